use anyhow::*;
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ms_toolbox::chemistry::complexes::{enumerate_complexes, Subunit};
use ms_toolbox::chemistry::digest::{digest, find_protease};
use ms_toolbox::chemistry::mass_calc::{mass_from_sequence, mean_residue_weight, Labeling, MassCalcParams};
use ms_toolbox::chemistry::nucleotide::{oligo_mass, NucleicAcid, NucleotideModifications};
use ms_toolbox::chemistry::rayleigh::rayleigh_charge;
use ms_toolbox::io::akta::parse_akta_asc;
use ms_toolbox::io::fasta::{dbfetch_batches, extract_uniprot_accessions, read_fasta, select_by_accessions, split_protein_ids, write_fasta};
use ms_toolbox::io::mgf::read_mgf_spectrum;
use ms_toolbox::io::pdb::read_pdb_chains;
use ms_toolbox::io::peaklist::{read_xy_peaks, write_unidec_peaks};
use ms_toolbox::io::waters::{collect_metadata, ordered_columns, varying_columns, write_metadata_csv};
use ms_toolbox::msms::annotator::*;
use ms_toolbox::msms::fragmentation::{ions_from_sequence, ions_from_xlink_sequence, IonGenerationParams, XlinkedPeptides};
use ms_toolbox::msms::model::{IonTable, IonType, Modification};
use ms_toolbox::quant::ibaq::{read_protein_groups, relative_ibaq, write_imputation_info, write_relative_ibaq, IbaqParams, IdColumn};
use ms_toolbox::spectroscopy::cd::CdSpectrum;
use ms_toolbox::{AminoAcidTable, MassType, Peaks, PpmWindow, STANDARD_AMINO_ACID_TABLE};

/// Command line tools for mass spectrometry and structural biology data
#[derive(Debug, Parser)]
#[command(name = "ms-toolbox", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Mass of a protein or peptide sequence
    Mass(MassArgs),
    /// Mass of an RNA or DNA oligonucleotide
    OligoMass(OligoMassArgs),
    /// Rayleigh limit charge of a globular protein of the given mass
    Rayleigh {
        /// Molecular mass in Da
        mass: f64,
    },
    /// In-silico digest of a sequence or of every fasta entry
    Digest(DigestArgs),
    /// Writes the fasta entries matching a list of accessions
    FastaSubset(FastaSubsetArgs),
    /// Lists the UniProt accessions of a text file as dbfetch URLs
    FastaAccessions {
        input: PathBuf,
        #[arg(long, default_value_t = 200)]
        batch_size: usize,
    },
    /// Theoretical fragment ions of a linear peptide
    Ions {
        #[command(flatten)]
        peptide: LinearPeptideArgs,
        #[command(flatten)]
        ions: IonArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Theoretical fragment ions of two cross-linked peptides
    XlinkIons {
        #[command(flatten)]
        xlink: XlinkArgs,
        #[command(flatten)]
        ions: IonArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Assigns the peaks of a spectrum to theoretical fragment ions
    Assign(AssignArgs),
    /// Relative iBAQ values from a MaxQuant proteinGroups.txt
    Ibaq(IbaqArgs),
    /// Baseline subtraction and MRW ellipticity of a JASCO CD spectrum
    Cd(CdArgs),
    /// Collects the tune parameters of Waters raw folders into one table
    WatersMetadata {
        /// Folder searched recursively for *.raw directories
        dir: PathBuf,
        /// Keep the columns with identical values in every raw file
        #[arg(short, long)]
        all: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Extracts curves from an AKTA/UNICORN ASCII export
    Akta {
        input: PathBuf,
        /// Curve name fragments to export
        #[arg(short, long, value_delimiter = ',', default_value = "UV1_280nm")]
        traces: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Sums a peak list into fixed m/z bins and writes it as UniDec text
    Digitize {
        /// Two column m/z intensity peak list
        input: PathBuf,
        /// Bin width in m/z
        #[arg(short, long, default_value_t = 0.5)]
        resolution: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Lists the chain identifiers of the COMPND records of a PDB file
    PdbChains {
        input: PathBuf,
    },
    /// Enumerates the complex stoichiometries below a mass limit
    Complexes {
        /// Subunits given as NAME=MASS
        #[arg(short, long = "subunit", required = true, value_parser = parse_subunit)]
        subunits: Vec<Subunit>,
        #[arg(long, default_value_t = 4)]
        max_subunits: usize,
        #[arg(long)]
        max_mass: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct MassArgs {
    /// Amino acid sequence
    #[arg(short, long, conflicts_with = "fasta", required_unless_present = "fasta")]
    sequence: Option<String>,
    /// Computes the mass of every entry of a fasta file
    #[arg(short, long)]
    fasta: Option<PathBuf>,
    #[arg(long, default_value = "average")]
    mass_type: MassType,
    #[arg(long, default_value = "none")]
    label: Labeling,
    /// Mass per residue instead of the total mass
    #[arg(long)]
    per_residue: bool,
    /// Residue mass table replacing the built-in one
    #[arg(long)]
    aa_table: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct OligoMassArgs {
    sequence: String,
    #[arg(long, default_value = "RNA")]
    kind: NucleicAcid,
    #[arg(long, default_value = "OH")]
    five_prime: String,
    #[arg(long, default_value = "None")]
    three_prime: String,
    /// Additional terminal modifications (name, mass, 5', 3' columns)
    #[arg(long)]
    mods: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct DigestArgs {
    /// Amino acid sequence
    #[arg(short, long, conflicts_with = "fasta", required_unless_present = "fasta")]
    sequence: Option<String>,
    #[arg(short, long)]
    fasta: Option<PathBuf>,
    /// Protease name, e.g. trypsin, lys-c, arg-c
    #[arg(short, long, default_value = "trypsin")]
    enzyme: String,
    #[arg(short, long, default_value_t = 0)]
    missed_cleavages: usize,
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct FastaSubsetArgs {
    #[arg(short, long)]
    fasta: PathBuf,
    /// File with one accession (or MaxQuant protein id cell) per line
    #[arg(short, long)]
    ids: PathBuf,
    /// Keep only the first id of each ';' separated cell
    #[arg(long)]
    first_only: bool,
    #[arg(long, default_value_t = 60)]
    line_width: usize,
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct IonArgs {
    #[arg(long, value_delimiter = ',', default_value = "a,b,y")]
    ion_types: Vec<IonType>,
    #[arg(long, default_value_t = 1)]
    min_charge: u8,
    #[arg(long, default_value_t = 1)]
    max_charge: u8,
    #[arg(long, default_value = "mono")]
    mass_type: MassType,
    /// Drops ions at or above this m/z
    #[arg(long)]
    max_mz: Option<f64>,
    #[arg(long)]
    aa_table: Option<PathBuf>,
}

impl IonArgs {
    fn params(&self) -> IonGenerationParams {
        IonGenerationParams {
            ion_types: self.ion_types.clone(),
            min_charge: self.min_charge,
            max_charge: self.max_charge,
            mass_type: self.mass_type,
            max_mz: self.max_mz,
        }
    }
}

#[derive(Debug, Args)]
struct LinearPeptideArgs {
    #[arg(long)]
    sequence: String,
    /// Modification as MASS@POSITION (1-based), may be repeated
    #[arg(long = "mod", allow_hyphen_values = true)]
    mods: Vec<Modification>,
}

#[derive(Debug, Args)]
struct XlinkArgs {
    #[arg(long)]
    peptide1: String,
    /// Cross-linked residue of peptide 1 (1-based)
    #[arg(long)]
    xlink1: usize,
    #[arg(long)]
    peptide2: String,
    #[arg(long)]
    xlink2: usize,
    /// Mass of the linker, e.g. 138.06808 for DSS
    #[arg(long, allow_hyphen_values = true)]
    linker_mass: f64,
    #[arg(long = "mod1", allow_hyphen_values = true)]
    mods1: Vec<Modification>,
    #[arg(long = "mod2", allow_hyphen_values = true)]
    mods2: Vec<Modification>,
}

impl XlinkArgs {
    fn peptides(&self) -> XlinkedPeptides {
        XlinkedPeptides {
            peptide1: self.peptide1.clone(),
            xlink1: self.xlink1,
            peptide2: self.peptide2.clone(),
            xlink2: self.xlink2,
            linker_mass: self.linker_mass,
            mods1: self.mods1.clone(),
            mods2: self.mods2.clone(),
        }
    }
}

#[derive(Debug, Args)]
struct AssignArgs {
    /// Two column m/z intensity peak list
    #[arg(long, conflicts_with = "mgf", required_unless_present = "mgf")]
    peaks: Option<PathBuf>,
    #[arg(long, requires = "spectrum")]
    mgf: Option<PathBuf>,
    /// Spectrum number in the MGF file (1-based)
    #[arg(long)]
    spectrum: Option<usize>,
    /// Linear peptide sequence
    #[arg(long, conflicts_with = "peptide1", required_unless_present = "peptide1")]
    sequence: Option<String>,
    #[arg(long = "mod", allow_hyphen_values = true)]
    mods: Vec<Modification>,
    #[arg(long, requires_all = ["xlink1", "peptide2", "xlink2", "linker_mass"])]
    peptide1: Option<String>,
    #[arg(long)]
    xlink1: Option<usize>,
    #[arg(long)]
    peptide2: Option<String>,
    #[arg(long)]
    xlink2: Option<usize>,
    #[arg(long, allow_hyphen_values = true)]
    linker_mass: Option<f64>,
    #[arg(long = "mod1", allow_hyphen_values = true)]
    mods1: Vec<Modification>,
    #[arg(long = "mod2", allow_hyphen_values = true)]
    mods2: Vec<Modification>,
    #[command(flatten)]
    ions: IonArgs,
    /// ppm window as LOWER,UPPER or a single symmetric value
    #[arg(long, default_value = "-10,10", allow_hyphen_values = true)]
    ppm: PpmWindow,
    /// Keep one peak per ion: nearest or highest
    #[arg(long)]
    dedup: Option<PeakSelectionStrategy>,
    /// Restricts the spectrum to START,END (m/z)
    #[arg(long, value_delimiter = ',')]
    mz_range: Option<Vec<f64>>,
    /// Reports intensities relative to the base peak
    #[arg(long)]
    normalise: bool,
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct IbaqArgs {
    /// MaxQuant proteinGroups.txt
    input: PathBuf,
    /// Experiment titles as given to MaxQuant
    #[arg(short, long, value_delimiter = ',', required = true)]
    titles: Vec<String>,
    /// Full or partial ids to report; all proteins when omitted
    #[arg(long, value_delimiter = ',')]
    targets: Vec<String>,
    #[arg(long, default_value = "Protein IDs")]
    id_column: IdColumn,
    /// Id of the protein to normalise to instead of the total iBAQ
    #[arg(long)]
    normalise_to: Option<String>,
    /// Impute missing values from the given low percentile of each column
    #[arg(long)]
    impute: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Writes the fitted imputation distributions to this CSV file
    #[arg(long, requires = "impute")]
    imputation_info: Option<PathBuf>,
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CdArgs {
    /// JASCO export of the sample
    sample: PathBuf,
    /// JASCO export of the buffer baseline
    #[arg(short, long)]
    baseline: Option<PathBuf>,
    /// Protein sequence used to compute the mean residue weight
    #[arg(long, conflicts_with = "mrw")]
    sequence: Option<String>,
    /// Mean residue weight in g/mol
    #[arg(long)]
    mrw: Option<f64>,
    #[arg(long, default_value_t = 0.1)]
    pathlength_cm: f64,
    /// Protein concentration in mg/mL
    #[arg(long)]
    conc: Option<f64>,
    #[arg(long, default_value_t = 0.0)]
    min_voltage: f64,
    #[arg(long, default_value_t = 1000.0)]
    max_voltage: f64,
    #[arg(long, default_value_t = 190.0)]
    start_nm: f64,
    #[arg(long, default_value_t = 260.0)]
    stop_nm: f64,
    #[arg(long, default_value_t = 1.0)]
    step_nm: f64,
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_subunit(s: &str) -> Result<Subunit> {
    let (name, mass) = s.split_once('=').ok_or_else(|| anyhow!("subunit '{}' must be given as NAME=MASS", s))?;
    Ok(Subunit { name: name.trim().to_string(), mass: mass.trim().parse()? })
}

fn open_output(path: &Option<PathBuf>) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = match path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("cannot create '{}'", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(std::io::stdout())),
    };

    Ok(writer)
}

fn open_file(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("failed to open '{}'", path.display()))
}

fn load_aa_table(path: &Option<PathBuf>) -> Result<Option<AminoAcidTable>> {
    match path {
        Some(path) => Ok(Some(AminoAcidTable::from_tsv(open_file(path)?)?)),
        None => Ok(None),
    }
}

fn write_ions(ions: &IonTable, output: &Option<PathBuf>) -> Result<()> {
    info!("generated {} theoretical ions", ions.len());
    write_ion_table(open_output(output)?, ions)
}

fn run_mass(args: &MassArgs) -> Result<()> {
    let custom_table = load_aa_table(&args.aa_table)?;
    let aa_table = custom_table.as_ref().unwrap_or(&*STANDARD_AMINO_ACID_TABLE);

    let params = MassCalcParams {
        mass_type: args.mass_type,
        labeling: args.label,
        per_residue: args.per_residue,
    };

    if let Some(sequence) = &args.sequence {
        println!("{:.4}", mass_from_sequence(sequence, aa_table, &params)?);
    } else if let Some(fasta) = &args.fasta {
        for record in read_fasta(fasta)? {
            println!("{}\t{:.4}", record.accession, mass_from_sequence(&record.sequence, aa_table, &params)?);
        }
    }

    Ok(())
}

fn run_oligo_mass(args: &OligoMassArgs) -> Result<()> {
    let mut mods = NucleotideModifications::default();
    if let Some(path) = &args.mods {
        mods = mods.load(open_file(path)?)?;
    }

    let mass = oligo_mass(&args.sequence, args.kind, &args.five_prime, &args.three_prime, &mods)?;
    println!("{:.2}", mass);

    Ok(())
}

fn run_digest(args: &DigestArgs) -> Result<()> {
    let protease = find_protease(&args.enzyme)?;

    let entries: Vec<(String, String)> = match (&args.sequence, &args.fasta) {
        (Some(sequence), _) => vec![("sequence".to_string(), sequence.to_uppercase())],
        (None, Some(fasta)) => read_fasta(fasta)?.into_iter()
            .map(|record| (record.accession, record.sequence))
            .collect(),
        (None, None) => bail!("either --sequence or --fasta is required"),
    };

    let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_writer(open_output(&args.output)?);
    wtr.write_record(["accession", "peptide", "start", "end", "missed_cleavages"])?;
    for (accession, sequence) in &entries {
        let peptides = digest(sequence, protease, args.missed_cleavages)?;
        info!("{}: {} peptides", accession, peptides.len());
        for peptide in peptides {
            wtr.write_record([
                accession.clone(),
                peptide.sequence,
                peptide.start.to_string(),
                peptide.end.to_string(),
                peptide.missed_cleavages.to_string(),
            ])?;
        }
    }
    wtr.flush()?;

    Ok(())
}

fn run_fasta_subset(args: &FastaSubsetArgs) -> Result<()> {
    let records = read_fasta(&args.fasta)?;

    let ids_text = std::fs::read_to_string(&args.ids).with_context(|| format!("failed to read '{}'", args.ids.display()))?;
    let accessions: Vec<String> = ids_text.lines()
        .flat_map(|line| split_protein_ids(line, args.first_only))
        .collect();

    let selection = select_by_accessions(&records, &accessions);
    if !selection.missing.is_empty() {
        warn!("{} of {} accessions were not found", selection.missing.len(), accessions.len());
    }
    info!("writing {} fasta entries", selection.records.len());

    write_fasta(open_output(&args.output)?, &selection.records, args.line_width)
}

fn run_assign(args: &AssignArgs) -> Result<()> {
    let custom_table = load_aa_table(&args.ions.aa_table)?;
    let aa_table = custom_table.as_ref().unwrap_or(&*STANDARD_AMINO_ACID_TABLE);
    let params = args.ions.params();

    let peaks: Peaks = match (&args.peaks, &args.mgf, args.spectrum) {
        (Some(path), _, _) => read_xy_peaks(path)?,
        (None, Some(path), Some(number)) => read_mgf_spectrum(path, number)?.peaks,
        _ => bail!("either --peaks or --mgf with --spectrum is required"),
    };
    let peaks = match args.mz_range.as_deref() {
        Some([start, end]) => peaks.mz_range(*start, *end),
        Some(_) => bail!("--mz-range takes START,END"),
        None => peaks,
    };
    let peaks = if args.normalise { peaks.normalised() } else { peaks };

    let ions = match (&args.sequence, &args.peptide1) {
        (Some(sequence), _) => ions_from_sequence(sequence, &args.mods, &params, aa_table)?,
        (None, Some(peptide1)) => {
            let xl = XlinkedPeptides {
                peptide1: peptide1.clone(),
                xlink1: args.xlink1.ok_or_else(|| anyhow!("--xlink1 is required"))?,
                peptide2: args.peptide2.clone().ok_or_else(|| anyhow!("--peptide2 is required"))?,
                xlink2: args.xlink2.ok_or_else(|| anyhow!("--xlink2 is required"))?,
                linker_mass: args.linker_mass.ok_or_else(|| anyhow!("--linker-mass is required"))?,
                mods1: args.mods1.clone(),
                mods2: args.mods2.clone(),
            };
            ions_from_xlink_sequence(&xl, &params, aa_table)?
        }
        (None, None) => bail!("either --sequence or --peptide1 is required"),
    };

    let mut assignments = assign_peaks(&peaks, &ions, &args.ppm)?;
    if let Some(strategy) = args.dedup {
        assignments = deduplicate(assignments, strategy);
    }

    let summary = AssignmentSummary::new(&assignments, &peaks);
    info!(
        "{} assignments, mean error {:.2} ppm (sd {:.2}), {:.1}% of the intensity explained",
        summary.count, summary.mean_error_ppm, summary.std_error_ppm, summary.explained_intensity * 100.0
    );

    write_assignments(open_output(&args.output)?, &assignments)
}

fn run_ibaq(args: &IbaqArgs) -> Result<()> {
    let groups = read_protein_groups(open_file(&args.input)?)?;

    let params = IbaqParams {
        titles: args.titles.clone(),
        targets: args.targets.clone(),
        id_column: args.id_column,
        normalise_to: args.normalise_to.clone(),
        impute: args.impute,
    };

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let result = relative_ibaq(&groups, &params, &mut rng)?;
    if args.imputation_info.is_some() {
        write_imputation_info(open_output(&args.imputation_info)?, &result)?;
    }
    write_relative_ibaq(open_output(&args.output)?, &result)
}

fn run_cd(args: &CdArgs) -> Result<()> {
    let mut sample = CdSpectrum::new(args.start_nm, args.stop_nm, args.step_nm)?;
    sample.load_jasco(open_file(&args.sample)?)?;

    if let Some(path) = &args.baseline {
        let mut baseline = CdSpectrum::new(args.start_nm, args.stop_nm, args.step_nm)?;
        baseline.load_jasco(open_file(path)?)?;
        sample.subtract(&baseline)?;
    }

    let mrw = match (&args.sequence, args.mrw) {
        (Some(sequence), _) => Some(mean_residue_weight(sequence, &STANDARD_AMINO_ACID_TABLE)?),
        (None, mrw) => mrw,
    };
    match (mrw, args.conc) {
        (Some(mrw), Some(conc)) => {
            info!("mean residue weight {:.2} g/mol", mrw);
            sample.compute_mrwe(mrw, args.pathlength_cm, conc)?;
        }
        (Some(_), None) => bail!("--conc is required to compute the MRW ellipticity"),
        _ => {}
    }

    sample.filter_by_detector(args.min_voltage, args.max_voltage);
    sample.write_csv(open_output(&args.output)?)
}

fn run_akta(input: &Path, traces: &[String], output: &Option<PathBuf>) -> Result<()> {
    let chromatogram = parse_akta_asc(open_file(input)?)?;

    let mut wtr = csv::Writer::from_writer(open_output(output)?);
    wtr.write_record(["curve", "volume", "value"])?;
    for fragment in traces {
        let curve = match chromatogram.trace(fragment) {
            Some(curve) => curve,
            None => {
                warn!("no curve matching '{}' among {:?}", fragment, chromatogram.curve_names());
                continue;
            }
        };
        for (volume, value) in curve.volume.iter().zip(&curve.values) {
            wtr.write_record([curve.name.clone(), volume.to_string(), value.to_string()])?;
        }
    }
    wtr.flush()?;

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Mass(args) => run_mass(&args)?,
        Command::OligoMass(args) => run_oligo_mass(&args)?,
        Command::Rayleigh { mass } => {
            let limit = rayleigh_charge(mass)?;
            println!("radius\t{:.3} nm", limit.radius_m * 1e9);
            println!("charge\t{:.4e} C", limit.charge_coulomb);
            println!("protons\t{:.1}", limit.protons);
        }
        Command::Digest(args) => run_digest(&args)?,
        Command::FastaSubset(args) => run_fasta_subset(&args)?,
        Command::FastaAccessions { input, batch_size } => {
            let text = std::fs::read_to_string(&input).with_context(|| format!("failed to read '{}'", input.display()))?;
            let accessions = extract_uniprot_accessions(&text);
            info!("found {} accessions", accessions.len());
            for url in dbfetch_batches(&accessions, batch_size)? {
                println!("{}", url);
            }
        }
        Command::Ions { peptide, ions, output } => {
            let custom_table = load_aa_table(&ions.aa_table)?;
            let aa_table = custom_table.as_ref().unwrap_or(&*STANDARD_AMINO_ACID_TABLE);
            let table = ions_from_sequence(&peptide.sequence, &peptide.mods, &ions.params(), aa_table)?;
            write_ions(&table, &output)?;
        }
        Command::XlinkIons { xlink, ions, output } => {
            let custom_table = load_aa_table(&ions.aa_table)?;
            let aa_table = custom_table.as_ref().unwrap_or(&*STANDARD_AMINO_ACID_TABLE);
            let table = ions_from_xlink_sequence(&xlink.peptides(), &ions.params(), aa_table)?;
            write_ions(&table, &output)?;
        }
        Command::Assign(args) => run_assign(&args)?,
        Command::Ibaq(args) => run_ibaq(&args)?,
        Command::Cd(args) => run_cd(&args)?,
        Command::WatersMetadata { dir, all, output } => {
            let records = collect_metadata(&dir)?;
            if records.is_empty() {
                bail!("no raw folders found below '{}'", dir.display())
            }
            let mut columns = ordered_columns(&records);
            if !all {
                columns = varying_columns(&records, &columns);
            }
            write_metadata_csv(open_output(&output)?, &records, &columns)?;
        }
        Command::Akta { input, traces, output } => run_akta(&input, &traces, &output)?,
        Command::Digitize { input, resolution, output } => {
            let peaks = read_xy_peaks(&input)?.digitize(resolution)?;
            info!("{} bins of {} m/z", peaks.len(), resolution);
            write_unidec_peaks(open_output(&output)?, &peaks)?;
        }
        Command::PdbChains { input } => {
            for chain in read_pdb_chains(&input)? {
                println!("{}", chain);
            }
        }
        Command::Complexes { subunits, max_subunits, max_mass, output } => {
            let complexes = enumerate_complexes(&subunits, max_subunits, max_mass)?;
            let mut writer = open_output(&output)?;
            for complex in &complexes {
                writeln!(writer, "{}\t{:.2}", complex.label(&subunits), complex.mass)?;
            }
            writer.flush()?;
        }
    }

    Ok(())
}
