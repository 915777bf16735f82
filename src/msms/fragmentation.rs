use anyhow::*;
use log::debug;

use crate::chemistry::mass_calc::residue_mass_sum;
use crate::chemistry::table::{AminoAcidTable, MassType};
use crate::msms::model::*;

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Terminus {
    N,
    C,
}

#[derive(Clone, PartialEq, Debug)]
pub struct IonGenerationParams {
    pub ion_types: Vec<IonType>,
    pub min_charge: u8,
    pub max_charge: u8,
    pub mass_type: MassType,
    /// Ions at or above this m/z are dropped
    pub max_mz: Option<f64>,
}

impl Default for IonGenerationParams {
    fn default() -> Self {
        IonGenerationParams {
            ion_types: vec![IonType::A, IonType::B, IonType::Y],
            min_charge: 1,
            max_charge: 1,
            mass_type: MassType::Monoisotopic,
            max_mz: None,
        }
    }
}

impl IonGenerationParams {
    pub fn charges(&self) -> Result<std::ops::RangeInclusive<u8>> {
        if self.min_charge == 0 { bail!("the minimum charge must be at least 1") }
        if self.min_charge > self.max_charge {
            bail!("the minimum charge {} is above the maximum charge {}", self.min_charge, self.max_charge)
        }

        Ok(self.min_charge..=self.max_charge)
    }

    fn keeps(&self, mz: f64) -> bool {
        self.max_mz.map(|max_mz| mz < max_mz).unwrap_or(true)
    }
}

/// Two peptides joined by a linker between residue `xlink1` of `peptide1` and
/// residue `xlink2` of `peptide2` (1-based).
#[derive(Clone, PartialEq, Debug)]
pub struct XlinkedPeptides {
    pub peptide1: String,
    pub xlink1: usize,
    pub peptide2: String,
    pub xlink2: usize,
    pub linker_mass: f64,
    pub mods1: Vec<Modification>,
    pub mods2: Vec<Modification>,
}

/// Byte offset of every residue plus the end of the sequence.
fn residue_boundaries(seq: &str) -> Vec<usize> {
    seq.char_indices().map(|(idx, _)| idx).chain(std::iter::once(seq.len())).collect()
}

/// Prefixes of `len` residues for `len` in `start..end`.
pub fn nterm_peptides(seq: &str, start: usize, end: usize) -> Vec<&str> {
    let bounds = residue_boundaries(seq);
    let end = end.min(bounds.len());
    (start.max(1)..end).map(|len| &seq[..bounds[len]]).collect()
}

/// Suffixes starting at residue index `idx` (0-based) for `idx` in `start..end`.
pub fn cterm_peptides(seq: &str, start: usize, end: usize) -> Vec<&str> {
    let bounds = residue_boundaries(seq);
    let end = end.min(bounds.len() - 1);
    (start..end).map(|idx| &seq[bounds[idx]..]).collect()
}

/// Fragments of one cross-linked arm, split by whether they still carry the linker.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct ArmFragments<'a> {
    pub unmodified: Vec<&'a str>,
    pub modified: Vec<&'a str>,
}

#[derive(Clone, Default, PartialEq, Debug)]
pub struct XlinkFragments<'a> {
    pub alpha: ArmFragments<'a>,
    pub beta: ArmFragments<'a>,
}

fn arm_fragments(seq: &str, xlink: usize, terminus: Terminus) -> ArmFragments<'_> {
    let len = seq.len();
    match terminus {
        Terminus::N => ArmFragments {
            unmodified: nterm_peptides(seq, 1, xlink),
            modified: nterm_peptides(seq, xlink, len),
        },
        Terminus::C => ArmFragments {
            unmodified: cterm_peptides(seq, xlink, len),
            modified: cterm_peptides(seq, 1, xlink),
        },
    }
}

fn check_residues(seq: &str, aa_table: &AminoAcidTable) -> Result<()> {
    for aa in seq.chars() {
        aa_table.get(aa)?;
    }
    Ok(())
}

fn check_ascii(seq: &str) -> Result<()> {
    match seq.chars().find(|aa| !aa.is_ascii()) {
        Some(aa) => bail!("amino acid '{}' of peptide {} is not a one-letter code", aa, seq),
        None => Ok(()),
    }
}

fn check_xlink_position(seq: &str, xlink: usize) -> Result<()> {
    if xlink == 0 || xlink > seq.len() {
        bail!("cross-link position {} lies outside peptide {} (length {})", xlink, seq, seq.len())
    }
    Ok(())
}

/// Splits the N- or C-terminal fragments of both arms around their cross-link positions.
pub fn xlink_fragments<'a>(p1: &'a str, x1: usize, p2: &'a str, x2: usize, terminus: Terminus) -> Result<XlinkFragments<'a>> {
    check_ascii(p1)?;
    check_ascii(p2)?;
    check_xlink_position(p1, x1)?;
    check_xlink_position(p2, x2)?;

    Ok(XlinkFragments {
        alpha: arm_fragments(p1, x1, terminus),
        beta: arm_fragments(p2, x2, terminus),
    })
}

fn check_mods(seq: &str, mods: &[Modification]) -> Result<()> {
    for m in mods {
        if m.position == 0 || m.position > seq.len() {
            bail!("modification at position {} lies outside peptide {} (length {})", m.position, seq, seq.len())
        }
    }
    Ok(())
}

/// How a list of fragments of one peptide is turned into ions.
#[derive(Clone, Copy, Debug)]
pub struct FragmentSeries<'a> {
    pub ion_type: IonType,
    pub role: PeptideRole,
    pub mods: &'a [Modification],
    /// Length of the intact peptide, required to place modifications on C-terminal fragments
    pub peptide_length: Option<usize>,
    /// Neutral mass carried by every fragment of the series (cross-linked partner)
    pub stub_mass: f64,
    /// Appended to the fragment sequence in the ion descriptor
    pub annotation: &'a str,
}

pub fn fragment_series_ions(
    fragments: &[&str],
    series: &FragmentSeries,
    params: &IonGenerationParams,
    aa_table: &AminoAcidTable,
) -> Result<Vec<TheoreticalIon>> {

    let consts = FragmentationConstants::for_mass_type(params.mass_type);
    let charges = params.charges()?;

    let is_cterm = series.ion_type.direction() == FragmentIonSeriesDirection::REVERSE;
    if is_cterm && !series.mods.is_empty() && series.peptide_length.is_none() {
        bail!("modifications on {} ions require the total peptide length", series.ion_type)
    }

    let mut ions = Vec::with_capacity(fragments.len() * charges.len());
    for frag in fragments {
        let frag_len = frag.len();

        let applied_mods: Vec<&Modification> = series.mods.iter().filter(|m| {
            if is_cterm {
                let pep_len = series.peptide_length.unwrap_or(frag_len);
                m.position + frag_len > pep_len
            } else {
                m.position <= frag_len
            }
        }).collect();

        let mods_mass: f64 = applied_mods.iter().map(|m| m.mass).sum();
        let mods_str: String = applied_mods.iter().map(|m| m.describe()).collect();
        let frag_mass = residue_mass_sum(frag, aa_table, params.mass_type)? + mods_mass + series.stub_mass;

        for charge in charges.clone() {
            let mz = consts.ion_mz(series.ion_type, frag_mass, charge);
            if !params.keeps(mz) {
                continue;
            }

            ions.push(TheoreticalIon {
                mz,
                descriptor: IonDescriptor {
                    sequence: format!("{}{}", frag, series.annotation),
                    label: series.ion_type.label(series.role).to_string(),
                    length: Some(frag_len),
                    charge,
                    role: Some(series.role),
                    mods: mods_str.clone(),
                },
            });
        }
    }

    Ok(ions)
}

fn parent_ions(sequence: &str, neutral_mass: f64, mods: &[Modification], params: &IonGenerationParams) -> Result<Vec<TheoreticalIon>> {
    let consts = FragmentationConstants::for_mass_type(params.mass_type);
    let mods_str: String = mods.iter().map(|m| m.describe()).collect();

    let ions = params.charges()?
        .map(|charge| TheoreticalIon {
            mz: consts.parent_mz(neutral_mass, charge),
            descriptor: IonDescriptor {
                sequence: sequence.to_string(),
                label: format!("M+{}H", charge),
                length: None,
                charge,
                role: None,
                mods: mods_str.clone(),
            },
        })
        .filter(|ion| params.keeps(ion.mz))
        .collect();

    Ok(ions)
}

fn sort_ion_table(ions: &mut IonTable) {
    ions.sort_by(|a, b| a.mz.total_cmp(&b.mz));
}

/// All a/b/y fragments (lengths 1 to L-1) and parent ions of a linear peptide.
pub fn ions_from_sequence(
    seq: &str,
    mods: &[Modification],
    params: &IonGenerationParams,
    aa_table: &AminoAcidTable,
) -> Result<IonTable> {
    if seq.is_empty() { bail!("peptide sequence is empty") }
    check_residues(seq, aa_table)?;
    check_mods(seq, mods)?;

    let pep_len = seq.len();
    let mut ions = IonTable::new();

    for ion_type in &params.ion_types {
        let fragments = match ion_type.direction() {
            FragmentIonSeriesDirection::FORWARD => nterm_peptides(seq, 1, pep_len),
            FragmentIonSeriesDirection::REVERSE => cterm_peptides(seq, 1, pep_len),
        };
        debug!("{} fragments of {}: {:?}", ion_type, seq, fragments);

        let series = FragmentSeries {
            ion_type: *ion_type,
            role: PeptideRole::Alpha,
            mods,
            peptide_length: Some(pep_len),
            stub_mass: 0.0,
            annotation: "",
        };
        ions.extend(fragment_series_ions(&fragments, &series, params, aa_table)?);
    }

    let consts = FragmentationConstants::for_mass_type(params.mass_type);
    let mods_mass: f64 = mods.iter().map(|m| m.mass).sum();
    let neutral_mass = residue_mass_sum(seq, aa_table, params.mass_type)? + mods_mass + consts.water;
    ions.extend(parent_ions(seq, neutral_mass, mods, params)?);

    sort_ion_table(&mut ions);

    Ok(ions)
}

struct ArmContext<'a> {
    sequence: &'a str,
    xlink: usize,
    mods: &'a [Modification],
    role: PeptideRole,
    /// Neutral mass of the partner arm hanging off the linker
    stub_mass: f64,
    annotation: String,
}

/// Fragment and parent ions of two cross-linked peptides.
///
/// Fragments still carrying the cross-link gain the intact partner peptide and linker
/// as a stub mass; the others are plain fragments of their own arm.
pub fn ions_from_xlink_sequence(
    xl: &XlinkedPeptides,
    params: &IonGenerationParams,
    aa_table: &AminoAcidTable,
) -> Result<IonTable> {
    if xl.peptide1.is_empty() || xl.peptide2.is_empty() { bail!("cross-linked peptide sequences must not be empty") }
    check_residues(&xl.peptide1, aa_table)?;
    check_residues(&xl.peptide2, aa_table)?;
    check_xlink_position(&xl.peptide1, xl.xlink1)?;
    check_xlink_position(&xl.peptide2, xl.xlink2)?;
    check_mods(&xl.peptide1, &xl.mods1)?;
    check_mods(&xl.peptide2, &xl.mods2)?;

    let consts = FragmentationConstants::for_mass_type(params.mass_type);

    // intact arm mass: residues, modifications and terminal water
    let arm_mass = |seq: &str, mods: &[Modification]| -> Result<f64> {
        Ok(residue_mass_sum(seq, aa_table, params.mass_type)? + mods.iter().map(|m| m.mass).sum::<f64>() + consts.water)
    };
    let mass1 = arm_mass(&xl.peptide1, &xl.mods1)?;
    let mass2 = arm_mass(&xl.peptide2, &xl.mods2)?;

    let stub1 = xl.linker_mass + mass2;
    let stub2 = xl.linker_mass + mass1;
    debug!("stub masses: alpha {:.5}, beta {:.5}", stub1, stub2);

    let arms = [
        ArmContext {
            sequence: &xl.peptide1,
            xlink: xl.xlink1,
            mods: &xl.mods1,
            role: PeptideRole::Alpha,
            stub_mass: stub1,
            annotation: format!("-{}-{}-{}", xl.xlink1, xl.peptide2, xl.xlink2),
        },
        ArmContext {
            sequence: &xl.peptide2,
            xlink: xl.xlink2,
            mods: &xl.mods2,
            role: PeptideRole::Beta,
            stub_mass: stub2,
            annotation: format!("-{}-{}-{}", xl.xlink2, xl.peptide1, xl.xlink1),
        },
    ];

    let mut ions = IonTable::new();
    for arm in &arms {
        for ion_type in &params.ion_types {
            let terminus = match ion_type.direction() {
                FragmentIonSeriesDirection::FORWARD => Terminus::N,
                FragmentIonSeriesDirection::REVERSE => Terminus::C,
            };
            let fragments = arm_fragments(arm.sequence, arm.xlink, terminus);
            debug!("{} {} fragments of {}: unmodified {:?}, cross-linked {:?}",
                arm.role, ion_type, arm.sequence, fragments.unmodified, fragments.modified);

            let plain = FragmentSeries {
                ion_type: *ion_type,
                role: arm.role,
                mods: arm.mods,
                peptide_length: Some(arm.sequence.len()),
                stub_mass: 0.0,
                annotation: "",
            };
            ions.extend(fragment_series_ions(&fragments.unmodified, &plain, params, aa_table)?);

            let linked = FragmentSeries {
                stub_mass: arm.stub_mass,
                annotation: &arm.annotation,
                ..plain
            };
            ions.extend(fragment_series_ions(&fragments.modified, &linked, params, aa_table)?);
        }
    }

    let all_mods: Vec<Modification> = xl.mods1.iter().chain(xl.mods2.iter()).copied().collect();
    let parent_seq = format!("{}-{}-{}-{}", xl.peptide1, xl.xlink1, xl.peptide2, xl.xlink2);
    ions.extend(parent_ions(&parent_seq, mass1 + mass2 + xl.linker_mass, &all_mods, params)?);

    sort_ion_table(&mut ions);

    Ok(ions)
}
