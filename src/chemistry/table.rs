
use crate::chemistry::constants::N15_SHIFT;

use anyhow::*;
use lazy_static::lazy_static;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum MassType {
    Monoisotopic,
    Average,
}

impl std::fmt::Display for MassType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MassType::Monoisotopic => write!(f, "monoisotopic"),
            MassType::Average => write!(f, "average"),
        }
    }
}

impl std::str::FromStr for MassType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<MassType> {
        match s {
            "mono" | "monoisotopic" => Ok(MassType::Monoisotopic),
            "average" | "avg" => Ok(MassType::Average),
            _ => bail!("unknown mass type '{}', expected 'monoisotopic' or 'average'", s),
        }
    }
}

/// Residue (i.e. water-free) masses of one amino acid.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct AminoAcidResidue {
    pub code1: char,
    pub code3: String,
    pub name: String,
    pub mono_mass: f64,
    pub average_mass: f64,
    /// Mass shift after complete metabolic 15N labeling
    pub n15_shift: f64,
}

impl AminoAcidResidue {
    pub fn new(code1: char, mono_mass: f64, average_mass: f64) -> Result<AminoAcidResidue> {
        if !code1.is_ascii_alphabetic() { bail!("invalid one-letter code '{}'", code1) }
        if mono_mass <= 0.0 { bail!("mono_mass must be a strictly positive number") }
        if average_mass <= 0.0 { bail!("average_mass must be a strictly positive number") }

        Ok(AminoAcidResidue {
            code1,
            mono_mass,
            average_mass,
            ..Default::default()
        })
    }

    pub fn mass(&self, mass_type: MassType) -> f64 {
        match mass_type {
            MassType::Monoisotopic => self.mono_mass,
            MassType::Average => self.average_mass,
        }
    }
}

#[derive(Clone, Default, PartialEq, Debug)]
pub struct AminoAcidTable {
    pub amino_acids: Vec<AminoAcidResidue>,
    pub aa_by_code1: HashMap<char, AminoAcidResidue>
}

#[derive(Deserialize)]
struct AminoAcidTableRow(char, f64, f64);

impl AminoAcidTable {
    pub fn new(
        amino_acids: Vec<AminoAcidResidue>,
    ) -> Result<AminoAcidTable> {

        if amino_acids.is_empty() { bail!("amino_acids is empty") }

        let n_aas = amino_acids.len();
        let mut aa_by_code1 = HashMap::with_capacity(n_aas);
        for amino_acid in amino_acids.to_owned() {
            aa_by_code1.insert(amino_acid.code1, amino_acid);
        }

        if aa_by_code1.len() != n_aas {
            bail!("amino_acids contains duplicated entries")
        }

        Ok(AminoAcidTable {
            amino_acids,
            aa_by_code1,
        })
    }

    /// Loads a headerless `code<TAB>mono<TAB>average` residue table.
    pub fn from_tsv<R: Read>(reader: R) -> Result<AminoAcidTable> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut amino_acids = Vec::new();
        for row in csv_reader.deserialize() {
            let AminoAcidTableRow(code1, mono_mass, average_mass) = row?;
            amino_acids.push(AminoAcidResidue::new(code1, mono_mass, average_mass)?);
        }

        AminoAcidTable::new(amino_acids)
    }

    pub fn get(&self, code1: char) -> Result<&AminoAcidResidue> {
        self.aa_by_code1.get(&code1).ok_or_else(
            || anyhow!("amino acid '{}' not found in mass table", code1)
        )
    }

    pub fn residue_mass(&self, code1: char, mass_type: MassType) -> Result<f64> {
        Ok(self.get(code1)?.mass(mass_type))
    }
}

macro_rules! residue {
    ($code1:expr, $code3:expr, $name:expr, $mono:expr, $avg:expr, $n_count:expr) => {
        AminoAcidResidue {
            code1: $code1,
            code3: $code3.to_string(),
            name: $name.to_string(),
            mono_mass: $mono,
            average_mass: $avg,
            n15_shift: $n_count as f64 * N15_SHIFT,
        }
    }
}

// The lab's residue table. Label shifts count the nitrogens of each residue,
// see https://www.sciencedirect.com/science/article/abs/pii/0891391958900858
lazy_static! {
    pub static ref STANDARD_AMINO_ACID_TABLE: AminoAcidTable = AminoAcidTable::new(
        vec![
            residue!('A', "Ala", "Alanine", 71.03711, 71.0788, 1),
            residue!('R', "Arg", "Arginine", 156.10111, 156.1875, 4),
            residue!('N', "Asn", "Asparagine", 114.04293, 114.1038, 2),
            residue!('D', "Asp", "Aspartic acid", 115.02694, 115.0886, 1),
            residue!('C', "Cys", "Cysteine", 103.00919, 103.1388, 1),
            residue!('E', "Glu", "Glutamic acid", 129.04259, 129.1155, 1),
            residue!('Q', "Gln", "Glutamine", 128.05858, 128.1307, 2),
            residue!('G', "Gly", "Glycine", 57.02146, 57.0519, 1),
            residue!('H', "His", "Histidine", 137.05891, 137.1411, 3),
            residue!('I', "Ile", "Isoleucine", 113.08406, 113.1594, 1),
            residue!('L', "Leu", "Leucine", 113.08406, 113.1594, 1),
            residue!('K', "Lys", "Lysine", 128.09496, 128.1741, 2),
            residue!('M', "Met", "Methionine", 131.04049, 131.1926, 1),
            residue!('F', "Phe", "Phenylalanine", 147.06841, 147.1766, 1),
            residue!('P', "Pro", "Proline", 97.05276, 97.1167, 1),
            residue!('S', "Ser", "Serine", 87.03203, 87.0782, 1),
            residue!('T', "Thr", "Threonine", 101.04768, 101.1051, 1),
            residue!('W', "Trp", "Tryptophan", 186.07931, 186.2132, 2),
            residue!('Y', "Tyr", "Tyrosine", 163.06333, 163.176, 1),
            residue!('V', "Val", "Valine", 99.06841, 99.1326, 1),
        ]
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_has_twenty_residues() {
        let table = &*STANDARD_AMINO_ACID_TABLE;
        assert_eq!(table.amino_acids.len(), 20);
        assert_eq!(table.residue_mass('G', MassType::Monoisotopic).unwrap(), 57.02146);
        assert_eq!(table.residue_mass('W', MassType::Average).unwrap(), 186.2132);
        assert!((table.get('R').unwrap().n15_shift - 4.000144).abs() < 1e-9);
    }

    #[test]
    fn unknown_residue_is_an_error() {
        let err = STANDARD_AMINO_ACID_TABLE.get('X').unwrap_err();
        assert!(err.to_string().contains("'X'"));
    }

    #[test]
    fn loads_tsv_table() {
        let tsv = "# residue masses\nA\t71.03711\t71.0788\nK\t128.09496\t128.1741\n";
        let table = AminoAcidTable::from_tsv(tsv.as_bytes()).unwrap();
        assert_eq!(table.amino_acids.len(), 2);
        assert_eq!(table.residue_mass('K', MassType::Average).unwrap(), 128.1741);
    }

    #[test]
    fn rejects_duplicates() {
        let tsv = "A\t71.0\t71.1\nA\t71.0\t71.1\n";
        assert!(AminoAcidTable::from_tsv(tsv.as_bytes()).is_err());
    }

    #[test]
    fn parses_mass_type() {
        assert_eq!("monoisotopic".parse::<MassType>().unwrap(), MassType::Monoisotopic);
        assert_eq!("average".parse::<MassType>().unwrap(), MassType::Average);
        assert!("heavy".parse::<MassType>().is_err());
    }
}
