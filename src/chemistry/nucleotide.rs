
// Nucleotide masses from http://biotools.nubic.northwestern.edu/OligoCalc.html#helpOD

use anyhow::*;
use log::debug;
use std::collections::BTreeMap;
use std::io::Read;

use crate::io::reader::TextReader;

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum NucleicAcid {
    Rna,
    Dna,
}

impl std::str::FromStr for NucleicAcid {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<NucleicAcid> {
        match s.to_ascii_uppercase().as_str() {
            "RNA" => Ok(NucleicAcid::Rna),
            "DNA" => Ok(NucleicAcid::Dna),
            _ => bail!("unknown nucleic acid type '{}', expected RNA or DNA", s),
        }
    }
}

pub fn nucleotide_mass(kind: NucleicAcid, nucleotide: char) -> Result<f64> {
    let mass = match (kind, nucleotide) {
        (NucleicAcid::Rna, 'A') => 329.21,
        (NucleicAcid::Rna, 'U') => 306.17,
        (NucleicAcid::Rna, 'C') => 305.18,
        (NucleicAcid::Rna, 'G') => 345.21,
        (NucleicAcid::Dna, 'A') => 313.21,
        (NucleicAcid::Dna, 'T') => 304.2,
        (NucleicAcid::Dna, 'C') => 289.18,
        (NucleicAcid::Dna, 'G') => 329.21,
        _ => bail!("could not find nucleotide {}", nucleotide),
    };

    Ok(mass)
}

/// Terminal modifications by name, for both ends of the strand.
#[derive(Clone, PartialEq, Debug)]
pub struct NucleotideModifications {
    pub five_prime: BTreeMap<String, f64>,
    pub three_prime: BTreeMap<String, f64>,
}

impl Default for NucleotideModifications {
    fn default() -> Self {
        let five_prime = [("OH", -62.0), ("Monophosphate", 0.0), ("Triphosphate", 159.0)]
            .iter()
            .map(|(name, mass)| (name.to_string(), *mass))
            .collect();
        let three_prime = [("None".to_string(), 0.0)].into_iter().collect();

        NucleotideModifications { five_prime, three_prime }
    }
}

impl NucleotideModifications {
    /// Extends the built-in modifications with a `name<TAB>mass<TAB>5'<TAB>3'` table,
    /// an `X` in a terminus column marks the modification as available there.
    pub fn load<R: Read>(mut self, reader: R) -> Result<Self> {
        let mut text_reader = TextReader::new(reader);

        while let Some(line) = text_reader.next() {
            let line = line?;
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            if fields.len() < 4 {
                bail!("line {} of the modification table must have 4 columns", text_reader.line_number());
            }

            let name = fields[0].to_string();
            let mass: f64 = fields[1].parse()
                .with_context(|| format!("invalid mass '{}' for modification '{}'", fields[1], name))?;

            if fields[2] == "X" {
                self.five_prime.insert(name.clone(), mass);
            }
            if fields[3] == "X" {
                self.three_prime.insert(name, mass);
            }
        }

        Ok(self)
    }
}

pub fn oligo_mass(
    sequence: &str,
    kind: NucleicAcid,
    five_prime_mod: &str,
    three_prime_mod: &str,
    mods: &NucleotideModifications,
) -> Result<f64> {
    let mut mass = *mods.five_prime.get(five_prime_mod)
        .ok_or_else(|| anyhow!("unknown 5' modification '{}'", five_prime_mod))?;

    for n in sequence.chars().filter(|c| !c.is_whitespace()) {
        mass += nucleotide_mass(kind, n)?;
    }

    mass += *mods.three_prime.get(three_prime_mod)
        .ok_or_else(|| anyhow!("unknown 3' modification '{}'", three_prime_mod))?;

    debug!("{:?} {} with 5' {} and 3' {}: {}", kind, sequence, five_prime_mod, three_prime_mod, mass);

    Ok(mass)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rna_with_hydroxyl_terminus() {
        let mods = NucleotideModifications::default();
        let mass = oligo_mass("AUCG", NucleicAcid::Rna, "OH", "None", &mods).unwrap();
        assert!((mass - (329.21 + 306.17 + 305.18 + 345.21 - 62.0)).abs() < 1e-9);
    }

    #[test]
    fn uracil_is_not_dna() {
        let mods = NucleotideModifications::default();
        assert!(oligo_mass("AU", NucleicAcid::Dna, "OH", "None", &mods).is_err());
        assert!(oligo_mass("AT", NucleicAcid::Dna, "Cy5", "None", &mods).is_err());
    }

    #[test]
    fn loads_modification_table() {
        let table = "# name\tmass\t5'\t3'\nCyanine (CY) 5\t534.6\tX\t\nBHQ-1\t554.6\t\tX\n";
        let mods = NucleotideModifications::default().load(table.as_bytes()).unwrap();

        assert_eq!(mods.five_prime["Cyanine (CY) 5"], 534.6);
        assert!(!mods.three_prime.contains_key("Cyanine (CY) 5"));
        assert_eq!(mods.three_prime["BHQ-1"], 554.6);

        let mass = oligo_mass("GA", NucleicAcid::Dna, "Cyanine (CY) 5", "BHQ-1", &mods).unwrap();
        assert!((mass - (329.21 + 313.21 + 534.6 + 554.6)).abs() < 1e-9);
    }

    #[test]
    fn short_rows_are_rejected() {
        assert!(NucleotideModifications::default().load("Cy5\t534.6\n".as_bytes()).is_err());
    }
}
