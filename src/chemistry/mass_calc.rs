
use anyhow::*;
use std::collections::BTreeMap;

use crate::chemistry::composition::*;
use crate::chemistry::constants::CONDENSATION_WATER_MASS;
use crate::chemistry::table::{AminoAcidTable, MassType};

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Labeling {
    None,
    N15,
}

impl std::str::FromStr for Labeling {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Labeling> {
        match s {
            "none" | "None" => Ok(Labeling::None),
            "15N" | "n15" | "N15" => Ok(Labeling::N15),
            _ => bail!("The label name '{}' was not found in the DB", s),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MassCalcParams {
    pub mass_type: MassType,
    pub labeling: Labeling,
    /// Divide the mass by the number of residues
    pub per_residue: bool,
}

impl Default for MassCalcParams {
    fn default() -> Self {
        MassCalcParams {
            mass_type: MassType::Average,
            labeling: Labeling::None,
            per_residue: false,
        }
    }
}

/// Sum of the residue masses of `aa_seq`, without terminal water.
pub fn residue_mass_sum(aa_seq: &str, aa_table: &AminoAcidTable, mass_type: MassType) -> Result<f64> {
    let aa_comp = parse_aa_composition(aa_seq);
    _calc_mass(&aa_comp, |aa| aa_table.residue_mass(aa, mass_type))
}

/// Mass of the intact peptide/protein: residues plus condensation water.
pub fn mass_from_sequence(aa_seq: &str, aa_table: &AminoAcidTable, params: &MassCalcParams) -> Result<f64> {

    let aa_comp = parse_aa_composition(aa_seq);
    let n_residues: usize = aa_comp.values().sum();
    if n_residues == 0 { bail!("sequence is empty") }

    let get_aa_mass = |aa_code1: char| -> Result<f64> {
        let aa = aa_table.get(aa_code1)?;
        let label_shift = match params.labeling {
            Labeling::None => 0.0,
            Labeling::N15 => aa.n15_shift,
        };
        Ok(aa.mass(params.mass_type) + label_shift)
    };

    let mass = _calc_mass(&aa_comp, get_aa_mass)? + CONDENSATION_WATER_MASS;

    if params.per_residue {
        Ok(mass / n_residues as f64)
    } else {
        Ok(mass)
    }
}

/// Mean residue weight used to normalise CD spectra: average mass / (N - 1).
pub fn mean_residue_weight(aa_seq: &str, aa_table: &AminoAcidTable) -> Result<f64> {
    let n_residues: usize = parse_aa_composition(aa_seq).values().sum();
    if n_residues < 2 { bail!("mean residue weight requires at least two residues") }

    let mass = mass_from_sequence(aa_seq, aa_table, &MassCalcParams::default())?;

    Ok(mass / (n_residues - 1) as f64)
}

fn _calc_mass<T,F>(abundance_map: &BTreeMap<T, usize>, get_entity_mass: F) -> Result<f64> where T: Copy, F: Fn(T) -> Result<f64> {

    let mut mass: f64 = 0.0;
    for (entity, entity_ab) in abundance_map {
        let entity_mass = get_entity_mass(*entity)?;
        mass += *entity_ab as f64 * entity_mass;
    }

    Ok(mass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::table::STANDARD_AMINO_ACID_TABLE;

    const ALL_RESIDUES: &str = "ACDEFGHIKLMNPQRSTVWY";

    #[test]
    fn average_mass_is_order_independent() {
        let table = &*STANDARD_AMINO_ACID_TABLE;
        let expected: f64 = table.amino_acids.iter().map(|aa| aa.average_mass).sum::<f64>() + CONDENSATION_WATER_MASS;

        let params = MassCalcParams::default();
        let forward = mass_from_sequence(ALL_RESIDUES, table, &params).unwrap();
        let reversed: String = ALL_RESIDUES.chars().rev().collect();
        let backward = mass_from_sequence(&reversed, table, &params).unwrap();

        assert!((forward - expected).abs() < 1e-9);
        assert!((forward - backward).abs() < 1e-9);
    }

    #[test]
    fn monoisotopic_mass_of_glycine_dipeptide() {
        let params = MassCalcParams { mass_type: MassType::Monoisotopic, ..Default::default() };
        let mass = mass_from_sequence("GG", &STANDARD_AMINO_ACID_TABLE, &params).unwrap();
        assert!((mass - (2.0 * 57.02146 + 18.01056)).abs() < 1e-9);
    }

    #[test]
    fn labeling_and_per_residue() {
        let table = &*STANDARD_AMINO_ACID_TABLE;
        let plain = mass_from_sequence("KR", table, &MassCalcParams::default()).unwrap();
        let labeled = mass_from_sequence("KR", table, &MassCalcParams { labeling: Labeling::N15, ..Default::default() }).unwrap();
        assert!((labeled - plain - 6.0 * 1.000036).abs() < 1e-9);

        let per_residue = mass_from_sequence("KR", table, &MassCalcParams { per_residue: true, ..Default::default() }).unwrap();
        assert!((per_residue - plain / 2.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_residue_fails() {
        let res = mass_from_sequence("PEPTIDEX", &STANDARD_AMINO_ACID_TABLE, &MassCalcParams::default());
        assert!(res.is_err());
        assert!(mass_from_sequence("", &STANDARD_AMINO_ACID_TABLE, &MassCalcParams::default()).is_err());
    }

    #[test]
    fn residue_sum_has_no_water() {
        let sum = residue_mass_sum("GA", &STANDARD_AMINO_ACID_TABLE, MassType::Monoisotopic).unwrap();
        assert!((sum - (57.02146 + 71.03711)).abs() < 1e-9);
    }

    #[test]
    fn mean_residue_weight_divides_by_bonds() {
        let table = &*STANDARD_AMINO_ACID_TABLE;
        let mass = mass_from_sequence("GGG", table, &MassCalcParams::default()).unwrap();
        assert!((mean_residue_weight("GGG", table).unwrap() - mass / 2.0).abs() < 1e-9);
        assert!(mean_residue_weight("G", table).is_err());
    }

    #[test]
    fn parses_labeling() {
        assert_eq!("15N".parse::<Labeling>().unwrap(), Labeling::N15);
        assert!("13C".parse::<Labeling>().is_err());
    }
}
