
use anyhow::*;
use std::f64::consts::PI;

use crate::chemistry::constants::*;

/// Charge of a spherical droplet at the Rayleigh limit, assuming one globular
/// protein per droplet (ion evaporation model).
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RayleighLimit {
    pub radius_m: f64,
    pub charge_coulomb: f64,
    pub protons: f64,
}

/// Average protein density (kg/m³) as a function of molecular mass.
/// Fischer, Polikarpov & Craievich, Protein Science (2004).
pub fn protein_density(molar_mass_g_per_mol: f64) -> f64 {
    1410.0 + 145.0 * (-molar_mass_g_per_mol / 13.0).exp()
}

pub fn rayleigh_charge(molar_mass_g_per_mol: f64) -> Result<RayleighLimit> {
    if !(molar_mass_g_per_mol > 0.0) { bail!("mass must be a strictly positive number") }

    let density = protein_density(molar_mass_g_per_mol);
    let molecule_mass_kg = molar_mass_g_per_mol / AVOGADRO / 1000.0;
    let volume = molecule_mass_kg / density;
    let radius_m = (3.0 / (4.0 * PI) * volume).cbrt();

    let charge_coulomb = 8.0 * PI * (VACUUM_PERMITTIVITY * WATER_SURFACE_TENSION * radius_m.powi(3)).sqrt();

    Ok(RayleighLimit {
        radius_m,
        charge_coulomb,
        protons: PROTONS_PER_COULOMB * charge_coulomb,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn albumin_sized_protein() {
        let limit = rayleigh_charge(66_000.0).unwrap();
        // ~2.7 nm radius and ~17 charges for a 66 kDa globular protein
        assert!(limit.radius_m > 2.5e-9 && limit.radius_m < 2.8e-9);
        assert!(limit.protons > 15.0 && limit.protons < 19.0);
    }

    #[test]
    fn charge_grows_with_mass() {
        let small = rayleigh_charge(10_000.0).unwrap();
        let large = rayleigh_charge(800_000.0).unwrap();
        assert!(large.protons > small.protons);
    }

    #[test]
    fn rejects_non_positive_mass() {
        assert!(rayleigh_charge(0.0).is_err());
        assert!(rayleigh_charge(f64::NAN).is_err());
    }
}
