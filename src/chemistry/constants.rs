
pub const PROTON_MASS: f64 = 1.007276466812; // Source: NIST 2010 CODATA

// Monoisotopic masses of the small groups involved in peptide fragmentation
pub const CO_MONO_MASS: f64 = 27.99491461956;
pub const H2O_MONO_MASS: f64 = 18.010565;
pub const OH_MONO_MASS: f64 = 17.00273965;

// Average counterparts, hydrogen stands in for the proton
pub const CO_AVERAGE_MASS: f64 = 28.0101;
pub const H2O_AVERAGE_MASS: f64 = 18.01528;
pub const OH_AVERAGE_MASS: f64 = 17.00734;
pub const H_AVERAGE_MASS: f64 = 1.00794;

/// Water added on condensation of a residue chain into a peptide.
pub const CONDENSATION_WATER_MASS: f64 = 18.01056;

/// Mass shift of a single 15N incorporation.
pub const N15_SHIFT: f64 = 1.000036;

// Physical constants (SI)
pub const AVOGADRO: f64 = 6.02214076e23;
pub const VACUUM_PERMITTIVITY: f64 = 8.854187817e-12; // C² / N m²
pub const WATER_SURFACE_TENSION: f64 = 0.073; // N / m
pub const PROTONS_PER_COULOMB: f64 = 6.242e18;
