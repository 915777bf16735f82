
use serde::Serialize;

use crate::chemistry::constants::*;
use crate::chemistry::table::MassType;

#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Debug)]
pub enum IonType {
    A,
    B,
    Y,
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum FragmentIonSeriesDirection {
    FORWARD,
    REVERSE,
}

impl IonType {
    pub fn direction(&self) -> FragmentIonSeriesDirection {
        match self {
            IonType::A | IonType::B => FragmentIonSeriesDirection::FORWARD,
            IonType::Y => FragmentIonSeriesDirection::REVERSE,
        }
    }

    /// Series letter, uppercase for the alpha peptide of a cross-link.
    pub fn label(&self, role: PeptideRole) -> &'static str {
        match (self, role) {
            (IonType::A, PeptideRole::Alpha) => "A",
            (IonType::A, PeptideRole::Beta) => "a",
            (IonType::B, PeptideRole::Alpha) => "B",
            (IonType::B, PeptideRole::Beta) => "b",
            (IonType::Y, PeptideRole::Alpha) => "Y",
            (IonType::Y, PeptideRole::Beta) => "y",
        }
    }
}

impl std::fmt::Display for IonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IonType::A => write!(f, "a"),
            IonType::B => write!(f, "b"),
            IonType::Y => write!(f, "y"),
        }
    }
}

impl std::str::FromStr for IonType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<IonType> {
        match s {
            "a" | "A" => Ok(IonType::A),
            "b" | "B" => Ok(IonType::B),
            "y" | "Y" => Ok(IonType::Y),
            _ => anyhow::bail!("unsupported ion type '{}', expected a, b or y", s),
        }
    }
}

/// Which arm of a cross-linked pair an ion stems from; linear peptides are alpha.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeptideRole {
    Alpha,
    Beta,
}

impl std::fmt::Display for PeptideRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeptideRole::Alpha => write!(f, "alpha"),
            PeptideRole::Beta => write!(f, "beta"),
        }
    }
}

/// Mass added at a 1-based residue position.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Modification {
    pub mass: f64,
    pub position: usize,
}

impl Modification {
    pub fn new(mass: f64, position: usize) -> Modification {
        Modification { mass, position }
    }

    /// Annotation used in ion descriptions, e.g. `-1(25) `
    pub fn describe(&self) -> String {
        format!("{}({}) ", self.mass, self.position)
    }
}

impl std::str::FromStr for Modification {
    type Err = anyhow::Error;

    /// `mass@position`, e.g. `15.9949@3`
    fn from_str(s: &str) -> anyhow::Result<Modification> {
        let (mass, position) = s.split_once('@')
            .ok_or_else(|| anyhow::anyhow!("modification '{}' must be given as mass@position", s))?;
        let position: usize = position.trim().parse()?;
        if position == 0 { anyhow::bail!("modification positions start at 1") }

        Ok(Modification::new(mass.trim().parse()?, position))
    }
}

/// Structural description of a theoretical ion.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct IonDescriptor {
    /// Fragment sequence, with `-x1-partner-x2` appended when it carries the cross-link
    pub sequence: String,
    /// `A/B/Y` (alpha), `a/b/y` (beta) or `M+zH` (parent)
    pub label: String,
    pub length: Option<usize>,
    pub charge: u8,
    pub role: Option<PeptideRole>,
    pub mods: String,
}

impl IonDescriptor {
    pub fn is_parent(&self) -> bool {
        self.length.is_none()
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct TheoreticalIon {
    pub mz: f64,
    pub descriptor: IonDescriptor,
}

/// Theoretical ions sorted by ascending m/z.
pub type IonTable = Vec<TheoreticalIon>;

/// Masses of the groups gained or lost on fragmentation, for one mass type.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FragmentationConstants {
    pub water: f64,
    pub hydroxyl: f64,
    pub carbon_monoxide: f64,
    pub proton: f64,
}

impl FragmentationConstants {
    pub fn for_mass_type(mass_type: MassType) -> FragmentationConstants {
        match mass_type {
            MassType::Monoisotopic => FragmentationConstants {
                water: H2O_MONO_MASS,
                hydroxyl: OH_MONO_MASS,
                carbon_monoxide: CO_MONO_MASS,
                proton: PROTON_MASS,
            },
            MassType::Average => FragmentationConstants {
                water: H2O_AVERAGE_MASS,
                hydroxyl: OH_AVERAGE_MASS,
                carbon_monoxide: CO_AVERAGE_MASS,
                proton: H_AVERAGE_MASS,
            },
        }
    }

    /// Neutral mass shift applied to the residue sum, excluding the charging protons.
    pub fn ion_mass_shift(&self, ion_type: IonType) -> f64 {
        match ion_type {
            // b: condensation water minus the OH- lost on b-ion formation
            IonType::B => self.water - self.hydroxyl - self.proton,
            IonType::A => -self.carbon_monoxide,
            IonType::Y => self.water,
        }
    }

    /// m/z of an ion with neutral residue (plus modification) mass `residue_mass`.
    pub fn ion_mz(&self, ion_type: IonType, residue_mass: f64, charge: u8) -> f64 {
        let z = charge as f64;
        (residue_mass + self.ion_mass_shift(ion_type) + z * self.proton) / z
    }

    /// m/z of an intact precursor; `neutral_mass` already includes the terminal water.
    pub fn parent_mz(&self, neutral_mass: f64, charge: u8) -> f64 {
        let z = charge as f64;
        (neutral_mass + z * self.proton) / z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn b_ion_carries_one_proton_per_charge() {
        let consts = FragmentationConstants::for_mass_type(MassType::Average);
        // b: Σ + 18.01528 - 17.00734 + (z-1)·1.00794, divided by z
        let expected = (100.0 + 18.01528 - 17.00734 + 1.0 * 1.00794) / 2.0;
        assert!((consts.ion_mz(IonType::B, 100.0, 2) - expected).abs() < 1e-9);
    }

    #[test]
    fn a_and_y_shifts() {
        let consts = FragmentationConstants::for_mass_type(MassType::Average);
        assert!((consts.ion_mz(IonType::A, 100.0, 1) - (100.0 - 28.0101 + 1.00794)).abs() < 1e-9);
        assert!((consts.ion_mz(IonType::Y, 100.0, 1) - (100.0 + 18.01528 + 1.00794)).abs() < 1e-9);
        assert!((consts.parent_mz(100.0 + consts.water, 3) - consts.ion_mz(IonType::Y, 100.0, 3)).abs() < 1e-9);
    }

    #[test]
    fn labels_follow_role() {
        assert_eq!(IonType::B.label(PeptideRole::Alpha), "B");
        assert_eq!(IonType::Y.label(PeptideRole::Beta), "y");
        assert_eq!("a".parse::<IonType>().unwrap(), IonType::A);
        assert!("c".parse::<IonType>().is_err());
    }

    #[test]
    fn parses_modifications() {
        let m: Modification = "-1@25".parse().unwrap();
        assert_eq!(m, Modification::new(-1.0, 25));
        assert_eq!(m.describe(), "-1(25) ");
        assert!("15.99".parse::<Modification>().is_err());
        assert!("15.99@0".parse::<Modification>().is_err());
    }
}
