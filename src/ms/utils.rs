
use anyhow::*;

use crate::chemistry::constants::PROTON_MASS;

pub fn mz_to_mass( mz: f64, charge: i32 ) -> f64 {
    let z = charge as f64;
    mz * z.abs() - z * PROTON_MASS
}
pub fn mass_to_mz( mass: f64, charge: i32 ) -> f64 {
    let z = charge as f64;
    (mass + z * PROTON_MASS) / z.abs()
}

/// Relative deviation of a theoretical m/z from the measured one, in ppm.
pub fn ppm_error(exp_mz: f64, theo_mz: f64) -> f64 {
    (exp_mz - theo_mz) / exp_mz * 1e6
}

/// Asymmetric mass accuracy window in ppm, relative to the measured m/z.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PpmWindow {
    pub lower: f64,
    pub upper: f64,
}

impl PpmWindow {
    pub fn new(lower: f64, upper: f64) -> Result<PpmWindow> {
        if !lower.is_finite() || !upper.is_finite() { bail!("ppm window bounds must be finite") }
        if lower > upper { bail!("lower ppm bound {} is above the upper bound {}", lower, upper) }

        Ok(PpmWindow { lower, upper })
    }

    pub fn symmetric(ppm: f64) -> Result<PpmWindow> {
        PpmWindow::new(-ppm.abs(), ppm.abs())
    }

    pub fn lower_mz(&self, exp_mz: f64) -> f64 {
        exp_mz * (1.0 + self.lower / 1e6)
    }

    pub fn upper_mz(&self, exp_mz: f64) -> f64 {
        exp_mz * (1.0 + self.upper / 1e6)
    }

    /// True when `theo_mz` lies in `[exp·(1+lower/1e6), exp·(1+upper/1e6)]`.
    pub fn contains(&self, exp_mz: f64, theo_mz: f64) -> bool {
        theo_mz >= self.lower_mz(exp_mz) && theo_mz <= self.upper_mz(exp_mz)
    }
}

impl Default for PpmWindow {
    fn default() -> Self {
        PpmWindow { lower: -10.0, upper: 10.0 }
    }
}

impl std::str::FromStr for PpmWindow {
    type Err = anyhow::Error;

    /// `-10,10` or `10` (symmetric)
    fn from_str(s: &str) -> Result<PpmWindow> {
        match s.split_once(',') {
            Some((lower, upper)) => PpmWindow::new(lower.trim().parse()?, upper.trim().parse()?),
            None => PpmWindow::symmetric(s.trim().parse()?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_accepts_within_and_rejects_outside() {
        let window = PpmWindow::new(-10.0, 10.0).unwrap();
        // 9.8 ppm apart
        assert!(window.contains(500.0049, 500.0));
        // 12 ppm apart
        assert!(!window.contains(500.0060, 500.0));
    }

    #[test]
    fn asymmetric_window() {
        let window = PpmWindow::new(0.0, 20.0).unwrap();
        assert!(window.contains(500.0, 500.005));
        assert!(!window.contains(500.0, 499.999));
        assert!(PpmWindow::new(5.0, -5.0).is_err());
    }

    #[test]
    fn parses_window() {
        assert_eq!("-20,20".parse::<PpmWindow>().unwrap(), PpmWindow { lower: -20.0, upper: 20.0 });
        assert_eq!("15".parse::<PpmWindow>().unwrap(), PpmWindow { lower: -15.0, upper: 15.0 });
    }

    #[test]
    fn mass_and_mz_conversions() {
        let mz = mass_to_mz(1000.0, 2);
        assert!((mz - (1000.0 + 2.0 * PROTON_MASS) / 2.0).abs() < 1e-12);
        assert!((mz_to_mass(mz, 2) - 1000.0).abs() < 1e-9);
        assert!((ppm_error(500.0049, 500.0) - 9.7999).abs() < 1e-3);
    }
}
