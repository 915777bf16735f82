use anyhow::*;
use log::debug;
use std::io::{Read, Write};

use crate::io::reader::TextReader;

/// MRW ellipticity factor applied to the raw millidegree signal.
const MRWE_FACTOR: f64 = 142.5 * 3300.0 / 5610051.0;

/// Circular dichroism spectrum sampled on a fixed wavelength grid; gaps are NaN.
#[derive(Clone, PartialEq, Debug)]
pub struct CdSpectrum {
    pub wavelength_nm: Vec<f64>,
    pub ellipticity_mdeg: Vec<f64>,
    pub detector_v: Vec<f64>,
    /// Mean residue weighted ellipticity (deg cm² dmol⁻¹), once computed
    pub mrwe: Option<Vec<f64>>,
}

impl Default for CdSpectrum {
    fn default() -> Self {
        let n = 71;
        CdSpectrum {
            wavelength_nm: (0..n).map(|i| 190.0 + i as f64).collect(),
            ellipticity_mdeg: vec![f64::NAN; n],
            detector_v: vec![f64::NAN; n],
            mrwe: None,
        }
    }
}

impl CdSpectrum {
    pub fn new(start_nm: f64, stop_nm: f64, step_nm: f64) -> Result<CdSpectrum> {
        if step_nm <= 0.0 { bail!("wavelength step must be positive") }
        if stop_nm < start_nm { bail!("stop wavelength {} is below the start wavelength {}", stop_nm, start_nm) }

        let n = 1 + ((stop_nm - start_nm) / step_nm).round() as usize;
        Ok(CdSpectrum {
            wavelength_nm: (0..n).map(|i| start_nm + i as f64 * step_nm).collect(),
            ellipticity_mdeg: vec![f64::NAN; n],
            detector_v: vec![f64::NAN; n],
            mrwe: None,
        })
    }

    pub fn len(&self) -> usize {
        self.wavelength_nm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength_nm.is_empty()
    }

    fn grid_index(&self, wavelength: f64) -> Option<usize> {
        self.wavelength_nm.iter().position(|wl| (wl - wavelength).abs() < 1e-9)
    }

    /// Fills the grid from a JASCO text export (`x y1 y2` rows after the `XYDATA` line).
    pub fn load_jasco<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut in_data_block = false;
        let mut n_loaded = 0;

        for line in TextReader::new(reader) {
            let line = line?;
            let line = line.trim();

            if line.starts_with("XYDATA") {
                in_data_block = true;
                continue;
            }
            if !in_data_block || line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            let (x, y1, y2) = match fields.as_slice() {
                [x, y1, y2, ..] => (*x, *y1, *y2),
                _ => continue,
            };
            // trailing blocks of the export (e.g. extended information) are not numeric
            let wavelength = match fast_float::parse::<f64, _>(x) {
                std::result::Result::Ok(wl) => wl,
                Err(_) => continue,
            };

            if let Some(idx) = self.grid_index(wavelength) {
                self.ellipticity_mdeg[idx] = fast_float::parse(y1)?;
                self.detector_v[idx] = fast_float::parse(y2)?;
                n_loaded += 1;
            }
        }

        if !in_data_block { bail!("no XYDATA block found") }
        debug!("loaded {} of {} grid points", n_loaded, self.len());

        Ok(())
    }

    /// Discards points measured with a detector voltage outside `[min_v, max_v]`.
    pub fn filter_by_detector(&mut self, min_v: f64, max_v: f64) {
        for idx in 0..self.len() {
            let voltage = self.detector_v[idx];
            if voltage > max_v || voltage < min_v {
                self.ellipticity_mdeg[idx] = f64::NAN;
                if let Some(mrwe) = self.mrwe.as_mut() {
                    mrwe[idx] = f64::NAN;
                }
            }
        }
    }

    pub fn compute_mrwe(&mut self, mrw_g_per_mol: f64, pathlength_cm: f64, conc_mg_per_ml: f64) -> Result<()> {
        if pathlength_cm <= 0.0 || conc_mg_per_ml <= 0.0 {
            bail!("path length and concentration must be positive")
        }

        let scale = MRWE_FACTOR * mrw_g_per_mol / (conc_mg_per_ml * pathlength_cm);
        self.mrwe = Some(self.ellipticity_mdeg.iter().map(|theta| theta * scale).collect());

        Ok(())
    }

    fn check_grid(&self, other: &CdSpectrum) -> Result<()> {
        if self.wavelength_nm != other.wavelength_nm {
            bail!("the wavelength ranges and spacings of the two spectra must match")
        }
        Ok(())
    }

    fn combine<F: Fn(f64, f64) -> f64>(&mut self, other: &CdSpectrum, op: F) -> Result<()> {
        self.check_grid(other)?;

        for (a, b) in self.ellipticity_mdeg.iter_mut().zip(&other.ellipticity_mdeg) {
            *a = op(*a, *b);
        }

        self.mrwe = match (self.mrwe.take(), &other.mrwe) {
            (Some(mut mrwe), Some(other_mrwe)) => {
                for (a, b) in mrwe.iter_mut().zip(other_mrwe) {
                    *a = op(*a, *b);
                }
                Some(mrwe)
            }
            _ => None,
        };

        Ok(())
    }

    pub fn add(&mut self, other: &CdSpectrum) -> Result<()> {
        self.combine(other, |a, b| a + b)
    }

    /// Subtracts e.g. a buffer baseline.
    pub fn subtract(&mut self, other: &CdSpectrum) -> Result<()> {
        self.combine(other, |a, b| a - b)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["wavelength_nm", "ellipticity_mdeg", "detector_V", "mrwe_deg_cm2_dmol"])?;

        let fmt = |v: f64| if v.is_nan() { String::new() } else { v.to_string() };
        for idx in 0..self.len() {
            wtr.write_record([
                fmt(self.wavelength_nm[idx]),
                fmt(self.ellipticity_mdeg[idx]),
                fmt(self.detector_v[idx]),
                self.mrwe.as_ref().map(|m| fmt(m[idx])).unwrap_or_default(),
            ])?;
        }
        wtr.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JASCO: &str = "\
TITLE\tsample
XUNITS\tNANOMETERS
XYDATA
260\t-0.5\t250.1
259.5\t-0.7\t251.0
259\t-1.0\t252.3
191\t-20.0\t650.0
190\t-25.0\t800.0

##### Extended Information
[Comments]
";

    #[test]
    fn loads_grid_points() {
        let mut spectrum = CdSpectrum::new(190.0, 260.0, 1.0).unwrap();
        spectrum.load_jasco(JASCO.as_bytes()).unwrap();

        assert_eq!(spectrum.len(), 71);
        assert_eq!(spectrum.ellipticity_mdeg[70], -0.5);
        assert_eq!(spectrum.ellipticity_mdeg[69], -1.0);
        assert_eq!(spectrum.detector_v[0], 800.0);
        assert!(spectrum.ellipticity_mdeg[10].is_nan());
    }

    #[test]
    fn filters_high_voltage_and_scales() {
        let mut spectrum = CdSpectrum::default();
        spectrum.load_jasco(JASCO.as_bytes()).unwrap();
        spectrum.compute_mrwe(110.0, 0.1, 0.5).unwrap();

        let expected = -0.5 * MRWE_FACTOR * 110.0 / (0.5 * 0.1);
        assert!((spectrum.mrwe.as_ref().unwrap()[70] - expected).abs() < 1e-9);

        spectrum.filter_by_detector(0.0, 700.0);
        assert!(spectrum.ellipticity_mdeg[0].is_nan());
        assert!(spectrum.mrwe.as_ref().unwrap()[0].is_nan());
        assert_eq!(spectrum.ellipticity_mdeg[1], -20.0);
    }

    #[test]
    fn subtracts_baseline_on_same_grid() {
        let mut sample = CdSpectrum::default();
        sample.load_jasco(JASCO.as_bytes()).unwrap();
        let baseline = sample.clone();

        sample.subtract(&baseline).unwrap();
        assert_eq!(sample.ellipticity_mdeg[70], 0.0);

        let other_grid = CdSpectrum::new(200.0, 250.0, 1.0).unwrap();
        assert!(sample.add(&other_grid).is_err());
    }

    #[test]
    fn writes_nan_as_empty() {
        let mut spectrum = CdSpectrum::new(190.0, 191.0, 1.0).unwrap();
        spectrum.load_jasco("XYDATA\n190 -25 800\n".as_bytes()).unwrap();

        let mut out = Vec::new();
        spectrum.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "wavelength_nm,ellipticity_mdeg,detector_V,mrwe_deg_cm2_dmol\n190,-25,800,\n191,,,\n");
    }
}
