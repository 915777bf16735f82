use anyhow::*;
use log::debug;
use serde::{Serialize, Deserialize};
use std::io::Read;
use std::path::Path;

use crate::io::reader::TextReader;
use crate::ms::peaks::Peaks;

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct MgfSpectrum {
    pub header: MgfSpectrumHeader,
    pub peaks: Peaks,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct MgfSpectrumHeader {
    pub title: String,
    pub precursor_mz: f64,
    pub precursor_charge: Option<i8>,
    pub retention_time: Option<f32>,
}

/// Parses a `CHARGE` value such as `2+`, `3-` or `2`.
fn parse_charge(value: &str) -> Option<i8> {
    // multiple charges (e.g. "2+ and 3+") are ambiguous, only the first one is kept
    let value = value.split_ascii_whitespace().next()?;
    let sign_idx = value.chars().position(|c| !c.is_ascii_digit()).unwrap_or(value.len());
    let abs_charge = value[0..sign_idx].parse::<i8>().ok()?;

    match &value[sign_idx..] {
        "" | "+" => Some(abs_charge),
        "-" => Some(-abs_charge),
        _ => None,
    }
}

pub fn for_each_spectrum<R, F>(reader: R, mut cb: F) -> Result<()> where R: Read, F: FnMut(MgfSpectrum) -> Result<bool> {

    let text_reader = TextReader::with_capacity(reader, 10 * 1024 * 1024); // buffer capacity = 10MB

    let mut peaks_buffer = Peaks::with_capacity(10000);

    let mut title: String = "".to_string();
    let mut pep_mass: f64 = 0.0;
    let mut charge: Option<i8> = None;
    let mut rt: Option<f32> = None;

    let mut is_inside_spectrum_block = false;
    for line_res in text_reader {

        let line_string = line_res?;
        let line = line_string.trim();

        let first_char = match line.chars().next() {
            Some(c) => c,
            None => continue,
        };

        if first_char == 'B' && line.starts_with("BEGIN IONS") {
            title.clear();
            pep_mass = 0.0;
            charge = None;
            rt = None;
            peaks_buffer.clear();

            is_inside_spectrum_block = true;
        } else if first_char == 'E' && line.starts_with("END IONS") {

            let keep_going = cb(MgfSpectrum {
                header: MgfSpectrumHeader {
                    title: title.trim_end().to_owned(),
                    precursor_mz: pep_mass,
                    precursor_charge: charge,
                    retention_time: rt
                },
                peaks: peaks_buffer.clone(),
            })?;

            peaks_buffer.clear();
            is_inside_spectrum_block = false;

            if !keep_going {
                break;
            }
        } else if is_inside_spectrum_block {

            // if peak line
            if first_char.is_ascii_digit() {
                let mut parts = line.split_ascii_whitespace();

                let (mz_str, intensity_str) = match (parts.next(), parts.next()) {
                    (Some(mz_str), Some(intensity_str)) => (mz_str, intensity_str),
                    _ => bail!("invalid number of columns for a peak line: '{}'", line),
                };

                let mz: f64 = fast_float::parse(mz_str)?;
                let intensity: f64 = fast_float::parse(intensity_str)?;

                peaks_buffer.push(mz, intensity);
            } else { // header line assumed

                match line.split_once('=') {
                    Some(("TITLE", value)) => {
                        title = value.to_string();
                    }
                    Some(("PEPMASS", value)) => {
                        let pep_mass_str_opt = value.split_ascii_whitespace().next();
                        pep_mass = pep_mass_str_opt.unwrap_or("0.0").parse()?;
                    }
                    Some(("CHARGE", value)) => {
                        charge = parse_charge(value);
                    }
                    Some(("RTINSECONDS", value)) => {
                        rt = value.parse::<f32>().ok();
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

/// Reads every spectrum of an MGF stream.
pub fn parse_mgf<R: Read>(reader: R) -> Result<Vec<MgfSpectrum>> {
    let mut spectra = Vec::new();
    for_each_spectrum(reader, |spectrum| {
        spectra.push(spectrum);
        Ok(true)
    })?;

    Ok(spectra)
}

/// Returns the `number`-th spectrum (1-based) of an MGF file.
pub fn read_mgf_spectrum(path: impl AsRef<Path>, number: usize) -> Result<MgfSpectrum> {
    let path = path.as_ref();
    if number == 0 { bail!("spectrum numbers start at 1") }

    let file = std::fs::File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;

    let mut count = 0;
    let mut found = None;
    for_each_spectrum(file, |spectrum| {
        count += 1;
        if count == number {
            found = Some(spectrum);
            return Ok(false);
        }
        Ok(true)
    })?;

    let spectrum = found.ok_or_else(|| anyhow!("'{}' contains only {} spectra, cannot read spectrum {}", path.display(), count, number))?;
    debug!("read spectrum {} '{}' with {} peaks", number, spectrum.header.title, spectrum.peaks.len());

    Ok(spectrum)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MGF: &str = "\
BEGIN IONS
TITLE=scan=1
PEPMASS=500.25 1200.0
CHARGE=2+
RTINSECONDS=61.5
100.5 10
200.25 20.5
END IONS

BEGIN IONS
TITLE=scan=2
PEPMASS=650.1
CHARGE=3-
300.0 5
END IONS
";

    #[test]
    fn parses_blocks() {
        let spectra = parse_mgf(MGF.as_bytes()).unwrap();
        assert_eq!(spectra.len(), 2);

        let first = &spectra[0];
        assert_eq!(first.header.title, "scan=1");
        assert_eq!(first.header.precursor_mz, 500.25);
        assert_eq!(first.header.precursor_charge, Some(2));
        assert_eq!(first.header.retention_time, Some(61.5));
        assert_eq!(first.peaks.mz_list, vec![100.5, 200.25]);
        assert_eq!(first.peaks.intensity_list, vec![10.0, 20.5]);

        assert_eq!(spectra[1].header.precursor_charge, Some(-3));
        assert_eq!(spectra[1].peaks.len(), 1);
    }

    #[test]
    fn parses_charges() {
        assert_eq!(parse_charge("2+"), Some(2));
        assert_eq!(parse_charge("4"), Some(4));
        assert_eq!(parse_charge("1-"), Some(-1));
        assert_eq!(parse_charge("2+ and 3+"), Some(2));
        assert_eq!(parse_charge("x"), None);
    }

    #[test]
    fn rejects_truncated_peak_line() {
        assert!(parse_mgf("BEGIN IONS\n100.0\nEND IONS\n".as_bytes()).is_err());
    }
}
