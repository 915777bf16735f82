
use anyhow::*;
use std::io::{Read, Write};
use std::path::Path;

use crate::io::reader::TextReader;
use crate::ms::peaks::Peaks;

/// Reads a two-column `mz intensity` text export (tab, comma or space separated).
/// Lines that do not start with two numbers, e.g. column headers, are skipped.
pub fn parse_xy_peaks<R: Read>(reader: R) -> Result<Peaks> {
    let mut peaks = Peaks::with_capacity(4096);

    for line in TextReader::new(reader) {
        let line = line?;
        let mut fields = line
            .split(|c: char| c == '\t' || c == ',' || c == ';' || c.is_whitespace())
            .filter(|f| !f.is_empty());

        let (x, y) = match (fields.next(), fields.next()) {
            (Some(x), Some(y)) => (x, y),
            _ => continue,
        };

        match (fast_float::parse::<f64, _>(x), fast_float::parse::<f64, _>(y)) {
            (std::result::Result::Ok(mz), std::result::Result::Ok(intensity)) => peaks.push(mz, intensity),
            _ => continue,
        }
    }

    Ok(peaks)
}

pub fn read_xy_peaks(path: impl AsRef<Path>) -> Result<Peaks> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;
    let peaks = parse_xy_peaks(file)?;
    if peaks.is_empty() {
        bail!("no peaks found in '{}'", path.display())
    }

    Ok(peaks)
}

/// Space separated `mz intensity` lines with nine decimals, as read by UniDec.
pub fn write_unidec_peaks<W: Write>(mut writer: W, peaks: &Peaks) -> Result<()> {
    for (mz, intensity) in peaks.iter() {
        writeln!(writer, "{:.9} {:.9}", mz, intensity)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_headers_and_mixed_separators() {
        let text = "m/z\tIntensity\n1000.5\t12\n1001.0, 30.5\n1001.5 7e2\n\n";
        let peaks = parse_xy_peaks(text.as_bytes()).unwrap();
        assert_eq!(peaks.mz_list, vec![1000.5, 1001.0, 1001.5]);
        assert_eq!(peaks.intensity_list, vec![12.0, 30.5, 700.0]);
    }

    #[test]
    fn writes_unidec_text() {
        let peaks = Peaks::new(vec![1000.0, 1000.5], vec![3.0, 0.25]).unwrap();
        let mut out = Vec::new();
        write_unidec_peaks(&mut out, &peaks).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "1000.000000000 3.000000000\n1000.500000000 0.250000000\n");
        assert_eq!(parse_xy_peaks(text.as_bytes()).unwrap(), peaks);
    }
}
