use anyhow::*;
use std::io::Read;

use crate::io::reader::TextReader;

#[derive(Clone, PartialEq, Debug)]
pub enum TraceValue {
    Number(f64),
    /// e.g. fraction labels such as `A1` or `Waste`
    Text(String),
}

impl TraceValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TraceValue::Number(v) => Some(*v),
            TraceValue::Text(_) => None,
        }
    }
}

impl std::fmt::Display for TraceValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceValue::Number(v) => write!(f, "{}", v),
            TraceValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Curve {
    pub name: String,
    pub volume_unit: String,
    pub value_unit: String,
    pub volume: Vec<TraceValue>,
    pub values: Vec<TraceValue>,
}

#[derive(Clone, Default, PartialEq, Debug)]
pub struct Chromatogram {
    pub curves: Vec<Curve>,
}

impl Chromatogram {
    /// First curve whose name contains `name_fragment`, e.g. `UV1_280nm`, `Cond%` or `Fractions`.
    pub fn trace(&self, name_fragment: &str) -> Option<&Curve> {
        self.curves.iter().find(|c| c.name.contains(name_fragment))
    }

    pub fn curve_names(&self) -> Vec<&str> {
        self.curves.iter().map(|c| c.name.as_str()).collect()
    }
}

fn parse_cell(cell: &str) -> TraceValue {
    match fast_float::parse::<f64, _>(cell) {
        std::result::Result::Ok(v) => TraceValue::Number(v),
        Err(_) => TraceValue::Text(cell.to_string()),
    }
}

/// Parses a UNICORN ASCII export: a title line, the curve names, the units, then one
/// `volume<TAB>value` column pair per curve.
pub fn parse_akta_asc<R: Read>(reader: R) -> Result<Chromatogram> {
    let mut lines = TextReader::new(reader);

    lines.next().transpose()?.ok_or_else(|| anyhow!("empty chromatogram export"))?;

    let names_line = lines.next().transpose()?.ok_or_else(|| anyhow!("missing curve names line"))?;
    let names: Vec<String> = names_line.trim().split('\t')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    if names.is_empty() { bail!("no curves found in chromatogram export") }

    let units_line = lines.next().transpose()?.unwrap_or_default();
    let units: Vec<&str> = units_line.split('\t').map(|s| s.trim()).collect();

    let mut curves: Vec<Curve> = names.into_iter().enumerate()
        .map(|(idx, name)| Curve {
            name,
            volume_unit: units.get(2 * idx).unwrap_or(&"").to_string(),
            value_unit: units.get(2 * idx + 1).unwrap_or(&"").to_string(),
            volume: Vec::new(),
            values: Vec::new(),
        })
        .collect();

    for line in lines {
        let line = line?;
        for (idx, cell) in line.split('\t').map(|c| c.trim()).enumerate() {
            if cell.is_empty() {
                continue;
            }
            let curve = match curves.get_mut(idx / 2) {
                Some(curve) => curve,
                None => bail!("data column {} has no matching curve", idx + 1),
            };
            if idx % 2 == 0 {
                curve.volume.push(parse_cell(cell));
            } else {
                curve.values.push(parse_cell(cell));
            }
        }
    }

    Ok(Chromatogram { curves })
}
