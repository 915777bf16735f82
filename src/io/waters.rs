use anyhow::*;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::io::reader::{Encoding, TextReader};

const EXTERN_INF: &str = "_extern.inf";
const HEADER_TXT: &str = "_HEADER.TXT";

lazy_static! {
    static ref HEADER_LINE_REGEX: Regex = Regex::new(r"^\$\$ ([^:]+):(.*)").unwrap();
}

/// MassLynx parameters reported first, in this order, when present.
const STANDARD_FIRST_COLUMNS: &[&str] = &[
    "Rawfile",
    "Acquired Name",
    "Start Mass",
    "End Mass",
    "Cal Date",
    "Cal Time",
    "Capillary",
    "Capillary (kV)",
    "Desolvation Gas Flow (L/Hr)",
    "Desolvation Temperature (°C)",
    "Wave Velocity (m/s)",
    "Sampling Cone",
    "Source Temperature (°C)",
    "Source Wave Height (V)",
    "Source Wave Velocity (m/s)",
    "Extraction Cone",
    "Backing",
    "Aperture2",
    "Collision Energy",
    "Transfer Collision Energy",
    "Trap Collision Energy",
    "Trap DC Bias",
    "Trap DC Entrance",
    "Trap DC Exit",
    "Trap Extract Height (V)",
    "Trap Gas Flow (mL/min)",
    "Trap Manual Control",
    "Trap Height (V)",
    "Trap Wave Height (V)",
    "Trap Wave Velocity (m/s)",
    "Transfer DC Entrance",
    "Transfer DC Exit",
    "Transfer Extract Height (V)",
    "Transfer Manual Control",
    "Transfer Trap Height (V)",
    "Transfer Wave Height (V)",
    "Transfer Wave Velocity (m/s)",
    "Variable Wave Height Enabled",
    "Variable Wave Velocity Enabled",
    "Cell pressure [e^-3 mbar]",
    "IMS",
    "IMS DC Entrance",
    "IMS DC Exit",
    "IMS Extract Height (V)",
    "IMS Gas Flow (mL/min)",
    "IMS Manual Control",
    "IMS Trap Height (V)",
    "IMS Wave Height (V)",
    "Detector",
];

/// Key/value parameters of one raw folder, in insertion order.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct MetadataRecord {
    pub entries: Vec<(String, String)>,
}

impl MetadataRecord {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Repeated keys are stored as `key_2`, `key_3`, ...
    pub fn insert(&mut self, key: &str, value: &str) {
        let mut unique_key = key.to_string();
        let mut n = 1;
        while self.get(&unique_key).is_some() {
            n += 1;
            unique_key = format!("{}_{}", key, n);
        }
        self.entries.push((unique_key, value.to_string()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn latin1_lines<R: Read>(reader: R) -> TextReader<R> {
    // MassLynx does not write UTF-8
    TextReader::new(reader).encoding(Encoding::Latin1)
}

/// Tab separated `_extern.inf` lines: first field is the key, last field the value.
pub fn parse_extern_inf<R: Read>(reader: R, record: &mut MetadataRecord) -> Result<()> {
    for line in latin1_lines(reader) {
        let line = line?;
        let line = line.trim();
        if !line.contains('\t') {
            continue;
        }

        let mut fields = line.split('\t');
        let key = fields.next().unwrap_or("").trim();
        let value = fields.last().unwrap_or("").trim();
        record.insert(key, value);
    }

    Ok(())
}

/// `$$ key: value` lines of `_HEADER.TXT`.
pub fn parse_header_txt<R: Read>(reader: R, record: &mut MetadataRecord) -> Result<()> {
    for line in latin1_lines(reader) {
        let line = line?;
        if let Some(caps) = HEADER_LINE_REGEX.captures(&line) {
            record.insert(caps[1].trim(), caps[2].trim());
        }
    }

    Ok(())
}

/// Directories named `*.raw` below `dir`, sorted by path.
pub fn find_raw_folders(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    fn visit(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
        for entry in std::fs::read_dir(dir).with_context(|| format!("cannot list '{}'", dir.display()))? {
            let entry = entry?;
            // symlinked directories are not followed
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let path = entry.path();
            if path.extension().map(|ext| ext == "raw").unwrap_or(false) {
                found.push(path.clone());
            }
            visit(&path, found)?;
        }
        Ok(())
    }

    let mut found = Vec::new();
    visit(dir.as_ref(), &mut found)?;
    found.sort();

    Ok(found)
}

/// Reads the parameter files of every raw folder found below `dir`.
pub fn collect_metadata(dir: impl AsRef<Path>) -> Result<Vec<MetadataRecord>> {
    let raw_folders = find_raw_folders(dir)?;
    debug!("found {} raw folders", raw_folders.len());

    let mut records = Vec::with_capacity(raw_folders.len());
    for raw_folder in raw_folders {
        let mut record = MetadataRecord::default();
        let name = raw_folder.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        record.insert("Rawfile", &name);

        let extern_path = raw_folder.join(EXTERN_INF);
        match std::fs::File::open(&extern_path) {
            std::result::Result::Ok(file) => parse_extern_inf(file, &mut record)?,
            Err(e) => warn!("could not read {} for {}: {}", EXTERN_INF, name, e),
        }

        let header_path = raw_folder.join(HEADER_TXT);
        match std::fs::File::open(&header_path) {
            std::result::Result::Ok(file) => parse_header_txt(file, &mut record)?,
            Err(e) => warn!("could not read {} for {}: {}", HEADER_TXT, name, e),
        }

        records.push(record);
    }

    Ok(records)
}

/// Union of the record keys: standard MassLynx columns first, then the others sorted.
/// Columns that are blank in every record are left out.
pub fn ordered_columns(records: &[MetadataRecord]) -> Vec<String> {
    let filled: BTreeSet<&str> = records.iter()
        .flat_map(|r| r.entries.iter())
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, _)| k.as_str())
        .collect();

    let mut columns: Vec<String> = STANDARD_FIRST_COLUMNS.iter()
        .filter(|c| filled.contains(*c))
        .map(|c| c.to_string())
        .collect();

    let standard: HashSet<&str> = STANDARD_FIRST_COLUMNS.iter().copied().collect();
    columns.extend(filled.iter().filter(|c| !standard.contains(*c)).map(|c| c.to_string()));

    columns
}

/// Drops the columns holding the same value in every record, `Rawfile` is always kept.
pub fn varying_columns(records: &[MetadataRecord], columns: &[String]) -> Vec<String> {
    columns.iter()
        .filter(|c| {
            if c.as_str() == "Rawfile" {
                return true;
            }
            let distinct: HashSet<&str> = records.iter().map(|r| r.get(c).unwrap_or("")).collect();
            distinct.len() > 1
        })
        .cloned()
        .collect()
}

pub fn write_metadata_csv<W: Write>(writer: W, records: &[MetadataRecord], columns: &[String]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(columns)?;

    for record in records {
        wtr.write_record(columns.iter().map(|c| record.get(c).unwrap_or("")))?;
    }
    wtr.flush()?;

    Ok(())
}
