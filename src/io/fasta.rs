
use anyhow::*;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

use crate::io::reader::TextReader;

/// Maximum number of identifiers the EBI dbfetch service accepts per request.
pub const DBFETCH_MAX_IDS: usize = 200;

const DBFETCH_URL: &str = "http://www.ebi.ac.uk/Tools/dbfetch/dbfetch?db=uniprotkb&id=";
const DBFETCH_URL_SUFFIX: &str = "&format=fasta&style=raw&Retrieve=Retrieve";

lazy_static! {
    // Swiss-Prot style accession at the start of a line, e.g. P12345
    static ref UNIPROT_ACCESSION_RE: Regex = Regex::new(r"^(P\d{5})").unwrap();
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FastaRecord {
    pub accession: String,
    /// Full defline without the leading '>'
    pub header: String,
    pub sequence: String,
}

impl FastaRecord {
    pub fn new(header: &str, sequence: &str) -> FastaRecord {
        FastaRecord {
            accession: accession_from_header(header),
            header: header.to_string(),
            sequence: sequence.to_string(),
        }
    }
}

/// `sp|P12345|NAME_HUMAN ...` gives `P12345`, headers without a '|' are used as a whole.
pub fn accession_from_header(header: &str) -> String {
    let header = header.trim();
    let header = header.strip_prefix('>').unwrap_or(header);

    if header.contains('|') {
        header.split('|').nth(1).unwrap_or("").to_string()
    } else {
        header.trim().to_string()
    }
}

pub fn for_each_fasta_entry<R, F>(reader: R, mut cb: F) -> Result<()> where R: Read, F: FnMut(&str, &str) -> () {

    let mut header = String::with_capacity(512);
    let mut seq: String = String::with_capacity(100 * 1024);
    let mut has_header = false;

    for line in TextReader::new(reader) {
        let line = line?;
        let l = line.trim();

        // When a new FASTA entry is met
        if l.starts_with('>') {
            if has_header {
                cb(header.as_str(), seq.as_str());
            }

            header.clear();
            header.push_str(&l[1..]);
            seq.clear();
            has_header = true;
        } else if has_header {
            seq.push_str(l);
        } else if !l.is_empty() {
            warn!("ignoring sequence line before the first fasta header: '{}'", l);
        }
    }

    // Emit last entry
    if has_header {
        cb(header.as_str(), seq.as_str());
    }

    Ok(())
}

pub fn parse_fasta<R: Read>(reader: R) -> Result<Vec<FastaRecord>> {
    let mut records = Vec::new();
    for_each_fasta_entry(reader, |header, seq| records.push(FastaRecord::new(header, seq)))?;

    Ok(records)
}

pub fn read_fasta(path: impl AsRef<Path>) -> Result<Vec<FastaRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;
    let records = parse_fasta(file)?;
    debug!("read {} fasta entries from '{}'", records.len(), path.display());

    Ok(records)
}

/// Writes the records in fasta format, wrapping sequences every `line_width` residues (0 disables wrapping).
pub fn write_fasta<W: Write>(mut writer: W, records: &[FastaRecord], line_width: usize) -> Result<()> {
    for record in records {
        writeln!(writer, ">{}", record.header)?;

        if line_width == 0 || record.sequence.len() <= line_width {
            writeln!(writer, "{}", record.sequence)?;
        } else {
            let residues: Vec<char> = record.sequence.chars().collect();
            for chunk in residues.chunks(line_width) {
                writeln!(writer, "{}", chunk.iter().collect::<String>())?;
            }
        }
    }
    writer.flush()?;

    Ok(())
}

/// Splits a MaxQuant "Majority protein IDs" cell, optionally keeping only the leading ID.
pub fn split_protein_ids(cell: &str, first_only: bool) -> Vec<String> {
    let ids = cell.split(';').map(str::trim).filter(|id| !id.is_empty());
    if first_only {
        ids.take(1).map(String::from).collect()
    } else {
        ids.map(String::from).collect()
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct FastaSelection {
    pub records: Vec<FastaRecord>,
    pub missing: Vec<String>,
}

/// Fasta subset following the order of the requested accessions.
pub fn select_by_accessions(records: &[FastaRecord], accessions: &[String]) -> FastaSelection {
    let mut selection = FastaSelection::default();

    for accession in accessions {
        let matching: Vec<&FastaRecord> = records.iter().filter(|r| &r.accession == accession).collect();
        if matching.is_empty() {
            warn!("could not find {} in the fasta database", accession);
            selection.missing.push(accession.clone());
        } else {
            debug!("found {} ({} entries)", accession, matching.len());
            selection.records.extend(matching.into_iter().cloned());
        }
    }

    selection
}

/// Collects UniProt accessions found at the beginning of lines, first occurrence wins.
pub fn extract_uniprot_accessions(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    text.lines()
        .filter_map(|line| UNIPROT_ACCESSION_RE.captures(line.trim_start()))
        .map(|caps| caps[1].to_string())
        .filter(|acc| seen.insert(acc.clone()))
        .collect()
}

/// Renders one EBI dbfetch URL per batch of at most `batch_size` accessions.
pub fn dbfetch_batches(accessions: &[String], batch_size: usize) -> Result<Vec<String>> {
    if batch_size == 0 || batch_size > DBFETCH_MAX_IDS {
        bail!("batch size must be between 1 and {}", DBFETCH_MAX_IDS)
    }

    let urls = accessions.chunks(batch_size)
        .map(|batch| format!("{}{}{}", DBFETCH_URL, batch.join("+"), DBFETCH_URL_SUFFIX))
        .collect();

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FASTA: &str = ">sp|P02769|ALBU_BOVIN Serum albumin\nMKWVTFISLL\nLLFSSAYS\n\n>my protein\nPEPTIDE\n";

    #[test]
    fn parses_multi_record_fasta() {
        let records = parse_fasta(FASTA.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].accession, "P02769");
        assert_eq!(records[0].sequence, "MKWVTFISLLLLFSSAYS");
        assert_eq!(records[1].accession, "my protein");
        assert_eq!(records[1].sequence, "PEPTIDE");
    }

    #[test]
    fn round_trips_through_writer() {
        let records = vec![
            FastaRecord::new("alpha", "ACDEFGHIKLMNPQRSTVWY"),
            FastaRecord::new("beta", "GGG"),
            FastaRecord::new("beta", "KKK"),
        ];

        let mut out = Vec::new();
        write_fasta(&mut out, &records, 7).unwrap();
        let parsed = parse_fasta(out.as_slice()).unwrap();

        assert_eq!(parsed, records);
    }

    #[test]
    fn empty_sequence_is_kept() {
        let records = parse_fasta(">a\n>b\nAAA\n".as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sequence, "");
    }

    #[test]
    fn selects_in_requested_order() {
        let records = parse_fasta(FASTA.as_bytes()).unwrap();
        let wanted = vec!["my protein".to_string(), "Q99999".to_string(), "P02769".to_string()];
        let selection = select_by_accessions(&records, &wanted);

        assert_eq!(selection.records.len(), 2);
        assert_eq!(selection.records[0].accession, "my protein");
        assert_eq!(selection.missing, vec!["Q99999".to_string()]);
    }

    #[test]
    fn splits_majority_protein_ids() {
        assert_eq!(split_protein_ids("P1;P2;;P3", false), vec!["P1", "P2", "P3"]);
        assert_eq!(split_protein_ids("P1;P2", true), vec!["P1"]);
    }

    #[test]
    fn extracts_and_batches_accessions() {
        let accs = extract_uniprot_accessions("P12345 partner\nP12345 again\nQ11111\n  P54321\n");
        assert_eq!(accs, vec!["P12345", "P54321"]);

        let urls = dbfetch_batches(&accs, 1).unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].contains("id=P12345&format=fasta"));
        assert!(dbfetch_batches(&accs, 201).is_err());
    }
}
