use anyhow::*;
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use crate::io::reader::TextReader;

const CHAIN_TAG: &str = "CHAIN:";

/// Chain identifiers listed in the `COMPND ... CHAIN: A, B;` records of a PDB file, sorted.
pub fn parse_pdb_chains<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut chains = BTreeSet::new();

    for line in TextReader::new(reader) {
        let line = line?;
        if !line.starts_with("COMPND") {
            continue;
        }
        let ids = match line.find(CHAIN_TAG) {
            Some(pos) => &line[pos + CHAIN_TAG.len()..],
            None => continue,
        };

        chains.extend(
            ids.trim().trim_end_matches(';').split(',')
                .map(|id| id.trim())
                .filter(|id| !id.is_empty())
                .map(|id| id.to_string())
        );
    }

    Ok(chains.into_iter().collect())
}

pub fn read_pdb_chains(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;

    parse_pdb_chains(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDB: &str = "\
HEADER    TRANSPORT PROTEIN                       01-JAN-00   1ABC
COMPND    MOL_ID: 1;
COMPND   2 MOLECULE: PROTEIN TRANSPORT PROTEIN SEC23;
COMPND   3 CHAIN: B, A;
COMPND   4 MOL_ID: 2;
COMPND   5 CHAIN: C, A ;
ATOM      1  N   MET A   1      11.104  13.207   2.100  1.00 20.00           N
REMARK  CHAIN: Z;
";

    #[test]
    fn collects_sorted_unique_chains() {
        assert_eq!(parse_pdb_chains(PDB.as_bytes()).unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn no_compound_records() {
        assert!(parse_pdb_chains("ATOM      1  N   MET A   1\n".as_bytes()).unwrap().is_empty());
    }
}
