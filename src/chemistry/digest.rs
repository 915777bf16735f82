use anyhow::*;
use lazy_static::lazy_static;
use log::debug;
use std::collections::BTreeMap;

/// Residues accepted at one position of a cleavage motif.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum SiteResidue {
    Any,
    OneOf(&'static str),
    NoneOf(&'static str),
}

impl SiteResidue {
    fn matches(&self, residue: u8) -> bool {
        match self {
            SiteResidue::Any => true,
            SiteResidue::OneOf(set) => set.as_bytes().contains(&residue),
            SiteResidue::NoneOf(set) => !set.as_bytes().contains(&residue),
        }
    }
}

use SiteResidue::{Any, NoneOf, OneOf};

/// Cut between the `before` residues and the `after` residues.
#[derive(Clone, PartialEq, Debug)]
pub struct CleavageRule {
    pub before: Vec<SiteResidue>,
    pub after: Vec<SiteResidue>,
}

impl CleavageRule {
    fn new(before: &[SiteResidue], after: &[SiteResidue]) -> CleavageRule {
        CleavageRule { before: before.to_vec(), after: after.to_vec() }
    }

    /// True when the residues around `seq[..site] | seq[site..]` fit the motif.
    fn matches_at(&self, seq: &[u8], site: usize) -> bool {
        if site < self.before.len() || site + self.after.len() > seq.len() {
            return false;
        }

        seq[site - self.before.len()..site + self.after.len()].iter()
            .zip(self.before.iter().chain(self.after.iter()))
            .all(|(residue, pattern)| pattern.matches(*residue))
    }
}

/// An enzyme or chemical cleaving wherever any of its rules matches.
#[derive(Clone, PartialEq, Debug)]
pub struct Protease {
    pub name: &'static str,
    pub rules: Vec<CleavageRule>,
}

impl Protease {
    /// Cut positions strictly inside `seq`, as residue counts from the N-terminus.
    pub fn cleavage_sites(&self, seq: &str) -> Result<Vec<usize>> {
        if let Some(aa) = seq.chars().find(|aa| !aa.is_ascii()) {
            bail!("amino acid '{}' is not a one-letter code", aa)
        }

        let residues = seq.as_bytes();
        let sites = (1..residues.len())
            .filter(|site| self.rules.iter().any(|rule| rule.matches_at(residues, *site)))
            .collect();

        Ok(sites)
    }
}

const CASPASE_P1_PRIME: SiteResidue = NoneOf("PEDQKR");

macro_rules! protease {
    ($name:expr, [$(($before:expr, $after:expr)),+ $(,)?]) => {
        ($name, Protease {
            name: $name,
            rules: vec![$(CleavageRule::new(&$before, &$after)),+],
        })
    };
}

lazy_static! {
    /// Expasy PeptideCutter rules, keyed by lower-case name.
    pub static ref PROTEASES: BTreeMap<&'static str, Protease> = [
        protease!("arg-c", [([OneOf("R")], [])]),
        protease!("asp-n", [([Any], [OneOf("D")])]),
        protease!("bnps-skatole", [([OneOf("W")], [])]),
        protease!("caspase 1", [([OneOf("FWYL"), Any, OneOf("HAT"), OneOf("D")], [CASPASE_P1_PRIME])]),
        protease!("caspase 2", [([OneOf("D"), OneOf("V"), OneOf("A"), OneOf("D")], [CASPASE_P1_PRIME])]),
        protease!("caspase 3", [([OneOf("D"), OneOf("M"), OneOf("Q"), OneOf("D")], [CASPASE_P1_PRIME])]),
        protease!("caspase 4", [([OneOf("L"), OneOf("E"), OneOf("V"), OneOf("D")], [CASPASE_P1_PRIME])]),
        protease!("caspase 5", [([OneOf("LW"), OneOf("E"), OneOf("H"), OneOf("D")], [])]),
        protease!("caspase 6", [([OneOf("V"), OneOf("E"), OneOf("HI"), OneOf("D")], [CASPASE_P1_PRIME])]),
        protease!("caspase 7", [([OneOf("D"), OneOf("E"), OneOf("V"), OneOf("D")], [CASPASE_P1_PRIME])]),
        protease!("caspase 8", [([OneOf("IL"), OneOf("E"), OneOf("T"), OneOf("D")], [CASPASE_P1_PRIME])]),
        protease!("caspase 9", [([OneOf("L"), OneOf("E"), OneOf("H"), OneOf("D")], [])]),
        protease!("caspase 10", [([OneOf("I"), OneOf("E"), OneOf("A"), OneOf("D")], [])]),
        protease!("chymotrypsin high specificity", [
            ([OneOf("FY")], [NoneOf("P")]),
            ([OneOf("W")], [NoneOf("MP")]),
        ]),
        protease!("chymotrypsin low specificity", [
            ([OneOf("FLY")], [NoneOf("P")]),
            ([OneOf("W")], [NoneOf("MP")]),
            ([OneOf("M")], [NoneOf("PY")]),
            ([OneOf("H")], [NoneOf("DMPW")]),
        ]),
        protease!("clostripain", [([OneOf("R")], [])]),
        protease!("cnbr", [([OneOf("M")], [])]),
        protease!("enterokinase", [([OneOf("DE"), OneOf("DE"), OneOf("DE"), OneOf("K")], [])]),
        protease!("factor xa", [([OneOf("AFGILTVM"), OneOf("DE"), OneOf("G"), OneOf("R")], [])]),
        protease!("formic acid", [([OneOf("D")], [])]),
        protease!("glutamyl endopeptidase", [([OneOf("E")], [])]),
        protease!("granzyme b", [([OneOf("I"), OneOf("E"), OneOf("P"), OneOf("D")], [])]),
        protease!("hydroxylamine", [([OneOf("N")], [OneOf("G")])]),
        protease!("iodosobenzoic acid", [([OneOf("W")], [])]),
        protease!("lysc", [([OneOf("K")], [])]),
        protease!("ntcb", [([Any], [OneOf("C")])]),
        protease!("pepsin ph1.3", [
            ([NoneOf("HKR"), NoneOf("P"), NoneOf("R")], [OneOf("FLWY"), NoneOf("P")]),
            ([NoneOf("HKR"), NoneOf("P"), OneOf("FLWY")], [Any, NoneOf("P")]),
        ]),
        protease!("pepsin ph2.0", [
            ([NoneOf("HKR"), NoneOf("P"), NoneOf("R")], [OneOf("FL"), NoneOf("P")]),
            ([NoneOf("HKR"), NoneOf("P"), OneOf("FL")], [Any, NoneOf("P")]),
        ]),
        protease!("proline endopeptidase", [([OneOf("HKR"), OneOf("P")], [NoneOf("P")])]),
        protease!("proteinase k", [([OneOf("AEFILTVWY")], [])]),
        protease!("staphylococcal peptidase i", [([NoneOf("E"), OneOf("E")], [])]),
        protease!("thermolysin", [([NoneOf("DE")], [OneOf("AFILMV")])]),
        protease!("thrombin", [
            ([OneOf("G"), OneOf("R")], [OneOf("G")]),
            ([OneOf("AFGILTVM"), OneOf("AFGILTVWA"), OneOf("P"), OneOf("R")], [NoneOf("DE"), NoneOf("DE")]),
        ]),
        protease!("trypsin", [
            ([OneOf("KR")], [NoneOf("P")]),
            ([OneOf("W"), OneOf("K")], [OneOf("P")]),
            ([OneOf("M"), OneOf("R")], [OneOf("P")]),
        ]),
    ].into_iter().collect();
}

/// Looks up a protease by name, case-insensitive (`lys-c` is accepted for `lysc`).
pub fn find_protease(name: &str) -> Result<&'static Protease> {
    let key = name.trim().to_lowercase();
    let key = if key == "lys-c" { "lysc".to_string() } else { key };

    PROTEASES.get(key.as_str()).ok_or_else(|| anyhow!(
        "unknown protease '{}', use one of: {}",
        name,
        PROTEASES.keys().copied().collect::<Vec<_>>().join(", ")
    ))
}

/// One product of an in-silico digest; `start` and `end` are 1-based and inclusive.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DigestPeptide {
    pub sequence: String,
    pub start: usize,
    pub end: usize,
    pub missed_cleavages: usize,
}

/// Cuts `seq` at every cleavage site of `protease`, the cleaved residue staying on the
/// N-terminal product, and adds the products spanning up to `max_missed_cleavages` sites.
pub fn digest(seq: &str, protease: &Protease, max_missed_cleavages: usize) -> Result<Vec<DigestPeptide>> {
    if seq.is_empty() {
        return Ok(Vec::new());
    }

    let mut sites = vec![0];
    sites.extend(protease.cleavage_sites(seq)?);
    sites.push(seq.len());
    debug!("{} cleavage sites for {}", sites.len() - 2, protease.name);

    let mut peptides = Vec::new();
    for (idx, start) in sites.iter().enumerate() {
        for (missed, end) in sites.iter().skip(idx + 1).take(max_missed_cleavages + 1).enumerate() {
            peptides.push(DigestPeptide {
                sequence: seq[*start..*end].to_string(),
                start: start + 1,
                end: *end,
                missed_cleavages: missed,
            });
        }
    }

    Ok(peptides)
}
