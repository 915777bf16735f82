
use std::collections::BTreeMap;

/// Counts the residues of a sequence, whitespace is ignored.
pub fn parse_aa_composition(sequence: &str) -> BTreeMap<char, usize> {
    let mut aa_count_by_char: BTreeMap<char, usize> = BTreeMap::new();

    for aa in sequence.chars().filter(|c| !c.is_whitespace()) {
        *aa_count_by_char.entry(aa).or_insert(0) += 1;
    }

    aa_count_by_char
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_residues() {
        let comp = parse_aa_composition("PEP TIDE\n");
        assert_eq!(comp[&'P'], 2);
        assert_eq!(comp[&'E'], 2);
        assert_eq!(comp.values().sum::<usize>(), 7);
        assert!(!comp.contains_key(&' '));
    }
}
