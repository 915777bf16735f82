
use anyhow::*;
use itertools::Itertools;
use serde::Serialize;

#[derive(Clone, PartialEq, Debug)]
pub struct Subunit {
    pub name: String,
    pub mass: f64,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct ComplexComposition {
    /// Copy number of each subunit, in the order the subunits were given
    pub counts: Vec<usize>,
    pub mass: f64,
}

impl ComplexComposition {
    /// `SubA_2 SubB_0 ...` style label
    pub fn label(&self, subunits: &[Subunit]) -> String {
        subunits.iter()
            .zip(&self.counts)
            .map(|(subunit, count)| format!("{}_{}", subunit.name, count))
            .join(" ")
    }
}

/// Enumerates every stoichiometry of up to `max_subunits` copies whose mass stays below `max_mass`.
pub fn enumerate_complexes(subunits: &[Subunit], max_subunits: usize, max_mass: f64) -> Result<Vec<ComplexComposition>> {
    if subunits.is_empty() { bail!("no subunits given") }
    if let Some(s) = subunits.iter().find(|s| !(s.mass > 0.0)) {
        bail!("mass of subunit {} must be a strictly positive number", s.name)
    }
    if subunits.iter().map(|s| &s.name).duplicates().next().is_some() {
        bail!("subunit names must be unique")
    }

    let mut complexes = Vec::new();

    for n_copies in 1..=max_subunits {
        for combination in (0..subunits.len()).combinations_with_replacement(n_copies) {
            let mass: f64 = combination.iter().map(|&idx| subunits[idx].mass).sum();
            if mass >= max_mass {
                continue;
            }

            let mut counts = vec![0; subunits.len()];
            for idx in combination {
                counts[idx] += 1;
            }
            complexes.push(ComplexComposition { counts, mass });
        }
    }

    Ok(complexes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subunits() -> Vec<Subunit> {
        vec![
            Subunit { name: "SubA".to_string(), mass: 2.0 },
            Subunit { name: "SubB".to_string(), mass: 3.0 },
        ]
    }

    #[test]
    fn enumerates_each_stoichiometry_once() {
        let complexes = enumerate_complexes(&subunits(), 3, 7.0).unwrap();
        let masses: Vec<f64> = complexes.iter().map(|c| c.mass).collect();
        // A, B, AA, AB, BB, AAA; AAB reaches the limit
        assert_eq!(masses, vec![2.0, 3.0, 4.0, 5.0, 6.0, 6.0]);
        assert_eq!(complexes[4].counts, vec![0, 2]);
        assert_eq!(complexes[5].label(&subunits()), "SubA_3 SubB_0");
    }

    #[test]
    fn rejects_bad_subunits() {
        let mut bad = subunits();
        bad[1].name = "SubA".to_string();
        assert!(enumerate_complexes(&bad, 2, 10.0).is_err());
        assert!(enumerate_complexes(&[], 2, 10.0).is_err());
    }
}
