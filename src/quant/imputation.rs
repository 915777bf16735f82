use anyhow::*;
use rand::Rng;
use serde::Serialize;
use statrs::distribution::Normal;
use statrs::statistics::{Data, Distribution, OrderStatistics};

/// Location and spread of a log2 intensity column and of its low tail.
#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct ImputationInfo {
    pub mean_full: f64,
    pub std_full: f64,
    pub mean_subset: f64,
    pub std_subset: f64,
}

/// Replaces missing log2 values by draws from a normal distribution fitted to the
/// values at or below the `percentile` (0-100) of the observed ones.
///
/// When the low tail has no spread every missing value becomes its mean. A column
/// without any observed value is returned unchanged, together with `None`.
pub fn low_impute<R: Rng + ?Sized>(values: &[Option<f64>], percentile: f64, rng: &mut R) -> Result<(Vec<Option<f64>>, Option<ImputationInfo>)> {
    if !(0.0..=100.0).contains(&percentile) {
        bail!("percentile must lie between 0 and 100, got {}", percentile)
    }

    let observed: Vec<f64> = values.iter().flatten().copied().collect();
    if observed.is_empty() {
        return Ok((values.to_vec(), None));
    }

    let mut full = Data::new(observed.clone());
    let threshold = full.quantile(percentile / 100.0);
    let subset = Data::new(observed.iter().copied().filter(|v| *v <= threshold).collect::<Vec<f64>>());

    let info = ImputationInfo {
        mean_full: full.mean().unwrap_or(f64::NAN),
        std_full: full.std_dev().unwrap_or(0.0),
        mean_subset: subset.mean().unwrap_or(threshold),
        std_subset: subset.std_dev().filter(|s| s.is_finite()).unwrap_or(0.0),
    };

    let imputed = if info.std_subset > 0.0 {
        let normal = Normal::new(info.mean_subset, info.std_subset)?;
        values.iter().map(|v| Some(v.unwrap_or_else(|| rng.sample(normal)))).collect()
    } else {
        values.iter().map(|v| Some(v.unwrap_or(info.mean_subset))).collect()
    };

    Ok((imputed, Some(info)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fills_missing_from_low_tail() {
        let mut values: Vec<Option<f64>> = (0..100).map(|i| Some(20.0 + i as f64 * 0.1)).collect();
        values.push(None);
        values.push(None);

        let mut rng = StdRng::seed_from_u64(7);
        let (imputed, info) = low_impute(&values, 10.0, &mut rng).unwrap();
        let info = info.unwrap();

        assert!(imputed.iter().all(|v| v.is_some()));
        assert_eq!(&imputed[..100], &values[..100]);
        assert!(info.mean_subset < info.mean_full);
        assert!(info.std_subset > 0.0);
        // draws stay well below the bulk of the distribution
        assert!(imputed[100].unwrap() < info.mean_full);
    }

    #[test]
    fn constant_tail_uses_mean() {
        let values = vec![Some(10.0), Some(10.0), None];
        let mut rng = StdRng::seed_from_u64(1);
        let (imputed, _) = low_impute(&values, 1.0, &mut rng).unwrap();
        assert_eq!(imputed[2], Some(10.0));
    }

    #[test]
    fn all_missing_is_untouched() {
        let values = vec![None, None];
        let mut rng = StdRng::seed_from_u64(1);
        let (imputed, info) = low_impute(&values, 1.0, &mut rng).unwrap();
        assert_eq!(imputed, values);
        assert!(info.is_none());
        assert!(low_impute(&values, 101.0, &mut rng).is_err());
    }
}
