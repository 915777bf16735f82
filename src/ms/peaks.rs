
use anyhow::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Centroided peak list stored as parallel m/z and intensity columns.
#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct Peaks {
    pub mz_list: Vec<f64>,
    pub intensity_list: Vec<f64>,
}

impl Peaks {
    pub fn new(mz_list: Vec<f64>, intensity_list: Vec<f64>) -> Result<Peaks> {
        if mz_list.len() != intensity_list.len() {
            bail!("m/z ({}) and intensity ({}) lists must have the same length", mz_list.len(), intensity_list.len())
        }

        Ok(Peaks { mz_list, intensity_list })
    }

    pub fn with_capacity(capacity: usize) -> Peaks {
        Peaks {
            mz_list: Vec::with_capacity(capacity),
            intensity_list: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, mz: f64, intensity: f64) {
        self.mz_list.push(mz);
        self.intensity_list.push(intensity);
    }

    pub fn len(&self) -> usize {
        self.mz_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz_list.is_empty()
    }

    pub fn clear(&mut self) {
        self.mz_list.clear();
        self.intensity_list.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.mz_list.iter().copied().zip(self.intensity_list.iter().copied())
    }

    pub fn total_intensity(&self) -> f64 {
        self.intensity_list.iter().sum()
    }

    /// Scales intensities so that the base peak is 1.0.
    pub fn normalised(&self) -> Peaks {
        let max = self.intensity_list.iter().copied().fold(0.0_f64, f64::max);
        if max <= 0.0 {
            return self.clone();
        }

        Peaks {
            mz_list: self.mz_list.clone(),
            intensity_list: self.intensity_list.iter().map(|i| i / max).collect(),
        }
    }

    /// Keeps the peaks with `start <= mz <= end`.
    pub fn mz_range(&self, start: f64, end: f64) -> Peaks {
        let mut peaks = Peaks::with_capacity(self.len());
        for (mz, intensity) in self.iter().filter(|(mz, _)| *mz >= start && *mz <= end) {
            peaks.push(mz, intensity);
        }

        peaks
    }

    /// Sums intensities into m/z bins of width `resolution`; each bin is reported at its
    /// lower edge, in ascending order.
    pub fn digitize(&self, resolution: f64) -> Result<Peaks> {
        if !(resolution > 0.0) { bail!("bin width must be positive, got {}", resolution) }

        let mut bins: BTreeMap<i64, f64> = BTreeMap::new();
        for (mz, intensity) in self.iter() {
            *bins.entry((mz / resolution).floor() as i64).or_insert(0.0) += intensity;
        }

        let mut peaks = Peaks::with_capacity(bins.len());
        for (bin, intensity) in bins {
            peaks.push(bin as f64 * resolution, intensity);
        }

        Ok(peaks)
    }
}
