use anyhow::*;
use itertools::Itertools;
use log::debug;
use serde::Serialize;
use std::collections::HashSet;
use std::io::Write;

use crate::ms::peaks::Peaks;
use crate::ms::utils::{ppm_error, PpmWindow};
use crate::msms::model::*;

// --- Matched pair of an experimental peak and a theoretical ion --- //
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct PeakAssignment {
    pub peak_mz: f64,
    pub peak_intensity: f64,
    pub theo_mz: f64,
    pub error_ppm: f64,
    pub descriptor: IonDescriptor,
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum PeakSelectionStrategy {
    NearestPeak,
    HighestPeak,
}

impl std::str::FromStr for PeakSelectionStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<PeakSelectionStrategy> {
        match s {
            "nearest" => Ok(PeakSelectionStrategy::NearestPeak),
            "highest" => Ok(PeakSelectionStrategy::HighestPeak),
            _ => bail!("unknown peak selection strategy '{}', expected nearest or highest", s),
        }
    }
}

/// Matches every peak against the theoretical ions falling inside the ppm window.
///
/// Peaks are visited by ascending m/z while a cursor moves along the sorted ions, so
/// each ion below the current window is skipped once. A peak may be matched by
/// several ions.
pub fn assign_peaks(peaks: &Peaks, ions: &[TheoreticalIon], window: &PpmWindow) -> Result<Vec<PeakAssignment>> {

    let mut sorted_ions: Vec<&TheoreticalIon> = ions.iter().collect();
    sorted_ions.sort_by(|a, b| a.mz.total_cmp(&b.mz));

    let mut sorted_peaks: Vec<(f64, f64)> = peaks.iter().collect();
    sorted_peaks.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut assignments = Vec::new();
    let mut cursor = 0;
    for (peak_mz, peak_intensity) in sorted_peaks {
        let lower_mz = window.lower_mz(peak_mz);
        let upper_mz = window.upper_mz(peak_mz);

        while cursor < sorted_ions.len() && sorted_ions[cursor].mz < lower_mz {
            cursor += 1;
        }

        for ion in sorted_ions[cursor..].iter().take_while(|ion| ion.mz <= upper_mz) {
            assignments.push(PeakAssignment {
                peak_mz,
                peak_intensity,
                theo_mz: ion.mz,
                error_ppm: ppm_error(peak_mz, ion.mz),
                descriptor: ion.descriptor.clone(),
            });
        }
    }

    if assignments.is_empty() {
        bail!("could not assign any peak with the given specifications")
    }
    debug!("assigned {} peak/ion pairs out of {} peaks and {} ions", assignments.len(), peaks.len(), ions.len());

    Ok(assignments)
}

/// Keeps a single peak per theoretical ion, chosen according to the selection strategy.
pub fn deduplicate(assignments: Vec<PeakAssignment>, peak_sel_strategy: PeakSelectionStrategy) -> Vec<PeakAssignment> {

    let mut assignments = assignments;
    assignments.sort_by(|a, b| {
        a.theo_mz.total_cmp(&b.theo_mz)
            .then_with(|| a.descriptor.sequence.cmp(&b.descriptor.sequence))
            .then_with(|| a.descriptor.label.cmp(&b.descriptor.label))
            .then_with(|| a.descriptor.charge.cmp(&b.descriptor.charge))
    });

    let mut non_redundant = Vec::with_capacity(assignments.len());

    let groups_iter = &assignments.into_iter().group_by(|a| {
        (a.theo_mz.to_bits(), a.descriptor.sequence.clone(), a.descriptor.label.clone(), a.descriptor.charge)
    });
    for (_, grouped_items_iter) in groups_iter {
        let best = match peak_sel_strategy {
            PeakSelectionStrategy::NearestPeak => grouped_items_iter.min_by(|x1, x2| {
                x1.error_ppm.abs().total_cmp(&x2.error_ppm.abs())
            }),
            PeakSelectionStrategy::HighestPeak => grouped_items_iter.max_by(|x1, x2| {
                x1.peak_intensity.total_cmp(&x2.peak_intensity)
            }),
        };

        if let Some(best) = best {
            non_redundant.push(best);
        }
    }

    non_redundant.sort_by(|a, b| a.peak_mz.total_cmp(&b.peak_mz));

    non_redundant
}

/// pLink annotation colours.
pub fn ion_color(descriptor: &IonDescriptor) -> &'static str {
    if descriptor.is_parent() {
        return "cyan";
    }

    match descriptor.label.as_str() {
        "A" => "yellow",
        "a" => "brown",
        "B" => "green",
        "b" => "orange",
        "Y" => "red",
        "y" => "purple",
        _ => "black",
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct AssignmentSummary {
    pub count: usize,
    pub mean_error_ppm: f64,
    pub std_error_ppm: f64,
    /// Fraction of the total spectrum intensity carried by assigned peaks
    pub explained_intensity: f64,
}

impl AssignmentSummary {
    pub fn new(assignments: &[PeakAssignment], peaks: &Peaks) -> AssignmentSummary {
        let count = assignments.len();
        if count == 0 {
            return AssignmentSummary { count, mean_error_ppm: 0.0, std_error_ppm: 0.0, explained_intensity: 0.0 };
        }

        let n = count as f64;
        let mean = assignments.iter().map(|a| a.error_ppm).sum::<f64>() / n;
        let variance = assignments.iter().map(|a| (a.error_ppm - mean).powi(2)).sum::<f64>() / n;

        // a peak explained by several ions is only counted once
        let mut seen_peaks = HashSet::new();
        let assigned_intensity: f64 = assignments.iter()
            .filter(|a| seen_peaks.insert(a.peak_mz.to_bits()))
            .map(|a| a.peak_intensity)
            .sum();

        let total_intensity = peaks.total_intensity();
        let explained_intensity = if total_intensity > 0.0 { assigned_intensity / total_intensity } else { 0.0 };

        AssignmentSummary {
            count,
            mean_error_ppm: mean,
            std_error_ppm: variance.sqrt(),
            explained_intensity,
        }
    }
}

fn descriptor_fields(descriptor: &IonDescriptor) -> [String; 6] {
    [
        descriptor.sequence.clone(),
        descriptor.label.clone(),
        descriptor.length.map(|l| l.to_string()).unwrap_or_default(),
        descriptor.charge.to_string(),
        descriptor.role.map(|r| r.to_string()).unwrap_or_default(),
        descriptor.mods.trim_end().to_string(),
    ]
}

fn tsv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer)
}

/// Writes the theoretical ions as a tab separated table.
pub fn write_ion_table<W: Write>(writer: W, ions: &[TheoreticalIon]) -> Result<()> {
    let mut wtr = tsv_writer(writer);
    wtr.write_record(["Mass", "Peptide", "IonType", "Length", "Charge", "PepType", "Mods"])?;

    for ion in ions {
        let mut record = vec![format!("{:.6}", ion.mz)];
        record.extend(descriptor_fields(&ion.descriptor));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;

    Ok(())
}

pub fn write_assignments<W: Write>(writer: W, assignments: &[PeakAssignment]) -> Result<()> {
    let mut wtr = tsv_writer(writer);
    wtr.write_record([
        "PeakMz", "Intensity", "TheoMz", "ErrorPpm", "Peptide", "IonType", "Length", "Charge", "PepType", "Mods", "Color",
    ])?;

    for a in assignments {
        let mut record = vec![
            format!("{:.6}", a.peak_mz),
            a.peak_intensity.to_string(),
            format!("{:.6}", a.theo_mz),
            format!("{:.3}", a.error_ppm),
        ];
        record.extend(descriptor_fields(&a.descriptor));
        record.push(ion_color(&a.descriptor).to_string());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ion(mz: f64, label: &str, length: Option<usize>) -> TheoreticalIon {
        TheoreticalIon {
            mz,
            descriptor: IonDescriptor {
                sequence: "PEP".to_string(),
                label: label.to_string(),
                length,
                charge: 1,
                role: length.map(|_| PeptideRole::Alpha),
                mods: String::new(),
            },
        }
    }

    #[test]
    fn window_accepts_9_8_ppm_and_rejects_12_ppm() {
        let ions = vec![ion(500.0, "B", Some(2))];
        let window = PpmWindow::new(-10.0, 10.0).unwrap();

        let peaks = Peaks::new(vec![500.0049], vec![100.0]).unwrap();
        let assigned = assign_peaks(&peaks, &ions, &window).unwrap();
        assert_eq!(assigned.len(), 1);
        assert!((assigned[0].error_ppm - 9.8).abs() < 0.01);

        let peaks = Peaks::new(vec![500.0060], vec![100.0]).unwrap();
        let err = assign_peaks(&peaks, &ions, &window).unwrap_err();
        assert_eq!(err.to_string(), "could not assign any peak with the given specifications");
    }

    #[test]
    fn several_ions_per_peak_and_unsorted_peaks() {
        let ions = vec![ion(300.0, "Y", Some(2)), ion(200.0, "B", Some(1)), ion(200.001, "A", Some(2))];
        let peaks = Peaks::new(vec![300.001, 200.0005, 250.0], vec![1.0, 2.0, 3.0]).unwrap();
        let window = PpmWindow::symmetric(10.0).unwrap();

        let assigned = assign_peaks(&peaks, &ions, &window).unwrap();
        let labels: Vec<&str> = assigned.iter().map(|a| a.descriptor.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "A", "Y"]);
    }

    #[test]
    fn deduplicates_by_strategy() {
        let ions = vec![ion(400.0, "B", Some(3))];
        let peaks = Peaks::new(vec![399.999, 400.003], vec![50.0, 80.0]).unwrap();
        let window = PpmWindow::symmetric(10.0).unwrap();
        let assigned = assign_peaks(&peaks, &ions, &window).unwrap();
        assert_eq!(assigned.len(), 2);

        let nearest = deduplicate(assigned.clone(), PeakSelectionStrategy::NearestPeak);
        assert_eq!(nearest.len(), 1);
        assert_eq!(nearest[0].peak_mz, 399.999);

        let highest = deduplicate(assigned, PeakSelectionStrategy::HighestPeak);
        assert_eq!(highest[0].peak_mz, 400.003);
    }

    #[test]
    fn summary_counts_shared_peaks_once() {
        let ions = vec![ion(200.0, "B", Some(1)), ion(200.0001, "A", Some(2))];
        let peaks = Peaks::new(vec![200.0, 500.0], vec![25.0, 75.0]).unwrap();
        let assigned = assign_peaks(&peaks, &ions, &PpmWindow::default()).unwrap();

        let summary = AssignmentSummary::new(&assigned, &peaks);
        assert_eq!(summary.count, 2);
        assert!((summary.explained_intensity - 0.25).abs() < 1e-12);
    }

    #[test]
    fn colours() {
        assert_eq!(ion_color(&ion(1.0, "y", Some(1)).descriptor), "purple");
        assert_eq!(ion_color(&ion(1.0, "M+2H", None).descriptor), "cyan");
    }

    #[test]
    fn writes_peptide_log_table() {
        let mut out = Vec::new();
        write_ion_table(&mut out, &[ion(175.118952, "Y", Some(1))]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Mass\tPeptide\tIonType\tLength\tCharge\tPepType\tMods"));
        assert_eq!(lines.next(), Some("175.118952\tPEP\tY\t1\t1\talpha\t"));
    }
}
