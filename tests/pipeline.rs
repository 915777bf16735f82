use ms_toolbox::io::mgf::parse_mgf;
use ms_toolbox::msms::annotator::*;
use ms_toolbox::msms::fragmentation::{ions_from_sequence, ions_from_xlink_sequence, IonGenerationParams, XlinkedPeptides};
use ms_toolbox::msms::model::{IonType, Modification};
use ms_toolbox::{MassType, Peaks, PpmWindow, STANDARD_AMINO_ACID_TABLE};

/// Shifts an m/z value by `ppm` relative to the resulting experimental value.
fn shifted(theo_mz: f64, ppm: f64) -> f64 {
    theo_mz / (1.0 - ppm / 1e6)
}

#[test]
fn annotates_simulated_spectrum() {
    let params = IonGenerationParams { min_charge: 1, max_charge: 2, ..Default::default() };
    let mods = [Modification::new(15.994915, 5)];
    let ions = ions_from_sequence("LVNEMTEFAK", &mods, &params, &STANDARD_AMINO_ACID_TABLE).unwrap();
    assert_eq!(ions.len(), 9 * 2 * 3 + 2);

    // every third y ion, measured 3 ppm off, plus noise peaks
    let mut peaks = Peaks::default();
    let picked: Vec<f64> = ions.iter()
        .filter(|ion| ion.descriptor.label == "Y" && ion.descriptor.charge == 1)
        .step_by(3)
        .map(|ion| ion.mz)
        .collect();
    for mz in &picked {
        peaks.push(shifted(*mz, 3.0), 1000.0);
    }
    peaks.push(150.123, 10.0);
    peaks.push(2500.0, 10.0);

    let window = PpmWindow::new(-10.0, 10.0).unwrap();
    let assignments = deduplicate(assign_peaks(&peaks, &ions, &window).unwrap(), PeakSelectionStrategy::NearestPeak);

    assert!(assignments.len() >= picked.len());
    assert!(assignments.iter()
        .filter(|a| a.descriptor.label == "Y" && a.descriptor.charge == 1)
        .all(|a| (a.error_ppm - 3.0).abs() < 1e-6));

    let summary = AssignmentSummary::new(&assignments, &peaks);
    assert!(summary.explained_intensity > 0.99);

    let mut out = Vec::new();
    write_assignments(&mut out, &assignments).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), assignments.len() + 1);
    assert!(text.contains("\tred\n"));
}

#[test]
fn annotates_xlinked_mgf_spectrum() {
    let xl = XlinkedPeptides {
        peptide1: "AKDEL".to_string(),
        xlink1: 2,
        peptide2: "GSKR".to_string(),
        xlink2: 3,
        linker_mass: 138.06808,
        mods1: vec![],
        mods2: vec![],
    };
    let params = IonGenerationParams {
        ion_types: vec![IonType::B, IonType::Y],
        min_charge: 1,
        max_charge: 3,
        mass_type: MassType::Monoisotopic,
        max_mz: Some(2000.0),
    };
    let ions = ions_from_xlink_sequence(&xl, &params, &STANDARD_AMINO_ACID_TABLE).unwrap();
    let parent = ions.iter().find(|ion| ion.descriptor.label == "M+3H").unwrap();

    let mgf = format!(
        "BEGIN IONS\nTITLE=xl\nPEPMASS={:.5}\nCHARGE=3+\n{:.6} 500\n{:.6} 80\nEND IONS\n",
        parent.mz,
        parent.mz,
        shifted(ions[0].mz, -2.0),
    );
    let spectra = parse_mgf(mgf.as_bytes()).unwrap();
    let spectrum = &spectra[0];
    assert_eq!(spectrum.header.precursor_charge, Some(3));

    let assignments = assign_peaks(&spectrum.peaks, &ions, &PpmWindow::default()).unwrap();
    let labels: Vec<&str> = assignments.iter().map(|a| a.descriptor.label.as_str()).collect();
    assert!(labels.contains(&"M+3H"));
    assert_eq!(ion_color(&assignments.iter().find(|a| a.descriptor.label == "M+3H").unwrap().descriptor), "cyan");
}

#[test]
fn unmatched_spectrum_is_an_error() {
    let ions = ions_from_sequence("PEPTIDE", &[], &IonGenerationParams::default(), &STANDARD_AMINO_ACID_TABLE).unwrap();
    let peaks = Peaks::new(vec![12.0, 13.0], vec![1.0, 1.0]).unwrap();
    assert!(assign_peaks(&peaks, &ions, &PpmWindow::default()).is_err());
}
