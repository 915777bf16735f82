//! Mass spectrometry and structural biology lab toolbox: sequence masses, fragment
//! ion annotation, iBAQ quantification, CD spectra and instrument exports.

pub mod chemistry;
pub mod io;
pub mod ms;
pub mod msms;
pub mod quant;
pub mod spectroscopy;

pub use chemistry::table::{AminoAcidTable, MassType, STANDARD_AMINO_ACID_TABLE};
pub use ms::peaks::Peaks;
pub use ms::utils::{mass_to_mz, mz_to_mass, PpmWindow};
