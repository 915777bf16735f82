pub mod complexes;
pub mod composition;
pub mod constants;
pub mod digest;
pub mod mass_calc;
pub mod nucleotide;
pub mod rayleigh;
pub mod table;
