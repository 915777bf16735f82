pub mod akta;
pub mod fasta;
pub mod mgf;
pub mod pdb;
pub mod peaklist;
pub mod reader;
pub mod waters;
