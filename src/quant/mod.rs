pub mod ibaq;
pub mod imputation;
