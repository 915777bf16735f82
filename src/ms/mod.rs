pub mod peaks;
pub mod utils;
