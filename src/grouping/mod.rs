pub mod constants;
pub mod scheme;
