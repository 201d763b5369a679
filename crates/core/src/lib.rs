pub mod ending;
pub mod error;
