pub mod error;
pub mod generation;
pub mod volume;
