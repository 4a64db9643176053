// Library interface for taxcat modules
// This allows tests and other binaries to import modules

pub mod analysis;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod report;
pub mod taxonomy;
pub mod text;

pub use error::TaxcatError;
pub use pipeline::{Pipeline, RunReport};
