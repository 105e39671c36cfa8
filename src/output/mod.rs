//! Output format writers.

mod archive;
mod csv;
mod json;
pub mod progress;
mod types;
mod writer;

pub use archive::write_archive;
pub use csv::CsvWriter;
pub use json::JsonResultWriter;
pub use types::{OutputRecord, records};
pub use writer::OutputWriter;
