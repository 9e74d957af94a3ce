pub mod file;
pub mod sink;

use thiserror::Error;

pub use file::{report_file_name, write_report, ReportFormat};
pub use sink::{CsvSink, JsonSink, TabularSink};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown report format: {0}")]
    UnknownFormat(String),
}
