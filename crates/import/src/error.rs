use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
    #[error("Archive member not found: {0}")]
    MissingMember(String),
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

impl ImportError {
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        ImportError::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }
}

/// Result of a lenient parse: what could be decoded, plus every line that
/// was skipped and why.
#[derive(Debug)]
pub struct Parsed<T> {
    pub records: T,
    pub skipped: Vec<ImportError>,
}

impl<T> Parsed<T> {
    pub fn new(records: T) -> Self {
        Self {
            records,
            skipped: Vec::new(),
        }
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Logs skipped lines under `what` (first few in detail).
    pub fn log_skipped(&self, what: &str) {
        if self.skipped.is_empty() {
            return;
        }
        tracing::warn!("{what}: skipped {} malformed line(s)", self.skipped.len());
        for err in self.skipped.iter().take(5) {
            tracing::warn!("{what}: {err}");
        }
    }
}
