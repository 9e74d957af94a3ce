use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tunep_core::{AggregatedRow, ReferencePeriod, ReportColumn};

use crate::sink::{CsvSink, JsonSink, TabularSink};
use crate::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// `{facility}-{yyyy}-{mm}-{timestamp}.{ext}`
pub fn report_file_name(
    facility_code: &str,
    period: ReferencePeriod,
    timestamp: i64,
    format: ReportFormat,
) -> String {
    format!(
        "{facility_code}-{:04}-{:02}-{timestamp}.{}",
        period.year(),
        period.month(),
        format.extension()
    )
}

/// Writes every report column for `rows` to `path`. The content goes to a
/// sibling `.tmp` file first and is renamed into place once complete, so a
/// failed run leaves no partial report behind.
pub fn write_report(
    path: &Path,
    format: ReportFormat,
    rows: &[AggregatedRow],
    period: ReferencePeriod,
) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);

    let result = write_to(&tmp, format, rows, period).and_then(|()| {
        fs::rename(&tmp, path)?;
        Ok(())
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
        return result;
    }

    tracing::info!("Wrote {} report rows to {}", rows.len(), path.display());
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_to(
    path: &Path,
    format: ReportFormat,
    rows: &[AggregatedRow],
    period: ReferencePeriod,
) -> Result<(), ExportError> {
    let file = BufWriter::new(File::create(path)?);
    match format {
        ReportFormat::Csv => {
            let mut sink = CsvSink::new(file);
            sink.write_rows(&ReportColumn::ALL, rows, period)?;
            sink.into_inner()?.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        }
        ReportFormat::Json => {
            let mut sink = JsonSink::new(file);
            sink.write_rows(&ReportColumn::ALL, rows, period)?;
            sink.into_inner().into_inner().map_err(|e| e.into_error())?.sync_all()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::tests::{period, row};
    use tunep_core::Money;

    #[test]
    fn file_name_layout() {
        assert_eq!(
            report_file_name("2111659", period(), 1_725_000_000, ReportFormat::Csv),
            "2111659-2024-08-1725000000.csv"
        );
        assert_eq!(
            report_file_name("2111659", period(), 7, ReportFormat::Json),
            "2111659-2024-08-7.json"
        );
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("CSV".parse::<ReportFormat>().unwrap(), ReportFormat::Csv);
        assert_eq!(" json".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!(matches!(
            "xlsx".parse::<ReportFormat>(),
            Err(ExportError::UnknownFormat(_))
        ));
    }

    #[test]
    fn write_report_creates_dirs_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("r.csv");
        write_report(&path, ReportFormat::Csv, &[row(Some(Money::from_cents(2500)))], period()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert_eq!(text.lines().next().unwrap().split(',').count(), ReportColumn::ALL.len());
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn header_only_report_for_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_report(&path, ReportFormat::Csv, &[], period()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);
    }

    #[test]
    fn json_report_is_an_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.json");
        write_report(&path, ReportFormat::Json, &[row(None)], period()).unwrap();
        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["CNES"], "2111659");
    }

    #[test]
    fn failed_write_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let path = blocker.join("r.csv");
        assert!(write_report(&path, ReportFormat::Csv, &[], period()).is_err());
        assert!(!path.exists());
    }
}
