use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;
use tunep_core::{reference_prefix, PeriodError, ReferencePeriod, SourceSystem};
use tunep_export::{report_file_name, write_report, ExportError, ReportFormat};
use tunep_import::{
    aggregate, decode_latin1, parse_rate_table, reconcile, AggregationRequest, BillingProfile,
    BillingSource, CsvBillingSource, ImportError, ReconcileSummary, SigtapArchive,
};
use tunep_storage::{FileStore, Origin, ReferenceCache, ResolveError, WritableStore};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Period(#[from] PeriodError),
    #[error("Cannot read rate table {path}: {source}")]
    RateTable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fixed inputs shared by every run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub sigtap_prefix: String,
    pub rate_table: PathBuf,
    pub output_dir: PathBuf,
    pub state: String,
    pub billing_profile: BillingProfile,
    pub format: ReportFormat,
}

/// One report to produce.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub facility_code: String,
    pub period: ReferencePeriod,
    pub source: SourceSystem,
    /// Unix time stamped into the report name.
    pub timestamp: i64,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub report_path: PathBuf,
    pub rows: usize,
    pub reconciliation: ReconcileSummary,
    /// Malformed lines skipped across every input.
    pub skipped: usize,
}

pub struct Pipeline<C, R> {
    reference: ReferenceCache<C, R>,
    billing: ReferenceCache<C, R>,
    settings: Settings,
}

impl<C: WritableStore, R: FileStore> Pipeline<C, R> {
    pub fn new(
        reference: ReferenceCache<C, R>,
        billing: ReferenceCache<C, R>,
        settings: Settings,
    ) -> Self {
        Self {
            reference,
            billing,
            settings,
        }
    }

    /// Resolves the inputs, reconciles, aggregates and writes the report.
    /// Any fatal error aborts before a report file is created.
    pub fn run(&self, request: &RunRequest) -> Result<RunOutcome, PipelineError> {
        let started = Instant::now();
        let settings = &self.settings;
        let billing_prefix = request
            .source
            .billing_prefix(&settings.state, request.period)?;

        // Reference table
        let stage = Instant::now();
        let archive_file = self
            .reference
            .resolve(&reference_prefix(&settings.sigtap_prefix, request.period))?;
        log_resolved("Reference table", &archive_file.name, archive_file.origin, &archive_file.sha256);
        let archive = SigtapArchive::load(&archive_file.bytes)?;
        let mut skipped = archive.skipped_count();
        let mut registry = archive.procedures.records;
        tracing::info!("Reference table loaded in {:.2?}", stage.elapsed());

        // Rate table
        let stage = Instant::now();
        let rate_bytes = fs::read(&settings.rate_table).map_err(|source| PipelineError::RateTable {
            path: settings.rate_table.clone(),
            source,
        })?;
        let rates = parse_rate_table(&decode_latin1(&rate_bytes))?;
        rates.log_skipped("Rate table");
        skipped += rates.skipped_count();
        let reconciliation = reconcile(&mut registry, &rates.records);
        tracing::info!(
            "{} rates read and reconciled in {:.2?}",
            rates.records.len(),
            stage.elapsed()
        );

        // Billing rows
        let stage = Instant::now();
        let billing_file = self.billing.resolve(&billing_prefix)?;
        log_resolved("Billing file", &billing_file.name, billing_file.origin, &billing_file.sha256);
        let billing = CsvBillingSource::new(billing_file.bytes, settings.billing_profile.clone()).load()?;
        billing.log_skipped(&billing_file.name);
        skipped += billing.skipped_count();

        let rows = aggregate(
            &billing.records,
            &registry,
            &AggregationRequest {
                facility_code: request.facility_code.clone(),
                period: request.period,
                source: request.source,
            },
        );
        tracing::info!(
            "{} billing rows aggregated in {:.2?}",
            billing.records.len(),
            stage.elapsed()
        );

        let report_path = settings.output_dir.join(report_file_name(
            &request.facility_code,
            request.period,
            request.timestamp,
            settings.format,
        ));
        write_report(&report_path, settings.format, &rows, request.period)?;

        tracing::info!("Finished in {:.2?}", started.elapsed());
        Ok(RunOutcome {
            report_path,
            rows: rows.len(),
            reconciliation,
            skipped,
        })
    }
}

fn log_resolved(what: &str, name: &str, origin: Origin, sha256: &str) {
    let origin = match origin {
        Origin::Cache => "cache",
        Origin::Remote => "remote",
    };
    tracing::info!("{what}: {name} (from {origin})");
    tracing::debug!("{what} sha256 {sha256}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tunep_storage::MemoryStore;
    use zip::write::SimpleFileOptions;

    const FACILITY: &str = "2111659";

    fn period() -> ReferencePeriod {
        ReferencePeriod::new(2024, 8).unwrap()
    }

    fn procedure_line(code: &str, name: &str, hospital_cents: u32) -> String {
        let mut line = format!("{code:<10}{name:<250}");
        line.push_str(&" ".repeat(22));
        line.push_str(&format!("{hospital_cents:010}"));
        line.push_str(&" ".repeat(11));
        line.push_str("000000000");
        line
    }

    fn sigtap_archive() -> Vec<u8> {
        let procedures = format!(
            "{}\r\n{}\r\n",
            procedure_line("0301010010", "CONSULTA MEDICA", 2500),
            procedure_line("0202010010", "DOSAGEM", 1000),
        );
        let links = "0301010010A1\r\n0301010010A2\r\n0202010010B1\r\n";

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("tb_procedimento.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(procedures.as_bytes()).unwrap();
        writer
            .start_file("rl_procedimento_sia_sih.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(links.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    const BILLING: &str = "CNES;PROC_REA;VAL_TOT\n\
        2111659;0301010010;100.00\n\
        2111659;301010010;50.50\n\
        2111659;0202010010;10.00\n\
        2111659;0101010010;7.00\n\
        9999999;0301010010;999.00\n\
        2111659;0301010010;not-a-number\n";

    const RATES: &str = "CODIGO;SUS;TUNEP\nA1;20,00;22,00\nA2;18,00;24,00\nB1;9,00;15,00\n";

    struct Fixture {
        dir: tempfile::TempDir,
        pipeline: Pipeline<MemoryStore, MemoryStore>,
    }

    fn fixture(reference_remote: MemoryStore, billing_remote: MemoryStore) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let rate_table = dir.path().join("TUNEP.csv");
        fs::write(&rate_table, RATES).unwrap();

        let settings = Settings {
            sigtap_prefix: "TabelaUnificada_".into(),
            rate_table,
            output_dir: dir.path().join("results"),
            state: "MG".into(),
            billing_profile: BillingProfile::default(),
            format: ReportFormat::Csv,
        };
        let pipeline = Pipeline::new(
            ReferenceCache::new(MemoryStore::new("cache"), reference_remote),
            ReferenceCache::new(MemoryStore::new("cache"), billing_remote),
            settings,
        );
        Fixture { dir, pipeline }
    }

    fn remotes() -> (MemoryStore, MemoryStore) {
        (
            MemoryStore::new("sigtap")
                .with_entry("TabelaUnificada_202407_v1.zip", b"old".to_vec())
                .with_entry("TabelaUnificada_202408_v2408.zip", sigtap_archive()),
            MemoryStore::new("billing").with_entry("RDMG2408.csv", BILLING),
        )
    }

    fn request() -> RunRequest {
        RunRequest {
            facility_code: FACILITY.into(),
            period: period(),
            source: SourceSystem::Sih,
            timestamp: 1_725_000_000,
        }
    }

    #[test]
    fn end_to_end_report() {
        let (sigtap, billing) = remotes();
        let f = fixture(sigtap, billing);
        let outcome = f.pipeline.run(&request()).unwrap();

        assert_eq!(
            outcome.report_path,
            f.dir.path().join("results").join("2111659-2024-08-1725000000.csv")
        );
        assert_eq!(outcome.rows, 3);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.reconciliation.single, 1);
        assert_eq!(outcome.reconciliation.averaged, 1);

        let text = fs::read_to_string(&outcome.report_path).unwrap();
        let lines: Vec<Vec<&str>> = text.lines().skip(1).map(|l| l.split(',').collect()).collect();
        assert_eq!(lines.len(), 3);

        // Sorted by procedure code; unknown procedure first.
        assert_eq!(lines[0][2], "0101010010");
        assert_eq!(lines[0][3], "-");
        assert_eq!(lines[0][1], "");

        assert_eq!(lines[1][2], "0202010010");
        assert_eq!(lines[1][1], "B1");
        assert_eq!(lines[1][8], "9.00");
        assert_eq!(lines[1][9], "");

        let consult = &lines[2];
        assert_eq!(consult[0], FACILITY);
        assert_eq!(consult[1], "A1 - A2");
        assert_eq!(consult[4], "08/2024");
        assert_eq!(consult[5], "150.50");
        assert_eq!(consult[6], "2");
        assert_eq!(consult[7], "25.00");
        assert_eq!(consult[8], "");
        assert_eq!(consult[9], "19.00");
        assert_eq!(consult[11], "23.00");
        assert_eq!(consult[14], "4.00");
        assert_eq!(consult[15], "8.00");
        assert_eq!(consult[18], "");
        assert_eq!(consult[20], "37.50");
        assert_eq!(consult[21], "12.50");
        assert_eq!(consult[22], "SIH");
    }

    #[test]
    fn second_run_is_served_from_cache() {
        let (sigtap, billing) = remotes();
        let f = fixture(sigtap, billing);
        f.pipeline.run(&request()).unwrap();
        let fetched = f.pipeline.reference.remote().fetch_count();
        f.pipeline
            .run(&RunRequest {
                timestamp: 1_725_000_001,
                ..request()
            })
            .unwrap();

        assert_eq!(fetched, 1);
        assert_eq!(f.pipeline.reference.remote().fetch_count(), 1);
        assert_eq!(f.pipeline.billing.remote().fetch_count(), 1);
    }

    #[test]
    fn facility_without_rows_writes_header_only() {
        let (sigtap, billing) = remotes();
        let f = fixture(sigtap, billing);
        let outcome = f
            .pipeline
            .run(&RunRequest {
                facility_code: "0000001".into(),
                ..request()
            })
            .unwrap();
        assert_eq!(outcome.rows, 0);
        assert_eq!(fs::read_to_string(&outcome.report_path).unwrap().lines().count(), 1);
    }

    #[test]
    fn missing_reference_table_aborts_without_report() {
        let (_, billing) = remotes();
        let f = fixture(MemoryStore::new("sigtap"), billing);
        let err = f.pipeline.run(&request()).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Resolve(ResolveError::NotFound { ref prefix, .. })
                if prefix == "TabelaUnificada_202408"
        ));
        assert!(!f.dir.path().join("results").exists());
    }

    #[test]
    fn missing_billing_file_aborts() {
        let (sigtap, _) = remotes();
        let f = fixture(sigtap, MemoryStore::new("billing"));
        let err = f.pipeline.run(&request()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Resolve(ResolveError::NotFound { ref prefix, .. }) if prefix == "RDMG2408"
        ));
    }

    #[test]
    fn missing_rate_table_is_reported() {
        let (sigtap, billing) = remotes();
        let f = fixture(sigtap, billing);
        fs::remove_file(f.dir.path().join("TUNEP.csv")).unwrap();
        assert!(matches!(
            f.pipeline.run(&request()),
            Err(PipelineError::RateTable { .. })
        ));
    }

    #[test]
    fn json_format() {
        let (sigtap, billing) = remotes();
        let mut f = fixture(sigtap, billing);
        f.pipeline.settings.format = ReportFormat::Json;
        let outcome = f.pipeline.run(&request()).unwrap();

        assert_eq!(outcome.report_path.extension().unwrap(), "json");
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&outcome.report_path).unwrap()).unwrap();
        let consult = &value[2];
        assert_eq!(consult["TUNEP_MEDIA"], "23.00");
        assert!(consult["TUNEP"].is_null());
    }
}
