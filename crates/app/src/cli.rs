use std::path::PathBuf;

use clap::Parser;
use tunep_core::SourceSystem;
use tunep_export::ReportFormat;

#[derive(Debug, Parser)]
#[command(name = "tunep")]
#[command(about = "Reconcile a facility's billed procedures against the TUNEP reference rates")]
pub struct Args {
    /// Facility code (CNES) to report on.
    #[arg(long)]
    pub cnes: String,

    /// Reference month (1-12). Defaults to the current month.
    #[arg(long)]
    pub month: Option<u32>,

    /// Reference year. Defaults to the current year.
    #[arg(long)]
    pub year: Option<u32>,

    /// Billing system the rows come from: `sih` (hospital) or `sia` (outpatient).
    #[arg(long, default_value = "sih")]
    pub source: SourceSystem,

    /// Two-letter state code used in billing file names.
    #[arg(long)]
    pub state: Option<String>,

    /// Local directory holding downloaded reference and billing files.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Directory reports are written to.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Legacy rate table (Latin-1, `;` separated).
    #[arg(long)]
    pub rate_table: Option<PathBuf>,

    /// Report format: `csv` or `json`.
    #[arg(long)]
    pub format: Option<ReportFormat>,

    /// Use only files already in the cache.
    #[arg(long, default_value_t = false)]
    pub offline: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,

    /// Configuration file. Defaults to `tunep.toml` in the working directory
    /// when present.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_invocation_uses_defaults() {
        let args = Args::try_parse_from(["tunep", "--cnes", "2111659"]).unwrap();
        assert_eq!(args.cnes, "2111659");
        assert_eq!(args.source, SourceSystem::Sih);
        assert!(args.month.is_none());
        assert!(args.format.is_none());
        assert!(!args.offline);
    }

    #[test]
    fn full_invocation() {
        let args = Args::try_parse_from([
            "tunep", "--cnes", "1", "--month", "8", "--year", "2024", "--source", "SIA",
            "--state", "sp", "--format", "json", "--offline", "-v",
        ])
        .unwrap();
        assert_eq!(args.month, Some(8));
        assert_eq!(args.year, Some(2024));
        assert_eq!(args.source, SourceSystem::Sia);
        assert_eq!(args.state.as_deref(), Some("sp"));
        assert_eq!(args.format, Some(ReportFormat::Json));
        assert!(args.offline && args.verbose);
    }

    #[test]
    fn cnes_is_required() {
        assert!(Args::try_parse_from(["tunep"]).is_err());
    }

    #[test]
    fn unknown_source_is_rejected() {
        assert!(Args::try_parse_from(["tunep", "--cnes", "1", "--source", "ftp"]).is_err());
    }
}
