use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tunep_core::SourceSystem;
use tunep_export::ReportFormat;
use tunep_import::BillingProfile;

use crate::cli::Args;

pub const DEFAULT_CONFIG_FILE: &str = "tunep.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Delimiter must be a single ASCII character, got '{0}'")]
    InvalidDelimiter(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
    pub rate_table: PathBuf,
    pub format: ReportFormat,
    pub sigtap: SigtapConfig,
    pub billing: BillingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("downloads"),
            output_dir: PathBuf::from("results"),
            rate_table: PathBuf::from("sources/TUNEP.csv"),
            format: ReportFormat::Csv,
            sigtap: SigtapConfig::default(),
            billing: BillingConfig::default(),
        }
    }
}

/// Where the unified procedure table archives come from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SigtapConfig {
    /// Directory path or `http(s)` index URL. Unset means cache only.
    pub remote: Option<String>,
    pub prefix: String,
}

impl Default for SigtapConfig {
    fn default() -> Self {
        Self {
            remote: None,
            prefix: "TabelaUnificada_".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BillingConfig {
    /// Like `sigtap.remote`; `{source}` is replaced by `SIH` or `SIA`.
    pub remote: Option<String>,
    pub state: String,
    pub delimiter: String,
    pub facility_column: String,
    pub procedure_column: String,
    pub value_column: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        let profile = BillingProfile::default();
        Self {
            remote: None,
            state: "MG".to_string(),
            delimiter: char::from(profile.delimiter).to_string(),
            facility_column: profile.facility_column,
            procedure_column: profile.procedure_column,
            value_column: profile.value_column,
        }
    }
}

impl BillingConfig {
    pub fn remote_for(&self, source: SourceSystem) -> Option<String> {
        self.remote
            .as_deref()
            .map(|r| r.replace("{source}", &source.to_string()))
    }

    pub fn profile(&self) -> Result<BillingProfile, ConfigError> {
        let delimiter = match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => *b,
            _ => return Err(ConfigError::InvalidDelimiter(self.delimiter.clone())),
        };
        Ok(BillingProfile {
            delimiter,
            facility_column: self.facility_column.clone(),
            procedure_column: self.procedure_column.clone(),
            value_column: self.value_column.clone(),
        })
    }
}

impl AppConfig {
    /// Reads `path` if given; otherwise `tunep.toml` in the working directory
    /// if it exists; otherwise the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Command-line values win over file values.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(dir) = &args.cache_dir {
            self.cache_dir = dir.clone();
        }
        if let Some(dir) = &args.output_dir {
            self.output_dir = dir.clone();
        }
        if let Some(path) = &args.rate_table {
            self.rate_table = path.clone();
        }
        if let Some(format) = args.format {
            self.format = format;
        }
        if let Some(state) = &args.state {
            self.billing.state = state.clone();
        }
        if args.offline {
            self.sigtap.remote = None;
            self.billing.remote = None;
        }
    }
}
