use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("Invalid month: {0} (expected 1-12)")]
    InvalidMonth(u32),
    #[error("Invalid year: {0} (expected four digits)")]
    InvalidYear(u32),
    #[error("Unknown source system: '{0}' (expected SIH or SIA)")]
    UnknownSource(String),
    #[error("Invalid state code: '{0}' (expected two letters)")]
    InvalidState(String),
}

/// Competence month of a billing dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferencePeriod {
    year: u16,
    month: u8,
}

impl ReferencePeriod {
    pub fn new(year: u32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }
        if !(1000..=9999).contains(&year) {
            return Err(PeriodError::InvalidYear(year));
        }
        Ok(ReferencePeriod {
            year: year as u16,
            month: month as u8,
        })
    }

    pub fn current() -> Self {
        let today = Local::now().date_naive();
        ReferencePeriod {
            year: today.year() as u16,
            month: today.month() as u8,
        }
    }

    pub fn year(self) -> u16 {
        self.year
    }

    pub fn month(self) -> u8 {
        self.month
    }

    /// `YYYYMM`, as used in reference table archive names.
    pub fn compact(self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }

    /// `YYMM`, as used in billing file names.
    pub fn short(self) -> String {
        format!("{:02}{:02}", self.year % 100, self.month)
    }
}

impl fmt::Display for ReferencePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

/// Billing information system a dataset comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceSystem {
    /// Hospital admissions (reduced AIH files, `RD` prefix).
    Sih,
    /// Outpatient production (`PA` prefix).
    Sia,
}

impl SourceSystem {
    pub fn file_tag(self) -> &'static str {
        match self {
            SourceSystem::Sih => "RD",
            SourceSystem::Sia => "PA",
        }
    }

    /// File-name prefix of the billing dataset for `state` and `period`,
    /// e.g. `RDMG2408`.
    pub fn billing_prefix(self, state: &str, period: ReferencePeriod) -> Result<String, PeriodError> {
        let state = state.trim();
        if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PeriodError::InvalidState(state.to_string()));
        }
        Ok(format!(
            "{}{}{}",
            self.file_tag(),
            state.to_ascii_uppercase(),
            period.short()
        ))
    }
}

impl fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSystem::Sih => write!(f, "SIH"),
            SourceSystem::Sia => write!(f, "SIA"),
        }
    }
}

impl std::str::FromStr for SourceSystem {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SIH" => Ok(SourceSystem::Sih),
            "SIA" => Ok(SourceSystem::Sia),
            other => Err(PeriodError::UnknownSource(other.to_string())),
        }
    }
}

/// File-name prefix of the reference table archive, e.g.
/// `TabelaUnificada_202408`.
pub fn reference_prefix(base: &str, period: ReferencePeriod) -> String {
    format!("{base}{}", period.compact())
}
