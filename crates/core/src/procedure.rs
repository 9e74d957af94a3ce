use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::money::Money;

/// Width of a SIGTAP procedure code.
pub const PROCEDURE_CODE_LEN: usize = 10;

/// Separator between matched legacy codes in the report.
pub const LEGACY_CODE_SEPARATOR: &str = " - ";

pub type ProcedureRegistry = BTreeMap<String, ProcedureRecord>;
pub type RateRegistry = BTreeMap<String, RateRecord>;

/// Trims a raw procedure code and left-pads it with zeros to the canonical
/// ten characters. Longer codes are returned trimmed but otherwise untouched.
pub fn normalize_procedure_code(raw: &str) -> String {
    format!("{:0>width$}", raw.trim(), width = PROCEDURE_CODE_LEN)
}

/// A procedure of the unified reference table, enriched in place by the
/// relationship table and by reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureRecord {
    pub code: String,
    pub name: String,
    /// Hospital plus professional service value, rounded to centavos.
    pub base_value: Money,
    /// Half of the base value.
    pub incentive_value: Money,
    /// Legacy codes from the relationship table, in file order. Repeats are
    /// kept as they appear.
    pub linked_codes: Vec<String>,
    pub reconciliation: Reconciliation,
}

impl ProcedureRecord {
    pub fn new(code: impl Into<String>, name: impl Into<String>, base_value: Money) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            base_value,
            incentive_value: base_value.half(),
            linked_codes: Vec::new(),
            reconciliation: Reconciliation::Unmatched,
        }
    }

    /// Value per unit when the incentive is applied (base + 50%).
    pub fn incentive_unit_value(&self) -> Money {
        self.base_value + self.incentive_value
    }
}

/// Legacy rate table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRecord {
    pub code: String,
    /// Public-system unit rate.
    pub sus: Money,
    /// Reference unit rate.
    pub tunep: Money,
}

/// Figures derived from the legacy codes of one procedure that were found in
/// the rate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateComparison {
    /// Matched legacy codes in encounter order.
    pub matched_codes: Vec<String>,
    pub public_rate: Money,
    pub reference_rate: Money,
    /// `|reference_rate - public_rate|`
    pub rate_difference: Money,
    /// `reference_rate - base_value`, absent when negative.
    pub difference_vs_base: Option<Money>,
}

impl RateComparison {
    pub fn legacy_display(&self) -> String {
        self.matched_codes.join(LEGACY_CODE_SEPARATOR)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "figures", rename_all = "snake_case")]
pub enum Reconciliation {
    /// No linked legacy code has a rate.
    #[default]
    Unmatched,
    /// Exactly one legacy code has a rate.
    Single(RateComparison),
    /// Several legacy codes have rates; figures are means.
    Averaged(RateComparison),
}

impl Reconciliation {
    pub fn single(&self) -> Option<&RateComparison> {
        match self {
            Reconciliation::Single(c) => Some(c),
            _ => None,
        }
    }

    pub fn averaged(&self) -> Option<&RateComparison> {
        match self {
            Reconciliation::Averaged(c) => Some(c),
            _ => None,
        }
    }

    pub fn comparison(&self) -> Option<&RateComparison> {
        match self {
            Reconciliation::Unmatched => None,
            Reconciliation::Single(c) | Reconciliation::Averaged(c) => Some(c),
        }
    }

    pub fn legacy_display(&self) -> Option<String> {
        self.comparison().map(RateComparison::legacy_display)
    }
}
