use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::period::{ReferencePeriod, SourceSystem};

/// One output line: a procedure billed by a facility in a period, with the
/// reconciled reference figures attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRow {
    pub facility_code: String,
    /// Matched legacy codes joined with `" - "`.
    pub legacy_codes: Option<String>,
    pub procedure_code: String,
    pub procedure_name: String,
    pub period: ReferencePeriod,
    pub billed_value: Money,
    pub frequency: u64,
    pub base_value: Money,
    pub public_rate: Option<Money>,
    pub public_rate_mean: Option<Money>,
    pub reference_rate: Option<Money>,
    pub reference_rate_mean: Option<Money>,
    pub rate_difference: Option<Money>,
    pub rate_difference_total: Option<Money>,
    pub rate_difference_mean: Option<Money>,
    pub rate_difference_mean_total: Option<Money>,
    pub difference_vs_base: Option<Money>,
    pub difference_vs_base_total: Option<Money>,
    pub difference_vs_base_mean: Option<Money>,
    pub difference_vs_base_mean_total: Option<Money>,
    pub incentive_unit_value: Money,
    pub incentive_value: Option<Money>,
    pub source: SourceSystem,
}

/// A single report value. `Blank` is an absent figure and must never be
/// rendered like a zero.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(u64),
    Money(Money),
    Blank,
}

impl From<Option<Money>> for Cell {
    fn from(value: Option<Money>) -> Self {
        value.map_or(Cell::Blank, Cell::Money)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportColumn {
    Facility,
    LegacyCodes,
    ProcedureCode,
    ProcedureName,
    Period,
    BilledValue,
    Frequency,
    BaseValue,
    PublicRate,
    PublicRateMean,
    ReferenceRate,
    ReferenceRateMean,
    RateDifference,
    RateDifferenceTotal,
    RateDifferenceMean,
    RateDifferenceMeanTotal,
    DifferenceVsBase,
    DifferenceVsBaseTotal,
    DifferenceVsBaseMean,
    DifferenceVsBaseMeanTotal,
    IncentiveUnitValue,
    IncentiveValue,
    Source,
}

impl ReportColumn {
    /// Output order of the report.
    pub const ALL: [ReportColumn; 23] = [
        ReportColumn::Facility,
        ReportColumn::LegacyCodes,
        ReportColumn::ProcedureCode,
        ReportColumn::ProcedureName,
        ReportColumn::Period,
        ReportColumn::BilledValue,
        ReportColumn::Frequency,
        ReportColumn::BaseValue,
        ReportColumn::PublicRate,
        ReportColumn::PublicRateMean,
        ReportColumn::ReferenceRate,
        ReportColumn::ReferenceRateMean,
        ReportColumn::RateDifference,
        ReportColumn::RateDifferenceTotal,
        ReportColumn::RateDifferenceMean,
        ReportColumn::RateDifferenceMeanTotal,
        ReportColumn::DifferenceVsBase,
        ReportColumn::DifferenceVsBaseTotal,
        ReportColumn::DifferenceVsBaseMean,
        ReportColumn::DifferenceVsBaseMeanTotal,
        ReportColumn::IncentiveUnitValue,
        ReportColumn::IncentiveValue,
        ReportColumn::Source,
    ];

    /// Stable machine-readable key.
    pub fn key(self) -> &'static str {
        match self {
            ReportColumn::Facility => "CNES",
            ReportColumn::LegacyCodes => "COD_TUNEP",
            ReportColumn::ProcedureCode => "PROC_REA",
            ReportColumn::ProcedureName => "NOME",
            ReportColumn::Period => "DATA",
            ReportColumn::BilledValue => "VAL_TOT",
            ReportColumn::Frequency => "FREQ",
            ReportColumn::BaseValue => "SIGTAP",
            ReportColumn::PublicRate => "SIGTAP_ORIGEM",
            ReportColumn::PublicRateMean => "SIGTAP_ORIGEM_MEDIA",
            ReportColumn::ReferenceRate => "TUNEP",
            ReportColumn::ReferenceRateMean => "TUNEP_MEDIA",
            ReportColumn::RateDifference => "DIF_TUNEP_SUS",
            ReportColumn::RateDifferenceTotal => "TUNEP_SUS_TOTAL",
            ReportColumn::RateDifferenceMean => "DIF_TUNEP_SUS_MEDIA",
            ReportColumn::RateDifferenceMeanTotal => "TUNEP_SUS_TOTAL_MEDIA",
            ReportColumn::DifferenceVsBase => "DIF_TUNEP_SIGTAP",
            ReportColumn::DifferenceVsBaseTotal => "VALOR_TOTAL_TUNEP",
            ReportColumn::DifferenceVsBaseMean => "DIF_TUNEP_SIGTAP_MEDIA",
            ReportColumn::DifferenceVsBaseMeanTotal => "VALOR_TOTAL",
            ReportColumn::IncentiveUnitValue => "VALOR_UNIT_IVR",
            ReportColumn::IncentiveValue => "IVR",
            ReportColumn::Source => "BD_SUS",
        }
    }

    /// Human-readable header. Some headers name the reference period.
    pub fn label(self, period: ReferencePeriod) -> String {
        match self {
            ReportColumn::Facility => "CNES".to_string(),
            ReportColumn::LegacyCodes => "Código de origem da TUNEP".to_string(),
            ReportColumn::ProcedureCode => "Código do Procedimento".to_string(),
            ReportColumn::ProcedureName => "Nome do Procedimento".to_string(),
            ReportColumn::Period => "Data/Mês de Referência".to_string(),
            ReportColumn::BilledValue => format!(
                "Valor aprovado / realizado no mês de referência do TABWIN {period}"
            ),
            ReportColumn::Frequency => "Frequência / Quantidade aprovada".to_string(),
            ReportColumn::BaseValue => {
                format!("Valor unitário SIGTAP-SUS {period} no mês de referência")
            }
            ReportColumn::PublicRate => "Valor unitário SIGTAP-SUS 2008".to_string(),
            ReportColumn::PublicRateMean => "Média do valor unitário SIGTAP-SUS 2008".to_string(),
            ReportColumn::ReferenceRate => "Valor unitário TUNEP 2008".to_string(),
            ReportColumn::ReferenceRateMean => "Média do valor unitário TUNEP 2008".to_string(),
            ReportColumn::RateDifference => "Diferença da TUNEP - SIGTAP-SUS 2008".to_string(),
            ReportColumn::RateDifferenceTotal => {
                "Valor Total TUNEP (Dif. TUNEP 2008 - SIGTAP-SUS 2008)".to_string()
            }
            ReportColumn::RateDifferenceMean => {
                "Diferença Média TUNEP 2008 - Média SIGTAP-SUS 2008".to_string()
            }
            ReportColumn::RateDifferenceMeanTotal => {
                "Valor Total TUNEP (Dif. Méd. TUNEP 2008 - Média SIGTAP-SUS 2008)".to_string()
            }
            ReportColumn::DifferenceVsBase => format!("Diferença TUNEP - SIGTAP SUS {period}"),
            ReportColumn::DifferenceVsBaseTotal => {
                "VR TOTAL TUNEP (Diferença TUNEP 2008 - SIGTAP-SUS no mês de referência)"
                    .to_string()
            }
            ReportColumn::DifferenceVsBaseMean => {
                format!("Dif. Méd. TUNEP 2008 e SIGTAP {period}")
            }
            ReportColumn::DifferenceVsBaseMeanTotal => {
                format!("VALOR TOTAL - Dif. Méd TUNEP 2008 - SIGTAP {period}")
            }
            ReportColumn::IncentiveUnitValue => "Valor unitário que deveria ser pago aplicando o IVR = SIGTAP-SUS mês de referência + 50% do SIGTAP-SUS no mês de referência".to_string(),
            ReportColumn::IncentiveValue => {
                "50% do SIGTAP-SUS no mês de referência = IVR".to_string()
            }
            ReportColumn::Source => "BD SUS".to_string(),
        }
    }
}

impl AggregatedRow {
    pub fn cell(&self, column: ReportColumn) -> Cell {
        match column {
            ReportColumn::Facility => Cell::Text(self.facility_code.clone()),
            ReportColumn::LegacyCodes => self
                .legacy_codes
                .clone()
                .map_or(Cell::Blank, Cell::Text),
            ReportColumn::ProcedureCode => Cell::Text(self.procedure_code.clone()),
            ReportColumn::ProcedureName => Cell::Text(self.procedure_name.clone()),
            ReportColumn::Period => Cell::Text(self.period.to_string()),
            ReportColumn::BilledValue => Cell::Money(self.billed_value),
            ReportColumn::Frequency => Cell::Integer(self.frequency),
            ReportColumn::BaseValue => Cell::Money(self.base_value),
            ReportColumn::PublicRate => self.public_rate.into(),
            ReportColumn::PublicRateMean => self.public_rate_mean.into(),
            ReportColumn::ReferenceRate => self.reference_rate.into(),
            ReportColumn::ReferenceRateMean => self.reference_rate_mean.into(),
            ReportColumn::RateDifference => self.rate_difference.into(),
            ReportColumn::RateDifferenceTotal => self.rate_difference_total.into(),
            ReportColumn::RateDifferenceMean => self.rate_difference_mean.into(),
            ReportColumn::RateDifferenceMeanTotal => self.rate_difference_mean_total.into(),
            ReportColumn::DifferenceVsBase => self.difference_vs_base.into(),
            ReportColumn::DifferenceVsBaseTotal => self.difference_vs_base_total.into(),
            ReportColumn::DifferenceVsBaseMean => self.difference_vs_base_mean.into(),
            ReportColumn::DifferenceVsBaseMeanTotal => self.difference_vs_base_mean_total.into(),
            ReportColumn::IncentiveUnitValue => Cell::Money(self.incentive_unit_value),
            ReportColumn::IncentiveValue => self.incentive_value.into(),
            ReportColumn::Source => Cell::Text(self.source.to_string()),
        }
    }
}
