use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tunep_core::{
    normalize_procedure_code, AggregatedRow, Money, ProcedureRegistry, ReferencePeriod,
    SourceSystem,
};

use crate::billing::BillingRow;

/// Name written for procedures missing from the reference table.
pub const UNKNOWN_PROCEDURE_NAME: &str = "-";

/// Selects the facility, period and billing system of one report.
#[derive(Debug, Clone)]
pub struct AggregationRequest {
    pub facility_code: String,
    pub period: ReferencePeriod,
    pub source: SourceSystem,
}

struct Group {
    billed_value: Money,
    frequency: u64,
}

impl Default for Group {
    fn default() -> Self {
        Self {
            billed_value: Money::zero(),
            frequency: 0,
        }
    }
}

/// Groups the requested facility's rows by procedure and attaches the
/// reconciled figures. Rows come out ordered by procedure code.
pub fn aggregate(
    rows: &[BillingRow],
    registry: &ProcedureRegistry,
    request: &AggregationRequest,
) -> Vec<AggregatedRow> {
    let mut groups: BTreeMap<String, Group> = BTreeMap::new();

    for row in rows.iter().filter(|r| r.facility_code == request.facility_code) {
        let group = groups
            .entry(normalize_procedure_code(&row.procedure_code))
            .or_default();
        group.billed_value = group.billed_value + row.total_value;
        group.frequency += 1;
    }

    if groups.is_empty() {
        tracing::warn!(
            "No billing rows for facility {} in {} ({})",
            request.facility_code,
            request.period,
            request.source
        );
        return Vec::new();
    }

    let unknown = groups.keys().filter(|c| !registry.contains_key(*c)).count();
    if unknown > 0 {
        tracing::warn!("{unknown} billed procedure(s) not found in the reference table");
    }
    tracing::info!(
        "Aggregated {} procedures for facility {}",
        groups.len(),
        request.facility_code
    );

    groups
        .into_iter()
        .map(|(code, group)| build_row(code, group, registry, request))
        .collect()
}

fn build_row(
    procedure_code: String,
    group: Group,
    registry: &ProcedureRegistry,
    request: &AggregationRequest,
) -> AggregatedRow {
    let record = registry.get(&procedure_code);
    let freq = group.frequency;
    let total = |value: Option<Money>| value.map(|v| v.times(freq));

    let reconciliation = record.map(|r| &r.reconciliation);
    let single = reconciliation.and_then(|r| r.single());
    let averaged = reconciliation.and_then(|r| r.averaged());

    let base_value = record.map_or_else(Money::zero, |r| r.base_value);
    let rate_difference = single.map(|c| c.rate_difference);
    let rate_difference_mean = averaged.map(|c| c.rate_difference);
    let difference_vs_base = single.and_then(|c| c.difference_vs_base);
    let difference_vs_base_mean = averaged.and_then(|c| c.difference_vs_base);

    AggregatedRow {
        facility_code: request.facility_code.clone(),
        legacy_codes: reconciliation.and_then(|r| r.legacy_display()),
        procedure_name: record.map_or_else(|| UNKNOWN_PROCEDURE_NAME.to_string(), |r| r.name.clone()),
        procedure_code,
        period: request.period,
        billed_value: group.billed_value,
        frequency: freq,
        base_value,
        public_rate: single.map(|c| c.public_rate),
        public_rate_mean: averaged.map(|c| c.public_rate),
        reference_rate: single.map(|c| c.reference_rate),
        reference_rate_mean: averaged.map(|c| c.reference_rate),
        rate_difference,
        rate_difference_total: total(rate_difference),
        rate_difference_mean,
        rate_difference_mean_total: total(rate_difference_mean),
        difference_vs_base,
        difference_vs_base_total: total(difference_vs_base),
        difference_vs_base_mean,
        difference_vs_base_mean_total: total(difference_vs_base_mean),
        incentive_unit_value: Money::new(base_value.amount() * Decimal::new(15, 1)),
        incentive_value: record.map(|r| r.incentive_value),
        source: request.source,
    }
}
