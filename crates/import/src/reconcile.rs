use tunep_core::{Money, ProcedureRecord, ProcedureRegistry, RateComparison, RateRegistry, Reconciliation};

/// How many procedures fell into each reconciliation outcome.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub unmatched: usize,
    pub single: usize,
    pub averaged: usize,
}

/// Attaches reference-rate figures to every procedure of `registry` whose
/// linked legacy codes appear in `rates`.
pub fn reconcile(registry: &mut ProcedureRegistry, rates: &RateRegistry) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();

    for record in registry.values_mut() {
        record.reconciliation = reconcile_procedure(record, rates);
        match record.reconciliation {
            Reconciliation::Unmatched => summary.unmatched += 1,
            Reconciliation::Single(_) => summary.single += 1,
            Reconciliation::Averaged(_) => summary.averaged += 1,
        }
    }

    tracing::info!(
        "Reconciled procedures: {} single, {} averaged, {} without a rate",
        summary.single,
        summary.averaged,
        summary.unmatched
    );
    summary
}

/// Reconciliation outcome for one procedure. Linked codes are visited in
/// order and repeats count once per occurrence.
pub fn reconcile_procedure(record: &ProcedureRecord, rates: &RateRegistry) -> Reconciliation {
    let matches: Vec<_> = record
        .linked_codes
        .iter()
        .filter_map(|code| rates.get(code))
        .collect();

    let (public_rate, reference_rate) = match matches.as_slice() {
        [] => return Reconciliation::Unmatched,
        [only] => (only.sus, only.tunep),
        many => {
            let sus: Money = many.iter().map(|r| r.sus).sum();
            let tunep: Money = many.iter().map(|r| r.tunep).sum();
            match (Money::mean(sus, many.len()), Money::mean(tunep, many.len())) {
                (Some(sus), Some(tunep)) => (sus, tunep),
                _ => return Reconciliation::Unmatched,
            }
        }
    };

    let difference_vs_base = reference_rate - record.base_value;
    let comparison = RateComparison {
        matched_codes: matches.iter().map(|r| r.code.clone()).collect(),
        public_rate,
        reference_rate,
        rate_difference: (reference_rate - public_rate).abs(),
        difference_vs_base: (!difference_vs_base.is_negative()).then_some(difference_vs_base),
    };

    if matches.len() == 1 {
        Reconciliation::Single(comparison)
    } else {
        Reconciliation::Averaged(comparison)
    }
}
