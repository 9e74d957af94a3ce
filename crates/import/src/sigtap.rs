use rust_decimal::Decimal;
use tunep_core::{Money, ProcedureRecord, ProcedureRegistry};

use crate::error::{ImportError, Parsed};
use crate::util::{fixed_field, is_blank, lines};

// Byte offsets of the unified procedure table (`tb_procedimento.txt`).
const CODE: (usize, usize) = (0, 10);
const NAME: (usize, usize) = (10, 260);
const HOSPITAL_SERVICE: (usize, usize) = (282, 292);
const PROFESSIONAL_SERVICE: (usize, usize) = (303, 312);

// Byte offsets of the procedure/legacy relationship table
// (`rl_procedimento_sia_sih.txt`).
const LINK_CODE: (usize, usize) = (0, 10);
const LINK_LEGACY_CODE: (usize, usize) = (10, 18);

/// Outcome of applying the relationship table to a registry.
#[derive(Debug, Default)]
pub struct LinkReport {
    /// Legacy codes appended to a procedure.
    pub linked: usize,
    /// Lines naming a procedure absent from the registry.
    pub unknown_procedures: usize,
    pub skipped: Vec<ImportError>,
}

/// Decodes the fixed-width procedure table. A later line with an
/// already-seen code replaces the earlier record.
pub fn parse_procedure_table(bytes: &[u8]) -> Parsed<ProcedureRegistry> {
    let mut parsed = Parsed::new(ProcedureRegistry::new());

    for (line_no, line) in lines(bytes) {
        if is_blank(line) {
            continue;
        }
        match parse_procedure_line(line_no, line) {
            Ok(record) => {
                parsed.records.insert(record.code.clone(), record);
            }
            Err(e) => parsed.skipped.push(e),
        }
    }

    tracing::debug!(
        "Procedure table: {} procedures, {} skipped",
        parsed.records.len(),
        parsed.skipped.len()
    );
    parsed
}

fn parse_procedure_line(line_no: usize, line: &[u8]) -> Result<ProcedureRecord, ImportError> {
    let code = fixed_field(line, CODE.0, CODE.1);
    if code.is_empty() {
        return Err(ImportError::malformed(line_no, "blank procedure code"));
    }
    let name = fixed_field(line, NAME.0, NAME.1);
    let hospital = parse_cents(
        line_no,
        "hospital service value",
        &fixed_field(line, HOSPITAL_SERVICE.0, HOSPITAL_SERVICE.1),
    )?;
    let professional = parse_cents(
        line_no,
        "professional service value",
        &fixed_field(line, PROFESSIONAL_SERVICE.0, PROFESSIONAL_SERVICE.1),
    )?;

    let base_value = Money::from_decimal((hospital + professional).amount());
    Ok(ProcedureRecord::new(code, name, base_value))
}

fn parse_cents(line_no: usize, field: &str, raw: &str) -> Result<Money, ImportError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ImportError::malformed(
            line_no,
            format!("{field} is not an integer: '{raw}'"),
        ));
    }
    let cents = raw
        .parse::<i64>()
        .map_err(|_| ImportError::malformed(line_no, format!("{field} out of range: '{raw}'")))?;
    Ok(Money::new(Decimal::new(cents, 2)))
}

/// Appends the legacy codes of the relationship table to the procedures of
/// `registry`. Repeated pairs are appended again, as they appear in the file.
pub fn parse_relationship_table(bytes: &[u8], registry: &mut ProcedureRegistry) -> LinkReport {
    let mut report = LinkReport::default();

    for (line_no, line) in lines(bytes) {
        if is_blank(line) {
            continue;
        }
        let code = fixed_field(line, LINK_CODE.0, LINK_CODE.1);
        if code.is_empty() {
            report
                .skipped
                .push(ImportError::malformed(line_no, "blank procedure code"));
            continue;
        }
        let legacy = fixed_field(line, LINK_LEGACY_CODE.0, LINK_LEGACY_CODE.1);

        let Some(record) = registry.get_mut(&code) else {
            report.unknown_procedures += 1;
            continue;
        };
        if legacy.is_empty() {
            continue;
        }
        record.linked_codes.push(legacy);
        report.linked += 1;
    }

    tracing::debug!(
        "Relationship table: {} links, {} unknown procedures, {} skipped",
        report.linked,
        report.unknown_procedures,
        report.skipped.len()
    );
    report
}
