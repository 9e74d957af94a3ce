use rust_decimal::Decimal;
use std::str::FromStr;
use tunep_core::Money;

use crate::error::{ImportError, Parsed};
use crate::util::decode_latin1;

/// One billed procedure, as exported by the public billing system.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingRow {
    pub facility_code: String,
    /// Raw procedure code; normalization happens at aggregation.
    pub procedure_code: String,
    pub total_value: Money,
}

/// Something that yields billing rows for one period.
pub trait BillingSource {
    fn load(&self) -> Result<Parsed<Vec<BillingRow>>, ImportError>;
}

/// Column layout of a delimited billing export.
#[derive(Debug, Clone)]
pub struct BillingProfile {
    pub delimiter: u8,
    pub facility_column: String,
    pub procedure_column: String,
    pub value_column: String,
}

impl Default for BillingProfile {
    fn default() -> Self {
        Self {
            delimiter: b';',
            facility_column: "CNES".to_string(),
            procedure_column: "PROC_REA".to_string(),
            value_column: "VAL_TOT".to_string(),
        }
    }
}

/// Billing rows read from an in-memory, Latin-1 encoded delimited file with
/// a header line.
pub struct CsvBillingSource {
    bytes: Vec<u8>,
    profile: BillingProfile,
}

impl CsvBillingSource {
    pub fn new(bytes: Vec<u8>, profile: BillingProfile) -> Self {
        Self { bytes, profile }
    }
}

struct ColumnIndexes {
    facility: usize,
    procedure: usize,
    value: usize,
}

impl BillingSource for CsvBillingSource {
    fn load(&self) -> Result<Parsed<Vec<BillingRow>>, ImportError> {
        let text = decode_latin1(&self.bytes);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.profile.delimiter)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| ImportError::MissingColumn(name.to_string()))
        };
        let columns = ColumnIndexes {
            facility: find(&self.profile.facility_column)?,
            procedure: find(&self.profile.procedure_column)?,
            value: find(&self.profile.value_column)?,
        };

        let mut parsed = Parsed::new(Vec::new());
        for result in reader.records() {
            let record = result?;
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            let line = record.position().map_or(0, |p| p.line() as usize);
            match parse_billing_record(line, &record, &columns) {
                Ok(row) => parsed.records.push(row),
                Err(e) => parsed.skipped.push(e),
            }
        }

        tracing::debug!(
            "Billing file: {} rows, {} skipped",
            parsed.records.len(),
            parsed.skipped.len()
        );
        Ok(parsed)
    }
}

fn parse_billing_record(
    line: usize,
    record: &csv::StringRecord,
    columns: &ColumnIndexes,
) -> Result<BillingRow, ImportError> {
    let field = |idx: usize, name: &str| {
        record
            .get(idx)
            .map(str::trim)
            .ok_or_else(|| ImportError::malformed(line, format!("missing {name} field")))
    };
    let facility_code = field(columns.facility, "facility")?;
    let procedure_code = field(columns.procedure, "procedure")?;
    let value = field(columns.value, "value")?;

    if procedure_code.is_empty() {
        return Err(ImportError::malformed(line, "blank procedure code"));
    }
    let total_value = parse_amount(value)
        .ok_or_else(|| ImportError::malformed(line, format!("invalid amount: '{value}'")))?;

    Ok(BillingRow {
        facility_code: facility_code.to_string(),
        procedure_code: procedure_code.to_string(),
        total_value,
    })
}

/// Accepts `123.45` as well as the pt-BR form `1.234,56`.
fn parse_amount(raw: &str) -> Option<Money> {
    if raw.contains(',') {
        Money::parse_br(raw).ok()
    } else {
        Decimal::from_str(raw).ok().map(Money::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &[u8]) -> Parsed<Vec<BillingRow>> {
        CsvBillingSource::new(text.to_vec(), BillingProfile::default())
            .load()
            .unwrap()
    }

    #[test]
    fn reads_rows_by_header_name() {
        let parsed = load(b"UF_ZI;CNES;PROC_REA;VAL_TOT\n310620;2111659;0301010010;100.00\n310620;2111659;301010010;50,50\n");
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].facility_code, "2111659");
        assert_eq!(parsed.records[0].procedure_code, "0301010010");
        assert_eq!(parsed.records[0].total_value, Money::from_cents(10000));
        assert_eq!(parsed.records[1].procedure_code, "301010010");
        assert_eq!(parsed.records[1].total_value, Money::from_cents(5050));
    }

    #[test]
    fn header_match_ignores_case_and_padding() {
        let parsed = load(b" cnes ;Proc_Rea;val_tot\n1;0301010010;1.234,56\n");
        assert_eq!(parsed.records[0].total_value, Money::from_cents(123456));
    }

    #[test]
    fn missing_column_is_fatal() {
        let source = CsvBillingSource::new(b"CNES;PROC_REA\n1;2\n".to_vec(), BillingProfile::default());
        assert!(matches!(
            source.load(),
            Err(ImportError::MissingColumn(c)) if c == "VAL_TOT"
        ));
    }

    #[test]
    fn bad_rows_are_skipped_and_counted() {
        let parsed = load(b"CNES;PROC_REA;VAL_TOT\n1;0301010010;abc\n1;0301010010\n1;;5.00\n\n1;0301010010;5.00\n");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.skipped_count(), 3);
        assert!(matches!(
            parsed.skipped[0],
            ImportError::MalformedRecord { line: 2, .. }
        ));
    }

    #[test]
    fn custom_profile() {
        let profile = BillingProfile {
            delimiter: b',',
            facility_column: "ESTAB".into(),
            procedure_column: "PROC".into(),
            value_column: "VALOR".into(),
        };
        let parsed = CsvBillingSource::new(b"ESTAB,PROC,VALOR\n42,0301010010,7.5\n".to_vec(), profile)
            .load()
            .unwrap();
        assert_eq!(parsed.records[0].facility_code, "42");
        assert_eq!(parsed.records[0].total_value, Money::from_cents(750));
    }
}
