use tunep_core::{Money, RateRecord, RateRegistry};

use crate::error::{ImportError, Parsed};

pub const RATE_TABLE_DELIMITER: u8 = b';';

/// Parses the legacy rate table: a header line, then
/// `code;sus;tunep` with pt-BR formatted amounts. Later lines with a code
/// seen before replace the earlier entry.
pub fn parse_rate_table(text: &str) -> Result<Parsed<RateRegistry>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(RATE_TABLE_DELIMITER)
        .quoting(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut parsed = Parsed::new(RateRegistry::new());

    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line() as usize);

        match parse_rate_record(line, &record) {
            Ok(rate) => {
                if parsed.records.insert(rate.code.clone(), rate).is_some() {
                    tracing::debug!("Rate table line {line}: code redefined, keeping the later entry");
                }
            }
            Err(e) => parsed.skipped.push(e),
        }
    }

    tracing::debug!(
        "Rate table: {} codes, {} skipped",
        parsed.records.len(),
        parsed.skipped.len()
    );
    Ok(parsed)
}

fn parse_rate_record(line: usize, record: &csv::StringRecord) -> Result<RateRecord, ImportError> {
    let code = record.get(0).unwrap_or_default().trim();
    if code.is_empty() {
        return Err(ImportError::malformed(line, "blank legacy code"));
    }
    let (Some(sus), Some(tunep)) = (record.get(1), record.get(2)) else {
        return Err(ImportError::malformed(
            line,
            format!("expected 3 fields, found {}", record.len()),
        ));
    };
    let sus = Money::parse_br(sus).map_err(|e| ImportError::malformed(line, e.to_string()))?;
    let tunep = Money::parse_br(tunep).map_err(|e| ImportError::malformed(line, e.to_string()))?;

    Ok(RateRecord {
        code: code.to_string(),
        sus,
        tunep,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "CODIGO;VALOR SUS;VALOR TUNEP\n";

    #[test]
    fn parses_locale_amounts() {
        let text = format!("{HEADER}A1;20,00;22,00\nA2 ;1.234,56;2.000,10\n");
        let parsed = parse_rate_table(&text).unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records["A1"].sus, Money::from_cents(2000));
        assert_eq!(parsed.records["A1"].tunep, Money::from_cents(2200));
        assert_eq!(parsed.records["A2"].sus, Money::from_cents(123456));
        assert_eq!(parsed.records["A2"].tunep, Money::from_cents(200010));
    }

    #[test]
    fn header_only_yields_nothing() {
        let parsed = parse_rate_table(HEADER).unwrap();
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.skipped_count(), 0);
    }

    #[test]
    fn last_write_wins() {
        let text = format!("{HEADER}A1;20,00;22,00\nA1;30,00;31,00\n");
        let parsed = parse_rate_table(&text).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records["A1"].sus, Money::from_cents(3000));
        assert_eq!(parsed.records["A1"].tunep, Money::from_cents(3100));
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let text = format!("{HEADER}A1;20,00\nA2;abc;1,00\n;1,00;2,00\nA3;5,00;6,00\n");
        let parsed = parse_rate_table(&text).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert!(parsed.records.contains_key("A3"));
        assert_eq!(parsed.skipped_count(), 3);
        assert!(matches!(
            parsed.skipped[0],
            ImportError::MalformedRecord { line: 2, .. }
        ));
    }

    #[test]
    fn quotes_are_literal() {
        let text = format!("{HEADER}\"A1\";1,00;2,00\n");
        let parsed = parse_rate_table(&text).unwrap();
        assert!(parsed.records.contains_key("\"A1\""));
    }
}
