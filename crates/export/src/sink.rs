use serde::ser::{Serialize, SerializeMap, Serializer};
use std::io::Write;
use tunep_core::{AggregatedRow, Cell, ReferencePeriod, ReportColumn};

use crate::ExportError;

/// Destination for report rows. `Cell::Blank` must stay distinguishable
/// from a zero amount in every implementation.
pub trait TabularSink {
    fn write_rows(
        &mut self,
        columns: &[ReportColumn],
        rows: &[AggregatedRow],
        period: ReferencePeriod,
    ) -> Result<(), ExportError>;
}

/// Delimited text with a header of column labels. Amounts are written with
/// two decimals, absent values as empty cells.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
        }
    }

    pub fn into_inner(self) -> Result<W, ExportError> {
        self.writer
            .into_inner()
            .map_err(|e| ExportError::Io(e.into_error()))
    }
}

fn cell_text(cell: Cell) -> String {
    match cell {
        Cell::Text(s) => s,
        Cell::Integer(n) => n.to_string(),
        Cell::Money(m) => m.to_plain_string(),
        Cell::Blank => String::new(),
    }
}

impl<W: Write> TabularSink for CsvSink<W> {
    fn write_rows(
        &mut self,
        columns: &[ReportColumn],
        rows: &[AggregatedRow],
        period: ReferencePeriod,
    ) -> Result<(), ExportError> {
        self.writer
            .write_record(columns.iter().map(|c| c.label(period)))?;
        for row in rows {
            self.writer
                .write_record(columns.iter().map(|&c| cell_text(row.cell(c))))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// A JSON array of objects keyed by column key, in column order. Amounts are
/// two-decimal strings, absent values `null`.
pub struct JsonSink<W: Write> {
    inner: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

struct RowObject<'a> {
    columns: &'a [ReportColumn],
    row: &'a AggregatedRow,
}

impl Serialize for RowObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for &column in self.columns {
            match self.row.cell(column) {
                Cell::Text(s) => map.serialize_entry(column.key(), &s)?,
                Cell::Integer(n) => map.serialize_entry(column.key(), &n)?,
                Cell::Money(m) => map.serialize_entry(column.key(), &m.to_plain_string())?,
                Cell::Blank => map.serialize_entry(column.key(), &None::<String>)?,
            }
        }
        map.end()
    }
}

impl<W: Write> TabularSink for JsonSink<W> {
    fn write_rows(
        &mut self,
        columns: &[ReportColumn],
        rows: &[AggregatedRow],
        _period: ReferencePeriod,
    ) -> Result<(), ExportError> {
        let objects: Vec<_> = rows.iter().map(|row| RowObject { columns, row }).collect();
        serde_json::to_writer_pretty(&mut self.inner, &objects)?;
        self.inner.write_all(b"\n")?;
        self.inner.flush()?;
        Ok(())
    }
}
