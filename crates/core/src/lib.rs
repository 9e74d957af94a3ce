pub mod money;
pub mod period;
pub mod procedure;
pub mod report;

pub use money::{Money, MoneyError};
pub use period::{reference_prefix, PeriodError, ReferencePeriod, SourceSystem};
pub use procedure::{
    normalize_procedure_code, ProcedureRecord, ProcedureRegistry, RateComparison, RateRecord,
    RateRegistry, Reconciliation, LEGACY_CODE_SEPARATOR, PROCEDURE_CODE_LEN,
};
pub use report::{AggregatedRow, Cell, ReportColumn};
