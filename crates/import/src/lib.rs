pub mod aggregate;
pub mod archive;
pub mod billing;
pub mod error;
pub mod reconcile;
pub mod sigtap;
pub mod tunep;
pub mod util;

pub use aggregate::{aggregate, AggregationRequest, UNKNOWN_PROCEDURE_NAME};
pub use archive::{read_member, SigtapArchive, PROCEDURE_MEMBER, RELATIONSHIP_MEMBER};
pub use billing::{BillingProfile, BillingRow, BillingSource, CsvBillingSource};
pub use error::{ImportError, Parsed};
pub use reconcile::{reconcile, reconcile_procedure, ReconcileSummary};
pub use sigtap::{parse_procedure_table, parse_relationship_table, LinkReport};
pub use tunep::{parse_rate_table, RATE_TABLE_DELIMITER};
pub use util::decode_latin1;
