//! Convenient imports for common functionality.

pub use crate::adapter::ConnectionAdapter;
pub use crate::criteria::{Criteria, FieldMap, WhereClause, build_where};
pub use crate::driver::PgDriver;
pub use crate::error::{
    AdapterError, DriverError, QueryError, TransactionError, TransactionStep,
};
pub use crate::notice::{Notice, NoticeHandler, NoticeSlot, Severity};
pub use crate::options::AdapterOptions;
pub use crate::quoting::{TableRef, quote_identifier};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::savepoint::{RandomNamer, SavepointNamer, SequentialNamer};
pub use crate::types::{QueryAndParams, RowValues, TransactionStatus};

#[cfg(feature = "postgres")]
pub use crate::postgres::{PgClientDriver, PgConfig, PostgresOptions};
