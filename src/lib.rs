//! Nested transactions and warning-checked execution for one PostgreSQL connection.
//!
//! [`ConnectionAdapter`] wraps a [`PgDriver`] and turns nested
//! `open_transaction`/`commit_transaction`/`rollback_transaction` calls into a
//! single `BEGIN`/`COMMIT` with savepoints for the inner levels. Server warnings
//! raised while a statement runs are reported as [`QueryError::Warning`] instead of
//! being dropped. A small record API (`table_exists`, `record_exists`,
//! `get_record_values`, `insert_record`, `update_record`) covers the bookkeeping a
//! schema migration tool needs.

pub mod adapter;
pub mod criteria;
pub mod driver;
pub mod error;
pub mod executor;
pub mod notice;
pub mod options;
pub mod prelude;
pub mod quoting;
pub mod record;
pub mod results;
pub mod savepoint;
pub mod scan;
pub mod status;
pub mod transaction;
pub mod translate;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use adapter::ConnectionAdapter;
pub use criteria::{Criteria, FieldMap};
pub use driver::PgDriver;
pub use error::{AdapterError, DriverError, QueryError, TransactionError, TransactionStep};
pub use options::AdapterOptions;
pub use quoting::{TableRef, quote_identifier};
pub use results::{CustomDbRow, ResultSet};
pub use types::{QueryAndParams, RowValues, TransactionStatus};
