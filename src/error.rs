use std::fmt;

use thiserror::Error;

use crate::notice::Severity;

/// Failure reported by a [`PgDriver`](crate::driver::PgDriver) call.
///
/// Drivers hand back the server's message untouched; `code` is the SQLSTATE when the
/// server supplied one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DriverError {
    pub message: String,
    pub code: Option<String>,
}

impl DriverError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Error produced by a single raw or parameterized execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The driver call itself failed.
    #[error("{message}")]
    Driver {
        message: String,
        code: Option<String>,
    },

    /// The server raised a warning while the call was in flight.
    #[error("{message}")]
    Warning {
        severity: Severity,
        message: String,
        code: Option<String>,
    },

    /// The statement could not be built from the supplied fields or criteria.
    #[error("invalid statement: {0}")]
    InvalidStatement(String),

    /// A fresh savepoint name could not be found.
    #[error("{0}")]
    Exhausted(String),
}

impl QueryError {
    /// SQLSTATE of the underlying server message, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Driver { code, .. } | Self::Warning { code, .. } => code.as_deref(),
            Self::InvalidStatement(_) | Self::Exhausted(_) => None,
        }
    }

    #[must_use]
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning { .. })
    }
}

impl From<DriverError> for QueryError {
    fn from(err: DriverError) -> Self {
        Self::Driver {
            message: err.message,
            code: err.code,
        }
    }
}

/// The transactional step a [`TransactionError`] happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionStep {
    Begin,
    Commit,
    Rollback,
    SavepointCreate,
    SavepointRelease,
    SavepointRollback,
}

/// A [`QueryError`] raised while opening, committing or rolling back a transaction level.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionError {
    pub step: TransactionStep,
    /// Savepoint the step operated on; `None` for the outermost level.
    pub savepoint: Option<String>,
    pub source: QueryError,
}

impl TransactionError {
    pub(crate) fn outer(step: TransactionStep, source: QueryError) -> Self {
        Self {
            step,
            savepoint: None,
            source,
        }
    }

    pub(crate) fn savepoint(step: TransactionStep, name: &str, source: QueryError) -> Self {
        Self {
            step,
            savepoint: Some(name.to_owned()),
            source,
        }
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.savepoint.as_deref().unwrap_or_default();
        match self.step {
            TransactionStep::Begin => f.write_str("cannot start the transaction"),
            TransactionStep::Commit => f.write_str("cannot commit transaction"),
            TransactionStep::Rollback => f.write_str("cannot cancel transaction"),
            TransactionStep::SavepointCreate => write!(f, "cannot create savepoint {name}"),
            TransactionStep::SavepointRelease => write!(f, "cannot release savepoint {name}"),
            TransactionStep::SavepointRollback => {
                write!(f, "cannot rollback to savepoint {name}")
            }
        }
    }
}

impl std::error::Error for TransactionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Umbrella error for everything the crate can return.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn transaction_error_names_the_savepoint_and_keeps_the_cause() {
        let err = TransactionError::savepoint(
            TransactionStep::SavepointRelease,
            "sp_1",
            QueryError::Driver {
                message: "savepoint \"sp_1\" does not exist".into(),
                code: Some("3B001".into()),
            },
        );
        assert_eq!(err.to_string(), "cannot release savepoint sp_1");
        let cause = err.source().map(ToString::to_string);
        assert_eq!(cause.as_deref(), Some("savepoint \"sp_1\" does not exist"));
        assert_eq!(err.source.code(), Some("3B001"));
    }

    #[test]
    fn outer_steps_have_fixed_messages() {
        let cause = || QueryError::from(DriverError::new("boom"));
        assert_eq!(
            TransactionError::outer(TransactionStep::Begin, cause()).to_string(),
            "cannot start the transaction"
        );
        assert_eq!(
            TransactionError::outer(TransactionStep::Rollback, cause()).to_string(),
            "cannot cancel transaction"
        );
    }
}
