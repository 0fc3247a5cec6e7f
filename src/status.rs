use crate::scan::{StatementKind, classify_all};
use crate::types::TransactionStatus;

/// Follows the server's transaction state from the statements sent over a connection.
///
/// For drivers that do not surface the protocol's ready-for-query status. Only
/// statements that went through the driver are seen, which is every statement on a
/// connection the adapter owns exclusively.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusTracker {
    status: TransactionStatus,
}

impl StatusTracker {
    #[must_use]
    pub fn new(status: TransactionStatus) -> Self {
        Self { status }
    }

    #[must_use]
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// `sql` completed without error.
    pub fn observe_success(&mut self, sql: &str) {
        for kind in classify_all(sql) {
            self.status = match (kind, self.status) {
                (StatementKind::Begin, TransactionStatus::Idle) => TransactionStatus::InTransaction,
                (StatementKind::Commit | StatementKind::Rollback, _) => TransactionStatus::Idle,
                (StatementKind::RollbackTo(_), TransactionStatus::InError) => {
                    TransactionStatus::InTransaction
                }
                (_, status) => status,
            };
        }
    }

    /// `sql` failed.
    ///
    /// A failure inside a transaction block aborts it, except for a lone `COMMIT` or
    /// `ROLLBACK`: the server ends the block even when that statement fails (a deferred
    /// constraint, for one). Outside a block, the block is only left open-and-failed
    /// when the text itself began a transaction before failing.
    pub fn observe_failure(&mut self, sql: &str) {
        let kinds = classify_all(sql);
        self.status = match self.status {
            TransactionStatus::InTransaction | TransactionStatus::InError => {
                if ends_block(&kinds) {
                    TransactionStatus::Idle
                } else {
                    TransactionStatus::InError
                }
            }
            TransactionStatus::Idle => {
                let began = kinds
                    .iter()
                    .position(|k| *k == StatementKind::Begin)
                    .is_some_and(|pos| {
                        !kinds[pos..]
                            .iter()
                            .any(|k| matches!(k, StatementKind::Commit | StatementKind::Rollback))
                    });
                if began {
                    TransactionStatus::InError
                } else {
                    TransactionStatus::Idle
                }
            }
        };
    }
}

/// `true` when the text is exactly one `COMMIT` or `ROLLBACK`.
pub(crate) fn ends_block(kinds: &[StatementKind]) -> bool {
    matches!(kinds, [StatementKind::Commit | StatementKind::Rollback])
}
