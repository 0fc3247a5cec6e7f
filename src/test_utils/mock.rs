use async_trait::async_trait;

use crate::driver::PgDriver;
use crate::error::DriverError;
use crate::notice::{Notice, NoticeSlot};
use crate::results::ResultSet;
use crate::scan::{StatementKind, classify_all};
use crate::status::ends_block;
use crate::types::{RowValues, TransactionStatus};

/// One call the driver received.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub params: Vec<RowValues>,
    /// `true` for `query_params`, `false` for `simple_query`.
    pub parameterized: bool,
}

#[derive(Debug, Clone)]
struct Rule<T> {
    pattern: String,
    payload: T,
    remaining: Option<usize>,
}

impl<T: Clone> Rule<T> {
    fn matches(&self, sql: &str) -> bool {
        self.remaining != Some(0) && sql.contains(&self.pattern)
    }

    fn fire(&mut self) -> T {
        if let Some(n) = self.remaining.as_mut() {
            *n -= 1;
        }
        self.payload.clone()
    }
}

/// In-memory [`PgDriver`] that records every call and follows PostgreSQL's
/// transaction rules.
///
/// Savepoints, `BEGIN`/`COMMIT`/`ROLLBACK` and aborted-transaction behaviour are
/// emulated, including the server's warnings for `COMMIT`/`ROLLBACK` outside a
/// transaction. Failures, notices and result rows can be scripted per SQL fragment.
#[derive(Debug, Default)]
pub struct MockDriver {
    status: TransactionStatus,
    savepoints: Vec<String>,
    notices: NoticeSlot,
    executed: Vec<ExecutedStatement>,
    failures: Vec<Rule<DriverError>>,
    scripted_notices: Vec<Rule<Notice>>,
    responses: Vec<Rule<ResultSet>>,
}

impl MockDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start inside a transaction the caller opened before handing the connection over.
    #[must_use]
    pub fn in_transaction() -> Self {
        Self {
            status: TransactionStatus::InTransaction,
            ..Self::default()
        }
    }

    pub fn set_status(&mut self, status: TransactionStatus) {
        self.status = status;
    }

    /// Every call whose SQL contains `pattern` fails with `error`.
    #[must_use]
    pub fn fail_on(mut self, pattern: impl Into<String>, error: DriverError) -> Self {
        self.failures.push(Rule {
            pattern: pattern.into(),
            payload: error,
            remaining: None,
        });
        self
    }

    /// The next call whose SQL contains `pattern` fails with `error`.
    #[must_use]
    pub fn fail_once(mut self, pattern: impl Into<String>, error: DriverError) -> Self {
        self.failures.push(Rule {
            pattern: pattern.into(),
            payload: error,
            remaining: Some(1),
        });
        self
    }

    /// Every call whose SQL contains `pattern` emits `notice` while it runs.
    #[must_use]
    pub fn notice_on(mut self, pattern: impl Into<String>, notice: Notice) -> Self {
        self.scripted_notices.push(Rule {
            pattern: pattern.into(),
            payload: notice,
            remaining: None,
        });
        self
    }

    /// Calls whose SQL contains `pattern` return `rows`. Earlier registrations win.
    #[must_use]
    pub fn respond_with(mut self, pattern: impl Into<String>, rows: ResultSet) -> Self {
        self.responses.push(Rule {
            pattern: pattern.into(),
            payload: rows,
            remaining: None,
        });
        self
    }

    #[must_use]
    pub fn executed(&self) -> &[ExecutedStatement] {
        &self.executed
    }

    /// SQL text of every call, in order.
    #[must_use]
    pub fn sql_log(&self) -> Vec<&str> {
        self.executed.iter().map(|s| s.sql.as_str()).collect()
    }

    pub fn clear_log(&mut self) {
        self.executed.clear();
    }

    /// Savepoints the emulated server currently holds, outermost first.
    #[must_use]
    pub fn server_savepoints(&self) -> &[String] {
        &self.savepoints
    }

    fn run(
        &mut self,
        sql: &str,
        params: &[RowValues],
        parameterized: bool,
    ) -> Result<ResultSet, DriverError> {
        self.executed.push(ExecutedStatement {
            sql: sql.to_owned(),
            params: params.to_vec(),
            parameterized,
        });

        let notices: Vec<Notice> = self
            .scripted_notices
            .iter_mut()
            .filter(|rule| rule.matches(sql))
            .map(Rule::fire)
            .collect();
        for notice in &notices {
            self.notices.dispatch(notice);
        }

        let kinds = classify_all(sql);
        if let Some(rule) = self.failures.iter_mut().find(|rule| rule.matches(sql)) {
            let err = rule.fire();
            self.abort_block(&kinds);
            return Err(err);
        }

        for kind in kinds.iter().cloned() {
            if let Err(err) = self.apply(kind) {
                self.abort_block(&kinds);
                return Err(err);
            }
        }

        Ok(self
            .responses
            .iter_mut()
            .find(|rule| rule.matches(sql))
            .map(Rule::fire)
            .unwrap_or_default())
    }

    /// A failed lone `COMMIT`/`ROLLBACK` still ends the block; any other failure aborts it.
    fn abort_block(&mut self, kinds: &[StatementKind]) {
        if self.status == TransactionStatus::Idle {
            return;
        }
        if ends_block(kinds) {
            self.status = TransactionStatus::Idle;
            self.savepoints.clear();
        } else {
            self.status = TransactionStatus::InError;
        }
    }

    fn apply(&mut self, kind: StatementKind) -> Result<(), DriverError> {
        let idle = self.status == TransactionStatus::Idle;
        if self.status == TransactionStatus::InError
            && !matches!(
                kind,
                StatementKind::Commit | StatementKind::Rollback | StatementKind::RollbackTo(_)
            )
        {
            return Err(DriverError::new(
                "current transaction is aborted, commands ignored until end of transaction block",
            )
            .with_code("25P02"));
        }

        match kind {
            StatementKind::Begin if idle => self.status = TransactionStatus::InTransaction,
            StatementKind::Begin => self.notices.dispatch(
                &Notice::warning("there is already a transaction in progress").with_code("25001"),
            ),
            StatementKind::Commit | StatementKind::Rollback if idle => self.notices.dispatch(
                &Notice::warning("there is no transaction in progress").with_code("25P01"),
            ),
            StatementKind::Commit | StatementKind::Rollback => {
                self.status = TransactionStatus::Idle;
                self.savepoints.clear();
            }
            StatementKind::Savepoint(_) if idle => {
                return Err(outside_block("SAVEPOINT"));
            }
            StatementKind::Savepoint(name) => self.savepoints.push(name),
            StatementKind::Release(_) if idle => {
                return Err(outside_block("RELEASE SAVEPOINT"));
            }
            StatementKind::Release(name) => {
                let pos = self.find_savepoint(&name)?;
                self.savepoints.truncate(pos);
            }
            StatementKind::RollbackTo(_) if idle => {
                return Err(outside_block("ROLLBACK TO SAVEPOINT"));
            }
            StatementKind::RollbackTo(name) => {
                let pos = self.find_savepoint(&name)?;
                self.savepoints.truncate(pos + 1);
                self.status = TransactionStatus::InTransaction;
            }
            StatementKind::Other => {}
        }
        Ok(())
    }

    fn find_savepoint(&self, name: &str) -> Result<usize, DriverError> {
        self.savepoints
            .iter()
            .rposition(|sp| sp == name)
            .ok_or_else(|| {
                DriverError::new(format!("savepoint \"{name}\" does not exist")).with_code("3B001")
            })
    }
}

fn outside_block(command: &str) -> DriverError {
    DriverError::new(format!("{command} can only be used in transaction blocks")).with_code("25P01")
}

#[async_trait]
impl PgDriver for MockDriver {
    async fn simple_query(&mut self, sql: &str) -> Result<ResultSet, DriverError> {
        self.run(sql, &[], false)
    }

    async fn query_params(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, DriverError> {
        self.run(sql, params, true)
    }

    fn transaction_status(&self) -> TransactionStatus {
        self.status
    }

    fn notices(&self) -> &NoticeSlot {
        &self.notices
    }
}
