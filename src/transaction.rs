//! Nested transactions: the outermost level is a plain `BEGIN`/`COMMIT`, every level
//! opened while a transaction is already active becomes a savepoint.

use futures_util::future::BoxFuture;

use crate::adapter::ConnectionAdapter;
use crate::driver::PgDriver;
use crate::error::{TransactionError, TransactionStep};
use crate::quoting::quote_identifier;
use crate::types::TransactionStatus;

impl<D: PgDriver> ConnectionAdapter<D> {
    /// Open a transaction level.
    ///
    /// Issues `BEGIN` when the connection is idle. When a transaction is already open
    /// (started by this adapter or by the caller, healthy or failed) a fresh savepoint
    /// is created and pushed instead.
    ///
    /// # Errors
    /// Returns [`TransactionError`] with step `Begin` or `SavepointCreate`.
    pub async fn open_transaction(&mut self) -> Result<(), TransactionError> {
        match self.driver.transaction_status() {
            TransactionStatus::Idle => {
                if self.savepoints.depth() > 0 {
                    tracing::warn!(
                        stale = ?self.savepoints.names(),
                        "connection is idle, discarding savepoints of a finished transaction"
                    );
                    self.savepoints.clear();
                }
                self.execute_sql_command("BEGIN")
                    .await
                    .map_err(|e| TransactionError::outer(TransactionStep::Begin, e))?;
                tracing::debug!("transaction started");
            }
            TransactionStatus::InTransaction | TransactionStatus::InError => {
                let name = self
                    .savepoints
                    .fresh_name(self.options.max_name_attempts)
                    .map_err(|e| TransactionError::outer(TransactionStep::SavepointCreate, e))?;
                self.execute_sql_command(&format!("SAVEPOINT {}", quote_identifier(&name)))
                    .await
                    .map_err(|e| {
                        TransactionError::savepoint(TransactionStep::SavepointCreate, &name, e)
                    })?;
                self.savepoints.push(name);
                tracing::debug!(
                    savepoint = self.savepoints.names().last().map(String::as_str),
                    depth = self.savepoints.depth(),
                    "savepoint created"
                );
            }
        }
        Ok(())
    }

    /// Close the innermost level successfully.
    ///
    /// Releases the innermost savepoint, or issues `COMMIT` when none is open. A
    /// savepoint whose release failed stays registered so its name is not reused.
    ///
    /// # Errors
    /// Returns [`TransactionError`] with step `SavepointRelease` or `Commit`.
    pub async fn commit_transaction(&mut self) -> Result<(), TransactionError> {
        let Some(name) = self.savepoints.pop() else {
            self.execute_sql_command("COMMIT")
                .await
                .map_err(|e| TransactionError::outer(TransactionStep::Commit, e))?;
            tracing::debug!("transaction committed");
            return Ok(());
        };

        self.execute_sql_command(&format!("RELEASE SAVEPOINT {}", quote_identifier(&name)))
            .await
            .map_err(|e| TransactionError::savepoint(TransactionStep::SavepointRelease, &name, e))?;
        self.savepoints.forget(&name);
        tracing::debug!(
            savepoint = %name,
            depth = self.savepoints.depth(),
            "savepoint released"
        );
        Ok(())
    }

    /// Abandon the innermost level.
    ///
    /// Rolls back to the innermost savepoint and releases it, or issues `ROLLBACK`
    /// when none is open. The savepoint's name is unregistered whichever sub-step fails.
    ///
    /// # Errors
    /// Returns [`TransactionError`] with step `SavepointRollback`, `SavepointRelease`
    /// or `Rollback`.
    pub async fn rollback_transaction(&mut self) -> Result<(), TransactionError> {
        let Some(name) = self.savepoints.pop() else {
            self.execute_sql_command("ROLLBACK")
                .await
                .map_err(|e| TransactionError::outer(TransactionStep::Rollback, e))?;
            tracing::debug!("transaction rolled back");
            return Ok(());
        };

        let quoted = quote_identifier(&name);
        let rolled_back = self.execute_sql_command(&format!("ROLLBACK TO {quoted}")).await;
        let outcome = match rolled_back {
            Err(e) => Err(TransactionError::savepoint(
                TransactionStep::SavepointRollback,
                &name,
                e,
            )),
            Ok(_) => self
                .execute_sql_command(&format!("RELEASE SAVEPOINT {quoted}"))
                .await
                .map(|_| ())
                .map_err(|e| {
                    TransactionError::savepoint(TransactionStep::SavepointRelease, &name, e)
                }),
        };
        self.savepoints.forget(&name);
        if outcome.is_ok() {
            tracing::debug!(
                savepoint = %name,
                depth = self.savepoints.depth(),
                "rolled back to savepoint"
            );
        }
        outcome
    }

    /// Run `work` inside its own transaction level.
    ///
    /// Commits the level when `work` returns `Ok`, rolls it back when it returns `Err`.
    /// A failed rollback is logged and the error from `work` is returned.
    ///
    /// ```rust,no_run
    /// # use pg_savepoint_adapter::prelude::*;
    /// # async fn demo<D: PgDriver>(
    /// #     adapter: &mut ConnectionAdapter<D>,
    /// # ) -> Result<(), AdapterError> {
    /// adapter
    ///     .in_transaction(|tx| {
    ///         Box::pin(async move {
    ///             tx.execute_sql_command("CREATE TABLE t (id int)").await?;
    ///             tx.insert_record(&FieldMap::new().with("id", 1), &"t".into()).await?;
    ///             Ok::<_, AdapterError>(())
    ///         })
    ///     })
    ///     .await
    /// # }
    /// ```
    ///
    /// # Errors
    /// Returns the error of `work`, or a [`TransactionError`] converted into `E` when the
    /// level cannot be opened or committed.
    pub async fn in_transaction<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, Result<T, E>>,
        E: From<TransactionError>,
    {
        self.open_transaction().await?;
        match work(self).await {
            Ok(value) => {
                self.commit_transaction().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback_transaction().await {
                    tracing::error!(
                        error = %rollback_err,
                        "rollback after failed work also failed"
                    );
                }
                Err(err)
            }
        }
    }
}
