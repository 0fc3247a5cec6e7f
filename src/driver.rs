use async_trait::async_trait;

use crate::error::DriverError;
use crate::notice::NoticeSlot;
use crate::results::ResultSet;
use crate::types::{RowValues, TransactionStatus};

/// The calls the adapter needs from a PostgreSQL connection.
///
/// Implementations must report failures through the returned `Result` and route
/// every server notice produced during a call into [`PgDriver::notices`] before that
/// call resolves.
#[async_trait]
pub trait PgDriver: Send {
    /// Run SQL text over the simple-query protocol. The text may hold several statements.
    async fn simple_query(&mut self, sql: &str) -> Result<ResultSet, DriverError>;

    /// Run one statement with `$1..$N` bound to `params`, in order.
    async fn query_params(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, DriverError>;

    /// Transaction state as of the last completed call.
    fn transaction_status(&self) -> TransactionStatus;

    /// Slot that receives this connection's notices.
    fn notices(&self) -> &NoticeSlot;
}

#[async_trait]
impl<T: PgDriver + ?Sized> PgDriver for &mut T {
    async fn simple_query(&mut self, sql: &str) -> Result<ResultSet, DriverError> {
        (**self).simple_query(sql).await
    }

    async fn query_params(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, DriverError> {
        (**self).query_params(sql, params).await
    }

    fn transaction_status(&self) -> TransactionStatus {
        (**self).transaction_status()
    }

    fn notices(&self) -> &NoticeSlot {
        (**self).notices()
    }
}

#[async_trait]
impl<T: PgDriver + ?Sized> PgDriver for Box<T> {
    async fn simple_query(&mut self, sql: &str) -> Result<ResultSet, DriverError> {
        (**self).simple_query(sql).await
    }

    async fn query_params(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, DriverError> {
        (**self).query_params(sql, params).await
    }

    fn transaction_status(&self) -> TransactionStatus {
        (**self).transaction_status()
    }

    fn notices(&self) -> &NoticeSlot {
        (**self).notices()
    }
}
