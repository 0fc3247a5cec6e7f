use std::future::poll_fn;

use async_trait::async_trait;
use tokio_postgres::error::DbError;
use tokio_postgres::tls::NoTlsStream;
use tokio_postgres::{AsyncMessage, Client, Connection, NoTls, Socket};

use crate::adapter::ConnectionAdapter;
use crate::driver::PgDriver;
use crate::error::{AdapterError, DriverError};
use crate::notice::{Notice, NoticeSlot, Severity};
use crate::results::ResultSet;
use crate::status::StatusTracker;
use crate::types::{RowValues, TransactionStatus};

use super::config::PostgresOptions;
use super::params::Params;
use super::query::{build_result_set_from_messages, build_result_set_from_rows, driver_error};

fn notice_from_db_error(notice: &DbError) -> Notice {
    Notice::new(Severity::parse(notice.severity()), notice.message())
        .with_code(notice.code().code())
}

/// A single tokio-postgres connection exposed as a [`PgDriver`].
///
/// The connection half runs on a spawned task that forwards every server notice into
/// this driver's [`NoticeSlot`] before any later message on the socket is processed,
/// so a call's notices are delivered before the call returns.
pub struct PgClientDriver {
    client: Client,
    notices: NoticeSlot,
    tracker: StatusTracker,
}

impl PgClientDriver {
    /// Connect with `options` and start the connection task.
    ///
    /// # Errors
    /// Returns `AdapterError::Config` for incomplete settings and
    /// `AdapterError::Postgres` if the connection cannot be established.
    pub async fn connect(options: &PostgresOptions) -> Result<Self, AdapterError> {
        let config = options.to_pg_config()?;
        tracing::debug!(
            hosts = ?config.get_hosts(),
            dbname = ?config.get_dbname(),
            user = ?config.get_user(),
            "connecting to postgres"
        );
        let (client, connection) = config.connect(NoTls).await?;
        let notices = NoticeSlot::new();
        // Ends by itself once the client is dropped and the socket closes.
        tokio::spawn(drive_connection(connection, notices.clone()));
        Ok(Self {
            client,
            notices,
            tracker: StatusTracker::default(),
        })
    }

    /// Wrap a client whose connection half the caller drives.
    ///
    /// Notices reach `notices` only if the caller forwards them there. `status` is
    /// the transaction state the client is in right now.
    #[must_use]
    pub fn from_client(client: Client, notices: NoticeSlot, status: TransactionStatus) -> Self {
        Self {
            client,
            notices,
            tracker: StatusTracker::new(status),
        }
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }
}

async fn drive_connection(mut connection: Connection<Socket, NoTlsStream>, notices: NoticeSlot) {
    loop {
        match poll_fn(|cx| connection.poll_message(cx)).await {
            Some(Ok(AsyncMessage::Notice(notice))) => {
                notices.dispatch(&notice_from_db_error(&notice));
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::error!(error = %e, "postgres connection closed with error");
                break;
            }
            None => break,
        }
    }
}

#[async_trait]
impl PgDriver for PgClientDriver {
    async fn simple_query(&mut self, sql: &str) -> Result<ResultSet, DriverError> {
        match self.client.simple_query(sql).await {
            Ok(messages) => {
                self.tracker.observe_success(sql);
                Ok(build_result_set_from_messages(&messages))
            }
            Err(e) => {
                self.tracker.observe_failure(sql);
                Err(driver_error(&e))
            }
        }
    }

    async fn query_params(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, DriverError> {
        let converted = Params::convert(params);
        let outcome = self.client.query(sql, converted.as_refs()).await;
        match outcome {
            Ok(rows) => {
                self.tracker.observe_success(sql);
                build_result_set_from_rows(&rows)
            }
            Err(e) => {
                self.tracker.observe_failure(sql);
                Err(driver_error(&e))
            }
        }
    }

    fn transaction_status(&self) -> TransactionStatus {
        self.tracker.status()
    }

    fn notices(&self) -> &NoticeSlot {
        &self.notices
    }
}

impl ConnectionAdapter<PgClientDriver> {
    /// Open a connection and wrap it in an adapter configured from `options.adapter`.
    ///
    /// # Errors
    /// Returns the errors of [`PgClientDriver::connect`].
    pub async fn connect(options: &PostgresOptions) -> Result<Self, AdapterError> {
        let driver = PgClientDriver::connect(options).await?;
        Ok(Self::with_options(driver, options.adapter))
    }
}
