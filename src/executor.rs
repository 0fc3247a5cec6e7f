use crate::adapter::ConnectionAdapter;
use crate::driver::PgDriver;
use crate::error::QueryError;
use crate::results::ResultSet;
use crate::translate::translate;
use crate::types::QueryAndParams;

impl<D: PgDriver> ConnectionAdapter<D> {
    /// Run raw SQL text; several `;`-separated statements are allowed.
    ///
    /// # Errors
    /// Returns [`QueryError`] if the driver fails or the server raises a warning at or
    /// above the configured threshold.
    pub async fn execute_sql_command(&mut self, sql: &str) -> Result<ResultSet, QueryError> {
        tracing::debug!(sql = %sql, "executing sql command");
        let slot = self.driver.notices().clone();
        translate(
            &slot,
            self.options.warning_threshold,
            self.driver.simple_query(sql),
        )
        .await
    }

    /// Run one statement with its positional parameters bound out of band.
    ///
    /// # Errors
    /// Returns [`QueryError`] if the driver fails or the server raises a warning at or
    /// above the configured threshold.
    pub async fn execute_parameterized(
        &mut self,
        query: &QueryAndParams,
    ) -> Result<ResultSet, QueryError> {
        tracing::debug!(
            sql = %query.query,
            params = query.params.len(),
            "executing parameterized query"
        );
        let slot = self.driver.notices().clone();
        translate(
            &slot,
            self.options.warning_threshold,
            self.driver.query_params(&query.query, &query.params),
        )
        .await
    }
}
