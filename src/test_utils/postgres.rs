//! Embedded PostgreSQL for integration tests.

use postgresql_embedded::PostgreSQL;

use crate::postgres::{PgConfig, PostgresOptions};

/// A running embedded server and the options that reach its test database.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub options: PostgresOptions,
}

/// Start an embedded server and create `dbname` on it.
///
/// # Errors
/// Returns an error if the server cannot be installed, started or provisioned.
pub async fn setup_postgres_embedded(
    dbname: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    let mut postgresql = PostgreSQL::default();
    postgresql.setup().await?;
    postgresql.start().await?;
    postgresql.create_database(dbname).await?;

    let settings = postgresql.settings();
    let mut config = PgConfig::new();
    config.host = Some(settings.host.clone());
    config.port = Some(settings.port);
    config.user = Some(settings.username.clone());
    config.password = Some(settings.password.clone());
    config.dbname = Some(dbname.to_string());
    tracing::info!(port = settings.port, dbname, "embedded postgres started");

    Ok(EmbeddedPostgres {
        postgresql,
        options: PostgresOptions::new(config),
    })
}

/// Stop a server started by [`setup_postgres_embedded`].
pub async fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    if let Err(e) = postgres.postgresql.stop().await {
        tracing::warn!(error = %e, "embedded postgres did not stop cleanly");
    }
}
