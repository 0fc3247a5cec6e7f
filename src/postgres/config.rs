use deadpool_postgres::Config as PgConfig;

use crate::error::AdapterError;
use crate::options::AdapterOptions;

/// Connection settings for [`PgClientDriver`](super::PgClientDriver) plus adapter options.
///
/// ```rust
/// use pg_savepoint_adapter::postgres::{PgConfig, PostgresOptions};
///
/// let mut cfg = PgConfig::new();
/// cfg.dbname = Some("app".into());
/// cfg.host = Some("localhost".into());
/// cfg.port = Some(5432);
/// cfg.user = Some("migrator".into());
/// let options = PostgresOptions::new(cfg);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct PostgresOptions {
    pub config: PgConfig,
    pub adapter: AdapterOptions,
}

impl PostgresOptions {
    #[must_use]
    pub fn new(config: PgConfig) -> Self {
        Self {
            config,
            adapter: AdapterOptions::default(),
        }
    }

    #[must_use]
    pub fn with_adapter_options(mut self, adapter: AdapterOptions) -> Self {
        self.adapter = adapter;
        self
    }

    /// Check that every field needed to connect is present.
    ///
    /// The password may be absent for trust or peer authentication.
    ///
    /// # Errors
    /// Returns `AdapterError::Config` naming the first missing field.
    pub fn validate(&self) -> Result<(), AdapterError> {
        let cfg = &self.config;
        if cfg.dbname.is_none() {
            return Err(AdapterError::Config("dbname is required".to_string()));
        }
        if cfg.host.is_none() && cfg.hosts.is_none() {
            return Err(AdapterError::Config("host is required".to_string()));
        }
        if cfg.port.is_none() && cfg.ports.is_none() {
            return Err(AdapterError::Config("port is required".to_string()));
        }
        if cfg.user.is_none() {
            return Err(AdapterError::Config("user is required".to_string()));
        }
        Ok(())
    }

    /// Validate and convert into a `tokio_postgres::Config`.
    ///
    /// # Errors
    /// Returns `AdapterError::Config` if validation or conversion fails.
    pub fn to_pg_config(&self) -> Result<tokio_postgres::Config, AdapterError> {
        self.validate()?;
        self.config
            .get_pg_config()
            .map_err(|e| AdapterError::Config(format!("invalid postgres config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> PgConfig {
        let mut cfg = PgConfig::new();
        cfg.dbname = Some("testing".to_string());
        cfg.host = Some("localhost".to_string());
        cfg.port = Some(5432);
        cfg.user = Some("testuser".to_string());
        cfg
    }

    #[test]
    fn missing_fields_are_named() {
        let mut cfg = complete();
        cfg.user = None;
        let err = PostgresOptions::new(cfg).validate().unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: user is required");

        let mut cfg = complete();
        cfg.dbname = None;
        let err = PostgresOptions::new(cfg).validate().unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: dbname is required");
    }

    #[test]
    fn converts_complete_config() {
        let pg = PostgresOptions::new(complete()).to_pg_config().unwrap();
        assert_eq!(pg.get_dbname(), Some("testing"));
        assert_eq!(pg.get_user(), Some("testuser"));
    }
}
