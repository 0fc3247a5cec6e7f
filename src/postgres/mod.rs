// PostgreSQL backend - a `PgDriver` over one tokio-postgres connection
//
// - config: connection options and validation
// - params: `RowValues` <-> postgres type conversion
// - query: result set building
// - driver: the `PgDriver` implementation and its notice-forwarding task

pub mod config;
pub mod driver;
pub mod params;
pub mod query;

pub use config::PostgresOptions;
pub use deadpool_postgres::Config as PgConfig;
pub use driver::PgClientDriver;
pub use params::Params;
