//! Test support: a scripted in-memory driver and, with `test-utils-postgres`, an
//! embedded PostgreSQL server.

pub mod mock;

#[cfg(feature = "test-utils-postgres")]
pub mod postgres;

pub use mock::{ExecutedStatement, MockDriver};
