use crate::driver::PgDriver;
use crate::options::AdapterOptions;
use crate::savepoint::{RandomNamer, SavepointNamer, SavepointStack};
use crate::types::TransactionStatus;

/// Nested transactions and checked execution over one PostgreSQL connection.
///
/// The adapter either owns the driver or borrows it (`ConnectionAdapter<&mut D>`);
/// it never closes the connection. Every operation takes `&mut self`, so calls on
/// one adapter never overlap.
pub struct ConnectionAdapter<D> {
    pub(crate) driver: D,
    pub(crate) options: AdapterOptions,
    pub(crate) savepoints: SavepointStack,
}

impl<D: PgDriver> ConnectionAdapter<D> {
    pub fn new(driver: D) -> Self {
        Self::with_options(driver, AdapterOptions::default())
    }

    pub fn with_options(driver: D, options: AdapterOptions) -> Self {
        Self::with_namer(driver, options, Box::new(RandomNamer))
    }

    /// Use `namer` for savepoint names instead of random ones.
    pub fn with_namer(driver: D, options: AdapterOptions, namer: Box<dyn SavepointNamer>) -> Self {
        Self {
            driver,
            options,
            savepoints: SavepointStack::new(namer),
        }
    }

    #[must_use]
    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Status as the connection reports it right now.
    #[must_use]
    pub fn transaction_status(&self) -> TransactionStatus {
        self.driver.transaction_status()
    }

    /// Number of savepoint levels opened by this adapter and not yet closed.
    #[must_use]
    pub fn transaction_depth(&self) -> usize {
        self.savepoints.depth()
    }

    /// Open savepoints, outermost first.
    #[must_use]
    pub fn open_savepoints(&self) -> &[String] {
        self.savepoints.names()
    }

    /// Whether `name` is held by an open (or not cleanly released) savepoint.
    #[must_use]
    pub fn is_savepoint_registered(&self, name: &str) -> bool {
        self.savepoints.is_registered(name)
    }

    /// Hand the driver back to the caller.
    pub fn into_inner(self) -> D {
        self.driver
    }
}
