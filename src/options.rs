use serde::{Deserialize, Deserializer, Serialize};

use crate::notice::Severity;

/// Default cap on attempts to draw an unused savepoint name.
pub const DEFAULT_MAX_NAME_ATTEMPTS: usize = 64;

/// Behaviour knobs for a [`ConnectionAdapter`](crate::adapter::ConnectionAdapter).
///
/// ```rust
/// use pg_savepoint_adapter::prelude::*;
///
/// let options = AdapterOptions::default().with_warning_threshold(Severity::Notice);
/// assert_eq!(options.warning_threshold, Severity::Notice);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterOptions {
    /// Notices at or above this severity turn the call that raised them into an error.
    pub warning_threshold: Severity,
    /// Attempts to find a savepoint name not already in use before giving up.
    #[serde(deserialize_with = "at_least_one")]
    pub max_name_attempts: usize,
}

fn at_least_one<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    Ok(usize::deserialize(deserializer)?.max(1))
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            warning_threshold: Severity::Warning,
            max_name_attempts: DEFAULT_MAX_NAME_ATTEMPTS,
        }
    }
}

impl AdapterOptions {
    #[must_use]
    pub fn with_warning_threshold(mut self, threshold: Severity) -> Self {
        self.warning_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_max_name_attempts(mut self, attempts: usize) -> Self {
        self.max_name_attempts = attempts.max(1);
        self
    }
}
