//! Server notices and the per-connection slot they are delivered through.
//!
//! A connection emits notices (warnings, informational messages) out of band from
//! the results of the call that caused them. The driver pushes every notice into its
//! [`NoticeSlot`]; whoever has a handler installed there at that moment receives it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

/// Notice severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Log,
    Info,
    Notice,
    Warning,
    Error,
}

impl Severity {
    /// Map a server severity keyword (`WARNING`, `DEBUG2`, ...) onto [`Severity`].
    ///
    /// Unrecognised keywords are treated as [`Severity::Notice`].
    #[must_use]
    pub fn parse(keyword: &str) -> Self {
        let upper = keyword.trim().to_ascii_uppercase();
        match upper.as_str() {
            "LOG" => Self::Log,
            "INFO" => Self::Info,
            "NOTICE" => Self::Notice,
            "WARNING" => Self::Warning,
            "ERROR" | "FATAL" | "PANIC" => Self::Error,
            s if s.starts_with("DEBUG") => Self::Debug,
            _ => Self::Notice,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            Self::Debug => "DEBUG",
            Self::Log => "LOG",
            Self::Info => "INFO",
            Self::Notice => "NOTICE",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        };
        f.write_str(keyword)
    }
}

/// A message the server sent alongside a command's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    /// SQLSTATE, e.g. `25P01` for "there is no transaction in progress".
    pub code: Option<String>,
    pub message: String,
}

impl Notice {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }
}

/// Callback receiving notices delivered to a [`NoticeSlot`].
pub type NoticeHandler = Arc<dyn Fn(&Notice) + Send + Sync>;

/// Holder for the notice handler currently installed on one connection.
///
/// Clones share the same slot, so the task that reads from the socket and the
/// adapter that installs handlers see one value.
#[derive(Clone, Default)]
pub struct NoticeSlot {
    handler: Arc<Mutex<Option<NoticeHandler>>>,
}

impl NoticeSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<NoticeHandler>> {
        match self.handler.lock() {
            Ok(guard) => guard,
            // A handler that panicked leaves nothing half-written behind.
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Install `handler`, returning whatever was installed before.
    pub fn replace(&self, handler: Option<NoticeHandler>) -> Option<NoticeHandler> {
        std::mem::replace(&mut *self.lock(), handler)
    }

    /// The currently installed handler.
    #[must_use]
    pub fn current(&self) -> Option<NoticeHandler> {
        self.lock().clone()
    }

    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.lock().is_some()
    }

    /// Deliver `notice` to the installed handler, or log it when there is none.
    pub fn dispatch(&self, notice: &Notice) {
        // Call outside the lock: a handler may itself touch the slot.
        match self.current() {
            Some(handler) => handler(notice),
            None => tracing::debug!(
                severity = %notice.severity,
                code = notice.code.as_deref().unwrap_or(""),
                message = %notice.message,
                "unhandled server notice"
            ),
        }
    }
}

impl fmt::Debug for NoticeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoticeSlot")
            .field("installed", &self.is_installed())
            .finish()
    }
}
