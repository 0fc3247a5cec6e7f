//! Turns a driver call into a `Result<_, QueryError>`, including warnings the server
//! raised while the call ran.
//!
//! Warnings arrive on the connection's [`NoticeSlot`], not in the call's return value.
//! [`WarningScope`] installs a capturing handler for exactly the duration of one call
//! and puts back the handler it displaced when it is dropped, whatever the exit path.
//! Scopes nest: an inner scope restores the outer scope's handler, the outer one
//! restores whatever was there before it.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{DriverError, QueryError};
use crate::notice::{Notice, NoticeHandler, NoticeSlot, Severity};

type Captured = Arc<Mutex<Option<Notice>>>;

fn lock(captured: &Captured) -> MutexGuard<'_, Option<Notice>> {
    match captured.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Guard that captures notices at or above a severity while it is alive.
pub struct WarningScope {
    slot: NoticeSlot,
    previous: Option<NoticeHandler>,
    captured: Captured,
}

impl WarningScope {
    /// Install a capturing handler on `slot`.
    ///
    /// Notices below `threshold` are passed on to the handler that was installed
    /// before, so an enclosing scope or the caller's own handler still sees them.
    #[must_use]
    pub fn install(slot: &NoticeSlot, threshold: Severity) -> Self {
        let captured: Captured = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&captured);
        let forward = slot.current();
        let handler: NoticeHandler = Arc::new(move |notice: &Notice| {
            if notice.severity >= threshold {
                let mut first = lock(&sink);
                if first.is_none() {
                    *first = Some(notice.clone());
                }
            } else if let Some(outer) = &forward {
                outer(notice);
            } else {
                tracing::debug!(
                    severity = %notice.severity,
                    message = %notice.message,
                    "server notice"
                );
            }
        });
        let previous = slot.replace(Some(handler));
        Self {
            slot: slot.clone(),
            previous,
            captured,
        }
    }

    /// The first notice at or above the threshold seen so far.
    #[must_use]
    pub fn take_warning(&self) -> Option<Notice> {
        lock(&self.captured).take()
    }
}

impl Drop for WarningScope {
    fn drop(&mut self) {
        self.slot.replace(self.previous.take());
    }
}

/// Run `call` with warnings on `slot` translated into [`QueryError::Warning`].
///
/// A driver failure wins over a warning captured during the same call. When only a
/// warning was raised, the call's result is discarded.
///
/// # Errors
/// Returns [`QueryError::Driver`] when `call` fails and [`QueryError::Warning`] when the
/// server raised a notice at or above `threshold` while it ran.
pub async fn translate<T, F>(
    slot: &NoticeSlot,
    threshold: Severity,
    call: F,
) -> Result<T, QueryError>
where
    F: Future<Output = Result<T, DriverError>>,
{
    let scope = WarningScope::install(slot, threshold);
    let outcome = call.await;
    let warning = scope.take_warning();
    drop(scope);

    match (outcome, warning) {
        (Err(err), _) => Err(QueryError::from(err)),
        (Ok(_), Some(notice)) => {
            tracing::warn!(
                severity = %notice.severity,
                code = notice.code.as_deref().unwrap_or(""),
                message = %notice.message,
                "server warning translated into a query error"
            );
            Err(QueryError::Warning {
                severity: notice.severity,
                message: notice.message,
                code: notice.code,
            })
        }
        (Ok(value), None) => Ok(value),
    }
}
