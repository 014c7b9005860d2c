use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::DatastoreError;

/// A cooperative cancellation flag, cheap to clone and share across threads.
///
/// Mechanism-neutral by design: nothing here assumes tokio, a deadline, or any
/// particular host runtime. A caller with no cancellation source of its own passes
/// [`CancelToken::never`], which is indistinguishable from a fresh token until something
/// calls [`CancelToken::cancel`] on the clone it was handed.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    /// A token no caller will ever raise. Distinct name from `new` so call sites that do
    /// not care about cancellation say so.
    pub fn never() -> CancelToken {
        CancelToken::new()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(DatastoreError::Canceled)` if raised, `Ok(())` otherwise. Called at every
    /// suspension point a `DataSource` method passes through, not only on entry.
    pub fn check(&self) -> Result<(), DatastoreError> {
        if self.is_canceled() {
            Err(DatastoreError::Canceled)
        } else {
            Ok(())
        }
    }
}
