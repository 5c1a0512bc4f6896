use std::sync::atomic::{AtomicBool, Ordering};

use crate::ParseError;

/// At most one request in flight per object.
#[derive(Debug, Default)]
pub(crate) struct BusyFlag(AtomicBool);

impl BusyFlag {
    pub(crate) fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn acquire(&self, owner: &'static str) -> Result<BusyGuard<'_>, ParseError> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(&self.0))
            .map_err(|_| ParseError::Busy(owner))
    }
}

/// Clears the flag on drop, including when the request future is cancelled.
pub(crate) struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
