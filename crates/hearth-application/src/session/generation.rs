use std::sync::atomic::{AtomicBool, Ordering};

use hearth_core::error::{HearthError, Result};

/// In-flight marker for AI generation (`Idle` / `AwaitingResponse`).
#[derive(Debug, Default)]
pub(crate) struct GenerationFlag {
    active: AtomicBool,
}

impl GenerationFlag {
    /// Moves to `AwaitingResponse`, or fails with `HearthError::Busy` if a
    /// generation is already running.
    pub(crate) fn try_begin(&self) -> Result<GenerationGuard<'_>> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| HearthError::Busy)?;
        Ok(GenerationGuard { flag: self })
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Returns the flag to `Idle` when dropped, on every exit path.
#[derive(Debug)]
#[must_use]
pub(crate) struct GenerationGuard<'a> {
    flag: &'a GenerationFlag,
}

impl Drop for GenerationGuard<'_> {
    fn drop(&mut self) {
        self.flag.active.store(false, Ordering::Release);
    }
}
