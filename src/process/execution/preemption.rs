/*!
 * Preemption Signal
 *
 * Cooperative cancellation contract between the scheduler and a running
 * execution context. The scheduler is the only writer; the engine polls the
 * flag once per instruction boundary and stops when it sees it raised.
 * Nothing here interrupts an instruction in flight, so the observed latency
 * is at most one instruction dispatch.
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-task preemption flag
///
/// Clones share the same underlying flag, so the scheduler keeps one handle
/// and moves another into the execution context.
#[derive(Debug, Clone, Default)]
pub struct PreemptionFlag {
    raised: Arc<AtomicBool>,
}

impl PreemptionFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset before a dispatch
    #[inline]
    pub fn clear(&self) {
        self.raised.store(false, Ordering::Release);
    }

    /// Ask the execution context to stop at its next instruction boundary
    #[inline]
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Polled by the engine between instructions
    ///
    /// # Performance
    /// Hot path - read once per retired instruction
    #[inline(always)]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}
