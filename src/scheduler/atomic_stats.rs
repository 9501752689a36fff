/*!
 * Lock-Free Scheduler Statistics
 * Atomic counters updated by the scheduler after each joined dispatch
 */

use super::types::SchedulerStats;
use crate::cpu::RunReport;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic scheduler statistics
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - Relaxed ordering; the join already orders the values being counted
#[repr(C, align(64))]
pub struct AtomicSchedulerStats {
    sweeps: AtomicU64,
    dispatches: AtomicU64,
    preemptions: AtomicU64,
    completions: AtomicU64,
    instructions: AtomicU64,
    unknown_opcodes: AtomicU64,
    stack_overflows: AtomicU64,
    stack_underflows: AtomicU64,
    slice_micros: AtomicU64,
}

impl AtomicSchedulerStats {
    #[inline]
    pub fn new(slice_micros: u64) -> Self {
        Self {
            sweeps: AtomicU64::new(0),
            dispatches: AtomicU64::new(0),
            preemptions: AtomicU64::new(0),
            completions: AtomicU64::new(0),
            instructions: AtomicU64::new(0),
            unknown_opcodes: AtomicU64::new(0),
            stack_overflows: AtomicU64::new(0),
            stack_underflows: AtomicU64::new(0),
            slice_micros: AtomicU64::new(slice_micros),
        }
    }

    /// Start a sweep, returning its 1-based number
    #[inline]
    pub fn inc_sweeps(&self) -> u64 {
        self.sweeps.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline(always)]
    pub fn inc_dispatches(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_preemptions(&self) {
        self.preemptions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_completions(&self) {
        self.completions.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold one dispatch's engine counters in
    #[inline]
    pub fn record_run(&self, report: &RunReport) {
        self.instructions
            .fetch_add(report.retired, Ordering::Relaxed);
        self.unknown_opcodes
            .fetch_add(report.unknown_opcodes, Ordering::Relaxed);
        self.stack_overflows
            .fetch_add(report.stack_overflows, Ordering::Relaxed);
        self.stack_underflows
            .fetch_add(report.stack_underflows, Ordering::Relaxed);
    }

    /// Get snapshot of current stats
    ///
    /// # Note
    /// Counters are read individually and may be mutually inconsistent
    /// while a run is in progress.
    #[inline]
    pub fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            sweeps: self.sweeps.load(Ordering::Relaxed),
            dispatches: self.dispatches.load(Ordering::Relaxed),
            preemptions: self.preemptions.load(Ordering::Relaxed),
            completions: self.completions.load(Ordering::Relaxed),
            instructions: self.instructions.load(Ordering::Relaxed),
            unknown_opcodes: self.unknown_opcodes.load(Ordering::Relaxed),
            stack_overflows: self.stack_overflows.load(Ordering::Relaxed),
            stack_underflows: self.stack_underflows.load(Ordering::Relaxed),
            slice_micros: self.slice_micros.load(Ordering::Relaxed),
        }
    }
}
