/*!
 * System Limits and Constants
 *
 * Centralized location for the virtual CPU geometry, registry capacity and
 * scheduling time bounds.
 *
 * ## Layout
 * - Values are grouped by domain (cpu, registry, scheduling)
 * - Performance-sensitive constants are marked with [PERF]
 */

use std::time::Duration;

// =============================================================================
// VIRTUAL CPU
// =============================================================================

/// Width of the general-purpose register file (R0..R7)
pub const NUM_REGISTERS: usize = 8;

/// Per-task stack slots
/// The stack grows downwards from `STACK_SIZE - 1`
pub const STACK_SIZE: usize = 256;

/// Per-task scratch heap in bytes
/// Reserved and zeroed, no instruction touches it
pub const HEAP_SIZE: usize = 1024;

// =============================================================================
// TASK REGISTRY
// =============================================================================

/// Default registry capacity
pub const MAX_TASKS: usize = 5;

// =============================================================================
// SCHEDULING
// =============================================================================

/// Default wall-clock slice granted to each dispatch
pub const DEFAULT_TIME_SLICE: Duration = Duration::from_secs(2);

/// Smallest accepted slice
/// [PERF] Below this the timer resolution dominates anyway
pub const MIN_TIME_SLICE: Duration = Duration::from_micros(1);

/// Largest accepted slice
pub const MAX_TIME_SLICE: Duration = Duration::from_secs(60);
