/*!
 * Task Types
 * Lifecycle states and read-only task snapshots
 */

use crate::core::limits::NUM_REGISTERS;
use crate::core::types::{Priority, TaskId};
use crate::cpu::Exit;
use serde::{Deserialize, Serialize};

/// Task lifecycle state
///
/// `Admitted -> Dispatched -> {Preempted -> Dispatched ... | Completed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Registered, never dispatched
    Admitted,
    /// An execution context currently owns the task's CPU state
    Dispatched,
    /// Stopped by the preemption flag, resumable at its saved `pc`
    Preempted,
    /// Terminal
    Completed,
}

impl TaskState {
    #[inline(always)]
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Snapshot of one task for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TaskInfo {
    pub id: TaskId,
    pub priority: Priority,
    pub state: TaskState,
    pub completed: bool,
    /// How the last dispatch stopped; `Exhausted` marks a run past the end
    /// of a program without HALT
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit: Option<Exit>,
    pub dispatches: u64,
    /// CPU fields are absent while the task is dispatched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pc: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sp: Option<isize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registers: Option<[i32; NUM_REGISTERS]>,
}
