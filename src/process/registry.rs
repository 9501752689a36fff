/*!
 * Task Registry
 * Fixed-capacity, admission-ordered collection of tasks and their CPU state
 */

use super::execution::PreemptionFlag;
use super::types::{TaskInfo, TaskState};
use crate::core::errors::AdmissionError;
use crate::core::limits::MAX_TASKS;
use crate::core::types::{Priority, TaskId};
use crate::cpu::{CpuState, Exit, Program};
use std::sync::Arc;
use tracing::debug;

/// Opaque reference to an admitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(TaskId);

impl TaskHandle {
    #[inline(always)]
    pub const fn id(self) -> TaskId {
        self.0
    }

    #[inline(always)]
    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// An admitted task
///
/// The CPU state is boxed and moved into the execution context for the
/// length of a dispatch, so it is `None` exactly while the task runs.
#[derive(Debug)]
pub struct Task {
    id: TaskId,
    priority: Priority,
    program: Arc<Program>,
    state: TaskState,
    preempt: PreemptionFlag,
    cpu: Option<Box<CpuState>>,
    last_exit: Option<Exit>,
    dispatches: u64,
}

impl Task {
    fn new(id: TaskId, priority: Priority, program: Arc<Program>) -> Self {
        Self {
            id,
            priority,
            program,
            state: TaskState::Admitted,
            preempt: PreemptionFlag::new(),
            cpu: Some(Box::new(CpuState::new())),
            last_exit: None,
            dispatches: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[inline]
    pub fn handle(&self) -> TaskHandle {
        TaskHandle(self.id)
    }

    /// Informational only, never consulted by the scheduler
    #[inline]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    #[inline]
    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    #[inline]
    pub fn state(&self) -> TaskState {
        self.state
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }

    #[inline]
    pub fn preempt_flag(&self) -> &PreemptionFlag {
        &self.preempt
    }

    /// CPU state, unavailable while dispatched
    #[inline]
    pub fn cpu(&self) -> Option<&CpuState> {
        self.cpu.as_deref()
    }

    /// How the last dispatch stopped, `None` before the first one
    #[inline]
    pub fn last_exit(&self) -> Option<Exit> {
        self.last_exit
    }

    #[inline]
    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    pub fn info(&self) -> TaskInfo {
        let cpu = self.cpu();
        TaskInfo {
            id: self.id,
            priority: self.priority,
            state: self.state,
            completed: self.is_completed(),
            exit: self.last_exit,
            dispatches: self.dispatches,
            pc: cpu.map(CpuState::pc),
            sp: cpu.map(CpuState::sp),
            registers: cpu.map(|c| *c.registers()),
        }
    }

    /// Hand the CPU state to an execution context
    pub(crate) fn begin_dispatch(&mut self) -> Option<Box<CpuState>> {
        let cpu = self.cpu.take()?;
        self.preempt.clear();
        self.state = TaskState::Dispatched;
        self.dispatches += 1;
        Some(cpu)
    }

    /// Take the CPU state back after the context was joined
    pub(crate) fn end_dispatch(&mut self, cpu: Box<CpuState>, exit: Exit) {
        self.cpu = Some(cpu);
        self.last_exit = Some(exit);
        self.state = if exit.is_terminal() {
            TaskState::Completed
        } else {
            TaskState::Preempted
        };
    }
}

/// Fixed-capacity task table
#[derive(Debug)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    capacity: usize,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::with_capacity(MAX_TASKS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tasks: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Register a task; rejected without any state change when full
    pub fn admit(
        &mut self,
        priority: Priority,
        program: Arc<Program>,
    ) -> Result<TaskHandle, AdmissionError> {
        if self.is_full() {
            return Err(AdmissionError::AdmissionRejected {
                capacity: self.capacity,
            });
        }

        let id = self.tasks.len() as TaskId;
        debug!(task = id, priority, "Task admitted");
        self.tasks.push(Task::new(id, priority, program));
        Ok(TaskHandle(id))
    }

    #[inline]
    pub fn get(&self, handle: TaskHandle) -> Option<&Task> {
        self.tasks.get(handle.index())
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: TaskHandle) -> Option<&mut Task> {
        self.tasks.get_mut(handle.index())
    }

    /// Completion status, `None` for an unknown handle
    pub fn is_completed(&self, handle: TaskHandle) -> Option<bool> {
        self.get(handle).map(Task::is_completed)
    }

    /// Tasks in admission order
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Handles of tasks the next sweep will visit, in admission order
    pub fn runnable(&self) -> Vec<TaskHandle> {
        self.tasks
            .iter()
            .filter(|t| !t.is_completed())
            .map(Task::handle)
            .collect()
    }

    pub fn incomplete_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_completed()).count()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.tasks.len() >= self.capacity
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
