/*!
 * Virtual CPU Kernel Library
 * Round-robin, cooperatively preempted multitasking over a minimal virtual CPU
 */

pub mod core;
pub mod cpu;
pub mod monitoring;
pub mod process;
pub mod scheduler;

// Re-exports
pub use crate::core::errors::*;
pub use crate::core::types::{KernelResult, Priority, TaskId};
pub use cpu::{CpuState, Engine, Exit, Instruction, Program, Register};
pub use monitoring::{
    init_tracing, JsonLinesSink, MemorySink, NullSink, TraceEvent, TraceSink, TracingSink,
};
pub use process::{PreemptionFlag, Task, TaskHandle, TaskInfo, TaskRegistry, TaskState};
pub use scheduler::{
    RunSummary, Scheduler, SchedulerBuilder, SchedulerConfig, SchedulerStats, TimeSlice,
};
