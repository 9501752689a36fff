/*!
 * Trace Events
 * Strongly-typed records for every dispatch, stack operation and scheduler
 * state transition
 */

use crate::core::types::{Priority, TaskId};
use crate::cpu::instruction::{Instruction, Register};
use serde::{Serialize, Serializer};
use std::fmt;

/// Event severity for routing to log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
}

/// One line of the execution trace
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    // Registry
    TaskAdmitted {
        task: TaskId,
        priority: Priority,
        instructions: usize,
    },
    AdmissionRejected {
        capacity: usize,
    },

    // Scheduler
    SchedulerStarted {
        tasks: usize,
        slice_micros: u64,
    },
    SweepStarted {
        sweep: u64,
        incomplete: usize,
    },
    TaskDispatched {
        task: TaskId,
        priority: Priority,
        pc: usize,
    },
    TaskPreempted {
        task: TaskId,
        pc: usize,
        retired: u64,
    },
    TaskCompleted {
        task: TaskId,
        pc: usize,
        retired: u64,
    },
    AllCompleted {
        sweeps: u64,
    },

    // Engine
    Executed {
        task: TaskId,
        pc: usize,
        instruction: Instruction,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<i32>,
    },
    Pushed {
        task: TaskId,
        #[serde(serialize_with = "serialize_register")]
        register: Register,
        value: i32,
        sp: isize,
    },
    Popped {
        task: TaskId,
        #[serde(serialize_with = "serialize_register")]
        register: Register,
        value: i32,
        sp: isize,
    },
    StackOverflow {
        task: TaskId,
        pc: usize,
    },
    StackUnderflow {
        task: TaskId,
        pc: usize,
    },
    UnknownOpcode {
        task: TaskId,
        pc: usize,
        text: String,
    },
    Halted {
        task: TaskId,
        pc: usize,
    },
    /// Execution ran past the last instruction without a HALT
    ProgramExhausted {
        task: TaskId,
        pc: usize,
    },
}

fn serialize_register<S>(register: &Register, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(register)
}

impl TraceEvent {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Executed { .. } => Severity::Trace,
            Self::Pushed { .. } | Self::Popped { .. } | Self::Halted { .. } => Severity::Debug,
            Self::AdmissionRejected { .. }
            | Self::StackOverflow { .. }
            | Self::StackUnderflow { .. }
            | Self::UnknownOpcode { .. }
            | Self::ProgramExhausted { .. } => Severity::Warn,
            _ => Severity::Info,
        }
    }

    /// Task the event belongs to, if any
    pub fn task(&self) -> Option<TaskId> {
        match self {
            Self::TaskAdmitted { task, .. }
            | Self::TaskDispatched { task, .. }
            | Self::TaskPreempted { task, .. }
            | Self::TaskCompleted { task, .. }
            | Self::Executed { task, .. }
            | Self::Pushed { task, .. }
            | Self::Popped { task, .. }
            | Self::StackOverflow { task, .. }
            | Self::StackUnderflow { task, .. }
            | Self::UnknownOpcode { task, .. }
            | Self::Halted { task, .. }
            | Self::ProgramExhausted { task, .. } => Some(*task),
            Self::AdmissionRejected { .. }
            | Self::SchedulerStarted { .. }
            | Self::SweepStarted { .. }
            | Self::AllCompleted { .. } => None,
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TaskAdmitted {
                task,
                priority,
                instructions,
            } => write!(
                f,
                "Task {} added with priority {} ({} instructions)",
                task, priority, instructions
            ),
            Self::AdmissionRejected { capacity } => {
                write!(f, "Task queue full! ({} tasks)", capacity)
            }
            Self::SchedulerStarted {
                tasks,
                slice_micros,
            } => write!(
                f,
                "Starting task scheduler: {} task(s), {}μs slice",
                tasks, slice_micros
            ),
            Self::SweepStarted { sweep, incomplete } => {
                write!(f, "Sweep {}: {} incomplete task(s)", sweep, incomplete)
            }
            Self::TaskDispatched { task, priority, pc } => write!(
                f,
                "Scheduling Task {} (Priority: {}) at pc {}",
                task, priority, pc
            ),
            Self::TaskPreempted { task, pc, retired } => write!(
                f,
                "Task {} preempted at pc {} after {} instruction(s)",
                task, pc, retired
            ),
            Self::TaskCompleted { task, pc, retired } => write!(
                f,
                "Task {} completed at pc {} after {} instruction(s)",
                task, pc, retired
            ),
            Self::AllCompleted { sweeps } => {
                write!(f, "All tasks completed after {} sweep(s)", sweeps)
            }
            Self::Executed {
                task,
                pc,
                instruction,
                result,
            } => match result {
                Some(value) => write!(
                    f,
                    "[task {}] {:>4}: {:<16} ; {} -> {}",
                    task,
                    pc,
                    instruction.to_string(),
                    instruction.describe(),
                    value
                ),
                None => write!(f, "[task {}] {:>4}: {}", task, pc, instruction),
            },
            Self::Pushed {
                task,
                register,
                value,
                sp,
            } => write!(
                f,
                "[task {}] Pushed {} ({}) to stack, sp={}",
                task, register, value, sp
            ),
            Self::Popped {
                task,
                register,
                value,
                sp,
            } => write!(
                f,
                "[task {}] Popped {} to {}, sp={}",
                task, value, register, sp
            ),
            Self::StackOverflow { task, pc } => {
                write!(f, "[task {}] Stack Overflow! at pc {}", task, pc)
            }
            Self::StackUnderflow { task, pc } => {
                write!(f, "[task {}] Stack Underflow! at pc {}", task, pc)
            }
            Self::UnknownOpcode { task, pc, text } => {
                write!(f, "[task {}] Unknown instruction at pc {}: {}", task, pc, text)
            }
            Self::Halted { task, pc } => {
                write!(f, "[task {}] Halting task execution at pc {}", task, pc)
            }
            Self::ProgramExhausted { task, pc } => write!(
                f,
                "[task {}] Ran past end of program at pc {} without HALT",
                task, pc
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let event = TraceEvent::Pushed {
            task: 1,
            register: Register::new(2).unwrap(),
            value: 30,
            sp: 254,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "pushed");
        assert_eq!(json["register"], "R2");
        assert_eq!(json["sp"], 254);
    }

    #[test]
    fn test_executed_serializes_instruction_text() {
        let event = TraceEvent::Executed {
            task: 0,
            pc: 2,
            instruction: Instruction::decode(1, "ADD R2, R0, R1").unwrap(),
            result: Some(30),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["instruction"], "ADD R2, R0, R1");
        assert_eq!(json["result"], 30);
        assert_eq!(event.severity(), Severity::Trace);
        assert_eq!(event.task(), Some(0));
    }

    #[test]
    fn test_faults_are_warnings() {
        assert_eq!(
            TraceEvent::StackOverflow { task: 0, pc: 3 }.severity(),
            Severity::Warn
        );
        assert_eq!(
            TraceEvent::AllCompleted { sweeps: 1 }.severity(),
            Severity::Info
        );
    }
}
