/*!
 * Instruction Engine
 *
 * Interprets one task's program against its private CPU state. Every
 * instruction advances `pc` by exactly one; nothing in the instruction set
 * branches. Faults (unknown opcode, stack overflow, stack underflow) are
 * recovered locally: they are traced, counted and execution continues.
 */

use super::instruction::Instruction;
use super::program::Program;
use super::state::{CpuState, StackFault};
use crate::core::types::TaskId;
use crate::monitoring::{TraceEvent, TraceSink};
use crate::process::execution::PreemptionFlag;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Recoverable execution fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fault {
    UnknownOpcode,
    StackOverflow,
    StackUnderflow,
}

impl From<StackFault> for Fault {
    fn from(fault: StackFault) -> Self {
        match fault {
            StackFault::Overflow => Self::StackOverflow,
            StackFault::Underflow => Self::StackUnderflow,
        }
    }
}

/// Result of a single `step`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Instruction applied
    Retired,
    /// Instruction decoded to a fault; `pc` still advanced
    Faulted(Fault),
    /// HALT executed
    Halted,
    /// `pc` is past the last instruction, nothing executed
    EndOfProgram,
}

/// Why a dispatch stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exit {
    Halted,
    Preempted,
    /// Ran off the end of a program with no HALT
    Exhausted,
}

impl Exit {
    /// Whether the task must not be dispatched again
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Halted | Self::Exhausted)
    }
}

/// Counters for one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub exit: Exit,
    pub retired: u64,
    pub unknown_opcodes: u64,
    pub stack_overflows: u64,
    pub stack_underflows: u64,
}

impl RunReport {
    fn new() -> Self {
        Self {
            exit: Exit::Preempted,
            retired: 0,
            unknown_opcodes: 0,
            stack_overflows: 0,
            stack_underflows: 0,
        }
    }

    fn record_fault(&mut self, fault: Fault) {
        match fault {
            Fault::UnknownOpcode => self.unknown_opcodes += 1,
            Fault::StackOverflow => self.stack_overflows += 1,
            Fault::StackUnderflow => self.stack_underflows += 1,
        }
    }
}

/// Instruction engine bound to one task's identity and trace sink
pub struct Engine {
    task: TaskId,
    sink: Arc<dyn TraceSink>,
}

impl Engine {
    pub fn new(task: TaskId, sink: Arc<dyn TraceSink>) -> Self {
        Self { task, sink }
    }

    /// Decode and apply the instruction at `pc`, then advance `pc`
    pub fn step(&self, cpu: &mut CpuState, program: &Program) -> Step {
        let pc = cpu.pc();
        let Some(instruction) = program.get(pc) else {
            return Step::EndOfProgram;
        };

        let outcome = self.apply(cpu, pc, instruction);
        cpu.advance_pc();
        outcome
    }

    fn apply(&self, cpu: &mut CpuState, pc: usize, instruction: &Instruction) -> Step {
        let task = self.task;
        let mut result = None;

        let outcome = match instruction {
            Instruction::Load { rd, imm } => {
                cpu.set_register(*rd, *imm);
                result = Some(*imm);
                Step::Retired
            }
            Instruction::Arith { op, rd, lhs, rhs } => {
                let value = op.apply(cpu.register(*lhs), cpu.register(*rhs));
                cpu.set_register(*rd, value);
                result = Some(value);
                Step::Retired
            }
            Instruction::Push { rs } => {
                let value = cpu.register(*rs);
                match cpu.push(value) {
                    Ok(()) => {
                        self.sink.record(&TraceEvent::Pushed {
                            task,
                            register: *rs,
                            value,
                            sp: cpu.sp(),
                        });
                        Step::Retired
                    }
                    Err(fault) => Step::Faulted(fault.into()),
                }
            }
            Instruction::Pop { rd } => match cpu.pop() {
                Ok(value) => {
                    cpu.set_register(*rd, value);
                    result = Some(value);
                    self.sink.record(&TraceEvent::Popped {
                        task,
                        register: *rd,
                        value,
                        sp: cpu.sp(),
                    });
                    Step::Retired
                }
                Err(fault) => Step::Faulted(fault.into()),
            },
            Instruction::Halt => Step::Halted,
            Instruction::Unknown(_) => Step::Faulted(Fault::UnknownOpcode),
        };

        match outcome {
            Step::Faulted(Fault::StackOverflow) => {
                self.sink.record(&TraceEvent::StackOverflow { task, pc });
            }
            Step::Faulted(Fault::StackUnderflow) => {
                self.sink.record(&TraceEvent::StackUnderflow { task, pc });
            }
            Step::Faulted(Fault::UnknownOpcode) => {
                self.sink.record(&TraceEvent::UnknownOpcode {
                    task,
                    pc,
                    text: instruction.to_string(),
                });
            }
            Step::Halted => self.sink.record(&TraceEvent::Halted { task, pc }),
            Step::Retired | Step::EndOfProgram => {}
        }

        self.sink.record(&TraceEvent::Executed {
            task,
            pc,
            instruction: instruction.clone(),
            result,
        });

        outcome
    }

    /// Dispatch loop: run until HALT, end of program, or preemption
    ///
    /// The flag is checked after each retired instruction, so every call
    /// makes progress even when the flag is already raised on entry.
    pub fn run(&self, cpu: &mut CpuState, program: &Program, preempt: &PreemptionFlag) -> RunReport {
        let mut report = RunReport::new();

        loop {
            match self.step(cpu, program) {
                Step::EndOfProgram => {
                    self.sink.record(&TraceEvent::ProgramExhausted {
                        task: self.task,
                        pc: cpu.pc(),
                    });
                    report.exit = Exit::Exhausted;
                    break;
                }
                Step::Halted => {
                    report.retired += 1;
                    report.exit = Exit::Halted;
                    break;
                }
                Step::Retired => report.retired += 1,
                Step::Faulted(fault) => {
                    report.retired += 1;
                    report.record_fault(fault);
                }
            }

            if preempt.is_raised() {
                report.exit = Exit::Preempted;
                break;
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::limits::STACK_SIZE;
    use crate::cpu::instruction::Register;
    use crate::monitoring::{MemorySink, NullSink};

    fn engine() -> Engine {
        Engine::new(0, Arc::new(NullSink))
    }

    fn r(index: u8) -> Register {
        Register::new(index).unwrap()
    }

    #[test]
    fn test_step_advances_pc_by_one() {
        let program: Program = "LOAD R0, 10\nLOAD R1, 3\nSUB R0, R1\nHALT".parse().unwrap();
        let mut cpu = CpuState::new();
        let engine = engine();

        for expected_pc in 1..=3 {
            assert_eq!(engine.step(&mut cpu, &program), Step::Retired);
            assert_eq!(cpu.pc(), expected_pc);
        }
        assert_eq!(cpu.register(r(0)), 7);
        assert_eq!(engine.step(&mut cpu, &program), Step::Halted);
        assert_eq!(cpu.pc(), 4);
        assert_eq!(engine.step(&mut cpu, &program), Step::EndOfProgram);
        assert_eq!(cpu.pc(), 4);
    }

    #[test]
    fn test_unknown_opcode_is_non_fatal() {
        let program: Program = "NOP\nLOAD R1, 5\nHALT".parse().unwrap();
        let mut cpu = CpuState::new();
        let report = engine().run(&mut cpu, &program, &PreemptionFlag::new());

        assert_eq!(report.exit, Exit::Halted);
        assert_eq!(report.unknown_opcodes, 1);
        assert_eq!(report.retired, 3);
        assert_eq!(cpu.register(r(1)), 5);
    }

    #[test]
    fn test_underflow_is_noop() {
        let program: Program = "LOAD R0, 9\nPOP R0\nHALT".parse().unwrap();
        let mut cpu = CpuState::new();
        let report = engine().run(&mut cpu, &program, &PreemptionFlag::new());

        assert_eq!(report.stack_underflows, 1);
        assert_eq!(cpu.register(r(0)), 9);
        assert_eq!(cpu.sp(), CpuState::INITIAL_SP);
    }

    #[test]
    fn test_overflow_is_noop() {
        let mut source = String::from("LOAD R0, 1\n");
        for _ in 0..=STACK_SIZE {
            source.push_str("PUSH R0\n");
        }
        source.push_str("HALT\n");
        let program: Program = source.parse().unwrap();

        let mut cpu = CpuState::new();
        let report = engine().run(&mut cpu, &program, &PreemptionFlag::new());

        assert_eq!(report.exit, Exit::Halted);
        assert_eq!(report.stack_overflows, 1);
        assert_eq!(cpu.sp(), -1);
    }

    #[test]
    fn test_raised_flag_stops_after_one_instruction() {
        let program: Program = "LOAD R0, 1\nLOAD R1, 2\nHALT".parse().unwrap();
        let mut cpu = CpuState::new();
        let flag = PreemptionFlag::new();
        flag.raise();

        let report = engine().run(&mut cpu, &program, &flag);
        assert_eq!(report.exit, Exit::Preempted);
        assert_eq!(report.retired, 1);
        assert_eq!(cpu.pc(), 1);

        // Resumes where it stopped
        flag.clear();
        let report = engine().run(&mut cpu, &program, &flag);
        assert_eq!(report.exit, Exit::Halted);
        assert_eq!(cpu.register(r(1)), 2);
    }

    #[test]
    fn test_program_without_halt_is_exhausted() {
        let program: Program = "LOAD R0, 1".parse().unwrap();
        let mut cpu = CpuState::new();
        let report = engine().run(&mut cpu, &program, &PreemptionFlag::new());
        assert_eq!(report.exit, Exit::Exhausted);
        assert!(report.exit.is_terminal());
        assert_eq!(report.retired, 1);
    }

    #[test]
    fn test_trace_records_stack_operations() {
        let sink = Arc::new(MemorySink::new());
        let engine = Engine::new(3, sink.clone());
        let program: Program = "LOAD R2, 30\nPUSH R2\nPOP R3\nHALT".parse().unwrap();
        let mut cpu = CpuState::new();
        engine.run(&mut cpu, &program, &PreemptionFlag::new());

        let events = sink.events();
        assert!(events.contains(&TraceEvent::Pushed {
            task: 3,
            register: r(2),
            value: 30,
            sp: CpuState::INITIAL_SP - 1,
        }));
        assert!(events.contains(&TraceEvent::Popped {
            task: 3,
            register: r(3),
            value: 30,
            sp: CpuState::INITIAL_SP,
        }));
        assert!(events.contains(&TraceEvent::Halted { task: 3, pc: 3 }));
        let executed = events
            .iter()
            .filter(|e| matches!(e, TraceEvent::Executed { .. }))
            .count();
        assert_eq!(executed, 4);
    }
}
