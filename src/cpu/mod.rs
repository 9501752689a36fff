/*!
 * Virtual CPU
 * Instruction set, programs, per-task CPU state and the execution engine
 */

pub mod engine;
pub mod instruction;
pub mod program;
pub mod state;

pub use engine::{Engine, Exit, Fault, RunReport, Step};
pub use instruction::{ArithOp, Instruction, Register};
pub use program::Program;
pub use state::{CpuState, StackFault};
