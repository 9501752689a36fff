/*!
 * CPU State
 * Per-task register file, program counter and bounded stack
 */

use super::instruction::Register;
use crate::core::limits::{HEAP_SIZE, NUM_REGISTERS, STACK_SIZE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stack boundary violation; the offending operation is a no-op
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackFault {
    #[error("stack overflow")]
    Overflow,
    #[error("stack underflow")]
    Underflow,
}

/// Virtual CPU state owned by exactly one task
///
/// `sp` starts at `STACK_SIZE - 1` and moves down on push. A full stack
/// leaves `sp == -1`, which is why it is signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuState {
    registers: [i32; NUM_REGISTERS],
    pc: usize,
    sp: isize,
    stack: [i32; STACK_SIZE],
    heap: [u8; HEAP_SIZE],
}

impl CpuState {
    /// Zeroed registers, `pc = 0`, empty stack
    pub fn new() -> Self {
        Self {
            registers: [0; NUM_REGISTERS],
            pc: 0,
            sp: Self::INITIAL_SP,
            stack: [0; STACK_SIZE],
            heap: [0; HEAP_SIZE],
        }
    }

    pub const INITIAL_SP: isize = STACK_SIZE as isize - 1;

    #[inline(always)]
    pub fn registers(&self) -> &[i32; NUM_REGISTERS] {
        &self.registers
    }

    #[inline(always)]
    pub fn register(&self, reg: Register) -> i32 {
        self.registers[reg.index()]
    }

    #[inline(always)]
    pub fn set_register(&mut self, reg: Register, value: i32) {
        self.registers[reg.index()] = value;
    }

    #[inline(always)]
    pub fn pc(&self) -> usize {
        self.pc
    }

    #[inline(always)]
    pub(crate) fn advance_pc(&mut self) {
        self.pc += 1;
    }

    #[inline(always)]
    pub fn sp(&self) -> isize {
        self.sp
    }

    pub fn stack(&self) -> &[i32; STACK_SIZE] {
        &self.stack
    }

    pub fn heap(&self) -> &[u8; HEAP_SIZE] {
        &self.heap
    }

    /// Number of values currently on the stack
    pub fn stack_depth(&self) -> usize {
        (Self::INITIAL_SP - self.sp) as usize
    }

    /// Store at `sp`, then move `sp` down
    pub fn push(&mut self, value: i32) -> Result<(), StackFault> {
        if self.sp < 0 {
            return Err(StackFault::Overflow);
        }
        self.stack[self.sp as usize] = value;
        self.sp -= 1;
        Ok(())
    }

    /// Move `sp` up, then load from it
    pub fn pop(&mut self) -> Result<i32, StackFault> {
        if self.sp >= Self::INITIAL_SP {
            return Err(StackFault::Underflow);
        }
        self.sp += 1;
        Ok(self.stack[self.sp as usize])
    }
}

impl Default for CpuState {
    fn default() -> Self {
        Self::new()
    }
}
