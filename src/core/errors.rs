/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Program decoding errors, raised while building a `Program`
///
/// A line is rejected rather than defaulted whenever a known mnemonic is
/// malformed. Unknown mnemonics are not an error here, they decode to
/// `Instruction::Unknown` and are reported at dispatch.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProgramError {
    #[error("line {line}: {opcode} expects {expected} operand(s), found {found}")]
    #[diagnostic(
        code(program::operand_count),
        help("LOAD Rd, imm | ADD/SUB/MUL Rd, Rs[, Rt] | PUSH Rs | POP Rd | HALT")
    )]
    OperandCount {
        line: usize,
        opcode: String,
        expected: String,
        found: usize,
    },

    #[error("line {line}: invalid register '{operand}'")]
    #[diagnostic(
        code(program::invalid_register),
        help("Registers are written R0 through R7.")
    )]
    InvalidRegister { line: usize, operand: String },

    #[error("line {line}: invalid immediate '{operand}'")]
    #[diagnostic(
        code(program::invalid_immediate),
        help("Immediates are decimal 32-bit signed integers.")
    )]
    InvalidImmediate { line: usize, operand: String },

    #[error("failed to read program {path}: {reason}")]
    #[diagnostic(
        code(program::io),
        help("Check that the program file exists and is readable.")
    )]
    Io { path: String, reason: String },
}

/// Task registry admission errors
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum AdmissionError {
    #[error("admission rejected: registry full ({capacity} tasks)")]
    #[diagnostic(
        code(registry::admission_rejected),
        help("The registry has a fixed capacity. Raise VCPU_MAX_TASKS or admit fewer tasks.")
    )]
    AdmissionRejected { capacity: usize },
}

/// Configuration errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    #[diagnostic(
        code(config::invalid_value),
        help("Numeric settings must be non-negative decimal integers.")
    )]
    InvalidValue { key: String, value: String },

    #[error("time slice {micros}μs outside [{min_micros}μs, {max_micros}μs]")]
    #[diagnostic(code(config::invalid_time_slice))]
    InvalidTimeSlice {
        micros: u128,
        min_micros: u128,
        max_micros: u128,
    },

    #[error("registry capacity must be at least 1")]
    #[diagnostic(code(config::invalid_capacity))]
    InvalidCapacity,
}

/// Unified kernel error type with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum KernelError {
    #[error("Program error: {0}")]
    #[diagnostic(transparent)]
    Program(#[from] ProgramError),

    #[error("Admission error: {0}")]
    #[diagnostic(transparent)]
    Admission(#[from] AdmissionError),

    #[error("Configuration error: {0}")]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Execution context for task {task} failed: {reason}")]
    #[diagnostic(
        code(kernel::dispatch_failed),
        help("The execution context panicked or was cancelled. The task's CPU state is lost.")
    )]
    Dispatch { task: u32, reason: String },

    #[error("Sweep limit of {limit} reached with {remaining} task(s) incomplete")]
    #[diagnostic(
        code(kernel::sweep_limit),
        help("Raise VCPU_MAX_SWEEPS or unset it to run until every task completes.")
    )]
    SweepLimit { limit: u64, remaining: usize },
}
