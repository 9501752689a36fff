/*!
 * Core Types
 * Common types used across the kernel
 */

/// Task ID type, assigned in admission order starting at 0
pub type TaskId = u32;

/// Task priority (stored and reported, never used for ordering)
pub type Priority = i32;

/// Common result type for kernel operations
pub type KernelResult<T> = Result<T, super::errors::KernelError>;
