/*!
 * Process Module
 * Task registry, lifecycle types and cooperative preemption
 */

pub mod execution;
pub mod registry;
pub mod types;

// Re-export for convenience
pub use execution::PreemptionFlag;
pub use registry::{Task, TaskHandle, TaskRegistry};
pub use types::{TaskInfo, TaskState};
