/*!
 * Process Execution
 * Cooperative preemption of task execution contexts
 */

pub mod preemption;

pub use preemption::PreemptionFlag;
