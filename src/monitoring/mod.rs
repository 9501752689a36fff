/*!
 * Monitoring
 * Execution trace events, pluggable sinks and tracing setup
 */

pub mod events;
pub mod sink;
mod tracer;

pub use events::{Severity, TraceEvent};
pub use sink::{JsonLinesSink, MemorySink, NullSink, TraceSink, TracingSink};
pub use tracer::init_tracing;
