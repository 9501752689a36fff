/*!
 * Scheduler Builder
 * Builder pattern for Scheduler construction
 */

use super::config::SchedulerConfig;
use super::types::TimeSlice;
use super::Scheduler;
use crate::core::errors::ConfigError;
use crate::monitoring::{TraceSink, TracingSink};
use std::sync::Arc;

/// Builder for Scheduler
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    sink: Option<Arc<dyn TraceSink>>,
}

impl SchedulerBuilder {
    /// Create a new Scheduler builder with default configuration
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
            sink: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set registry capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Set the per-dispatch time slice
    pub fn with_time_slice(mut self, time_slice: TimeSlice) -> Self {
        self.config.time_slice = time_slice;
        self
    }

    /// Give up after this many sweeps
    pub fn with_max_sweeps(mut self, max_sweeps: u64) -> Self {
        self.config.max_sweeps = Some(max_sweeps);
        self
    }

    /// Route the execution trace to `sink` (default: `TracingSink`)
    pub fn with_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build the Scheduler
    pub fn build(self) -> Result<Scheduler, ConfigError> {
        self.config.validate()?;
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));
        Ok(Scheduler::from_parts(self.config, sink))
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
