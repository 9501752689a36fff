/*!
 * Scheduler Types
 * Domain types for scheduler configuration and reporting
 */

use crate::core::errors::ConfigError;
use crate::core::limits::{DEFAULT_TIME_SLICE, MAX_TIME_SLICE, MIN_TIME_SLICE};
use crate::cpu::Exit;
use crate::process::TaskInfo;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;
use uuid::Uuid;

/// Wall-clock slice granted to each dispatch
///
/// The amount of work done per slice depends on execution speed; it is not
/// an instruction budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlice(Duration);

impl TimeSlice {
    /// Create a validated time slice
    pub fn new(duration: Duration) -> Result<Self, ConfigError> {
        if duration < MIN_TIME_SLICE || duration > MAX_TIME_SLICE {
            return Err(ConfigError::InvalidTimeSlice {
                micros: duration.as_micros(),
                min_micros: MIN_TIME_SLICE.as_micros(),
                max_micros: MAX_TIME_SLICE.as_micros(),
            });
        }
        Ok(Self(duration))
    }

    pub fn from_millis(millis: u64) -> Result<Self, ConfigError> {
        Self::new(Duration::from_millis(millis))
    }

    /// # Performance
    /// Hot path - read on every dispatch
    #[inline(always)]
    pub const fn as_duration(&self) -> Duration {
        self.0
    }

    #[inline(always)]
    pub fn as_micros(&self) -> u64 {
        self.0.as_micros() as u64
    }
}

impl Default for TimeSlice {
    fn default() -> Self {
        Self(DEFAULT_TIME_SLICE)
    }
}

impl Serialize for TimeSlice {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.as_micros())
    }
}

impl<'de> Deserialize<'de> for TimeSlice {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u64::deserialize(deserializer)?;
        Self::new(Duration::from_micros(micros)).map_err(serde::de::Error::custom)
    }
}

/// Scheduler statistics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerStats {
    pub sweeps: u64,
    pub dispatches: u64,
    pub preemptions: u64,
    pub completions: u64,
    pub instructions: u64,
    pub unknown_opcodes: u64,
    pub stack_overflows: u64,
    pub stack_underflows: u64,
    pub slice_micros: u64,
}

/// Outcome of `Scheduler::run`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RunSummary {
    pub run_id: Uuid,
    /// Sweeps that dispatched at least one task
    pub sweeps: u64,
    pub tasks: Vec<TaskInfo>,
    pub stats: SchedulerStats,
}

impl RunSummary {
    pub fn all_completed(&self) -> bool {
        self.tasks.iter().all(|t| t.completed)
    }

    /// Every task stopped on a HALT rather than running off its program
    pub fn all_halted(&self) -> bool {
        self.tasks.iter().all(|t| t.exit == Some(Exit::Halted))
    }
}
