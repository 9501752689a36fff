/*!
 * Scheduler Configuration
 * Defaults from `core::limits`, overridable from the environment
 */

use super::types::TimeSlice;
use crate::core::errors::ConfigError;
use crate::core::limits::MAX_TASKS;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Registry capacity override
pub const ENV_MAX_TASKS: &str = "VCPU_MAX_TASKS";
/// Time slice override, in milliseconds
pub const ENV_TIME_SLICE_MS: &str = "VCPU_TIME_SLICE_MS";
/// Upper bound on sweeps before a run gives up
pub const ENV_MAX_SWEEPS: &str = "VCPU_MAX_SWEEPS";

/// Scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Registry capacity
    pub capacity: usize,
    pub time_slice: TimeSlice,
    /// `None` runs until every task completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sweeps: Option<u64>,
}

impl SchedulerConfig {
    /// Read overrides from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(capacity) = parse_var::<usize, _>(&lookup, ENV_MAX_TASKS)? {
            config.capacity = capacity;
        }
        if let Some(millis) = parse_var::<u64, _>(&lookup, ENV_TIME_SLICE_MS)? {
            config.time_slice = TimeSlice::from_millis(millis)?;
        }
        if let Some(sweeps) = parse_var::<u64, _>(&lookup, ENV_MAX_SWEEPS)? {
            config.max_sweeps = Some(sweeps);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_TASKS,
            time_slice: TimeSlice::default(),
            max_sweeps: None,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        })
}
