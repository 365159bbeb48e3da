//! Distro configuration document, parsed from json5 by the host process.

use crate::error::DistroError;
use serde::Deserialize;

/// Tunables for one process's distro components.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DistroConfig {
    /// Local cache capacity of each [`DistroManager`](crate::DistroManager).
    pub capacity: usize,
    /// Capacity of the cluster-shared available-objects queue.
    pub available_queue_capacity: usize,
    /// Capacity of each manager's private command queue.
    pub command_queue_capacity: usize,
}

impl Default for DistroConfig {
    fn default() -> Self {
        Self {
            capacity: 16,
            available_queue_capacity: 256,
            command_queue_capacity: 8,
        }
    }
}

impl DistroConfig {
    /// Parses and validates a json5 configuration document.
    pub fn from_json5(document: &str) -> Result<Self, DistroError> {
        let config: DistroConfig =
            json5::from_str(document).map_err(|err| DistroError::ConfigParse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DistroError> {
        if self.capacity == 0 {
            return Err(DistroError::InvalidConfig(
                "capacity must be positive; a zero-capacity manager can never admit".to_string(),
            ));
        }
        if self.available_queue_capacity == 0 {
            return Err(DistroError::InvalidConfig(
                "available_queue_capacity must be positive".to_string(),
            ));
        }
        if self.command_queue_capacity == 0 {
            return Err(DistroError::InvalidConfig(
                "command_queue_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
