use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::SimError;

/// Size caps applied to caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default = "default_max_frames")]
    pub max_frames: usize,
    #[serde(default = "default_max_processes")]
    pub max_processes: usize,
    #[serde(default = "default_max_resources")]
    pub max_resources: usize,
}

fn default_max_frames() -> usize {
    MAX_FRAMES
}

fn default_max_processes() -> usize {
    MAX_PROCESSES
}

fn default_max_resources() -> usize {
    MAX_RESOURCES
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_frames: MAX_FRAMES,
            max_processes: MAX_PROCESSES,
            max_resources: MAX_RESOURCES,
        }
    }
}

impl Limits {
    pub fn check_processes(&self, count: usize) -> Result<(), SimError> {
        check("processes", count, self.max_processes)
    }

    pub fn check_resources(&self, count: usize) -> Result<(), SimError> {
        check("resource types", count, self.max_resources)
    }
}

fn check(what: &'static str, count: usize, max: usize) -> Result<(), SimError> {
    if count > max {
        return Err(SimError::LimitExceeded { what, count, max });
    }
    Ok(())
}
