//! Validation errors shared by the simulators.
//!
//! Every variant describes bad input. None of them are fatal: the caller
//! renders the message and retries with corrected values.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// `max[process][resource]` is smaller than the allocation.
    NegativeNeed { process: usize, resource: usize },
    /// A matrix row or vector does not match the expected shape.
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// Frame count is zero, longer than the reference string, or above the cap.
    InvalidFrameCount { frames: usize, max: usize },
    InvalidTimeQuantum { quantum: u32 },
    DuplicateProcessId { id: u32 },
    InvalidBurstTime { id: u32 },
    /// Priority scheduling needs an explicit priority on every process.
    MissingPriority { id: u32 },
    LimitExceeded {
        what: &'static str,
        count: usize,
        max: usize,
    },
    /// A running total (work vector, clock) no longer fits in `u32`.
    Overflow { what: &'static str },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeNeed { process, resource } => write!(
                f,
                "invalid state: max < allocation for P{process}, R{resource} (negative need)"
            ),
            Self::DimensionMismatch {
                what,
                expected,
                found,
            } => write!(f, "{what}: expected {expected} entries, found {found}"),
            Self::InvalidFrameCount { frames, max } => {
                write!(f, "invalid frame count {frames} (must be between 1 and {max})")
            }
            Self::InvalidTimeQuantum { quantum } => {
                write!(f, "invalid time quantum {quantum} (must be at least 1)")
            }
            Self::DuplicateProcessId { id } => write!(f, "process id {id} already exists"),
            Self::InvalidBurstTime { id } => {
                write!(f, "process {id}: burst time must be at least 1")
            }
            Self::MissingPriority { id } => {
                write!(f, "process {id}: priority scheduling requires an explicit priority")
            }
            Self::LimitExceeded { what, count, max } => {
                write!(f, "too many {what}: {count} (max: {max})")
            }
            Self::Overflow { what } => write!(f, "{what} exceeds {}", u32::MAX),
        }
    }
}

impl std::error::Error for SimError {}
