pub mod analysis;
pub mod bankers;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod paging;
pub mod report;
pub mod runner;
pub mod scheduling;

// Re-export commonly used items for convenience
pub use bankers::{check_safety, SafetyReport};
pub use config::Limits;
pub use error::SimError;
pub use paging::{simulate_paging, PagingResult, Strategy};
pub use scheduling::{simulate_scheduling, Policy, Process, ProcessSet, Schedule};
