//! Page replacement simulation: FIFO, LRU and Optimal.
//!
//! Each run owns its own frame set and produces a full step trace, so the
//! three strategies can be run side by side over the same reference string.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::Limits;
use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Fifo,
    Lru,
    Optimal,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Fifo, Strategy::Lru, Strategy::Optimal];

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Fifo => "FIFO",
            Strategy::Lru => "LRU",
            Strategy::Optimal => "Optimal",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What happened to the frame set on one access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Hit,
    /// Page placed in a free slot.
    Loaded { slot: usize },
    /// Page overwrote `evicted` in `slot`.
    Replaced { slot: usize, evicted: u32 },
}

impl Action {
    pub fn is_fault(&self) -> bool {
        !matches!(self, Action::Hit)
    }

    /// Human-readable description as shown in the step table.
    pub fn describe(&self, strategy: Strategy) -> String {
        match (self, strategy) {
            (Action::Hit, _) => "Hit - Page already in memory".to_string(),
            (Action::Loaded { .. }, _) => "Page Fault - Added to empty frame".to_string(),
            (Action::Replaced { slot, .. }, Strategy::Fifo) => {
                format!("Page Fault - Replaced frame {}", slot + 1)
            }
            (Action::Replaced { evicted, .. }, Strategy::Lru) => {
                format!("Page Fault - Replaced LRU page {evicted}")
            }
            (Action::Replaced { evicted, .. }, Strategy::Optimal) => {
                format!("Page Fault - Replaced optimal page {evicted}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based position in the reference string.
    pub step: usize,
    pub page: u32,
    /// Frame contents after this access, slot order.
    pub frames: Vec<u32>,
    pub fault: bool,
    pub action: Action,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagingResult {
    pub strategy: Strategy,
    pub num_frames: usize,
    pub steps: Vec<StepRecord>,
    pub total_faults: usize,
    /// `total_faults / reference length`, 0.0 for an empty reference.
    pub fault_rate: f64,
}

impl PagingResult {
    pub fn references(&self) -> usize {
        self.steps.len()
    }

    pub fn hits(&self) -> usize {
        self.steps.len() - self.total_faults
    }
}

/// Victim selection for a full frame set.
trait Replacer {
    /// Called after `page` is referenced at `step`, hit or load.
    fn touch(&mut self, _page: u32, _step: usize) {}

    /// Slot to overwrite. `frames` is full.
    fn victim(&mut self, frames: &[u32], reference: &[u32], step: usize) -> usize;

    fn evicted(&mut self, _page: u32) {}
}

/// Ring pointer over the slots; hits never move it.
struct Fifo {
    pointer: usize,
    num_frames: usize,
}

impl Replacer for Fifo {
    fn victim(&mut self, _frames: &[u32], _reference: &[u32], _step: usize) -> usize {
        let slot = self.pointer;
        self.pointer = (self.pointer + 1) % self.num_frames;
        slot
    }
}

/// Last-reference step per resident page.
#[derive(Default)]
struct Lru {
    last_used: HashMap<u32, usize>,
}

impl Replacer for Lru {
    fn touch(&mut self, page: u32, step: usize) {
        self.last_used.insert(page, step);
    }

    fn victim(&mut self, frames: &[u32], _reference: &[u32], _step: usize) -> usize {
        let mut slot = 0;
        let mut oldest = usize::MAX;
        for (j, page) in frames.iter().enumerate() {
            let used = self.last_used.get(page).copied().unwrap_or(0);
            // Strict comparison keeps the lowest slot among ties.
            if used < oldest {
                oldest = used;
                slot = j;
            }
        }
        slot
    }

    fn evicted(&mut self, page: u32) {
        self.last_used.remove(&page);
    }
}

struct Optimal;

impl Replacer for Optimal {
    fn victim(&mut self, frames: &[u32], reference: &[u32], step: usize) -> usize {
        let future = &reference[step + 1..];
        let mut slot = 0;
        let mut farthest = None;
        for (j, page) in frames.iter().enumerate() {
            match future.iter().position(|p| p == page) {
                None => return j,
                Some(next) => {
                    if farthest.is_none_or(|best| next > best) {
                        farthest = Some(next);
                        slot = j;
                    }
                }
            }
        }
        slot
    }
}

/// Simulate one strategy with the default [`Limits`].
pub fn simulate_paging(
    reference: &[u32],
    num_frames: usize,
    strategy: Strategy,
) -> Result<PagingResult, SimError> {
    simulate_paging_with_limits(reference, num_frames, strategy, &Limits::default())
}

/// Simulate one strategy.
///
/// An empty reference string yields an empty result. Otherwise
/// `num_frames` must lie in `1..=min(reference.len(), limits.max_frames)`.
pub fn simulate_paging_with_limits(
    reference: &[u32],
    num_frames: usize,
    strategy: Strategy,
    limits: &Limits,
) -> Result<PagingResult, SimError> {
    if reference.is_empty() {
        return Ok(PagingResult {
            strategy,
            num_frames,
            steps: Vec::new(),
            total_faults: 0,
            fault_rate: 0.0,
        });
    }

    let max = limits.max_frames.min(reference.len());
    if num_frames == 0 || num_frames > max {
        return Err(SimError::InvalidFrameCount {
            frames: num_frames,
            max,
        });
    }

    let result = match strategy {
        Strategy::Fifo => run(
            reference,
            num_frames,
            strategy,
            Fifo {
                pointer: 0,
                num_frames,
            },
        ),
        Strategy::Lru => run(reference, num_frames, strategy, Lru::default()),
        Strategy::Optimal => run(reference, num_frames, strategy, Optimal),
    };

    debug!(
        strategy = strategy.name(),
        num_frames,
        references = reference.len(),
        faults = result.total_faults,
        "paging simulation finished"
    );
    Ok(result)
}

/// Run FIFO, LRU and Optimal, in that order, over the same input.
pub fn simulate_all_strategies(
    reference: &[u32],
    num_frames: usize,
    limits: &Limits,
) -> Result<Vec<PagingResult>, SimError> {
    Strategy::ALL
        .iter()
        .map(|&s| simulate_paging_with_limits(reference, num_frames, s, limits))
        .collect()
}

fn run<R: Replacer>(
    reference: &[u32],
    num_frames: usize,
    strategy: Strategy,
    mut replacer: R,
) -> PagingResult {
    let mut frames: Vec<u32> = Vec::with_capacity(num_frames);
    let mut steps = Vec::with_capacity(reference.len());
    let mut total_faults = 0;

    for (i, &page) in reference.iter().enumerate() {
        let action = if frames.contains(&page) {
            Action::Hit
        } else if frames.len() < num_frames {
            frames.push(page);
            Action::Loaded {
                slot: frames.len() - 1,
            }
        } else {
            let slot = replacer.victim(&frames, reference, i);
            let evicted = std::mem::replace(&mut frames[slot], page);
            replacer.evicted(evicted);
            Action::Replaced { slot, evicted }
        };
        replacer.touch(page, i);

        if action.is_fault() {
            total_faults += 1;
        }
        trace!(step = i + 1, page, ?action, "reference");

        steps.push(StepRecord {
            step: i + 1,
            page,
            frames: frames.clone(),
            fault: action.is_fault(),
            action,
            description: action.describe(strategy),
        });
    }

    PagingResult {
        strategy,
        num_frames,
        steps,
        total_faults,
        fault_rate: total_faults as f64 / reference.len() as f64,
    }
}
