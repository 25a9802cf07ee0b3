//! Post-processing over finished simulations: ranking paging strategies by
//! fault count and scheduling policies by average waiting time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{EXCELLENT_FAULT_RATE, MODERATE_FAULT_RATE};
use crate::paging::{PagingResult, Strategy};
use crate::scheduling::{Policy, Schedule};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub strategy: Strategy,
    pub faults: usize,
    pub hits: usize,
    pub hit_rate: f64,
    /// Share of the worst strategy's faults avoided, 0.0..=1.0.
    pub efficiency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    OptimalBest,
    BestStrategy { strategy: Strategy, faults: usize },
    Improvement {
        best: Strategy,
        worst: Strategy,
        percent: f64,
    },
    LruBeatsFifo,
    FifoBeatsLru,
    OptimalLowerBound,
    Excellent,
    Moderate,
    Poor,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OptimalBest => write!(
                f,
                "Optimal algorithm achieved the best performance (theoretical minimum page faults)."
            ),
            Self::BestStrategy { strategy, faults } => {
                write!(f, "{strategy} performed best with {faults} page faults.")
            }
            Self::Improvement {
                best,
                worst,
                percent,
            } => write!(
                f,
                "Using {best} instead of {worst} would reduce page faults by {percent:.1}%."
            ),
            Self::LruBeatsFifo => write!(
                f,
                "LRU outperformed FIFO, indicating temporal locality in the reference string."
            ),
            Self::FifoBeatsLru => write!(
                f,
                "FIFO outperformed LRU, which is unusual but can occur with specific access patterns."
            ),
            Self::OptimalLowerBound => write!(
                f,
                "Optimal algorithm provides the theoretical lower bound for page faults (not practical in real systems)."
            ),
            Self::Excellent => write!(f, "Overall performance is excellent with low page fault rates."),
            Self::Moderate => write!(
                f,
                "Performance is moderate. Consider increasing number of frames to reduce page faults."
            ),
            Self::Poor => write!(
                f,
                "Performance is poor with high page fault rates. Increase frames or optimize reference pattern."
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagingAnalysis {
    pub best: Strategy,
    pub worst: Strategy,
    pub summaries: Vec<StrategySummary>,
    pub recommendations: Vec<Recommendation>,
}

impl PagingAnalysis {
    pub fn summary(&self, strategy: Strategy) -> Option<&StrategySummary> {
        self.summaries.iter().find(|s| s.strategy == strategy)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Compare strategy runs over the same reference string.
///
/// Best is the first run with the fewest faults, worst the last run with
/// the most. Returns `None` for an empty slice.
pub fn analyze_paging(results: &[PagingResult]) -> Option<PagingAnalysis> {
    let mut ranked: Vec<&PagingResult> = results.iter().collect();
    ranked.sort_by_key(|r| r.total_faults);
    let best = *ranked.first()?;
    let worst = *ranked.last()?;

    let max_faults = worst.total_faults;
    let summaries = results
        .iter()
        .map(|r| StrategySummary {
            strategy: r.strategy,
            faults: r.total_faults,
            hits: r.hits(),
            hit_rate: ratio(r.hits(), r.references()),
            efficiency: if max_faults == 0 {
                1.0
            } else {
                ratio(max_faults - r.total_faults, max_faults)
            },
        })
        .collect();

    let mut recommendations = Vec::new();
    if best.strategy == Strategy::Optimal {
        recommendations.push(Recommendation::OptimalBest);
    } else {
        recommendations.push(Recommendation::BestStrategy {
            strategy: best.strategy,
            faults: best.total_faults,
        });
    }

    if best.total_faults < worst.total_faults {
        recommendations.push(Recommendation::Improvement {
            best: best.strategy,
            worst: worst.strategy,
            percent: ratio(worst.total_faults - best.total_faults, worst.total_faults) * 100.0,
        });
    }

    let find = |s: Strategy| results.iter().find(|r| r.strategy == s);
    if let (Some(fifo), Some(lru)) = (find(Strategy::Fifo), find(Strategy::Lru)) {
        if fifo.total_faults > lru.total_faults {
            recommendations.push(Recommendation::LruBeatsFifo);
        } else if fifo.total_faults < lru.total_faults {
            recommendations.push(Recommendation::FifoBeatsLru);
        }
    }
    if find(Strategy::Optimal).is_some() {
        recommendations.push(Recommendation::OptimalLowerBound);
    }

    let avg_rate =
        results.iter().map(|r| r.fault_rate * 100.0).sum::<f64>() / results.len() as f64;
    recommendations.push(if avg_rate < EXCELLENT_FAULT_RATE {
        Recommendation::Excellent
    } else if avg_rate < MODERATE_FAULT_RATE {
        Recommendation::Moderate
    } else {
        Recommendation::Poor
    });

    Some(PagingAnalysis {
        best: best.strategy,
        worst: worst.strategy,
        summaries,
        recommendations,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyRanking {
    pub policy: Policy,
    pub avg_waiting: f64,
    pub avg_turnaround: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleComparison {
    /// Ascending average waiting time; ties keep input order.
    pub ranking: Vec<PolicyRanking>,
}

impl ScheduleComparison {
    pub fn best(&self) -> Option<&PolicyRanking> {
        self.ranking.first()
    }

    pub fn worst(&self) -> Option<&PolicyRanking> {
        self.ranking.last()
    }
}

pub fn compare_schedules(schedules: &[Schedule]) -> ScheduleComparison {
    let mut ranking: Vec<PolicyRanking> = schedules
        .iter()
        .map(|s| PolicyRanking {
            policy: s.policy,
            avg_waiting: s.avg_waiting,
            avg_turnaround: s.avg_turnaround,
        })
        .collect();
    ranking.sort_by(|a, b| a.avg_waiting.total_cmp(&b.avg_waiting));
    ScheduleComparison { ranking }
}
