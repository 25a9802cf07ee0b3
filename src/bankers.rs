//! Banker's Algorithm safety check.
//!
//! The search greedily scans processes in index order and restarts from
//! index 0 after every grant, so the safe sequence it reports is stable
//! for a given input even when several safe orders exist.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::SimError;

/// One granted process: resources available before it ran and after it
/// released its allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyStep {
    pub process: usize,
    pub work_before: Vec<u32>,
    pub work_after: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub safe: bool,
    /// Granted processes in order. Partial when the state is unsafe.
    pub sequence: Vec<usize>,
    pub need: Vec<Vec<u32>>,
    pub steps: Vec<SafetyStep>,
    /// Processes that could never be satisfied (empty when safe).
    pub unfinished: Vec<usize>,
}

/// Compute `need = max - allocation`, rejecting negative entries.
pub fn compute_need(
    allocation: &[Vec<u32>],
    max: &[Vec<u32>],
    resources: usize,
) -> Result<Vec<Vec<u32>>, SimError> {
    if max.len() != allocation.len() {
        return Err(SimError::DimensionMismatch {
            what: "max matrix rows",
            expected: allocation.len(),
            found: max.len(),
        });
    }

    let mut need = Vec::with_capacity(allocation.len());
    for (i, (alloc_row, max_row)) in allocation.iter().zip(max).enumerate() {
        check_row("allocation row", alloc_row, resources)?;
        check_row("max row", max_row, resources)?;

        let mut row = Vec::with_capacity(resources);
        for (j, (&held, &limit)) in alloc_row.iter().zip(max_row).enumerate() {
            match limit.checked_sub(held) {
                Some(n) => row.push(n),
                None => {
                    return Err(SimError::NegativeNeed {
                        process: i,
                        resource: j,
                    });
                }
            }
        }
        need.push(row);
    }
    Ok(need)
}

fn check_row(what: &'static str, row: &[u32], resources: usize) -> Result<(), SimError> {
    if row.len() != resources {
        return Err(SimError::DimensionMismatch {
            what,
            expected: resources,
            found: row.len(),
        });
    }
    Ok(())
}

/// True when every entry of `need` fits in `work`.
#[inline]
fn can_satisfy(need: &[u32], work: &[u32]) -> bool {
    need.iter().zip(work).all(|(n, w)| n <= w)
}

/// Run the safety algorithm over caller-owned matrices.
///
/// The number of resource types is taken from `available`. Any negative
/// need aborts before the search with [`SimError::NegativeNeed`], which is
/// distinct from an unsafe verdict.
pub fn check_safety(
    allocation: &[Vec<u32>],
    max: &[Vec<u32>],
    available: &[u32],
) -> Result<SafetyReport, SimError> {
    let resources = available.len();
    let need = compute_need(allocation, max, resources)?;
    let processes = allocation.len();

    let mut work = available.to_vec();
    let mut finish = vec![false; processes];
    let mut sequence = Vec::with_capacity(processes);
    let mut steps = Vec::with_capacity(processes);

    'search: while sequence.len() < processes {
        for i in 0..processes {
            if finish[i] || !can_satisfy(&need[i], &work) {
                continue;
            }

            let work_before = work.clone();
            for (w, held) in work.iter_mut().zip(&allocation[i]) {
                *w = w
                    .checked_add(*held)
                    .ok_or(SimError::Overflow { what: "work vector" })?;
            }
            trace!(process = i, ?work, "granted");

            finish[i] = true;
            sequence.push(i);
            steps.push(SafetyStep {
                process: i,
                work_before,
                work_after: work.clone(),
            });
            continue 'search;
        }
        break;
    }

    let unfinished: Vec<usize> = (0..processes).filter(|&i| !finish[i]).collect();
    let safe = unfinished.is_empty();
    debug!(processes, resources, safe, ?sequence, "banker's safety check");

    Ok(SafetyReport {
        safe,
        sequence,
        need,
        steps,
        unfinished,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn textbook() -> (Vec<Vec<u32>>, Vec<Vec<u32>>, Vec<u32>) {
        let allocation = vec![
            vec![0, 1, 0],
            vec![2, 0, 0],
            vec![3, 0, 2],
            vec![2, 1, 1],
            vec![0, 0, 2],
        ];
        let max = vec![
            vec![7, 5, 3],
            vec![3, 2, 2],
            vec![9, 0, 2],
            vec![2, 2, 2],
            vec![4, 3, 3],
        ];
        (allocation, max, vec![3, 3, 2])
    }

    #[test]
    fn test_textbook_state_is_safe() {
        let (allocation, max, available) = textbook();
        let report = check_safety(&allocation, &max, &available).unwrap();

        assert!(report.safe);
        // Index-ascending rescans pick P1 first, then restart and take P3.
        assert_eq!(report.sequence, vec![1, 3, 0, 2, 4]);
        assert!(report.unfinished.is_empty());
        assert_eq!(report.need[0], vec![7, 4, 3]);
        assert_eq!(report.need[4], vec![4, 3, 1]);
    }

    #[test]
    fn test_steps_track_work_vector() {
        let (allocation, max, available) = textbook();
        let report = check_safety(&allocation, &max, &available).unwrap();

        let first = &report.steps[0];
        assert_eq!(first.process, 1);
        assert_eq!(first.work_before, vec![3, 3, 2]);
        assert_eq!(first.work_after, vec![5, 3, 2]);

        let last = report.steps.last().unwrap();
        assert_eq!(last.work_after, vec![10, 5, 7]);
    }

    #[test]
    fn test_unsafe_state_reports_partial_sequence() {
        let allocation = vec![vec![1, 0], vec![0, 1], vec![1, 1]];
        let max = vec![vec![1, 1], vec![3, 3], vec![4, 4]];
        let available = vec![0, 1];

        let report = check_safety(&allocation, &max, &available).unwrap();
        assert!(!report.safe);
        assert_eq!(report.sequence, vec![0]);
        assert_eq!(report.unfinished, vec![1, 2]);
    }

    #[test]
    fn test_negative_need_is_an_input_error() {
        let allocation = vec![vec![2, 0], vec![0, 3]];
        let max = vec![vec![2, 1], vec![0, 2]];

        let err = check_safety(&allocation, &max, &[5, 5]).unwrap_err();
        assert_eq!(
            err,
            SimError::NegativeNeed {
                process: 1,
                resource: 1
            }
        );
    }

    #[test]
    fn test_shape_mismatch() {
        let allocation = vec![vec![0, 0]];
        let max = vec![vec![1, 1, 1]];
        let err = check_safety(&allocation, &max, &[1, 1]).unwrap_err();
        assert!(matches!(err, SimError::DimensionMismatch { what: "max row", .. }));

        let err = check_safety(&allocation, &[], &[1, 1]).unwrap_err();
        assert!(matches!(
            err,
            SimError::DimensionMismatch {
                what: "max matrix rows",
                ..
            }
        ));
    }

    #[test]
    fn test_no_processes_is_trivially_safe() {
        let report = check_safety(&[], &[], &[1, 2, 3]).unwrap();
        assert!(report.safe);
        assert!(report.sequence.is_empty());
        assert!(report.need.is_empty());
    }

    #[test]
    fn test_zero_need_processes_run_in_index_order() {
        let allocation = vec![vec![1], vec![1], vec![1]];
        let max = allocation.clone();
        let report = check_safety(&allocation, &max, &[0]).unwrap();
        assert_eq!(report.sequence, vec![0, 1, 2]);
    }

    #[test]
    fn test_repeat_runs_are_identical() {
        let (allocation, max, available) = textbook();
        let a = check_safety(&allocation, &max, &available).unwrap();
        let b = check_safety(&allocation, &max, &available).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_work_overflow_is_an_error() {
        let result = check_safety(&[vec![10]], &[vec![10]], &[u32::MAX]);
        assert_eq!(result, Err(SimError::Overflow { what: "work vector" }));

        // Reaching exactly u32::MAX is fine.
        let report = check_safety(&[vec![10]], &[vec![10]], &[u32::MAX - 10]).unwrap();
        assert_eq!(report.steps[0].work_after, vec![u32::MAX]);
    }

    /// Try every completion order.
    fn brute_force_safe(allocation: &[Vec<u32>], need: &[Vec<u32>], work: &[u32]) -> bool {
        fn go(allocation: &[Vec<u32>], need: &[Vec<u32>], work: &[u32], done: &mut [bool]) -> bool {
            if done.iter().all(|&d| d) {
                return true;
            }
            for i in 0..done.len() {
                if done[i] || !can_satisfy(&need[i], work) {
                    continue;
                }
                let next: Vec<u32> = work.iter().zip(&allocation[i]).map(|(w, a)| w + a).collect();
                done[i] = true;
                if go(allocation, need, &next, done) {
                    return true;
                }
                done[i] = false;
            }
            false
        }
        let mut done = vec![false; allocation.len()];
        go(allocation, need, work, &mut done)
    }

    fn arb_state() -> impl Strategy<Value = (Vec<Vec<u32>>, Vec<Vec<u32>>, Vec<u32>)> {
        (1usize..=4, 1usize..=3).prop_flat_map(|(p, r)| {
            (
                prop::collection::vec(prop::collection::vec(0u32..4, r), p),
                prop::collection::vec(prop::collection::vec(0u32..4, r), p),
                prop::collection::vec(0u32..5, r),
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn greedy_verdict_matches_brute_force((allocation, need, available) in arb_state()) {
            let max: Vec<Vec<u32>> = allocation
                .iter()
                .zip(&need)
                .map(|(a, n)| a.iter().zip(n).map(|(x, y)| x + y).collect())
                .collect();

            let report = check_safety(&allocation, &max, &available).unwrap();
            prop_assert_eq!(&report.need, &need);
            prop_assert_eq!(report.safe, brute_force_safe(&allocation, &need, &available));
            prop_assert_eq!(report.sequence.len() + report.unfinished.len(), allocation.len());
        }
    }
}
