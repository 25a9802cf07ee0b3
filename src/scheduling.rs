//! CPU scheduling simulation over a discrete time axis.
//!
//! Supported policies are FCFS, non-preemptive SJF, non-preemptive
//! Priority and Round Robin. Every run works on its own copy of the
//! bookkeeping, so the same process set can be scheduled under each
//! policy and compared.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub id: u32,
    pub arrival: u32,
    pub burst: u32,
    /// Lower value runs first. Only read by [`Policy::Priority`].
    #[serde(default)]
    pub priority: Option<u32>,
}

impl Process {
    pub fn new(id: u32, arrival: u32, burst: u32) -> Self {
        Process {
            id,
            arrival,
            burst,
            priority: None,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Insertion-ordered process list with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSet {
    processes: Vec<Process>,
}

impl ProcessSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set, rejecting the first duplicate id or zero burst.
    pub fn from_processes<I>(processes: I) -> Result<Self, SimError>
    where
        I: IntoIterator<Item = Process>,
    {
        let mut set = Self::new();
        for p in processes {
            set.insert(p)?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, process: Process) -> Result<(), SimError> {
        if process.burst == 0 {
            return Err(SimError::InvalidBurstTime { id: process.id });
        }
        if self.processes.iter().any(|p| p.id == process.id) {
            return Err(SimError::DuplicateProcessId { id: process.id });
        }
        self.processes.push(process);
        Ok(())
    }

    pub fn remove(&mut self, id: u32) -> Option<Process> {
        let pos = self.processes.iter().position(|p| p.id == id)?;
        Some(self.processes.remove(pos))
    }

    pub fn clear(&mut self) {
        self.processes.clear();
    }

    pub fn as_slice(&self) -> &[Process] {
        &self.processes
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    Fcfs,
    Sjf,
    Priority,
    RoundRobin { quantum: u32 },
}

impl Policy {
    pub fn name(&self) -> &'static str {
        match self {
            Policy::Fcfs => "FCFS",
            Policy::Sjf => "SJF",
            Policy::Priority => "Priority",
            Policy::RoundRobin { .. } => "Round Robin",
        }
    }

    /// All four policies; Round Robin uses `quantum`.
    pub fn all(quantum: u32) -> [Policy; 4] {
        [
            Policy::Fcfs,
            Policy::Sjf,
            Policy::Priority,
            Policy::RoundRobin { quantum },
        ]
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::RoundRobin { quantum } => write!(f, "Round Robin (q={quantum})"),
            _ => f.write_str(self.name()),
        }
    }
}

/// One contiguous execution interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GanttEntry {
    pub id: u32,
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub id: u32,
    pub arrival: u32,
    pub burst: u32,
    pub priority: Option<u32>,
    /// First dispatch.
    pub start: u32,
    pub completion: u32,
    pub turnaround: u32,
    pub waiting: u32,
    pub response: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub policy: Policy,
    /// Execution order.
    pub gantt: Vec<GanttEntry>,
    /// Input order.
    pub processes: Vec<ProcessResult>,
    pub avg_waiting: f64,
    pub avg_turnaround: f64,
}

impl Schedule {
    /// Time the last process completes.
    pub fn makespan(&self) -> u32 {
        self.gantt.last().map_or(0, |g| g.end)
    }

    pub fn intervals_for(&self, id: u32) -> impl Iterator<Item = &GanttEntry> {
        self.gantt.iter().filter(move |g| g.id == id)
    }
}

/// Per-run bookkeeping indexed by input position.
struct Timeline {
    start: Vec<Option<u32>>,
    completion: Vec<u32>,
    gantt: Vec<GanttEntry>,
}

impl Timeline {
    fn new(n: usize) -> Self {
        Timeline {
            start: vec![None; n],
            completion: vec![0; n],
            gantt: Vec::new(),
        }
    }

    fn run(&mut self, procs: &[Process], i: usize, start: u32, end: u32) {
        self.start[i].get_or_insert(start);
        self.gantt.push(GanttEntry {
            id: procs[i].id,
            start,
            end,
        });
        trace!(id = procs[i].id, start, end, "dispatch");
    }

    fn complete(&mut self, i: usize, at: u32) {
        self.completion[i] = at;
    }

    fn finish(self, procs: &[Process], policy: Policy) -> Schedule {
        let processes: Vec<ProcessResult> = procs
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let completion = self.completion[i];
                let start = self.start[i].unwrap_or(completion);
                let turnaround = completion - p.arrival;
                ProcessResult {
                    id: p.id,
                    arrival: p.arrival,
                    burst: p.burst,
                    priority: p.priority,
                    start,
                    completion,
                    turnaround,
                    waiting: turnaround - p.burst,
                    response: start - p.arrival,
                }
            })
            .collect();

        let (avg_waiting, avg_turnaround) = if processes.is_empty() {
            (0.0, 0.0)
        } else {
            let n = processes.len() as f64;
            let waiting: u64 = processes.iter().map(|r| r.waiting as u64).sum();
            let turnaround: u64 = processes.iter().map(|r| r.turnaround as u64).sum();
            (waiting as f64 / n, turnaround as f64 / n)
        };

        Schedule {
            policy,
            gantt: self.gantt,
            processes,
            avg_waiting,
            avg_turnaround,
        }
    }
}

/// Schedule `processes` under `policy`.
///
/// The caller owns id uniqueness (see [`ProcessSet`]). An empty slice
/// yields an empty schedule.
pub fn simulate_scheduling(processes: &[Process], policy: Policy) -> Result<Schedule, SimError> {
    validate(processes, policy)?;

    let mut timeline = Timeline::new(processes.len());
    match policy {
        Policy::Fcfs => fcfs(processes, &mut timeline)?,
        Policy::Sjf => non_preemptive(processes, &mut timeline, |p| p.burst)?,
        Policy::Priority => non_preemptive(processes, &mut timeline, |p| p.priority)?,
        Policy::RoundRobin { quantum } => round_robin(processes, quantum, &mut timeline)?,
    }

    let schedule = timeline.finish(processes, policy);
    debug!(
        policy = policy.name(),
        processes = processes.len(),
        avg_waiting = schedule.avg_waiting,
        avg_turnaround = schedule.avg_turnaround,
        "scheduling simulation finished"
    );
    Ok(schedule)
}

/// Run every policy on the same processes. Failures stay per policy.
pub fn simulate_all_policies(
    processes: &[Process],
    quantum: u32,
) -> Vec<(Policy, Result<Schedule, SimError>)> {
    Policy::all(quantum)
        .into_iter()
        .map(|policy| (policy, simulate_scheduling(processes, policy)))
        .collect()
}

fn validate(processes: &[Process], policy: Policy) -> Result<(), SimError> {
    if let Policy::RoundRobin { quantum: 0 } = policy {
        return Err(SimError::InvalidTimeQuantum { quantum: 0 });
    }
    for p in processes {
        if p.burst == 0 {
            return Err(SimError::InvalidBurstTime { id: p.id });
        }
        if policy == Policy::Priority && p.priority.is_none() {
            return Err(SimError::MissingPriority { id: p.id });
        }
    }
    Ok(())
}

fn advance(now: u32, by: u32) -> Result<u32, SimError> {
    now.checked_add(by).ok_or(SimError::Overflow { what: "clock" })
}

/// Input positions sorted by arrival; ties keep input order.
fn arrival_order(procs: &[Process]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..procs.len()).collect();
    order.sort_by_key(|&i| procs[i].arrival);
    order
}

fn fcfs(procs: &[Process], timeline: &mut Timeline) -> Result<(), SimError> {
    let mut now = 0;
    for i in arrival_order(procs) {
        let start = now.max(procs[i].arrival);
        let end = advance(start, procs[i].burst)?;
        timeline.run(procs, i, start, end);
        timeline.complete(i, end);
        now = end;
    }
    Ok(())
}

/// Pick the arrived process with the smallest `key`, ties to the earliest
/// arrival then input order, and run it to completion.
fn non_preemptive<K, F>(
    procs: &[Process],
    timeline: &mut Timeline,
    key: F,
) -> Result<(), SimError>
where
    K: Ord,
    F: Fn(&Process) -> K,
{
    let mut done = vec![false; procs.len()];
    let mut left = procs.len();
    let mut now = 0;

    while left > 0 {
        let pick = (0..procs.len())
            .filter(|&i| !done[i] && procs[i].arrival <= now)
            .min_by_key(|&i| (key(&procs[i]), procs[i].arrival, i));

        let Some(i) = pick else {
            // Idle: nothing can be picked before the next arrival.
            now = (0..procs.len())
                .filter(|&j| !done[j])
                .map(|j| procs[j].arrival)
                .min()
                .unwrap_or(now);
            continue;
        };

        let end = advance(now, procs[i].burst)?;
        timeline.run(procs, i, now, end);
        timeline.complete(i, end);
        done[i] = true;
        left -= 1;
        now = end;
    }
    Ok(())
}

fn admit(
    procs: &[Process],
    order: &[usize],
    next: &mut usize,
    now: u32,
    queue: &mut VecDeque<usize>,
) {
    while *next < order.len() && procs[order[*next]].arrival <= now {
        queue.push_back(order[*next]);
        *next += 1;
    }
}

fn round_robin(procs: &[Process], quantum: u32, timeline: &mut Timeline) -> Result<(), SimError> {
    let order = arrival_order(procs);
    let mut remaining: Vec<u32> = procs.iter().map(|p| p.burst).collect();
    let mut queue = VecDeque::with_capacity(procs.len());
    let mut next = 0;
    let mut now = 0;

    admit(procs, &order, &mut next, now, &mut queue);
    loop {
        let Some(i) = queue.pop_front() else {
            if next >= order.len() {
                break;
            }
            // CPU idles until the next arrival.
            now = now.max(procs[order[next]].arrival);
            admit(procs, &order, &mut next, now, &mut queue);
            continue;
        };

        let slice = quantum.min(remaining[i]);
        let start = now;
        now = advance(now, slice)?;
        remaining[i] -= slice;
        timeline.run(procs, i, start, now);

        // Arrivals during the slice queue ahead of the preempted process.
        admit(procs, &order, &mut next, now, &mut queue);
        if remaining[i] > 0 {
            queue.push_back(i);
        } else {
            timeline.complete(i, now);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gantt(schedule: &Schedule) -> Vec<(u32, u32, u32)> {
        schedule
            .gantt
            .iter()
            .map(|g| (g.id, g.start, g.end))
            .collect()
    }

    fn column<F: Fn(&ProcessResult) -> u32>(schedule: &Schedule, f: F) -> Vec<u32> {
        schedule.processes.iter().map(f).collect()
    }

    #[test]
    fn test_fcfs_reference_example() {
        let procs = [Process::new(0, 0, 5), Process::new(1, 1, 3), Process::new(2, 2, 8)];
        let s = simulate_scheduling(&procs, Policy::Fcfs).unwrap();

        assert_eq!(column(&s, |r| r.completion), vec![5, 8, 16]);
        assert_eq!(column(&s, |r| r.waiting), vec![0, 4, 6]);
        assert_eq!(column(&s, |r| r.turnaround), vec![5, 7, 14]);
        assert!((s.avg_waiting - 10.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.makespan(), 16);
    }

    #[test]
    fn test_fcfs_ties_keep_insertion_order() {
        let procs = [Process::new(5, 0, 2), Process::new(3, 0, 1)];
        let s = simulate_scheduling(&procs, Policy::Fcfs).unwrap();
        assert_eq!(gantt(&s), vec![(5, 0, 2), (3, 2, 3)]);
    }

    #[test]
    fn test_fcfs_waits_for_late_arrival() {
        let procs = [Process::new(0, 3, 2)];
        let s = simulate_scheduling(&procs, Policy::Fcfs).unwrap();
        assert_eq!(s.processes[0].start, 3);
        assert_eq!(s.processes[0].completion, 5);
        assert_eq!(s.processes[0].waiting, 0);
    }

    #[test]
    fn test_sjf_picks_shortest_arrived_job() {
        let procs = [
            Process::new(0, 0, 8),
            Process::new(1, 1, 4),
            Process::new(2, 2, 9),
            Process::new(3, 3, 5),
        ];
        let s = simulate_scheduling(&procs, Policy::Sjf).unwrap();

        assert_eq!(
            gantt(&s),
            vec![(0, 0, 8), (1, 8, 12), (3, 12, 17), (2, 17, 26)]
        );
        assert_eq!(column(&s, |r| r.waiting), vec![0, 7, 15, 9]);
        assert!((s.avg_waiting - 7.75).abs() < 1e-12);
    }

    #[test]
    fn test_sjf_ties_break_on_arrival() {
        let procs = [Process::new(0, 0, 4), Process::new(1, 2, 3), Process::new(2, 1, 3)];
        let s = simulate_scheduling(&procs, Policy::Sjf).unwrap();
        assert_eq!(gantt(&s), vec![(0, 0, 4), (2, 4, 7), (1, 7, 10)]);
    }

    #[test]
    fn test_sjf_idles_until_arrival() {
        let procs = [Process::new(0, 2, 1), Process::new(1, 6, 2)];
        let s = simulate_scheduling(&procs, Policy::Sjf).unwrap();
        assert_eq!(gantt(&s), vec![(0, 2, 3), (1, 6, 8)]);
    }

    #[test]
    fn test_priority_lower_value_runs_first() {
        let procs = [
            Process::new(0, 0, 5).with_priority(3),
            Process::new(1, 1, 3).with_priority(1),
            Process::new(2, 2, 1).with_priority(4),
            Process::new(3, 3, 2).with_priority(1),
        ];
        let s = simulate_scheduling(&procs, Policy::Priority).unwrap();
        assert_eq!(
            gantt(&s),
            vec![(0, 0, 5), (1, 5, 8), (3, 8, 10), (2, 10, 11)]
        );
        assert_eq!(s.processes[2].priority, Some(4));
    }

    #[test]
    fn test_priority_requires_explicit_priority() {
        let procs = [Process::new(0, 0, 2).with_priority(1), Process::new(9, 0, 2)];
        let err = simulate_scheduling(&procs, Policy::Priority).unwrap_err();
        assert_eq!(err, SimError::MissingPriority { id: 9 });

        // Other policies ignore it.
        assert!(simulate_scheduling(&procs, Policy::Sjf).is_ok());
    }

    #[test]
    fn test_round_robin_reference_example() {
        let procs = [Process::new(0, 0, 5), Process::new(1, 1, 3)];
        let s = simulate_scheduling(&procs, Policy::RoundRobin { quantum: 2 }).unwrap();

        assert_eq!(
            gantt(&s),
            vec![(0, 0, 2), (1, 2, 4), (0, 4, 6), (1, 6, 7), (0, 7, 8)]
        );
        assert_eq!(s.processes[1].start, 2);
        assert!(s.intervals_for(0).count() >= 2);
        assert_eq!(column(&s, |r| r.completion), vec![8, 7]);
        assert_eq!(column(&s, |r| r.waiting), vec![3, 3]);
    }

    #[test]
    fn test_round_robin_arrival_at_slice_end_queues_first() {
        let procs = [Process::new(0, 0, 3), Process::new(1, 2, 2)];
        let s = simulate_scheduling(&procs, Policy::RoundRobin { quantum: 2 }).unwrap();
        assert_eq!(gantt(&s), vec![(0, 0, 2), (1, 2, 4), (0, 4, 5)]);
    }

    #[test]
    fn test_round_robin_idles_between_arrivals() {
        let procs = [Process::new(0, 0, 1), Process::new(1, 5, 2)];
        let s = simulate_scheduling(&procs, Policy::RoundRobin { quantum: 2 }).unwrap();
        assert_eq!(gantt(&s), vec![(0, 0, 1), (1, 5, 7)]);
        assert_eq!(s.processes[1].response, 0);
    }

    #[test]
    fn test_clock_overflow_is_an_error() {
        let late = [Process::new(0, u32::MAX - 1, 5).with_priority(1)];
        for policy in Policy::all(2) {
            assert_eq!(
                simulate_scheduling(&late, policy),
                Err(SimError::Overflow { what: "clock" }),
                "{policy}"
            );
        }

        // Ending exactly at u32::MAX still fits.
        let long = [Process::new(0, 0, u32::MAX)];
        let s = simulate_scheduling(&long, Policy::Fcfs).unwrap();
        assert_eq!(s.makespan(), u32::MAX);

        let long = [Process::new(0, 0, u32::MAX), Process::new(1, 0, 1)];
        assert_eq!(
            simulate_scheduling(&long, Policy::Fcfs),
            Err(SimError::Overflow { what: "clock" })
        );
    }

    #[test]
    fn test_idle_gap_near_max_arrival() {
        let procs = [Process::new(3, u32::MAX - 10, 4)];
        let s = simulate_scheduling(&procs, Policy::Sjf).unwrap();
        assert_eq!(gantt(&s), vec![(3, u32::MAX - 10, u32::MAX - 6)]);
        assert_eq!(s.processes[0].waiting, 0);
    }

    #[test]
    fn test_round_robin_rejects_zero_quantum() {
        let procs = [Process::new(0, 0, 1)];
        let err = simulate_scheduling(&procs, Policy::RoundRobin { quantum: 0 }).unwrap_err();
        assert_eq!(err, SimError::InvalidTimeQuantum { quantum: 0 });
    }

    #[test]
    fn test_empty_process_list() {
        for policy in Policy::all(2) {
            let s = simulate_scheduling(&[], policy).unwrap();
            assert!(s.gantt.is_empty());
            assert!(s.processes.is_empty());
            assert_eq!(s.avg_waiting, 0.0);
            assert_eq!(s.avg_turnaround, 0.0);
        }
    }

    #[test]
    fn test_process_set_rejects_duplicates() {
        let mut set = ProcessSet::new();
        set.insert(Process::new(1, 0, 3)).unwrap();
        assert_eq!(
            set.insert(Process::new(1, 4, 2)),
            Err(SimError::DuplicateProcessId { id: 1 })
        );
        assert_eq!(
            set.insert(Process::new(2, 0, 0)),
            Err(SimError::InvalidBurstTime { id: 2 })
        );
        assert_eq!(set.len(), 1);

        assert_eq!(set.remove(1).map(|p| p.burst), Some(3));
        assert!(set.is_empty());
        assert!(set.remove(1).is_none());
    }

    #[test]
    fn test_all_policies_fail_independently() {
        let procs = [Process::new(0, 0, 3), Process::new(1, 1, 2)];
        let runs = simulate_all_policies(&procs, 2);
        assert_eq!(runs.len(), 4);
        assert!(runs[0].1.is_ok());
        assert!(runs[1].1.is_ok());
        assert!(matches!(runs[2].1, Err(SimError::MissingPriority { id: 0 })));
        assert!(runs[3].1.is_ok());
    }

    #[test]
    fn test_repeat_runs_are_identical() {
        let procs = [
            Process::new(0, 0, 4).with_priority(2),
            Process::new(1, 1, 3).with_priority(1),
            Process::new(2, 1, 6).with_priority(2),
        ];
        for policy in Policy::all(3) {
            let a = simulate_scheduling(&procs, policy).unwrap();
            let b = simulate_scheduling(&procs, policy).unwrap();
            assert_eq!(a, b);
        }
    }

    fn arb_processes() -> impl Strategy<Value = Vec<Process>> {
        prop::collection::vec((0u32..12, 1u32..8, 0u32..4), 0..8).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (arrival, burst, prio))| {
                    Process::new(i as u32, arrival, burst).with_priority(prio)
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn timing_identities_hold(procs in arb_processes(), quantum in 1u32..5) {
            for policy in Policy::all(quantum) {
                let s = simulate_scheduling(&procs, policy).unwrap();
                prop_assert_eq!(s.processes.len(), procs.len());

                let waiting: u32 = s.processes.iter().map(|r| r.waiting).sum();
                let burst: u32 = s.processes.iter().map(|r| r.burst).sum();
                let turnaround: u32 = s.processes.iter().map(|r| r.turnaround).sum();
                prop_assert_eq!(waiting + burst, turnaround);

                for r in &s.processes {
                    prop_assert_eq!(r.turnaround, r.completion - r.arrival);
                    prop_assert!(r.turnaround >= r.burst);
                    prop_assert!(r.start >= r.arrival);
                    let ran: u32 = s.intervals_for(r.id).map(|g| g.end - g.start).sum();
                    prop_assert_eq!(ran, r.burst);
                }

                for pair in s.gantt.windows(2) {
                    prop_assert!(pair[0].end <= pair[1].start);
                }
            }
        }
    }
}
