//! Runs every section of a [`Scenario`] and collects the results.
//!
//! A failing section records its error message and the remaining sections
//! still run, so one bad matrix does not hide the paging trace.

use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::{analyze_paging, compare_schedules, PagingAnalysis, ScheduleComparison};
use crate::bankers::{check_safety, SafetyReport};
use crate::config::Limits;
use crate::error::SimError;
use crate::io::{BankersInput, PagingInput, Scenario, SchedulingInput};
use crate::paging::{simulate_all_strategies, PagingResult};
use crate::scheduling::{simulate_scheduling, Policy, ProcessSet, Schedule};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section<T> {
    Ok(T),
    Error(String),
}

impl<T> Section<T> {
    fn from_result(section: &str, result: Result<T, SimError>) -> Self {
        match result {
            Ok(value) => Section::Ok(value),
            Err(err) => {
                warn!(section, error = %err, "section rejected");
                Section::Error(err.to_string())
            }
        }
    }

    pub fn ok(&self) -> Option<&T> {
        match self {
            Section::Ok(value) => Some(value),
            Section::Error(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankersOutcome {
    pub input: BankersInput,
    pub report: SafetyReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagingOutcome {
    pub reference: Vec<u32>,
    pub frames: usize,
    pub results: Vec<PagingResult>,
    pub analysis: Option<PagingAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyRun {
    pub policy: Policy,
    pub schedule: Section<Schedule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulingOutcome {
    pub runs: Vec<PolicyRun>,
    pub comparison: ScheduleComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub bankers: Option<Section<BankersOutcome>>,
    pub paging: Option<Section<PagingOutcome>>,
    pub scheduling: Option<Section<SchedulingOutcome>>,
}

pub fn run_scenario(scenario: &Scenario) -> ScenarioOutcome {
    let limits = &scenario.limits;
    let outcome = ScenarioOutcome {
        bankers: scenario.bankers.as_ref().map(|input| {
            Section::from_result("bankers", run_bankers(input, limits))
        }),
        paging: scenario
            .paging
            .as_ref()
            .map(|input| Section::from_result("paging", run_paging(input, limits))),
        scheduling: scenario.scheduling.as_ref().map(|input| {
            Section::from_result("scheduling", run_scheduling(input, limits))
        }),
    };
    info!(
        bankers = outcome.bankers.is_some(),
        paging = outcome.paging.is_some(),
        scheduling = outcome.scheduling.is_some(),
        "scenario finished"
    );
    outcome
}

pub fn run_bankers(input: &BankersInput, limits: &Limits) -> Result<BankersOutcome, SimError> {
    limits.check_processes(input.allocation.len())?;
    limits.check_resources(input.available.len())?;
    let report = check_safety(&input.allocation, &input.max, &input.available)?;
    Ok(BankersOutcome {
        input: input.clone(),
        report,
    })
}

pub fn run_paging(input: &PagingInput, limits: &Limits) -> Result<PagingOutcome, SimError> {
    let results = simulate_all_strategies(&input.reference, input.frames, limits)?;
    let analysis = if input.reference.is_empty() {
        None
    } else {
        analyze_paging(&results)
    };
    Ok(PagingOutcome {
        reference: input.reference.clone(),
        frames: input.frames,
        results,
        analysis,
    })
}

pub fn run_scheduling(
    input: &SchedulingInput,
    limits: &Limits,
) -> Result<SchedulingOutcome, SimError> {
    limits.check_processes(input.processes.len())?;
    let set = ProcessSet::from_processes(input.processes.iter().copied())?;

    let runs: Vec<PolicyRun> = input
        .policies()
        .into_iter()
        .map(|policy| PolicyRun {
            policy,
            schedule: Section::from_result(
                policy.name(),
                simulate_scheduling(set.as_slice(), policy),
            ),
        })
        .collect();

    let finished: Vec<Schedule> = runs
        .iter()
        .filter_map(|run| run.schedule.ok().cloned())
        .collect();
    let comparison = compare_schedules(&finished);

    Ok(SchedulingOutcome { runs, comparison })
}
