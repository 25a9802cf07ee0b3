//! Plain-text rendering of simulation results.
//!
//! The output is deterministic: no timestamps, so the same scenario always
//! renders the same report.

use std::fmt::{self, Display, Formatter};

use crate::analysis::{PagingAnalysis, ScheduleComparison};
use crate::bankers::SafetyReport;
use crate::paging::PagingResult;
use crate::runner::{BankersOutcome, PagingOutcome, ScenarioOutcome, SchedulingOutcome, Section};
use crate::scheduling::Schedule;

const RULE: &str = "========================================";

const UNSAFE_SUGGESTIONS: [&str; 4] = [
    "Increase available resources",
    "Reduce maximum resource requirements",
    "Reallocate resources from other processes",
    "Wait for some processes to release resources",
];

fn join<T: ToString>(items: &[T], sep: &str) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

fn process_list(ids: &[usize], sep: &str) -> String {
    ids.iter()
        .map(|p| format!("P{p}"))
        .collect::<Vec<_>>()
        .join(sep)
}

fn write_matrix(f: &mut Formatter<'_>, title: &str, rows: &[Vec<u32>]) -> fmt::Result {
    writeln!(f, "{title}:")?;
    let resources = rows.first().map_or(0, |r| r.len());
    write!(f, "{:<8}", "Process")?;
    for j in 0..resources {
        write!(f, "{:>5}", format!("R{j}"))?;
    }
    writeln!(f)?;
    for (i, row) in rows.iter().enumerate() {
        write!(f, "{:<8}", format!("P{i}"))?;
        for v in row {
            write!(f, "{v:>5}")?;
        }
        writeln!(f)?;
    }
    Ok(())
}

struct Safety<'a>(&'a SafetyReport);

impl Display for Safety<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let report = self.0;
        write_matrix(f, "Need Matrix (Max - Allocation)", &report.need)?;
        writeln!(f)?;

        if report.safe {
            writeln!(f, "System is in SAFE state. Safe sequence found.")?;
            writeln!(f, "Safe Sequence: {}", process_list(&report.sequence, " -> "))?;
            writeln!(
                f,
                "All processes can be completed in the order shown above without causing a deadlock."
            )?;
        } else {
            writeln!(f, "System is in UNSAFE state. Deadlock may occur.")?;
            if !report.sequence.is_empty() {
                writeln!(
                    f,
                    "Completed before stalling: {}",
                    process_list(&report.sequence, " -> ")
                )?;
            }
            writeln!(f, "Cannot complete: {}", process_list(&report.unfinished, ", "))?;
            writeln!(f, "Suggestions:")?;
            for s in UNSAFE_SUGGESTIONS {
                writeln!(f, "  - {s}")?;
            }
        }

        if !report.steps.is_empty() {
            writeln!(f)?;
            writeln!(f, "Steps:")?;
            for step in &report.steps {
                writeln!(
                    f,
                    "  P{}: work [{}] -> [{}]",
                    step.process,
                    join(&step.work_before, ", "),
                    join(&step.work_after, ", ")
                )?;
            }
        }
        Ok(())
    }
}

struct PagingTable<'a>(&'a PagingResult);

impl Display for PagingTable<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let result = self.0;
        writeln!(f, "{} Algorithm", result.strategy)?;

        write!(f, "{:>5} {:>5}", "Step", "Page")?;
        for slot in 1..=result.num_frames {
            write!(f, " {:>4}", format!("F{slot}"))?;
        }
        writeln!(f, " {:>6}  Action", "Fault")?;

        for step in &result.steps {
            write!(f, "{:>5} {:>5}", step.step, step.page)?;
            for slot in 0..result.num_frames {
                match step.frames.get(slot) {
                    Some(page) => write!(f, " {page:>4}")?,
                    None => write!(f, " {:>4}", "-")?,
                }
            }
            let fault = if step.fault { "Yes" } else { "No" };
            writeln!(f, " {fault:>6}  {}", step.description)?;
        }
        writeln!(
            f,
            "{} faults | {:.2}% fault rate",
            result.total_faults,
            result.fault_rate * 100.0
        )
    }
}

struct Analysis<'a>(&'a PagingAnalysis);

impl Display for Analysis<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let analysis = self.0;
        writeln!(f, "Analysis:")?;
        for s in &analysis.summaries {
            writeln!(
                f,
                "  {:<8} faults {:>3}  hits {:>3}  hit rate {:>6.2}%  efficiency {:>6.2}%",
                s.strategy.name(),
                s.faults,
                s.hits,
                s.hit_rate * 100.0,
                s.efficiency * 100.0
            )?;
        }
        writeln!(f, "Best Algorithm: {}", analysis.best)?;
        if analysis.worst != analysis.best {
            writeln!(f, "Worst Algorithm: {}", analysis.worst)?;
        }
        writeln!(f, "Recommendations:")?;
        for r in &analysis.recommendations {
            writeln!(f, "  - {r}")?;
        }
        Ok(())
    }
}

struct ScheduleTable<'a>(&'a Schedule);

impl Display for ScheduleTable<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let schedule = self.0;
        writeln!(f, "{} Scheduling Results", schedule.policy)?;

        let gantt: Vec<String> = schedule
            .gantt
            .iter()
            .map(|g| format!("P{} {}-{}", g.id, g.start, g.end))
            .collect();
        if gantt.is_empty() {
            writeln!(f, "Gantt Chart: (empty)")?;
        } else {
            writeln!(f, "Gantt Chart: | {} |", gantt.join(" | "))?;
        }

        writeln!(
            f,
            "{:>7} {:>7} {:>5} {:>8} {:>5} {:>10} {:>10} {:>7}",
            "Process", "Arrival", "Burst", "Priority", "Start", "Completion", "Turnaround", "Waiting"
        )?;
        for r in &schedule.processes {
            let priority = r.priority.map_or_else(|| "-".to_string(), |p| p.to_string());
            writeln!(
                f,
                "{:>7} {:>7} {:>5} {:>8} {:>5} {:>10} {:>10} {:>7}",
                format!("P{}", r.id),
                r.arrival,
                r.burst,
                priority,
                r.start,
                r.completion,
                r.turnaround,
                r.waiting
            )?;
        }
        writeln!(f, "Average Waiting Time: {:.2}", schedule.avg_waiting)?;
        writeln!(f, "Average Turnaround Time: {:.2}", schedule.avg_turnaround)
    }
}

struct Comparison<'a>(&'a ScheduleComparison);

impl Display for Comparison<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let comparison = self.0;
        if comparison.ranking.is_empty() {
            return Ok(());
        }
        writeln!(f, "Comparison (by average waiting time):")?;
        for (rank, r) in comparison.ranking.iter().enumerate() {
            writeln!(
                f,
                "  {}. {:<20} waiting {:>7.2}  turnaround {:>7.2}",
                rank + 1,
                r.policy.to_string(),
                r.avg_waiting,
                r.avg_turnaround
            )?;
        }
        Ok(())
    }
}

fn write_bankers(f: &mut Formatter<'_>, outcome: &BankersOutcome) -> fmt::Result {
    write_matrix(f, "Allocation Matrix", &outcome.input.allocation)?;
    write_matrix(f, "Max Matrix", &outcome.input.max)?;
    writeln!(f, "Available: [{}]", join(&outcome.input.available, ", "))?;
    writeln!(f)?;
    write!(f, "{}", Safety(&outcome.report))
}

fn write_paging(f: &mut Formatter<'_>, outcome: &PagingOutcome) -> fmt::Result {
    writeln!(f, "Reference String: {}", join(&outcome.reference, ","))?;
    writeln!(f, "Number of Frames: {}", outcome.frames)?;
    for result in &outcome.results {
        write!(f, "\n{}", PagingTable(result))?;
    }
    if let Some(analysis) = &outcome.analysis {
        write!(f, "\n{}", Analysis(analysis))?;
    }
    Ok(())
}

fn write_scheduling(f: &mut Formatter<'_>, outcome: &SchedulingOutcome) -> fmt::Result {
    for run in &outcome.runs {
        match &run.schedule {
            Section::Ok(schedule) => write!(f, "{}", ScheduleTable(schedule))?,
            Section::Error(err) => writeln!(f, "{}: error: {err}", run.policy)?,
        }
        writeln!(f)?;
    }
    write!(f, "{}", Comparison(&outcome.comparison))
}

type SectionWriter<T> = fn(&mut Formatter<'_>, &T) -> fmt::Result;

fn write_section<T>(
    f: &mut Formatter<'_>,
    title: &str,
    section: &Section<T>,
    body: SectionWriter<T>,
) -> fmt::Result {
    writeln!(f, "{RULE}\n{title}\n{RULE}")?;
    match section {
        Section::Ok(value) => body(f, value)?,
        Section::Error(err) => writeln!(f, "Error: {err}")?,
    }
    writeln!(f)
}

struct Outcome<'a>(&'a ScenarioOutcome);

impl Display for Outcome<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let outcome = self.0;
        if outcome.bankers.is_none() && outcome.paging.is_none() && outcome.scheduling.is_none() {
            return writeln!(f, "Nothing to simulate.");
        }
        if let Some(section) = &outcome.bankers {
            write_section(f, "BANKER'S ALGORITHM RESULTS", section, write_bankers)?;
        }
        if let Some(section) = &outcome.paging {
            write_section(f, "PAGE REPLACEMENT RESULTS", section, write_paging)?;
        }
        if let Some(section) = &outcome.scheduling {
            write_section(f, "CPU SCHEDULING RESULTS", section, write_scheduling)?;
        }
        Ok(())
    }
}

pub fn render_safety(report: &SafetyReport) -> String {
    Safety(report).to_string()
}

pub fn render_paging_result(result: &PagingResult) -> String {
    PagingTable(result).to_string()
}

pub fn render_paging_analysis(analysis: &PagingAnalysis) -> String {
    Analysis(analysis).to_string()
}

pub fn render_schedule(schedule: &Schedule) -> String {
    ScheduleTable(schedule).to_string()
}

pub fn render_comparison(comparison: &ScheduleComparison) -> String {
    Comparison(comparison).to_string()
}

/// Full text export of a scenario run.
pub fn render_outcome(outcome: &ScenarioOutcome) -> String {
    Outcome(outcome).to_string()
}
