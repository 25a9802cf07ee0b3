use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::Limits;
use crate::constants::{DEFAULT_TIME_QUANTUM, PAGING_SAMPLES};
use crate::scheduling::{Policy, Process};

/// Input file for one simulator run. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub limits: Limits,
    pub bankers: Option<BankersInput>,
    pub paging: Option<PagingInput>,
    pub scheduling: Option<SchedulingInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankersInput {
    pub allocation: Vec<Vec<u32>>,
    pub max: Vec<Vec<u32>>,
    pub available: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInput {
    /// A JSON array, or a string such as `"7, 0, 1 2"`.
    #[serde(deserialize_with = "deserialize_reference")]
    pub reference: Vec<u32>,
    pub frames: usize,
}

impl PagingInput {
    /// Built-in sample `n` (1-based).
    pub fn sample(n: usize) -> Option<Self> {
        let (_, reference, frames) = PAGING_SAMPLES.get(n.checked_sub(1)?)?;
        Some(PagingInput {
            reference: reference.to_vec(),
            frames: *frames,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyName {
    Fcfs,
    Sjf,
    Priority,
    RoundRobin,
}

impl PolicyName {
    pub fn with_quantum(self, quantum: u32) -> Policy {
        match self {
            PolicyName::Fcfs => Policy::Fcfs,
            PolicyName::Sjf => Policy::Sjf,
            PolicyName::Priority => Policy::Priority,
            PolicyName::RoundRobin => Policy::RoundRobin { quantum },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingInput {
    pub processes: Vec<Process>,
    #[serde(default = "default_quantum")]
    pub quantum: u32,
    #[serde(default = "default_policies")]
    pub policies: Vec<PolicyName>,
}

impl SchedulingInput {
    pub fn policies(&self) -> Vec<Policy> {
        self.policies
            .iter()
            .map(|p| p.with_quantum(self.quantum))
            .collect()
    }
}

fn default_quantum() -> u32 {
    DEFAULT_TIME_QUANTUM
}

fn default_policies() -> Vec<PolicyName> {
    vec![
        PolicyName::Fcfs,
        PolicyName::Sjf,
        PolicyName::Priority,
        PolicyName::RoundRobin,
    ]
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReferenceInput {
    List(Vec<u32>),
    Text(String),
}

fn deserialize_reference<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match ReferenceInput::deserialize(deserializer)? {
        ReferenceInput::List(pages) => pages,
        ReferenceInput::Text(text) => parse_reference_string(&text),
    })
}

/// Split on commas and whitespace, keeping only non-negative integers.
///
/// Malformed tokens are dropped rather than reported, so `"7,,0, x, -1, 1"`
/// reads as `[7, 0, 1]`.
pub fn parse_reference_string(text: &str) -> Vec<u32> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter_map(|token| token.trim().parse().ok())
        .collect()
}

#[derive(Debug)]
pub enum ScenarioError {
    Read { path: PathBuf, source: io::Error },
    Write { path: PathBuf, source: io::Error },
    Json(serde_json::Error),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            Self::Write { path, source } => {
                write!(f, "failed to write {}: {source}", path.display())
            }
            Self::Json(err) => write!(f, "invalid scenario: {err}"),
        }
    }
}

impl std::error::Error for ScenarioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } => Some(source),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ScenarioError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

pub fn parse_scenario(content: &str) -> Result<Scenario, ScenarioError> {
    Ok(serde_json::from_str(content)?)
}

pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Scenario, ScenarioError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scenario(&content)
}

pub fn write_output<P: AsRef<Path>>(path: P, content: &str) -> Result<(), ScenarioError> {
    let path = path.as_ref();
    fs::write(path, content).map_err(|source| ScenarioError::Write {
        path: path.to_path_buf(),
        source,
    })
}
