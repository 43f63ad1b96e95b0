use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::ConfigError;

/// One deployment under test: a base URL plus defaults layered under every
/// request sent to it.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Target {
    pub url: String,

    #[serde(default)]
    pub default_headers: Option<HashMap<String, String>>,

    #[serde(default)]
    pub default_query_params: Option<HashMap<String, ParamValue>>,
}

/// The two deployments compared in duet mode.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DuetTargets {
    pub old: Target,
    pub latest: Target,
}

/// A query parameter value, either a string or a number on the wire.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Number(f64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// A single HTTP step within a scenario. `url` is a path suffix joined to
/// the active target's base URL.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RequestStep {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_method")]
    pub method: String,

    pub url: String,

    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    #[serde(default)]
    pub body: Option<StepBody>,

    /// Pause after this step, in milliseconds; local to the scenario
    /// instance.
    #[serde(default, rename = "thinkTime")]
    pub think_time: Option<u64>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl RequestStep {
    /// Key under which this step's samples accumulate: the explicit name
    /// if given, otherwise the path.
    pub fn metric_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum StepBody {
    Json(serde_json::Value),
    Raw(String),
}

/// A named, ordered user flow. Steps run top to bottom, never reordered.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Scenario {
    pub name: String,
    pub requests: Vec<RequestStep>,
}

/// A fixed-duration segment of the test with its own arrival rate and
/// optional concurrency ceiling.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Phase {
    /// Phase duration in seconds.
    pub duration: f64,

    /// Target scenario launches per second.
    pub arrival_rate: f64,

    /// Cap on scenario instances with unfinished steps; unbounded if
    /// absent.
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// Drain all in-flight scenarios after every launch, running them one
    /// at a time regardless of `concurrency`. Off by default; exists to
    /// reproduce the stricter serialized pacing some older harnesses used.
    #[serde(default)]
    pub serialize_arrivals: bool,
}

/// Whether the run drives one target or compares two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Single,
    Duet,
}

/// A validated test plan. Exactly one of `target`/`targets` must be set;
/// which one selects single vs. duet execution.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TestConfig {
    #[serde(default)]
    pub target: Option<Target>,

    #[serde(default)]
    pub targets: Option<DuetTargets>,

    /// Per-request timeout in milliseconds; an expired request is aborted
    /// and counted as failed.
    #[serde(default)]
    pub timeout: Option<u64>,

    pub phases: Vec<Phase>,

    pub scenarios: Vec<Scenario>,
}

impl TestConfig {
    /// Derive the execution mode from which target field the plan
    /// populated.
    pub fn execution_mode(&self) -> Result<ExecutionMode, ConfigError> {
        match (&self.target, &self.targets) {
            (Some(_), None) => Ok(ExecutionMode::Single),
            (None, Some(_)) => Ok(ExecutionMode::Duet),
            (Some(_), Some(_)) => Err(ConfigError::AmbiguousMode),
            (None, None) => Err(ConfigError::NoTargets),
        }
    }
}
