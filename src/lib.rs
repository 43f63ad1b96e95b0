//! Phased HTTP load-generation engine.
//!
//! Turns a validated test plan (phases, scenarios, request steps) into
//! rate-paced concurrent HTTP traffic against one target, or against two
//! deployments of the same service in duet mode, and reduces the recorded
//! latencies to a percentile report.
//!
//! Plan parsing/validation, result publishing, and statistical
//! significance testing over the duet sample series are owned by the
//! caller; this crate only drives the traffic and accumulates the
//! numbers.

pub mod client;
pub mod error;
pub mod executor;
pub mod models;
pub mod report;

pub use client::RequestError;
pub use error::ConfigError;
pub use executor::{run_load_test, run_load_test_as};
pub use models::plan::{
    DuetTargets, ExecutionMode, ParamValue, Phase, RequestStep, Scenario, StepBody, Target,
    TestConfig,
};
pub use models::stats::{latency_change, DuetSamples, LoadTestStats, RequestStats, SampleUnit};
pub use report::{percentile, LoadTestReport};
