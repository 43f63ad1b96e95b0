mod duet;
mod scenario;

use rand::Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::info;

use crate::client::{self, HttpsClient};
use crate::error::ConfigError;
use crate::models::plan::{DuetTargets, ExecutionMode, Phase, Scenario, Target, TestConfig};
use crate::models::stats::{LoadTestStats, SampleUnit};
use crate::report::{self, LoadTestReport};

/// Which executor a launched scenario instance runs through.
enum ResolvedMode {
    Single(Target),
    Duet(DuetTargets),
}

/// Everything a spawned scenario instance needs, shared across the run.
pub(crate) struct RunContext {
    pub(crate) client: HttpsClient,
    pub(crate) timeout: Option<Duration>,
    pub(crate) stats: Mutex<LoadTestStats>,
    mode: ResolvedMode,
    scenarios: Vec<Scenario>,
}

/// Run a full test plan, deriving single vs. duet execution from which
/// target field the plan populated.
pub async fn run_load_test(config: &TestConfig) -> Result<LoadTestReport, ConfigError> {
    let mode = config.execution_mode()?;
    run_load_test_as(config, mode).await
}

/// Run a full test plan in an explicitly requested mode. Fails before any
/// phase executes if the plan shape does not support that mode.
pub async fn run_load_test_as(
    config: &TestConfig,
    mode: ExecutionMode,
) -> Result<LoadTestReport, ConfigError> {
    let (resolved, unit) = match mode {
        ExecutionMode::Single => (
            ResolvedMode::Single(config.target.clone().ok_or(ConfigError::MissingTarget)?),
            SampleUnit::Millis,
        ),
        ExecutionMode::Duet => (
            ResolvedMode::Duet(config.targets.clone().ok_or(ConfigError::MissingTargets)?),
            SampleUnit::Percent,
        ),
    };
    if config.scenarios.is_empty() {
        return Err(ConfigError::NoScenarios);
    }

    let ctx = Arc::new(RunContext {
        client: client::build_client(),
        timeout: config.timeout.map(Duration::from_millis),
        stats: Mutex::new(LoadTestStats::new(unit)),
        mode: resolved,
        scenarios: config.scenarios.clone(),
    });

    for (index, phase) in config.phases.iter().enumerate() {
        info!(
            phase = index + 1,
            duration_secs = phase.duration,
            arrival_rate = phase.arrival_rate,
            concurrency = phase.concurrency,
            "running phase"
        );
        run_phase(phase, &ctx).await;
    }
    info!("load test completed");

    let stats = ctx.stats.lock().unwrap();
    Ok(report::summarize(&stats))
}

/// Pace scenario arrivals at `arrival_rate` for `duration`, holding the
/// number of in-flight scenario instances under the optional concurrency
/// cap. Launches are spawned, not awaited, so many instances overlap when
/// the rate outpaces per-scenario latency; everything still in flight is
/// drained before the phase returns.
async fn run_phase(phase: &Phase, ctx: &Arc<RunContext>) {
    let end = Instant::now() + Duration::from_secs_f64(phase.duration);
    let interval = Duration::from_secs_f64(1.0 / phase.arrival_rate);
    let gate = phase.concurrency.map(|cap| Arc::new(Semaphore::new(cap)));

    let mut in_flight = JoinSet::new();
    let mut next_arrival = Instant::now();

    while Instant::now() < end {
        // Rate pacing; never sleep past the end of the phase.
        sleep_until(next_arrival.min(end)).await;
        if Instant::now() >= end {
            break;
        }

        // Admission control: an arrival that finds the cap saturated waits
        // for a slot instead of being rejected.
        let permit = match &gate {
            Some(gate) => {
                let acquired = tokio::select! {
                    permit = Arc::clone(gate).acquire_owned() => permit,
                    _ = sleep_until(end) => break,
                };
                Some(acquired.expect("admission gate closed"))
            }
            None => None,
        };

        next_arrival = Instant::now() + interval;
        let index = rand::thread_rng().gen_range(0..ctx.scenarios.len());
        let ctx = Arc::clone(ctx);
        in_flight.spawn(async move {
            let scenario = &ctx.scenarios[index];
            match &ctx.mode {
                ResolvedMode::Single(target) => scenario::run_scenario(scenario, target, &ctx).await,
                ResolvedMode::Duet(targets) => duet::run_scenario_duet(scenario, targets, &ctx).await,
            }
            drop(permit);
        });

        if phase.serialize_arrivals {
            while in_flight.join_next().await.is_some() {}
        }
    }

    // Let the last arrivals finish so phases never bleed into each other.
    while in_flight.join_next().await.is_some() {}
}
