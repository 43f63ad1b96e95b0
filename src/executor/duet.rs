use hyper::StatusCode;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::client::{self, is_success_class, RequestError};
use crate::models::plan::{DuetTargets, RequestStep, Scenario, Target};

use super::RunContext;

/// Replay one scenario's steps against both deployments, firing each step
/// at `old` and `latest` concurrently. A step yields one relative-latency
/// sample only when both sides deliver a success-class response.
pub(crate) async fn run_scenario_duet(scenario: &Scenario, targets: &DuetTargets, ctx: &RunContext) {
    for step in &scenario.requests {
        let name = step.metric_name();
        ctx.stats.lock().unwrap().begin_step(name);

        let (old, latest) = tokio::join!(
            timed_request(ctx, &targets.old, step),
            timed_request(ctx, &targets.latest, step),
        );

        {
            let mut stats = ctx.stats.lock().unwrap();
            match (old, latest) {
                (Ok((old_status, old_ms)), Ok((latest_status, latest_ms)))
                    if is_success_class(old_status) && is_success_class(latest_status) =>
                {
                    stats.record_duet(name, old_ms, latest_ms);
                }
                // One failing side spoils the pair; there is nothing to
                // compare, so neither raw latency is kept.
                outcome => {
                    debug!(scenario = %scenario.name, request = name, ?outcome, "duet step failed");
                    stats.record_failure(name);
                }
            }
        }

        if let Some(think_ms) = step.think_time {
            if think_ms > 0 {
                sleep(Duration::from_millis(think_ms)).await;
            }
        }
    }
}

/// One side of a duet step: build the target-specific URL (base, default
/// headers, default query parameters), dispatch under the shared timeout,
/// and measure this side's own wall-clock latency.
async fn timed_request(
    ctx: &RunContext,
    target: &Target,
    step: &RequestStep,
) -> Result<(StatusCode, f64), RequestError> {
    let url = client::target_url(target, &step.url)?;
    let headers = client::merge_headers(target.default_headers.as_ref(), step.headers.as_ref());

    let started = Instant::now();
    let status = client::send_with_timeout(
        &ctx.client,
        &step.method,
        &url,
        &headers,
        step.body.as_ref(),
        ctx.timeout,
    )
    .await?;
    Ok((status, started.elapsed().as_secs_f64() * 1000.0))
}
