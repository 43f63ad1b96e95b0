use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::client::{self, is_success_class};
use crate::models::plan::{Scenario, Target};

use super::RunContext;

/// Replay one scenario's steps, in order, against the single configured
/// target. Step outcomes are independent; a failure never stops the
/// remaining steps.
pub(crate) async fn run_scenario(scenario: &Scenario, target: &Target, ctx: &RunContext) {
    for step in &scenario.requests {
        let name = step.metric_name();
        ctx.stats.lock().unwrap().begin_step(name);

        let url = client::join_url(&target.url, &step.url);
        let headers = client::merge_headers(target.default_headers.as_ref(), step.headers.as_ref());

        let started = Instant::now();
        let result = client::send_with_timeout(
            &ctx.client,
            &step.method,
            &url,
            &headers,
            step.body.as_ref(),
            ctx.timeout,
        )
        .await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        {
            let mut stats = ctx.stats.lock().unwrap();
            match result {
                // Delivered responses get a latency sample either way; a
                // non-2xx/3xx status additionally counts as failed.
                Ok(status) => {
                    stats.record_sample(name, elapsed_ms);
                    if !is_success_class(status) {
                        stats.record_failure(name);
                    }
                }
                // No response, no sample.
                Err(err) => {
                    debug!(scenario = %scenario.name, request = name, error = %err, "request failed");
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
