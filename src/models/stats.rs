use serde::Serialize;
use std::collections::HashMap;

/// What one entry of `response_times` means: absolute latency in a single
/// run, relative latency change in a duet run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SampleUnit {
    #[serde(rename = "ms")]
    Millis,
    #[serde(rename = "%")]
    Percent,
}

impl SampleUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleUnit::Millis => "ms",
            SampleUnit::Percent => "%",
        }
    }
}

/// Raw per-target latency series recorded in duet mode, handed to external
/// significance testing.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuetSamples {
    pub old_samples: Vec<f64>,
    pub latest_samples: Vec<f64>,
}

/// Accumulated outcomes for one request name (or the whole run).
///
/// `response_times` only holds entries for steps that produced a
/// measurement; failed transports leave `failed` incremented with no
/// sample, so `response_times.len()` can be less than `count`.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStats {
    pub count: u64,
    pub failed: u64,
    pub response_times: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duet: Option<DuetSamples>,
}

/// The single shared aggregate for a run: one `overall` bucket plus one
/// bucket per request name, created lazily and never removed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTestStats {
    pub unit: SampleUnit,
    pub overall: RequestStats,
    pub per_request: HashMap<String, RequestStats>,
}

/// Relative latency change of `latest` against `old`, in percent.
/// 100ms -> 150ms yields exactly 50.0.
pub fn latency_change(old_ms: f64, latest_ms: f64) -> f64 {
    latest_ms / old_ms * 100.0 - 100.0
}

impl LoadTestStats {
    pub fn new(unit: SampleUnit) -> Self {
        let overall = RequestStats {
            duet: (unit == SampleUnit::Percent).then(DuetSamples::default),
            ..Default::default()
        };
        Self {
            unit,
            overall,
            per_request: HashMap::new(),
        }
    }

    fn entry(&mut self, name: &str) -> &mut RequestStats {
        let duet_run = self.unit == SampleUnit::Percent;
        self.per_request
            .entry(name.to_string())
            .or_insert_with(|| RequestStats {
                duet: duet_run.then(DuetSamples::default),
                ..Default::default()
            })
    }

    /// Count one attempted step on both aggregates, creating the
    /// per-request bucket on first use.
    pub fn begin_step(&mut self, name: &str) {
        self.overall.count += 1;
        self.entry(name).count += 1;
    }

    /// Record a measured latency (or, in duet mode, a percentage delta).
    pub fn record_sample(&mut self, name: &str, value: f64) {
        self.overall.response_times.push(value);
        self.entry(name).response_times.push(value);
    }

    /// Count a failed step; no sample is recorded for it.
    pub fn record_failure(&mut self, name: &str) {
        self.overall.failed += 1;
        self.entry(name).failed += 1;
    }

    /// Record a dual-success duet step: the relative delta as the sample,
    /// plus the raw pair on both duet series.
    pub fn record_duet(&mut self, name: &str, old_ms: f64, latest_ms: f64) {
        self.record_sample(name, latency_change(old_ms, latest_ms));
        if let Some(duet) = self.overall.duet.as_mut() {
            duet.old_samples.push(old_ms);
            duet.latest_samples.push(latest_ms);
        }
        if let Some(duet) = self.entry(name).duet.as_mut() {
            duet.old_samples.push(old_ms);
            duet.latest_samples.push(latest_ms);
        }
    }
}
