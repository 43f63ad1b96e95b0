use chrono::Local;
use colored::*;
use serde::Serialize;
use std::collections::HashMap;

use crate::models::stats::{LoadTestStats, RequestStats, SampleUnit};

/// Final summary of a run: scalar percentile report plus the untouched
/// raw containers, so callers can break results down per request or feed
/// the duet sample series into significance testing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadTestReport {
    pub total_requests: u64,
    pub completed: u64,
    pub failed: u64,
    pub success_rate: f64,
    pub average: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub unit: SampleUnit,
    pub timestamp: String,
    pub overall: RequestStats,
    pub per_request: HashMap<String, RequestStats>,
}

/// Nearest-rank percentile over an ascending sequence: the element at
/// index `ceil(p/100 * n) - 1`, clamped into range. Always an element of
/// the input, never interpolated; 0 for an empty sequence.
pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    let rank = ((p / 100.0) * sorted_values.len() as f64).ceil() as isize - 1;
    let index = rank.clamp(0, sorted_values.len() as isize - 1) as usize;
    sorted_values[index]
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Reduce a run's accumulated stats to the percentile report. Scalars are
/// rounded to 2 decimals; the raw containers are carried over unchanged.
pub fn summarize(stats: &LoadTestStats) -> LoadTestReport {
    let overall = &stats.overall;

    let mut sorted = overall.response_times.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let completed = overall.count - overall.failed;
    let success_rate = if overall.count == 0 {
        0.0
    } else {
        completed as f64 / overall.count as f64 * 100.0
    };
    let average = if sorted.is_empty() {
        0.0
    } else {
        sorted.iter().sum::<f64>() / sorted.len() as f64
    };

    LoadTestReport {
        total_requests: overall.count,
        completed,
        failed: overall.failed,
        success_rate: round2(success_rate),
        average: round2(average),
        p50: round2(percentile(&sorted, 50.0)),
        p90: round2(percentile(&sorted, 90.0)),
        p95: round2(percentile(&sorted, 95.0)),
        p99: round2(percentile(&sorted, 99.0)),
        unit: stats.unit,
        timestamp: Local::now().format("%Y/%m/%d %H:%M:%S").to_string(),
        overall: overall.clone(),
        per_request: stats.per_request.clone(),
    }
}

impl LoadTestReport {
    /// Render the scalar summary to the console.
    pub fn print(&self) {
        let unit = self.unit.as_str();
        println!();
        println!("{}", "=== Load Test Results ===".bold());
        println!("{} {}", "Timestamp:".blue().bold(), self.timestamp);
        println!("{} {}", "Total Requests:".bold(), self.total_requests);
        println!("{} {}", "Completed:".green().bold(), self.completed);
        println!("{} {}", "Failed:".red().bold(), self.failed);
        println!("{} {:.2}%", "Success Rate:".bold(), self.success_rate);
        println!("{} {:.2}{}", "Average:".bold(), self.average, unit);
        println!("{} {:.2}{}", "p50:".bold(), self.p50, unit);
        println!("{} {:.2}{}", "p90:".bold(), self.p90, unit);
        println!("{} {:.2}{}", "p95:".bold(), self.p95, unit);
        println!("{} {:.2}{}", "p99:".bold(), self.p99, unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_of_empty_is_zero() {
        assert_eq!(percentile(&[], 0.0), 0.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
        assert_eq!(percentile(&[], 100.0), 0.0);
    }

    #[test]
    fn percentile_uses_nearest_rank() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        // ceil(50/100 * 5) - 1 = 2
        assert_eq!(percentile(&values, 50.0), 30.0);
        // ceil(90/100 * 5) - 1 = 4
        assert_eq!(percentile(&values, 90.0), 50.0);
        assert_eq!(percentile(&values, 95.0), 50.0);
        assert_eq!(percentile(&values, 99.0), 50.0);
    }

    #[test]
    fn percentile_bounds_clamp_to_range() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 4.0);
        // Every output is a member of the input.
        for p in 0..=100 {
            assert!(values.contains(&percentile(&values, p as f64)));
        }
    }

    #[test]
    fn summarize_rounds_and_counts() {
        let mut stats = LoadTestStats::new(SampleUnit::Millis);
        for (i, ms) in [12.345, 20.0, 31.5].iter().enumerate() {
            let name = format!("req-{i}");
            stats.begin_step(&name);
            stats.record_sample(&name, *ms);
        }
        stats.begin_step("req-0");
        stats.record_failure("req-0");

        let report = summarize(&stats);
        assert_eq!(report.total_requests, 4);
        assert_eq!(report.completed, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.success_rate, 75.0);
        // mean of 12.345, 20.0, 31.5 = 21.281666..
        assert_eq!(report.average, 21.28);
        assert_eq!(report.p50, 20.0);
        assert_eq!(report.p99, 31.5);
        assert_eq!(report.unit, SampleUnit::Millis);
        assert_eq!(report.per_request.len(), 3);
    }

    #[test]
    fn empty_run_reports_zeros_not_nan() {
        let stats = LoadTestStats::new(SampleUnit::Millis);
        let report = summarize(&stats);
        assert_eq!(report.total_requests, 0);
        assert_eq!(report.success_rate, 0.0);
        assert_eq!(report.average, 0.0);
        assert_eq!(report.p50, 0.0);
    }

    #[test]
    fn duet_stats_report_percent_unit() {
        let mut stats = LoadTestStats::new(SampleUnit::Percent);
        stats.begin_step("cmp");
        stats.record_duet("cmp", 100.0, 150.0);

        let report = summarize(&stats);
        assert_eq!(report.unit, SampleUnit::Percent);
        assert_eq!(report.unit.as_str(), "%");
        assert_eq!(report.p50, 50.0);
        assert_eq!(
            report.overall.duet.as_ref().unwrap().latest_samples,
            vec![150.0]
        );
    }
}
