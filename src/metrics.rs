//! Request metrics and periodic summaries for the scoring gateway.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

use crate::error::ValidationError;

/// Upper edges of the prediction amount histogram
const AMOUNT_BUCKETS: [f64; 6] = [10_000.0, 50_000.0, 100_000.0, 250_000.0, 500_000.0, 1_000_000.0];

/// Latency samples kept for percentile estimates
const LATENCY_WINDOW: usize = 10_000;

/// Metrics collector for the prediction endpoint
pub struct GatewayMetrics {
    /// Prediction requests received
    pub requests_received: AtomicU64,
    /// Requests answered with a prediction
    pub predictions_served: AtomicU64,
    /// Requests rejected by validation
    pub validation_failures: AtomicU64,
    /// Requests failed at the estimator
    pub scoring_failures: AtomicU64,
    /// Validation rejections by field
    rejections_by_field: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Prediction amount distribution, last bucket is open-ended
    amount_buckets: RwLock<[u64; AMOUNT_BUCKETS.len() + 1]>,
    /// Start time for rate calculation
    start_time: Instant,
    started_at: DateTime<Utc>,
}

impl GatewayMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            requests_received: AtomicU64::new(0),
            predictions_served: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            scoring_failures: AtomicU64::new(0),
            rejections_by_field: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            amount_buckets: RwLock::new([0; AMOUNT_BUCKETS.len() + 1]),
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }

    pub fn record_request(&self) {
        self.requests_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a served prediction
    pub fn record_prediction(&self, processing_time: Duration, allowed_loan: f64) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        self.record_latency(processing_time);

        let bucket = AMOUNT_BUCKETS
            .iter()
            .position(|&edge| allowed_loan < edge)
            .unwrap_or(AMOUNT_BUCKETS.len());
        if let Ok(mut buckets) = self.amount_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a validation rejection
    pub fn record_validation_failure(&self, error: &ValidationError) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_field) = self.rejections_by_field.write() {
            *by_field.entry(error.field().to_string()).or_insert(0) += 1;
        }
    }

    /// Record an estimator failure
    pub fn record_scoring_failure(&self, processing_time: Duration) {
        self.scoring_failures.fetch_add(1, Ordering::Relaxed);
        self.record_latency(processing_time);
    }

    fn record_latency(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the most recent samples
            if times.len() > LATENCY_WINDOW {
                times.drain(0..LATENCY_WINDOW / 2);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted: Vec<u64> = match self.processing_times.read() {
            Ok(times) => times.clone(),
            Err(_) => return ProcessingStats::default(),
        };
        if sorted.is_empty() {
            return ProcessingStats::default();
        }
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_received.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_rejections_by_field(&self) -> HashMap<String, u64> {
        self.rejections_by_field
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn get_amount_distribution(&self) -> Vec<AmountBucket> {
        let counts = self.amount_buckets.read().map(|b| *b).unwrap_or_default();
        counts
            .iter()
            .enumerate()
            .map(|(i, &count)| AmountBucket {
                from: if i == 0 { 0.0 } else { AMOUNT_BUCKETS[i - 1] },
                to: AMOUNT_BUCKETS.get(i).copied(),
                count,
            })
            .collect()
    }

    /// Point-in-time view served by the metrics endpoint
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            started_at: self.started_at,
            uptime_secs: self.start_time.elapsed().as_secs(),
            requests_received: self.requests_received.load(Ordering::Relaxed),
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            scoring_failures: self.scoring_failures.load(Ordering::Relaxed),
            throughput_rps: self.get_throughput(),
            processing: self.get_processing_stats(),
            rejections_by_field: self.get_rejections_by_field(),
            amount_distribution: self.get_amount_distribution(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let rejection_rate = if snapshot.requests_received > 0 {
            (snapshot.validation_failures as f64 / snapshot.requests_received as f64) * 100.0
        } else {
            0.0
        };
        let processing = &snapshot.processing;

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║             LOAN SCORING GATEWAY - METRICS SUMMARY           ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Requests Received:      {:>8}  │  Throughput: {:>6.1} req/s ║",
            snapshot.requests_received, snapshot.throughput_rps
        );
        info!(
            "║ Predictions Served:     {:>8}  │  Scoring Failures: {:>6} ║",
            snapshot.predictions_served, snapshot.scoring_failures
        );
        info!(
            "║ Validation Failures:    {:>8}  │  Rejection Rate: {:>5.1}%  ║",
            snapshot.validation_failures, rejection_rate
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        if !snapshot.rejections_by_field.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("║ Rejections by Field:                                         ║");
            let mut fields: Vec<_> = snapshot.rejections_by_field.iter().collect();
            fields.sort_by(|a, b| b.1.cmp(a.1));
            for (field, count) in fields {
                info!("║   {:32}: {:>6}", field, count);
            }
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Allowed Loan Distribution:                                   ║");
        let total: u64 = snapshot.amount_distribution.iter().map(|b| b.count).sum();
        for bucket in &snapshot.amount_distribution {
            let pct = if total > 0 {
                (bucket.count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar: String = "█".repeat(((pct / 5.0) as usize).min(20));
            let range = match bucket.to {
                Some(to) => format!("{:>9.0}-{:<9.0}", bucket.from, to),
                None => format!("{:>9.0}+{:9}", bucket.from, ""),
            };
            info!("║   {}: {:>6} ({:>5.1}%) {}", range, bucket.count, pct, bar);
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Count of predictions in `[from, to)`
#[derive(Debug, Clone, Serialize)]
pub struct AmountBucket {
    pub from: f64,
    pub to: Option<f64>,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub requests_received: u64,
    pub predictions_served: u64,
    pub validation_failures: u64,
    pub scoring_failures: u64,
    pub throughput_rps: f64,
    pub processing: ProcessingStats,
    pub rejections_by_field: HashMap<String, u64>,
    pub amount_distribution: Vec<AmountBucket>,
}

/// Prints periodic summaries
pub struct MetricsReporter {
    metrics: Arc<GatewayMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<GatewayMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = GatewayMetrics::new();

        metrics.record_request();
        metrics.record_request();
        metrics.record_request();
        metrics.record_prediction(Duration::from_micros(100), 45_000.0);
        metrics.record_validation_failure(&ValidationError::missing("user_age"));
        metrics.record_scoring_failure(Duration::from_micros(300));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_received, 3);
        assert_eq!(snapshot.predictions_served, 1);
        assert_eq!(snapshot.validation_failures, 1);
        assert_eq!(snapshot.scoring_failures, 1);
        assert_eq!(snapshot.rejections_by_field.get("user_age"), Some(&1));
        assert_eq!(snapshot.processing.count, 2);
        assert_eq!(snapshot.processing.max_us, 300);
    }

    #[test]
    fn test_amount_buckets() {
        let metrics = GatewayMetrics::new();
        metrics.record_prediction(Duration::from_micros(10), 5_000.0);
        metrics.record_prediction(Duration::from_micros(10), 75_000.0);
        metrics.record_prediction(Duration::from_micros(10), 2_500_000.0);

        let buckets = metrics.get_amount_distribution();
        assert_eq!(buckets.len(), AMOUNT_BUCKETS.len() + 1);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[2].count, 1);
        assert_eq!(buckets[2].from, 50_000.0);
        assert_eq!(buckets.last().map(|b| (b.count, b.to)), Some((1, None)));
    }

    #[test]
    fn test_processing_stats_empty() {
        let stats = GatewayMetrics::new().get_processing_stats();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.p99_us, 0);
    }
}
