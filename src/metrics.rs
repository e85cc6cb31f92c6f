//! Request statistics for the prediction pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for pipeline requests
pub struct PipelineMetrics {
    /// Total requests started
    pub requests_total: AtomicU64,
    /// Requests that produced both prices
    pub requests_succeeded: AtomicU64,
    /// Failures by error kind
    failures_by_kind: RwLock<HashMap<&'static str, u64>>,
    /// End-to-end processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Model inference times (in microseconds)
    model_times: RwLock<HashMap<String, Vec<u64>>>,
    /// Absolute difference between linear and tree predictions
    model_spreads: RwLock<Vec<f64>>,
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            requests_succeeded: AtomicU64::new(0),
            failures_by_kind: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            model_times: RwLock::new(HashMap::new()),
            model_spreads: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a successful request
    pub fn record_success(&self, processing_time: Duration, spread: f64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        if let Ok(mut spreads) = self.model_spreads.write() {
            spreads.push(spread);
            if spreads.len() > 10000 {
                spreads.drain(0..5000);
            }
        }
    }

    /// Record a failed request
    pub fn record_failure(&self, kind: &'static str) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(kind).or_insert(0) += 1;
        }
    }

    /// Record model inference time
    pub fn record_model_time(&self, model_name: &str, duration: Duration) {
        if let Ok(mut times) = self.model_times.write() {
            let model_times = times.entry(model_name.to_string()).or_default();
            model_times.push(duration.as_micros() as u64);
            // Keep only last 1000 per model
            if model_times.len() > 1000 {
                model_times.drain(0..500);
            }
        }
    }

    pub fn requests_failed(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed) - self.requests_succeeded.load(Ordering::Relaxed)
    }

    /// Failure counts by error kind
    pub fn get_failures_by_kind(&self) -> HashMap<&'static str, u64> {
        self.failures_by_kind
            .read()
            .map(|by_kind| by_kind.clone())
            .unwrap_or_default()
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        match self.processing_times.read() {
            Ok(times) => ProcessingStats::from_samples(&times),
            Err(_) => ProcessingStats::default(),
        }
    }

    /// Get per-model inference time statistics
    pub fn get_model_stats(&self) -> HashMap<String, ProcessingStats> {
        match self.model_times.read() {
            Ok(times) => times
                .iter()
                .filter(|(_, samples)| !samples.is_empty())
                .map(|(model, samples)| (model.clone(), ProcessingStats::from_samples(samples)))
                .collect(),
            Err(_) => HashMap::new(),
        }
    }

    /// Mean absolute difference between the two models' predictions
    pub fn get_avg_spread(&self) -> f64 {
        match self.model_spreads.read() {
            Ok(spreads) if !spreads.is_empty() => {
                spreads.iter().sum::<f64>() / spreads.len() as f64
            }
            _ => 0.0,
        }
    }

    /// Requests per second since the collector was created
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_total.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let total = self.requests_total.load(Ordering::Relaxed);
        let succeeded = self.requests_succeeded.load(Ordering::Relaxed);
        let success_rate = if total > 0 {
            (succeeded as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        let processing = self.get_processing_stats();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            PHONE PRICE PREDICTOR - METRICS SUMMARY           ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Requests: {:>8}  │  Succeeded: {:>8} ({:>5.1}%)            ║",
            total, succeeded, success_rate
        );
        info!(
            "║ Throughput: {:>8.1} req/s  │  Mean model spread: {:>10.2} ║",
            self.get_throughput(),
            self.get_avg_spread()
        );
        info!("║ Processing Time (μs): {:<39}║", processing.summary_line());

        let failures = self.get_failures_by_kind();
        if !failures.is_empty() {
            info!("╠══════════════════════════════════════════════════════════════╣");
            info!("║ Failures by Kind:                                            ║");
            let mut failures: Vec<_> = failures.into_iter().collect();
            failures.sort();
            for (kind, count) in failures {
                info!("║   {:16}: {:>6}                                   ║", kind, count);
            }
        }
        info!("╚══════════════════════════════════════════════════════════════╝");

        let model_stats = self.get_model_stats();
        if !model_stats.is_empty() {
            info!("Model Inference Times (μs):");
            for (model, stats) in &model_stats {
                info!(
                    "  {}: mean={} p50={} p99={} (calls={})",
                    model, stats.mean_us, stats.p50_us, stats.p99_us, stats.count
                );
            }
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl ProcessingStats {
    /// `mean/p50/p95/p99/max` in one line, as printed in the summary box
    pub fn summary_line(&self) -> String {
        format!(
            "mean={} p50={} p95={} p99={} max={}",
            self.mean_us, self.p50_us, self.p95_us, self.p99_us, self.max_us
        )
    }

    fn from_samples(samples: &[u64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let count = sorted.len();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        Self {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: sorted[count / 2],
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }
}
