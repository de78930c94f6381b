//! Health statistics for the exporter.
//!
//! Tracks scrape outcomes, sampling and parsing latency, and HTTP request
//! figures. Rendered as a plain-text table by the `/health` endpoint.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::{Duration, Instant};

/// Point-in-time view of a [`Stat`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatSnapshot {
    pub last: f64,
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    pub count: u64,
}

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
    }

    fn snapshot(&self) -> StatSnapshot {
        let avg = if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        };
        StatSnapshot {
            last: self.last,
            avg,
            max: self.max,
            min: self.min,
            count: self.count,
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    pub fn snapshot(&self) -> StatSnapshot {
        self.inner
            .lock()
            .map(|s| s.snapshot())
            .unwrap_or_default()
    }
}

/// HTTP request timestamps of the last ten minutes.
pub struct RequestTimestamps {
    inner: Mutex<VecDeque<Instant>>,
}

impl Default for RequestTimestamps {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(256)),
        }
    }
}

impl RequestTimestamps {
    const RETENTION: Duration = Duration::from_secs(600);

    pub fn record(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            let now = Instant::now();
            guard.push_back(now);
            while guard
                .front()
                .is_some_and(|&t| now.duration_since(t) > Self::RETENTION)
            {
                guard.pop_front();
            }
        }
    }

    pub fn count_last_minute(&self) -> u64 {
        let Ok(guard) = self.inner.lock() else {
            return 0;
        };
        let now = Instant::now();
        guard
            .iter()
            .filter(|&&t| now.duration_since(t) <= Duration::from_secs(60))
            .count() as u64
    }
}

/// Scrape and HTTP statistics for the exporter.
pub struct HealthStats {
    // Scrape outcomes
    pub scrapes_total: AtomicU64,
    pub scrape_success_count: AtomicU64,
    pub sample_failures: AtomicU64,
    pub parse_failures: AtomicU64,
    pub empty_samples: AtomicU64,

    // Timing breakdown
    pub sample_duration_ms: Stat,
    pub parse_duration_ms: Stat,
    pub lock_wait_duration_ms: Stat,

    // HTTP server
    pub http_request_timestamps: RequestTimestamps,
    pub metrics_endpoint_calls: AtomicU64,
    pub request_duration_ms: Stat,
    pub metrics_response_size_kb: Stat,

    last_scrape_failed: AtomicBool,
    last_success: StdRwLock<Option<DateTime<Utc>>>,
    last_error: StdRwLock<Option<String>>,
    start_time: Instant,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            scrapes_total: AtomicU64::new(0),
            scrape_success_count: AtomicU64::new(0),
            sample_failures: AtomicU64::new(0),
            parse_failures: AtomicU64::new(0),
            empty_samples: AtomicU64::new(0),
            sample_duration_ms: Stat::default(),
            parse_duration_ms: Stat::default(),
            lock_wait_duration_ms: Stat::default(),
            http_request_timestamps: RequestTimestamps::default(),
            metrics_endpoint_calls: AtomicU64::new(0),
            request_duration_ms: Stat::default(),
            metrics_response_size_kb: Stat::default(),
            last_scrape_failed: AtomicBool::new(false),
            last_success: StdRwLock::new(None),
            last_error: StdRwLock::new(None),
            start_time: Instant::now(),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_scrape_success(&self, sample_ms: f64, parse_ms: f64) {
        self.scrapes_total.fetch_add(1, Ordering::Relaxed);
        self.scrape_success_count.fetch_add(1, Ordering::Relaxed);
        self.sample_duration_ms.add_sample(sample_ms);
        self.parse_duration_ms.add_sample(parse_ms);
        self.last_scrape_failed.store(false, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_success.write() {
            *guard = Some(Utc::now());
        }
    }

    /// Output had no data row; nothing was published but nothing failed.
    pub fn record_empty_sample(&self, sample_ms: f64) {
        self.scrapes_total.fetch_add(1, Ordering::Relaxed);
        self.empty_samples.fetch_add(1, Ordering::Relaxed);
        self.sample_duration_ms.add_sample(sample_ms);
        self.last_scrape_failed.store(false, Ordering::Relaxed);
    }

    pub fn record_sample_failure(&self, error: &str) {
        self.sample_failures.fetch_add(1, Ordering::Relaxed);
        self.record_failure(error);
    }

    pub fn record_parse_failure(&self, error: &str) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
        self.record_failure(error);
    }

    fn record_failure(&self, error: &str) {
        self.scrapes_total.fetch_add(1, Ordering::Relaxed);
        self.last_scrape_failed.store(true, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_error.write() {
            *guard = Some(error.to_string());
        }
    }

    pub fn record_lock_wait_duration_ms(&self, duration_ms: f64) {
        self.lock_wait_duration_ms.add_sample(duration_ms);
    }

    pub fn record_http_request(&self) {
        self.http_request_timestamps.record();
    }

    pub fn record_metrics_endpoint_call(&self, duration_ms: f64, response_bytes: usize) {
        self.metrics_endpoint_calls.fetch_add(1, Ordering::Relaxed);
        self.request_duration_ms.add_sample(duration_ms);
        self.metrics_response_size_kb
            .add_sample(response_bytes as f64 / 1024.0);
    }

    pub fn last_scrape_failed(&self) -> bool {
        self.last_scrape_failed.load(Ordering::Relaxed)
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success.read().ok().and_then(|g| *g)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().ok().and_then(|g| g.clone())
    }

    pub fn get_scrape_success_rate(&self) -> f64 {
        let success = self.scrape_success_count.load(Ordering::Relaxed);
        let failed = self.sample_failures.load(Ordering::Relaxed)
            + self.parse_failures.load(Ordering::Relaxed);
        let total = success + failed;
        if total == 0 {
            100.0
        } else {
            (success as f64 / total as f64) * 100.0
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn render_table(&self) -> String {
        let mut out = String::new();

        writeln!(out, "HEALTH ENDPOINT - EXPORTER INTERNAL STATS").ok();
        writeln!(out, "==========================================").ok();
        writeln!(out).ok();
        header_row(&mut out);

        section(&mut out, "SCRAPES");
        count_row(&mut out, "scrapes_total", self.scrapes_total.load(Ordering::Relaxed));
        count_row(
            &mut out,
            "successful_scrapes",
            self.scrape_success_count.load(Ordering::Relaxed),
        );
        count_row(
            &mut out,
            "sample_failures",
            self.sample_failures.load(Ordering::Relaxed),
        );
        count_row(
            &mut out,
            "parse_failures",
            self.parse_failures.load(Ordering::Relaxed),
        );
        count_row(&mut out, "empty_samples", self.empty_samples.load(Ordering::Relaxed));
        let rate = self.get_scrape_success_rate();
        stat_row(
            &mut out,
            "scrape_success_rate (%)",
            StatSnapshot {
                last: rate,
                avg: rate,
                max: rate,
                min: rate,
                count: 1,
            },
            1,
        );

        section(&mut out, "TIMING BREAKDOWN (ms)");
        stat_row(&mut out, "sample_duration", self.sample_duration_ms.snapshot(), 1);
        stat_row(&mut out, "parse_duration", self.parse_duration_ms.snapshot(), 3);
        stat_row(&mut out, "lock_wait_duration", self.lock_wait_duration_ms.snapshot(), 1);

        section(&mut out, "HTTP SERVER");
        count_row(
            &mut out,
            "http_requests_last_minute",
            self.http_request_timestamps.count_last_minute(),
        );
        count_row(
            &mut out,
            "metrics_endpoint_calls",
            self.metrics_endpoint_calls.load(Ordering::Relaxed),
        );
        stat_row(
            &mut out,
            "request_duration (ms)",
            self.request_duration_ms.snapshot(),
            1,
        );
        stat_row(
            &mut out,
            "response_size (KB)",
            self.metrics_response_size_kb.snapshot(),
            1,
        );

        writeln!(out).ok();
        let last_success = self
            .last_success()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "N/A".to_string());
        writeln!(out, "last successful sample: {}", last_success).ok();
        writeln!(
            out,
            "last error: {}",
            self.last_error().as_deref().unwrap_or("none")
        )
        .ok();

        out
    }
}

const LEFT_COL: usize = 26;
const COL_W: usize = 12;

fn header_row(out: &mut String) {
    writeln!(
        out,
        "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
        "",
        "current",
        "average",
        "max",
        "min",
        left = LEFT_COL,
        col = COL_W
    )
    .ok();
}

fn section(out: &mut String, title: &str) {
    writeln!(out).ok();
    writeln!(out, "{}", title).ok();
    writeln!(out, "{}", "-".repeat(title.len())).ok();
}

fn count_row(out: &mut String, label: &str, value: u64) {
    writeln!(
        out,
        "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
        label,
        value,
        "N/A",
        "N/A",
        "N/A",
        left = LEFT_COL,
        col = COL_W
    )
    .ok();
}

fn stat_row(out: &mut String, label: &str, s: StatSnapshot, precision: usize) {
    writeln!(
        out,
        "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
        label,
        format!("{:.p$}", s.last, p = precision),
        format!("{:.p$}", s.avg, p = precision),
        format!("{:.p$}", s.max, p = precision),
        format!("{:.p$}", s.min, p = precision),
        left = LEFT_COL,
        col = COL_W
    )
    .ok();
}
