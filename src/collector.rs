//! Prometheus collector that samples jstat on every scrape.
//!
//! `GcUtilCollector` implements [`prometheus::core::Collector`]. Each
//! `collect()` runs sample → decode → publish under one mutex, so concurrent
//! scrapes never interleave, then returns the gauge families. A failed scrape
//! leaves the gauges at their previous values; before the first successful
//! sample no `jstat_*` series are returned at all.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use tracing::{debug, error, instrument, warn};

use crate::error::ScrapeError;
use crate::gcutil::{self, ColumnLayout, GcUtilSample};
use crate::health_stats::HealthStats;
use crate::metrics::{ExporterTelemetry, GcUtilMetrics};
use crate::sampler::Sampler;

/// Result of one scrape cycle.
#[derive(Debug)]
pub enum ScrapeOutcome {
    /// A sample was decoded and all gauges were updated.
    Published(GcUtilSample),
    /// The output had no data row; gauges were left untouched.
    NoDataRow,
    /// Sampling or decoding failed; gauges were left untouched.
    Failed(ScrapeError),
}

impl ScrapeOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ScrapeOutcome::Failed(_))
    }
}

/// Collector construction options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectorOptions {
    pub layout: ColumnLayout,
    /// Also export `gcutil_exporter_*` self metrics.
    pub telemetry: bool,
}

struct Inner {
    sampler: Box<dyn Sampler>,
    layout: ColumnLayout,
    metrics: GcUtilMetrics,
    telemetry: Option<ExporterTelemetry>,
    health_stats: Arc<HealthStats>,
    /// Held for a whole sample → decode → publish cycle.
    scrape_lock: Mutex<()>,
    /// Set once the first sample is published; read without the scrape lock.
    published: AtomicBool,
}

/// Cloneable handle; clones share the same gauges and scrape lock.
#[derive(Clone)]
pub struct GcUtilCollector {
    inner: Arc<Inner>,
}

impl GcUtilCollector {
    pub fn new(
        sampler: Box<dyn Sampler>,
        options: CollectorOptions,
        health_stats: Arc<HealthStats>,
    ) -> prometheus::Result<Self> {
        let telemetry = if options.telemetry {
            Some(ExporterTelemetry::new()?)
        } else {
            None
        };

        Ok(Self {
            inner: Arc::new(Inner {
                sampler,
                layout: options.layout,
                metrics: GcUtilMetrics::new()?,
                telemetry,
                health_stats,
                scrape_lock: Mutex::new(()),
                published: AtomicBool::new(false),
            }),
        })
    }

    pub fn metrics(&self) -> &GcUtilMetrics {
        &self.inner.metrics
    }

    pub fn layout(&self) -> ColumnLayout {
        self.inner.layout
    }

    pub fn source(&self) -> String {
        self.inner.sampler.source()
    }

    /// Whether any sample has been published since start.
    pub fn has_published(&self) -> bool {
        self.inner.published.load(Ordering::Acquire)
    }

    /// Runs one sample → decode → publish cycle.
    pub fn scrape(&self) -> ScrapeOutcome {
        let _guard = self.lock_scrape();
        self.scrape_locked()
    }

    fn lock_scrape(&self) -> MutexGuard<'_, ()> {
        let wait_start = Instant::now();
        let guard = self
            .inner
            .scrape_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.inner
            .health_stats
            .record_lock_wait_duration_ms(wait_start.elapsed().as_secs_f64() * 1000.0);
        guard
    }

    #[instrument(skip_all)]
    fn scrape_locked(&self) -> ScrapeOutcome {
        let inner = &self.inner;
        let start = Instant::now();

        let outcome = match inner.sampler.sample() {
            Err(e) => {
                error!("Sampling {} failed: {}", inner.sampler.source(), e);
                inner.health_stats.record_sample_failure(&e.to_string());
                ScrapeOutcome::Failed(e.into())
            }
            Ok(raw) => {
                let sample_ms = start.elapsed().as_secs_f64() * 1000.0;
                let parse_start = Instant::now();

                match gcutil::decode(&raw, inner.layout) {
                    Ok(Some(sample)) => {
                        inner.metrics.publish(&sample);
                        inner.published.store(true, Ordering::Release);
                        let parse_ms = parse_start.elapsed().as_secs_f64() * 1000.0;
                        inner.health_stats.record_scrape_success(sample_ms, parse_ms);
                        debug!("Published gcutil sample: {:?}", sample);
                        ScrapeOutcome::Published(sample)
                    }
                    Ok(None) => {
                        warn!(
                            "Output of {} has no data row ({} lines), gauges unchanged",
                            inner.sampler.source(),
                            raw.lines().count()
                        );
                        inner.health_stats.record_empty_sample(sample_ms);
                        ScrapeOutcome::NoDataRow
                    }
                    Err(e) => {
                        error!("Decoding output of {} failed: {}", inner.sampler.source(), e);
                        debug!("Raw output: {:?}", raw);
                        inner.health_stats.record_parse_failure(&e.to_string());
                        ScrapeOutcome::Failed(e.into())
                    }
                }
            }
        };

        if let Some(telemetry) = &inner.telemetry {
            telemetry
                .scrape_duration
                .set(start.elapsed().as_secs_f64());
            match &outcome {
                ScrapeOutcome::Failed(e) => {
                    telemetry.last_scrape_success.set(0.0);
                    telemetry
                        .scrape_errors_total
                        .with_label_values(&[e.kind()])
                        .inc();
                }
                _ => telemetry.last_scrape_success.set(1.0),
            }
        }

        outcome
    }
}

impl Collector for GcUtilCollector {
    fn desc(&self) -> Vec<&Desc> {
        let mut descs = self.inner.metrics.descs();
        if let Some(telemetry) = &self.inner.telemetry {
            descs.extend(telemetry.descs());
        }
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let guard = self.lock_scrape();
        self.scrape_locked();

        let mut families = if self.has_published() {
            self.inner.metrics.families()
        } else {
            Vec::new()
        };
        drop(guard);

        if let Some(telemetry) = &self.inner.telemetry {
            families.extend(telemetry.families());
        }
        families
    }
}
