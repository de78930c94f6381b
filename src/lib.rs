//! jstat GC Utilization Exporter Library
//!
//! Samples `jstat -gcutil <pid>` for a target JVM, decodes the first data row
//! and republishes it as eleven Prometheus gauges (`jstat_s0` … `jstat_gct`).
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use jstat_gcutil_exporter::{
//!     CollectorOptions, GcUtilCollector, GcUtilField, HealthStats, ScrapeOutcome, StaticSampler,
//! };
//!
//! let sampler = StaticSampler::new(
//!     "S0 S1 E O M CCS YGC YGCT FGC FGCT GCT\n0.00 50.00 10.50 20.25 95.10 93.00 5 0.050 1 0.200 0.250\n",
//! );
//! let collector = GcUtilCollector::new(
//!     Box::new(sampler),
//!     CollectorOptions::default(),
//!     Arc::new(HealthStats::new()),
//! )
//! .unwrap();
//!
//! assert!(matches!(collector.scrape(), ScrapeOutcome::Published(_)));
//! assert_eq!(collector.metrics().gauge(GcUtilField::Eden).get(), 10.50);
//! ```
//!
//! Register the collector with a `prometheus::Registry` to sample on every
//! `gather()`.

pub mod collector;
pub mod error;
pub mod gcutil;
pub mod health_stats;
pub mod metrics;
pub mod sampler;

// Re-export main types for convenience
pub use collector::{CollectorOptions, GcUtilCollector, ScrapeOutcome};
pub use error::{ParseError, SampleError, ScrapeError};
pub use gcutil::{ColumnLayout, ColumnSchema, GcUtilField, GcUtilSample};
pub use health_stats::HealthStats;
pub use metrics::{ExporterTelemetry, GcUtilMetrics};
pub use sampler::{FileSampler, JstatSampler, Sampler, StaticSampler, TargetSpec};
