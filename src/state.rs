//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers.

use jstat_gcutil_exporter::{
    CollectorOptions, FileSampler, GcUtilCollector, HealthStats, JstatSampler, Sampler,
};
use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    /// Registry holding the gcutil collector; `gather()` triggers a scrape.
    pub registry: Registry,
    pub collector: GcUtilCollector,
    pub config: Arc<Config>,
    pub health_stats: Arc<HealthStats>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

/// Builds the scrape collector for the effective configuration.
///
/// A configured `sample_file` replaces the jstat subprocess.
pub fn build_collector(
    config: &Config,
    health_stats: Arc<HealthStats>,
) -> prometheus::Result<GcUtilCollector> {
    let sampler: Box<dyn Sampler> = match &config.sample_file {
        Some(path) => Box::new(FileSampler::new(path)),
        None => Box::new(JstatSampler::new(config.target()).with_timeout(config.sample_timeout())),
    };

    let options = CollectorOptions {
        layout: config.column_layout(),
        telemetry: config.enable_telemetry.unwrap_or(false),
    };

    GcUtilCollector::new(sampler, options, health_stats)
}
