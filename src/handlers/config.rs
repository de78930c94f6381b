//! Configuration display endpoint handler.
//!
//! This module provides the `/config` endpoint handler that displays
//! the current exporter configuration.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

/// Handler for the /config endpoint.
#[instrument(skip(state))]
pub async fn config_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /config request");
    state.health_stats.record_http_request();

    let body = render_config_text(&state.config);

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!("{body}\n{FOOTER_TEXT}\n"),
    )
}

/// Plain-text rendering of the effective configuration.
pub fn render_config_text(cfg: &Config) -> String {
    let mut out = String::new();

    writeln!(out, "JSTAT GCUTIL EXPORTER - CONFIGURATION").ok();
    writeln!(out, "=====================================").ok();
    writeln!(out).ok();

    writeln!(out, "SERVER CONFIGURATION").ok();
    writeln!(out, "--------------------").ok();
    writeln!(out, "listen_address:             {}", cfg.listen_address()).ok();
    writeln!(out, "metrics_path:               {}", cfg.metrics_path()).ok();
    writeln!(
        out,
        "enable_health:              {}",
        cfg.enable_health.unwrap_or(true)
    )
    .ok();
    writeln!(
        out,
        "enable_telemetry:           {}",
        cfg.enable_telemetry.unwrap_or(false)
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "SAMPLING").ok();
    writeln!(out, "--------").ok();
    let target = cfg.target();
    writeln!(out, "jstat_path:                 {}", target.jstat_path.display()).ok();
    writeln!(out, "pid:                        {}", target.pid).ok();
    writeln!(
        out,
        "column_layout:              {}",
        format!("{:?}", cfg.column_layout()).to_lowercase()
    )
    .ok();
    writeln!(
        out,
        "sample_timeout_secs:        {}",
        cfg.sample_timeout_secs
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".to_string())
    )
    .ok();
    writeln!(
        out,
        "sample_file:                {}",
        cfg.sample_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "TLS/SSL CONFIGURATION").ok();
    writeln!(out, "---------------------").ok();
    writeln!(
        out,
        "enable_tls:                 {}",
        cfg.enable_tls.unwrap_or(false)
    )
    .ok();
    writeln!(
        out,
        "tls_cert_path:              {}",
        cfg.tls_cert_path.as_deref().unwrap_or("none")
    )
    .ok();
    writeln!(
        out,
        "tls_key_path:               {}",
        cfg.tls_key_path.as_deref().unwrap_or("none")
    )
    .ok();
    writeln!(out).ok();

    writeln!(out, "LOGGING").ok();
    writeln!(out, "-------").ok();
    writeln!(
        out,
        "log_level:                  {}",
        cfg.log_level.as_deref().unwrap_or("info")
    )
    .ok();

    out
}
