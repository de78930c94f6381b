//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("jstat-gcutil-exporter.yaml"),
    };

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# jstat GC Utilization Exporter Configuration
# ============================================
#
# Server Configuration
# --------------------
# listen_address: ":9010"      # host:port, or :port for all interfaces
# metrics_path: "/metrics"     # Must start with '/', must not be /, /health or /config
#
# Sampling
# --------
# jstat_path: "/usr/bin/jstat" # jstat binary, usually $JAVA_HOME/bin/jstat
# pid: ":0"                    # Target JVM vmid; ":0" is a placeholder that never resolves
# column_layout: legacy        # legacy (fixed indices) or header (match column titles)
# sample_timeout_secs: null    # Kill jstat after N seconds (null = wait forever)
# sample_file: null            # Read gcutil output from a file instead of jstat
#
# Feature Flags
# -------------
# enable_health: true          # Enable /health endpoint
# enable_telemetry: false      # Export gcutil_exporter_* self metrics
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
#
# TLS/SSL Configuration
# ---------------------
# enable_tls: false            # Enable HTTPS (default: false)
# tls_cert_path: null          # Path to TLS certificate (PEM format)
# tls_key_path: null           # Path to TLS private key (PEM format)
"#;

    format!("{comments}\n{yaml}")
}
