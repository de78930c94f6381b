//! CLI arguments and subcommands for jstat-gcutil-exporter.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use jstat_gcutil_exporter::ColumnLayout;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "jstat-gcutil-exporter",
    about = "Prometheus exporter for JVM GC utilization sampled with jstat -gcutil",
    long_about = "Prometheus exporter for JVM GC utilization sampled with jstat -gcutil.\n\n\
                  Runs `<jstat-path> -gcutil <pid>` on every scrape and republishes survivor, \
                  eden, old and metaspace utilization plus young/full GC counts and times \
                  as jstat_* gauges.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Address on which to expose metrics (host:port or :port)
    #[arg(long)]
    pub listen_address: Option<String>,

    /// Path under which to expose metrics
    #[arg(long)]
    pub metrics_path: Option<String>,

    /// jstat path
    #[arg(long)]
    pub jstat_path: Option<PathBuf>,

    /// Target pid (jstat vmid)
    #[arg(long)]
    pub pid: Option<String>,

    /// How data row columns map to metrics
    #[arg(long, value_enum)]
    pub column_layout: Option<ColumnLayout>,

    /// Kill jstat if it runs longer than N seconds
    #[arg(long)]
    pub sample_timeout_secs: Option<u64>,

    /// Read gcutil output from this file instead of running jstat
    #[arg(long)]
    pub sample_file: Option<PathBuf>,

    /// Log level [default: info]
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Export internal gcutil_exporter_* metrics
    #[arg(long)]
    pub enable_telemetry: bool,

    /// Enable TLS/SSL for HTTPS
    #[arg(long)]
    pub enable_tls: bool,

    /// Path to TLS certificate file (PEM format)
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM format)
    #[arg(long)]
    pub tls_key: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check runtime requirements and take one sample
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Run scrape cycles and print the decoded values
    Test {
        /// Number of test iterations
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Seconds to wait between iterations
        #[arg(long, default_value_t = 1)]
        interval_secs: u64,
    },
}
