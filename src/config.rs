//! Configuration management for jstat-gcutil-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use clap::ValueEnum;
use jstat_gcutil_exporter::sampler::PLACEHOLDER_PID;
use jstat_gcutil_exporter::{ColumnLayout, TargetSpec};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_LISTEN_ADDRESS: &str = ":9010";
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
pub const DEFAULT_JSTAT_PATH: &str = "/usr/bin/jstat";
pub const DEFAULT_PID: &str = PLACEHOLDER_PID;

/// Config files tried in order when no `--config` is given.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "/etc/jstat-gcutil-exporter/config.yaml",
    "/etc/jstat-gcutil-exporter/config.yml",
    "/etc/jstat-gcutil-exporter/config.json",
    "/etc/jstat-gcutil-exporter/config.toml",
    "./jstat-gcutil-exporter.yaml",
    "./jstat-gcutil-exporter.yml",
    "./jstat-gcutil-exporter.json",
    "./jstat-gcutil-exporter.toml",
];

/// Paths served by the exporter itself.
const RESERVED_PATHS: &[&str] = &["/", "/health", "/config"];

/// jstat vmid: `[protocol:][//]lvmid[@hostname[:port][/servername]]`
static VMID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z]+:)?(?://)?\d+(?:@[A-Za-z0-9._-]+(?::\d+)?(?:/[A-Za-z0-9._-]+)?)?$")
        .expect("vmid regex is valid")
});

/// Exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    #[serde(alias = "listen-address")]
    pub listen_address: Option<String>,
    #[serde(alias = "metrics-path")]
    pub metrics_path: Option<String>,

    // Sampling
    #[serde(alias = "jstat-path")]
    pub jstat_path: Option<PathBuf>,
    pub pid: Option<String>,
    #[serde(alias = "column-layout")]
    pub column_layout: Option<ColumnLayout>,
    #[serde(alias = "sample-timeout-secs")]
    pub sample_timeout_secs: Option<u64>,
    /// Read gcutil output from this file instead of running jstat
    #[serde(alias = "sample-file")]
    pub sample_file: Option<PathBuf>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,
    #[serde(alias = "enable-telemetry")]
    pub enable_telemetry: Option<bool>,

    // Logging
    pub log_level: Option<String>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: Some(DEFAULT_LISTEN_ADDRESS.to_string()),
            metrics_path: Some(DEFAULT_METRICS_PATH.to_string()),
            jstat_path: Some(PathBuf::from(DEFAULT_JSTAT_PATH)),
            pid: Some(DEFAULT_PID.to_string()),
            column_layout: Some(ColumnLayout::Legacy),
            sample_timeout_secs: None,
            sample_file: None,
            enable_health: Some(true),
            enable_telemetry: Some(false),
            log_level: Some("info".into()),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl Config {
    pub fn listen_address(&self) -> &str {
        self.listen_address
            .as_deref()
            .unwrap_or(DEFAULT_LISTEN_ADDRESS)
    }

    pub fn metrics_path(&self) -> &str {
        self.metrics_path.as_deref().unwrap_or(DEFAULT_METRICS_PATH)
    }

    pub fn target(&self) -> TargetSpec {
        TargetSpec::new(
            self.jstat_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_JSTAT_PATH)),
            self.pid.as_deref().unwrap_or(DEFAULT_PID),
        )
    }

    pub fn column_layout(&self) -> ColumnLayout {
        self.column_layout.unwrap_or_default()
    }

    pub fn sample_timeout(&self) -> Option<Duration> {
        self.sample_timeout_secs.map(Duration::from_secs)
    }
}

/// Parses a listen address; `:port` binds all interfaces.
pub fn parse_listen_address(addr: &str) -> Result<SocketAddr, String> {
    let full = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };

    full.to_socket_addrs()
        .map_err(|e| format!("Invalid listen_address '{}': {}", addr, e))?
        .next()
        .ok_or_else(|| format!("listen_address '{}' did not resolve to any address", addr))
}

/// True if `pid` is a syntactically valid jstat vmid.
pub fn is_valid_vmid(pid: &str) -> bool {
    VMID_RE.is_match(pid)
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    parse_listen_address(cfg.listen_address())?;

    let metrics_path = cfg.metrics_path();
    if !metrics_path.starts_with('/') {
        return Err(format!("metrics_path '{}' must start with '/'", metrics_path).into());
    }
    if !metrics_path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '.'))
    {
        return Err(format!(
            "metrics_path '{}' may only contain letters, digits, '/', '_', '-' and '.'",
            metrics_path
        )
        .into());
    }
    if RESERVED_PATHS.contains(&metrics_path) {
        return Err(format!(
            "metrics_path '{}' collides with a built-in endpoint",
            metrics_path
        )
        .into());
    }

    let target = cfg.target();
    if target.jstat_path.as_os_str().is_empty() {
        return Err("jstat_path must not be empty".into());
    }
    if target.pid.is_empty() {
        return Err("pid must not be empty".into());
    }
    if !target.is_placeholder() && !is_valid_vmid(&target.pid) {
        return Err(format!("pid '{}' is not a valid jstat vmid", target.pid).into());
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::from_str(level, true).is_err() {
            return Err(format!(
                "log_level '{}' must be one of off, error, warn, info, debug, trace",
                level
            )
            .into());
        }
    }

    if cfg.sample_timeout_secs == Some(0) {
        return Err("sample_timeout_secs must be greater than 0".into());
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                return Err(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                );
            }
            (Some(_), None) => {
                return Err("TLS is enabled but tls_key_path is not set".into());
            }
            (None, Some(_)) => {
                return Err("TLS is enabled but tls_cert_path is not set".into());
            }
            (Some(cert), Some(key)) => {
                check_pem_file("certificate", cert)?;
                check_pem_file("private key", key)?;
            }
        }
    }

    Ok(())
}

fn check_pem_file(kind: &str, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => Err(format!("TLS {} file is empty: {}", kind, path).into()),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("TLS {} file not found: {}", kind, path).into())
        }
        Err(e) => Err(format!("TLS {} file is not readable: {} ({})", kind, path, e).into()),
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(addr) = &args.listen_address {
        config.listen_address = Some(addr.clone());
    }
    if let Some(path) = &args.metrics_path {
        config.metrics_path = Some(path.clone());
    }
    if let Some(jstat) = &args.jstat_path {
        config.jstat_path = Some(jstat.clone());
    }
    if let Some(pid) = &args.pid {
        config.pid = Some(pid.clone());
    }
    if let Some(layout) = args.column_layout {
        config.column_layout = Some(layout);
    }
    if let Some(secs) = args.sample_timeout_secs {
        config.sample_timeout_secs = Some(secs);
    }
    if let Some(file) = &args.sample_file {
        config.sample_file = Some(file.clone());
    }

    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    // Feature flags
    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.enable_telemetry {
        config.enable_telemetry = Some(true);
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Loads configuration from `path`, or from the first default location that exists.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            match DEFAULT_CONFIG_PATHS
                .iter()
                .map(Path::new)
                .find(|p| p.exists())
            {
                Some(p) => p.to_path_buf(),
                None => return Ok(Config::default()),
            }
        }
    };

    if !path.exists() {
        return Err(format!("Config file not found: {}", path.display()).into());
    }

    let content = fs::read_to_string(&path)?;

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Renders configuration in the requested format.
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = Config::default();
        assert!(validate_effective_config(&cfg).is_ok());
        assert_eq!(cfg.listen_address(), ":9010");
        assert_eq!(cfg.metrics_path(), "/metrics");
        assert!(cfg.target().is_placeholder());
        assert_eq!(cfg.target().jstat_path, PathBuf::from("/usr/bin/jstat"));
    }

    #[test]
    fn test_parse_listen_address_port_only() {
        let addr = parse_listen_address(":9010").unwrap();
        assert_eq!(addr, "0.0.0.0:9010".parse().unwrap());
    }

    #[test]
    fn test_parse_listen_address_rejects_garbage() {
        assert!(parse_listen_address("not an address").is_err());
        assert!(parse_listen_address(":99999").is_err());
    }

    #[test]
    fn test_vmid_syntax() {
        assert!(is_valid_vmid("1234"));
        assert!(is_valid_vmid("1234@remote.example.com"));
        assert!(is_valid_vmid("rmi://1234@remote:1099/server"));
        assert!(!is_valid_vmid(""));
        assert!(!is_valid_vmid("java"));
        assert!(!is_valid_vmid("12 34"));
    }

    #[test]
    fn test_metrics_path_rules() {
        let mut cfg = Config::default();
        cfg.metrics_path = Some("metrics".into());
        assert!(validate_effective_config(&cfg).is_err());

        cfg.metrics_path = Some("/health".into());
        assert!(validate_effective_config(&cfg).is_err());

        cfg.metrics_path = Some("/jvm/metrics".into());
        assert!(validate_effective_config(&cfg).is_ok());
    }

    #[test]
    fn test_invalid_pid_rejected() {
        let mut cfg = Config::default();
        cfg.pid = Some("java".into());
        let err = validate_effective_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("not a valid jstat vmid"));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let mut cfg = Config::default();
        cfg.log_level = Some("verbose".into());
        assert!(validate_effective_config(&cfg).is_err());

        cfg.log_level = Some("DEBUG".into());
        assert!(validate_effective_config(&cfg).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut cfg = Config::default();
        cfg.sample_timeout_secs = Some(0);
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_tls_requires_both_paths() {
        let mut cfg = Config::default();
        cfg.enable_tls = Some(true);
        cfg.tls_cert_path = Some("/some/cert.pem".into());
        let err = validate_effective_config(&cfg).unwrap_err();
        assert_eq!(err.to_string(), "TLS is enabled but tls_key_path is not set");
    }

    #[test]
    fn test_load_yaml_config_with_dashed_keys() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "jstat-path: /opt/jdk/bin/jstat").unwrap();
        writeln!(file, "pid: \"4711\"").unwrap();
        writeln!(file, "column_layout: header").unwrap();

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.target(), TargetSpec::new("/opt/jdk/bin/jstat", "4711"));
        assert_eq!(cfg.column_layout(), ColumnLayout::Header);
        // Keys absent from the file fall back to defaults
        assert_eq!(cfg.metrics_path(), "/metrics");
    }

    #[test]
    fn test_every_supported_format_has_default_paths() {
        for ext in ["yaml", "yml", "json", "toml"] {
            let suffix = format!(".{}", ext);
            let count = DEFAULT_CONFIG_PATHS
                .iter()
                .filter(|p| p.ends_with(&suffix))
                .count();
            assert_eq!(count, 2, "expected /etc and ./ entries for {}", ext);
        }
    }

    #[test]
    fn test_load_toml_config() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "pid = \"31337\"").unwrap();
        writeln!(file, "column_layout = \"header\"").unwrap();

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.pid.as_deref(), Some("31337"));
        assert_eq!(cfg.column_layout(), ColumnLayout::Header);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        assert!(load_config(Some(Path::new("/nonexistent/exporter.yaml"))).is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"pid": "100", "metrics_path": "/gc"}}"#).unwrap();

        let path = file.path().to_string_lossy().to_string();
        let args = Args::parse_from([
            "jstat-gcutil-exporter",
            "--config",
            path.as_str(),
            "--pid",
            "200",
        ]);

        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.pid.as_deref(), Some("200"));
        assert_eq!(cfg.metrics_path(), "/gc");
    }
}
