//! Startup requirement validation for jstat-gcutil-exporter.
//!
//! This module checks that the jstat binary is usable and that the target
//! JVM can be attached to before the server starts.

use nix::unistd::geteuid;
use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::config::Config;

/// Validate all runtime requirements
pub fn validate_requirements(config: &Config) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    if let Some(file) = &config.sample_file {
        info!("Sampling from file {}, skipping jstat checks", file.display());
        return check_sample_file(file);
    }

    let target = config.target();
    check_jstat_binary(&target.jstat_path)?;

    if target.is_placeholder() {
        warn!(
            "⚠️  pid is the placeholder '{}' - every scrape will fail until a real pid is configured",
            target.pid
        );
        warn!("   Set --pid or 'pid:' in the config file");
        return Ok(());
    }

    check_target_process(&target.pid)?;

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Check that jstat exists and is executable
fn check_jstat_binary(path: &Path) -> Result<(), ValidationError> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            error!("❌ jstat not found at {}: {}", path.display(), e);
            error!("   Install a JDK or point --jstat-path at $JAVA_HOME/bin/jstat");
            return Err(ValidationError::JstatNotFound(path.display().to_string()));
        }
    };

    if !metadata.is_file() || metadata.permissions().mode() & 0o111 == 0 {
        error!("❌ {} is not an executable file", path.display());
        return Err(ValidationError::JstatNotExecutable(
            path.display().to_string(),
        ));
    }

    info!("✅ jstat found at {}", path.display());
    Ok(())
}

/// Check that a local target pid is alive and attachable by this user
fn check_target_process(pid: &str) -> Result<(), ValidationError> {
    // Remote vmids (with @host) cannot be checked locally
    let Ok(local_pid) = pid.parse::<u32>() else {
        debug!("Target {} is not a local pid, skipping /proc checks", pid);
        return Ok(());
    };

    let proc_dir = format!("/proc/{}", local_pid);
    let metadata = match fs::metadata(&proc_dir) {
        Ok(m) => m,
        Err(_) => {
            error!("❌ No process with pid {} is running", local_pid);
            return Err(ValidationError::TargetNotRunning(local_pid));
        }
    };

    let euid = geteuid();
    if euid.is_root() {
        info!("✅ Target pid {} is running (attaching as root)", local_pid);
    } else if metadata.uid() != euid.as_raw() {
        warn!(
            "⚠️  Target pid {} is owned by uid {} but the exporter runs as uid {}",
            local_pid,
            metadata.uid(),
            euid
        );
        warn!("   jstat can only attach to JVMs of the same user");
        return Err(ValidationError::TargetOwnerMismatch {
            pid: local_pid,
            owner: metadata.uid(),
            euid: euid.as_raw(),
        });
    } else {
        info!("✅ Target pid {} is running", local_pid);
    }

    Ok(())
}

fn check_sample_file(path: &Path) -> Result<(), ValidationError> {
    match fs::metadata(path) {
        Ok(m) if m.is_file() => {
            info!("✅ Sample file {} is readable", path.display());
            Ok(())
        }
        _ => {
            error!("❌ Sample file {} not found", path.display());
            Err(ValidationError::SampleFileNotFound(
                path.display().to_string(),
            ))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("jstat not found: {0}")]
    JstatNotFound(String),

    #[error("jstat is not executable: {0}")]
    JstatNotExecutable(String),

    #[error("target process {0} is not running")]
    TargetNotRunning(u32),

    #[error("target process {pid} is owned by uid {owner}, exporter runs as uid {euid}")]
    TargetOwnerMismatch { pid: u32, owner: u32, euid: u32 },

    #[error("sample file not found: {0}")]
    SampleFileNotFound(String),
}
