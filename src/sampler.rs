//! Sample sources for raw `jstat -gcutil` text.
//!
//! The collector only sees the [`Sampler`] trait, so the process-spawning
//! implementation can be swapped for a file replay or a fixed string.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::SampleError;

/// jstat option selecting GC utilization percentages.
pub const GCUTIL_OPTION: &str = "-gcutil";

/// Default target identifier meaning "no JVM configured".
pub const PLACEHOLDER_PID: &str = ":0";

/// Interval between child status polls when a timeout is configured.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Produces the raw text of one gcutil sample.
pub trait Sampler: Send + Sync {
    fn sample(&self) -> Result<String, SampleError>;

    /// Human-readable description of where samples come from.
    fn source(&self) -> String;
}

/// The jstat binary and the JVM it is pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub jstat_path: PathBuf,
    pub pid: String,
}

impl TargetSpec {
    pub fn new(jstat_path: impl Into<PathBuf>, pid: impl Into<String>) -> Self {
        Self {
            jstat_path: jstat_path.into(),
            pid: pid.into(),
        }
    }

    /// True while the target is still the `:0` placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.pid == PLACEHOLDER_PID
    }
}

/// Runs `<jstat_path> -gcutil <pid>` once per sample.
#[derive(Debug, Clone)]
pub struct JstatSampler {
    target: TargetSpec,
    timeout: Option<Duration>,
}

impl JstatSampler {
    pub fn new(target: TargetSpec) -> Self {
        Self {
            target,
            timeout: None,
        }
    }

    /// Kill the child if it has not exited after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn target(&self) -> &TargetSpec {
        &self.target
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.target.jstat_path);
        cmd.arg(GCUTIL_OPTION)
            .arg(&self.target.pid)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn spawn_error(&self, source: io::Error) -> SampleError {
        SampleError::Spawn {
            path: self.target.jstat_path.clone(),
            source,
        }
    }

    fn run_with_timeout(&self, timeout: Duration) -> Result<Output, SampleError> {
        let mut child = self.command().spawn().map_err(|e| self.spawn_error(e))?;
        let deadline = Instant::now() + timeout;

        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if Instant::now() >= deadline => {
                    if let Err(e) = child.kill() {
                        warn!("Failed to kill timed out jstat process: {}", e);
                    }
                    // Reap the child so it does not linger as a zombie
                    let _ = child.wait();
                    return Err(SampleError::Timeout {
                        path: self.target.jstat_path.clone(),
                        timeout,
                    });
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(self.spawn_error(e)),
            }
        }

        child.wait_with_output().map_err(|e| self.spawn_error(e))
    }
}

impl Sampler for JstatSampler {
    fn sample(&self) -> Result<String, SampleError> {
        debug!(
            "Running {} {} {}",
            self.target.jstat_path.display(),
            GCUTIL_OPTION,
            self.target.pid
        );

        let output = match self.timeout {
            Some(timeout) => self.run_with_timeout(timeout)?,
            None => self.command().output().map_err(|e| self.spawn_error(e))?,
        };

        if !output.status.success() {
            let detail = first_line(&output.stderr)
                .or_else(|| first_line(&output.stdout))
                .unwrap_or_default();
            return Err(SampleError::ExitStatus {
                path: self.target.jstat_path.clone(),
                status: output.status,
                detail,
            });
        }

        String::from_utf8(output.stdout).map_err(|_| SampleError::InvalidUtf8 {
            path: self.target.jstat_path.clone(),
        })
    }

    fn source(&self) -> String {
        format!(
            "{} {} {}",
            self.target.jstat_path.display(),
            GCUTIL_OPTION,
            self.target.pid
        )
    }
}

/// Replays jstat output captured in a file, re-reading it on every sample.
#[derive(Debug, Clone)]
pub struct FileSampler {
    path: PathBuf,
}

impl FileSampler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sampler for FileSampler {
    fn sample(&self) -> Result<String, SampleError> {
        std::fs::read_to_string(&self.path).map_err(|source| SampleError::ReadFile {
            path: self.path.clone(),
            source,
        })
    }

    fn source(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Always returns the same text.
#[derive(Debug, Clone, Default)]
pub struct StaticSampler {
    text: String,
}

impl StaticSampler {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Sampler for StaticSampler {
    fn sample(&self) -> Result<String, SampleError> {
        Ok(self.text.clone())
    }

    fn source(&self) -> String {
        "static text".to_string()
    }
}

fn first_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}
