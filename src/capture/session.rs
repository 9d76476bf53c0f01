use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::constants::FOLLOWER_PROGRAM;
use crate::error::YarderError;

/// Command used to follow a growing log file.
///
/// The log file path is appended as the last argument. The default is
/// `tail -n 0 -f`, which writes only the lines appended after it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFollower {
    program: String,
    args: Vec<String>,
}

impl Default for LogFollower {
    fn default() -> Self {
        LogFollower {
            program: FOLLOWER_PROGRAM.to_string(),
            args: vec!["-n".to_string(), "0".to_string(), "-f".to_string()],
        }
    }
}

impl LogFollower {
    /// Follow with a different program and leading arguments
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        LogFollower {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, log_file: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(log_file);
        cmd
    }
}

/// Outcome of a finished capture.
#[derive(Debug, Clone)]
pub struct CaptureReport {
    /// File the follower wrote to
    pub output_file: PathBuf,
    /// Requested window
    pub window: Duration,
    /// Measured time between spawn and kill
    pub elapsed: Duration,
    /// Wall-clock start of the capture
    pub started_at: DateTime<Utc>,
    /// Size of the output file after the follower stopped
    pub bytes_captured: u64,
}

/// A running log follower.
///
/// The session owns the child process exclusively. `stop` consumes the
/// session, so the follower can only be terminated once; a session dropped
/// without `stop` kills and reaps its follower.
#[derive(Debug)]
pub struct CaptureSession {
    child: Option<Child>,
    pid: u32,
    output_file: PathBuf,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl CaptureSession {
    /// Create (or truncate) `output_file` and start following `log_file` into it
    pub fn start(
        follower: &LogFollower,
        log_file: &Path,
        output_file: &Path,
    ) -> Result<Self, YarderError> {
        let start_error = |source| YarderError::CaptureStart {
            log_file: log_file.to_path_buf(),
            output_file: output_file.to_path_buf(),
            source,
        };

        let output = File::create(output_file).map_err(start_error)?;

        let child = follower
            .command(log_file)
            .stdin(Stdio::null())
            .stdout(Stdio::from(output))
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(start_error)?;

        let pid = child.id();
        info!(
            "Following {} into {} ({} pid {})",
            log_file.display(),
            output_file.display(),
            follower.program(),
            pid
        );

        Ok(CaptureSession {
            child: Some(child),
            pid,
            output_file: output_file.to_path_buf(),
            started: Instant::now(),
            started_at: Utc::now(),
        })
    }

    /// Process id of the follower
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Time since the follower was spawned
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Wait until `window` has passed since the follower started.
    ///
    /// Uses a single one-shot timer anchored at the spawn instant.
    pub async fn hold(&self, window: Duration) {
        debug!("Capture window of {:?} open for pid {}", window, self.pid);
        match self.started.checked_add(window) {
            Some(deadline) => {
                tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await
            }
            None => {
                warn!("Capture window {:?} is past the clock range, sleeping instead", window);
                tokio::time::sleep(window).await
            }
        }
    }

    /// Terminate the follower and wait for it to exit.
    ///
    /// A follower that already exited on its own is an error: the capture
    /// window was not fully observed.
    pub fn stop(mut self, window: Duration) -> Result<CaptureReport, YarderError> {
        let pid = self.pid;
        let mut child = match self.child.take() {
            Some(child) => child,
            None => {
                return Err(YarderError::CaptureStop {
                    pid,
                    reason: "follower already stopped".to_string(),
                })
            }
        };

        let stop_error = |reason: String| YarderError::CaptureStop { pid, reason };

        match child.try_wait() {
            Ok(Some(status)) => {
                return Err(stop_error(format!(
                    "follower exited before the capture window closed ({})",
                    describe_exit(status)
                )));
            }
            Ok(None) => {}
            Err(e) => return Err(stop_error(format!("failed to poll follower: {}", e))),
        }

        child
            .kill()
            .map_err(|e| stop_error(format!("failed to kill follower: {}", e)))?;
        let elapsed = self.elapsed();

        let status = child
            .wait()
            .map_err(|e| stop_error(format!("failed to reap follower: {}", e)))?;
        debug!("Follower pid {} terminated ({})", pid, describe_exit(status));

        let bytes_captured = fs::metadata(&self.output_file)
            .map(|m| m.len())
            .unwrap_or_else(|e| {
                warn!("Failed to stat {}: {}", self.output_file.display(), e);
                0
            });

        info!(
            "Captured {} bytes into {} in {:?}",
            bytes_captured,
            self.output_file.display(),
            elapsed
        );

        Ok(CaptureReport {
            output_file: self.output_file.clone(),
            window,
            elapsed,
            started_at: self.started_at,
            bytes_captured,
        })
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            warn!("Capture session dropped while running, killing pid {}", self.pid);
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Follow `log_file` into `output_file` for `window`, then stop the follower
pub async fn capture(
    follower: &LogFollower,
    log_file: &Path,
    output_file: &Path,
    window: Duration,
) -> Result<CaptureReport, YarderError> {
    let session = CaptureSession::start(follower, log_file, output_file)?;
    session.hold(window).await;
    session.stop(window)
}

fn describe_exit(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => format!("{}", status),
    }
}
