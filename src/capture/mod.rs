//! Timed capture of a growing log file.
//!
//! A [`CaptureSession`] owns the external follower process for the duration
//! of the capture window:
//!
//! ```text
//! start ──▶ hold(window) ──▶ stop ──▶ CaptureReport
//!   │                          │
//!   └─ spawn `tail -n 0 -f`    └─ kill + reap
//! ```
//!
//! The window is enforced with a single one-shot timer anchored at the spawn
//! instant, so the time between spawn and kill is never shorter than the
//! configured duration.
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use yarder::capture::{capture, LogFollower};
//!
//! # async fn example() -> Result<(), yarder::error::YarderError> {
//! let report = capture(
//!     &LogFollower::default(),
//!     Path::new("/var/log/syslog"),
//!     Path::new("/tmp/syslog-capture.log"),
//!     Duration::from_secs(60),
//! )
//! .await?;
//! println!("captured {} bytes", report.bytes_captured);
//! # Ok(())
//! # }
//! ```

mod session;

pub use session::{capture, CaptureReport, CaptureSession, LogFollower};
