//! # yarder
//!
//! Follow a log file for a fixed window, compress what was captured and ship
//! the archive to Amazon S3.
//!
//! ## Overview
//!
//! A run is a short linear pipeline:
//!
//! 1. read `YARDER_*` environment variables into a [`config::YarderConfig`]
//! 2. follow the log file with `tail` into the output file for the window
//! 3. compress the output file into `<name>.tar.gz` next to it
//! 4. upload the archive with one `PutObject` to `<bucket>/<prefix>/<name>.tar.gz`
//!
//! Every failure is fatal; nothing is retried.
//!
//! ## Usage
//!
//! ```no_run
//! use yarder::cloud::s3::S3Store;
//! use yarder::config::YarderConfig;
//! use yarder::pipeline::Pipeline;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = YarderConfig::from_env()?;
//! let store = S3Store::new(&config.aws_region)?;
//! let report = Pipeline::new(&config, &store).run().await?;
//! println!("uploaded {}", report.upload.key);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`config`]: Environment-sourced configuration
//! - [`capture`]: Timed log following
//! - [`utils`]: Archiving, hashing and content type sniffing
//! - [`cloud`]: S3 upload
//! - [`pipeline`]: Stage machine sequencing a run
//! - [`error`]: Error types
//! - [`constants`]: Application-wide constants

/// Environment-sourced configuration
pub mod config;

/// Timed capture of a growing log file
pub mod capture;

/// Utility functions for compression, hashing and sniffing
pub mod utils;

/// Cloud storage upload (S3)
pub mod cloud;

/// Stage machine for a single run
pub mod pipeline;

/// Error types
pub mod error;

/// Application constants and configuration values
pub mod constants;

/// Test utilities and helpers
#[cfg(test)]
pub mod test_utils;
