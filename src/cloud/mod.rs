//! Cloud storage integration for archive uploads.
//!
//! Archives are shipped to Amazon S3 with a single `PutObject` request. The
//! whole archive is buffered in memory first, which is fine for the small
//! archives a bounded capture window produces.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌────────────────┐
//! │ upload_archive  │────▶│  ObjectStore    │────▶│   S3 Bucket    │
//! │ read + sniff    │     │  (S3Store)      │     │ prefix/name    │
//! └─────────────────┘     └─────────────────┘     └────────────────┘
//! ```
//!
//! Failures are classified as client-side (credentials, dispatch,
//! validation, local read) or service-reported (S3 error document with code,
//! message and request id). Both end the run.
//!
//! ## Usage Example
//!
//! ```no_run
//! use std::path::Path;
//! use yarder::cloud::s3::{upload_archive, S3Store};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = S3Store::new("us-east-1")?;
//! let receipt = upload_archive(
//!     &store,
//!     Path::new("/tmp/capture.log.tar.gz"),
//!     "ops-archive",
//!     "logs/web",
//! )
//! .await?;
//! println!("stored s3://{}/{}", receipt.bucket, receipt.key);
//! # Ok(())
//! # }
//! ```

/// Amazon S3 store, key construction and upload
pub mod s3;

/// S3 client construction
pub mod client;
