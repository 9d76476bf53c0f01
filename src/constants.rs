//! Global constants for the yarder application.
//!
//! This module centralizes all hardcoded values: environment variable names,
//! their defaults, the external tools yarder drives and the naming rules for
//! the archives it ships.

use std::time::Duration;

/// Crate version, logged at startup and attached to every uploaded object
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Environment variables
/// Capture window length, e.g. `1m` or `90s`
pub const ENV_DURATION: &str = "YARDER_DURATION";

/// Destination key prefix inside the bucket
pub const ENV_S3_PATH: &str = "YARDER_S3_PATH";

/// Destination bucket
pub const ENV_S3_BUCKET: &str = "YARDER_S3_BUCKET";

/// AWS region of the destination bucket
pub const ENV_AWS_REGION: &str = "YARDER_AWS_REGION";

/// Local file receiving the captured lines
pub const ENV_OUTPUT_FILE: &str = "YARDER_OUTPUT_FILE";

/// Log file to follow
pub const ENV_LOG_FILE: &str = "YARDER_LOG_FILE";

/// Log verbosity for yarder itself
pub const ENV_LOG_LEVEL: &str = "YARDER_LOG_LEVEL";

// Defaults
pub const DEFAULT_DURATION: &str = "1m";
pub const DEFAULT_AWS_REGION: &str = "us-east-1";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Longest accepted capture window, `i64::MAX` nanoseconds
pub const MAX_CAPTURE_DURATION: Duration = Duration::from_nanos(i64::MAX as u64);

// External tools
/// Program used to follow the log file
pub const FOLLOWER_PROGRAM: &str = "tail";

/// Program used to build the archive
pub const ARCHIVER_PROGRAM: &str = "tar";

// Archive and upload naming
/// Extension appended to the output file name to form the archive name
pub const ARCHIVE_EXTENSION: &str = "tar.gz";

/// Metadata key attached to every uploaded object
pub const METADATA_VERSION_KEY: &str = "yarder-version";

/// Number of leading bytes inspected when sniffing the content type
pub const SNIFF_LENGTH: usize = 512;

/// Response header carrying the S3 request id
pub const S3_REQUEST_ID_HEADER: &str = "x-amz-request-id";

// Error messages
pub const ERROR_FAILED_TO_READ_ARCHIVE: &str = "Failed to read archive";
pub const ERROR_FAILED_TO_CREATE_CLIENT: &str = "Failed to create S3 client";
