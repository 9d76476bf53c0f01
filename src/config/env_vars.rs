use std::env;
use std::path::PathBuf;
use std::time::Duration;

use lazy_static::lazy_static;
use log::LevelFilter;
use regex::Regex;

use crate::constants::{
    DEFAULT_AWS_REGION, DEFAULT_DURATION, DEFAULT_LOG_LEVEL, ENV_AWS_REGION, ENV_DURATION,
    ENV_LOG_FILE, ENV_LOG_LEVEL, ENV_OUTPUT_FILE, ENV_S3_BUCKET, ENV_S3_PATH,
    MAX_CAPTURE_DURATION,
};
use crate::error::YarderError;

lazy_static! {
    static ref BARE_NUMBER: Regex = Regex::new(r"^(\d+\.?\d*|\.\d+)$").unwrap();
    static ref DURATION_GRAMMAR: Regex =
        Regex::new(r"^((\d+\.?\d*|\.\d+)(ns|us|µs|ms|s|m|h))+$").unwrap();
}

/// Settings for one yarder run.
///
/// Built once at startup from `YARDER_*` environment variables and handed to
/// each stage by reference. Only the duration is validated here; blank paths
/// or an empty bucket surface as failures in the stage that uses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YarderConfig {
    /// Length of the capture window
    pub duration: Duration,
    /// File receiving the captured lines
    pub output_file: PathBuf,
    /// File being followed
    pub log_file: PathBuf,
    /// Destination bucket
    pub s3_bucket: String,
    /// Destination key prefix
    pub s3_path: String,
    /// Region of the destination bucket
    pub aws_region: String,
}

impl YarderConfig {
    /// Load the configuration from the process environment
    pub fn from_env() -> Result<Self, YarderError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// Empty values count as unset, so `YARDER_DURATION=` still yields the
    /// default window.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, YarderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let duration = read(ENV_DURATION).unwrap_or_else(|| DEFAULT_DURATION.to_string());
        let duration = parse_capture_duration(&duration)?;

        Ok(YarderConfig {
            duration,
            output_file: PathBuf::from(read(ENV_OUTPUT_FILE).unwrap_or_default()),
            log_file: PathBuf::from(read(ENV_LOG_FILE).unwrap_or_default()),
            s3_bucket: read(ENV_S3_BUCKET).unwrap_or_default(),
            s3_path: read(ENV_S3_PATH).unwrap_or_default(),
            aws_region: read(ENV_AWS_REGION).unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
        })
    }
}

/// Parse a capture duration such as `1m`, `90s`, `1m30s`, `1.5h` or `500ms`.
///
/// The accepted grammar is a sequence of `<number><unit>` pairs with no
/// inner whitespace, units `ns`, `us`, `µs`, `ms`, `s`, `m` and `h`.
/// Surrounding whitespace is ignored. A bare `"0"` is zero; any other bare
/// number is rejected, so `"90"` never silently becomes ninety seconds.
/// Windows longer than `i64::MAX` nanoseconds (about 292 years) are rejected.
pub fn parse_capture_duration(value: &str) -> Result<Duration, YarderError> {
    let trimmed = value.trim();
    let invalid = |reason: String| YarderError::Config {
        value: value.to_string(),
        reason,
    };

    if trimmed.is_empty() {
        return Err(invalid("duration is empty".to_string()));
    }
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }
    if BARE_NUMBER.is_match(trimmed) {
        return Err(invalid("missing unit".to_string()));
    }
    if !DURATION_GRAMMAR.is_match(trimmed) {
        return Err(invalid(
            "expected <number><unit> pairs with units ns, us, ms, s, m or h".to_string(),
        ));
    }

    let duration = parse_duration::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if duration > MAX_CAPTURE_DURATION {
        return Err(invalid(format!(
            "duration exceeds the maximum of {:?}",
            MAX_CAPTURE_DURATION
        )));
    }
    Ok(duration)
}

/// Log level requested through `YARDER_LOG_LEVEL`.
///
/// Returns the level and, when the variable held something unparsable, the
/// rejected value so the caller can warn once logging is up.
pub fn log_level_from_env() -> (LevelFilter, Option<String>) {
    log_level_from_lookup(|name| env::var(name).ok())
}

pub(crate) fn log_level_from_lookup<F>(lookup: F) -> (LevelFilter, Option<String>)
where
    F: Fn(&str) -> Option<String>,
{
    let default = DEFAULT_LOG_LEVEL.parse().unwrap_or(LevelFilter::Info);
    match lookup(ENV_LOG_LEVEL).filter(|value| !value.is_empty()) {
        Some(value) => match value.parse::<LevelFilter>() {
            Ok(level) => (level, None),
            Err(_) => (default, Some(value)),
        },
        None => (default, None),
    }
}
