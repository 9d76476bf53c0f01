//! Error types shared by every pipeline stage.
//!
//! Every variant is fatal: the orchestrator logs it once together with the
//! hint of the stage it belongs to and exits non-zero.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use crate::pipeline::Stage;

/// A failure in one of the yarder stages.
#[derive(Debug, thiserror::Error)]
pub enum YarderError {
    /// The capture duration could not be parsed
    #[error("invalid capture duration {value:?}: {reason}")]
    Config { value: String, reason: String },

    /// The output file could not be created or the log follower could not be spawned
    #[error("failed to capture {} into {}: {source}", .log_file.display(), .output_file.display())]
    CaptureStart {
        log_file: PathBuf,
        output_file: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The log follower could not be terminated, or died before the window closed
    #[error("failed to stop log follower (pid {pid}): {reason}")]
    CaptureStop { pid: u32, reason: String },

    /// The compression tool could not be run or exited unsuccessfully
    #[error("failed to archive {}: {reason}", .path.display())]
    Archive { path: PathBuf, reason: String },

    /// The archive could not be read or stored
    #[error("failed to upload s3://{bucket}/{key}: {failure}")]
    Upload {
        bucket: String,
        key: String,
        failure: UploadFailure,
    },
}

impl YarderError {
    /// Stage that produced this error
    pub fn stage(&self) -> Stage {
        match self {
            YarderError::Config { .. } => Stage::Configuring,
            YarderError::CaptureStart { .. } | YarderError::CaptureStop { .. } => Stage::Capturing,
            YarderError::Archive { .. } => Stage::Archiving,
            YarderError::Upload { .. } => Stage::Uploading,
        }
    }

    /// Operator-facing hint for this error
    pub fn hint(&self) -> &'static str {
        self.stage().hint()
    }

    pub(crate) fn archive_exit(path: PathBuf, status: ExitStatus, stderr: &[u8]) -> Self {
        let stderr = String::from_utf8_lossy(stderr);
        let stderr = stderr.trim();
        let reason = if stderr.is_empty() {
            format!("compressor exited with {status}")
        } else {
            format!("compressor exited with {status}: {stderr}")
        };
        YarderError::Archive { path, reason }
    }
}

/// Why a single put-object call failed.
///
/// `Client` covers everything that never produced an S3 error document:
/// credentials, dispatch, request validation and local reads. `Service`
/// carries the structured fields S3 reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadFailure {
    #[error("{message}")]
    Client { message: String },

    #[error(
        "{code}: {message} (request id {})",
        .request_id.as_deref().unwrap_or("unknown")
    )]
    Service {
        code: String,
        message: String,
        status: Option<u16>,
        request_id: Option<String>,
    },
}

impl UploadFailure {
    /// Whether S3 itself reported the failure
    pub fn is_service(&self) -> bool {
        matches!(self, UploadFailure::Service { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_mapping() {
        let config = YarderError::Config {
            value: "5x".into(),
            reason: "unknown unit".into(),
        };
        assert_eq!(config.stage(), Stage::Configuring);

        let stop = YarderError::CaptureStop {
            pid: 42,
            reason: "gone".into(),
        };
        assert_eq!(stop.stage(), Stage::Capturing);

        let archive = YarderError::Archive {
            path: PathBuf::from("/tmp/out.log"),
            reason: "boom".into(),
        };
        assert_eq!(archive.stage(), Stage::Archiving);

        let upload = YarderError::Upload {
            bucket: "b".into(),
            key: "k".into(),
            failure: UploadFailure::Client {
                message: "no credentials".into(),
            },
        };
        assert_eq!(upload.stage(), Stage::Uploading);
        assert_eq!(upload.hint(), Stage::Uploading.hint());
    }

    #[test]
    fn test_service_failure_display_includes_fields() {
        let failure = UploadFailure::Service {
            code: "NoSuchBucket".into(),
            message: "The specified bucket does not exist".into(),
            status: Some(404),
            request_id: Some("4442587FB7D0A2F9".into()),
        };
        let text = failure.to_string();
        assert!(text.contains("NoSuchBucket"));
        assert!(text.contains("The specified bucket does not exist"));
        assert!(text.contains("4442587FB7D0A2F9"));
        assert!(failure.is_service());
    }

    #[test]
    fn test_service_failure_without_request_id() {
        let failure = UploadFailure::Service {
            code: "AccessDenied".into(),
            message: "Access Denied".into(),
            status: Some(403),
            request_id: None,
        };
        assert!(failure.to_string().contains("request id unknown"));
    }

    #[test]
    fn test_upload_error_display() {
        let err = YarderError::Upload {
            bucket: "logs".into(),
            key: "app/out.log.tar.gz".into(),
            failure: UploadFailure::Client { message: "dispatch failure".into() },
        };
        assert_eq!(
            err.to_string(),
            "failed to upload s3://logs/app/out.log.tar.gz: dispatch failure"
        );
        assert!(matches!(err, YarderError::Upload { ref failure, .. } if !failure.is_service()));
    }
}
