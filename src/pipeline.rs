//! Orchestration of one capture-archive-upload run.
//!
//! ```text
//! Init ─▶ Configuring ─▶ Capturing ─▶ Archiving ─▶ Uploading ─▶ Done
//!             │              │            │            │
//!             └──────────────┴────────────┴────────────┴──▶ Failed
//! ```
//!
//! Every edge is taken once. The first failure moves the run to `Failed` and
//! is returned to the caller untouched.

use std::fmt;
use std::path::PathBuf;

use log::{debug, info};

use crate::capture::{capture, CaptureReport, LogFollower};
use crate::cloud::s3::{upload_archive, ObjectStore, UploadReceipt};
use crate::config::YarderConfig;
use crate::error::YarderError;
use crate::utils::compress::Archiver;

/// Process-level stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Configuring,
    Capturing,
    Archiving,
    Uploading,
    Done,
    Failed,
}

impl Stage {
    /// Operator-facing hint logged when a run fails in this stage
    pub fn hint(self) -> &'static str {
        match self {
            Stage::Configuring => {
                "There was an error configuring Yarder. Please evaluate the error and try again"
            }
            Stage::Capturing => {
                "There was an error during the tail process. Please evaluate the error and try again"
            }
            Stage::Archiving => {
                "There was an error compressing the captured log. Please evaluate the error and try again"
            }
            Stage::Uploading => {
                "There was an error uploading the archive to S3. Please evaluate the error and try again"
            }
            Stage::Init | Stage::Done | Stage::Failed => "Please evaluate the error and try again",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::Configuring => "configuring",
            Stage::Capturing => "capturing",
            Stage::Archiving => "archiving",
            Stage::Uploading => "uploading",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub capture: CaptureReport,
    pub archive: PathBuf,
    pub upload: UploadReceipt,
}

/// Runs capture, archive and upload strictly in sequence.
pub struct Pipeline<'a, S: ObjectStore + ?Sized> {
    config: &'a YarderConfig,
    store: &'a S,
    follower: LogFollower,
    archiver: Archiver,
    stage: Stage,
}

impl<'a, S: ObjectStore + ?Sized> Pipeline<'a, S> {
    /// Create a pipeline for an already loaded configuration
    pub fn new(config: &'a YarderConfig, store: &'a S) -> Self {
        Pipeline {
            config,
            store,
            follower: LogFollower::default(),
            archiver: Archiver::default(),
            stage: Stage::Configuring,
        }
    }

    /// Replace the log follower command
    pub fn with_follower(mut self, follower: LogFollower) -> Self {
        self.follower = follower;
        self
    }

    /// Replace the archiver
    pub fn with_archiver(mut self, archiver: Archiver) -> Self {
        self.archiver = archiver;
        self
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, next: Stage) {
        debug!("Stage {} -> {}", self.stage, next);
        self.stage = next;
    }

    /// Run the remaining stages, stopping at the first failure
    pub async fn run(&mut self) -> Result<PipelineReport, YarderError> {
        match self.run_stages().await {
            Ok(report) => {
                self.advance(Stage::Done);
                Ok(report)
            }
            Err(e) => {
                self.advance(Stage::Failed);
                Err(e)
            }
        }
    }

    async fn run_stages(&mut self) -> Result<PipelineReport, YarderError> {
        let config = self.config;

        self.advance(Stage::Capturing);
        info!(
            "Capturing {} for {:?}",
            config.log_file.display(),
            config.duration
        );
        let capture_report = capture(
            &self.follower,
            &config.log_file,
            &config.output_file,
            config.duration,
        )
        .await?;
        info!(
            "Capture started at {} and ran for {:?}",
            capture_report.started_at.to_rfc3339(),
            capture_report.elapsed
        );

        self.advance(Stage::Archiving);
        let archive = self.archiver.archive(&config.output_file)?;

        self.advance(Stage::Uploading);
        let upload =
            upload_archive(self.store, &archive, &config.s3_bucket, &config.s3_path).await?;

        Ok(PipelineReport {
            capture: capture_report,
            archive,
            upload,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::cloud::s3::{MockObjectStore, UploadObject};
    use crate::error::UploadFailure;
    use crate::test_utils::create_temp_dir;
    use std::fs;
    use std::time::Duration;

    fn config_in(dir: &std::path::Path) -> YarderConfig {
        let log_file = dir.join("app.log");
        fs::write(&log_file, b"").unwrap();
        YarderConfig {
            duration: Duration::from_millis(200),
            output_file: dir.join("capture.log"),
            log_file,
            s3_bucket: "ops-archive".to_string(),
            s3_path: "logs".to_string(),
            aws_region: "us-east-1".to_string(),
        }
    }

    #[test]
    fn test_hints_are_stage_specific() {
        assert!(Stage::Configuring.hint().contains("configuring"));
        assert!(Stage::Capturing.hint().contains("tail"));
        assert!(Stage::Archiving.hint().contains("compressing"));
        assert!(Stage::Uploading.hint().contains("uploading"));
    }

    #[tokio::test]
    async fn test_successful_run_reaches_done() {
        let temp_dir = create_temp_dir().unwrap();
        let config = config_in(temp_dir.path());

        let mut store = MockObjectStore::new();
        store
            .expect_put_object()
            .withf(|object: &UploadObject| {
                object.key == "logs/capture.log.tar.gz" && object.bucket == "ops-archive"
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut pipeline = Pipeline::new(&config, &store);
        assert_eq!(pipeline.stage(), Stage::Configuring);

        let report = pipeline.run().await.unwrap();
        assert_eq!(pipeline.stage(), Stage::Done);
        assert_eq!(report.archive, temp_dir.path().join("capture.log.tar.gz"));
        assert!(report.capture.elapsed >= config.duration);
        assert_eq!(report.upload.key, "logs/capture.log.tar.gz");
    }

    #[tokio::test]
    async fn test_archive_failure_skips_upload() {
        let temp_dir = create_temp_dir().unwrap();
        let config = config_in(temp_dir.path());

        let mut store = MockObjectStore::new();
        store.expect_put_object().times(0);

        let mut pipeline =
            Pipeline::new(&config, &store).with_archiver(Archiver::with_program("false"));
        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, YarderError::Archive { .. }));
        assert_eq!(err.stage(), Stage::Archiving);
        assert_eq!(pipeline.stage(), Stage::Failed);
    }

    #[tokio::test]
    async fn test_capture_failure_skips_archive_and_upload() {
        let temp_dir = create_temp_dir().unwrap();
        let mut config = config_in(temp_dir.path());
        config.output_file = temp_dir.path().join("no-such-dir").join("capture.log");

        let mut store = MockObjectStore::new();
        store.expect_put_object().times(0);

        let mut pipeline = Pipeline::new(&config, &store);
        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, YarderError::CaptureStart { .. }));
        assert_eq!(pipeline.stage(), Stage::Failed);
        assert!(!temp_dir.path().join("capture.log.tar.gz").exists());
    }

    #[tokio::test]
    async fn test_service_error_fails_run() {
        let temp_dir = create_temp_dir().unwrap();
        let config = config_in(temp_dir.path());

        let mut store = MockObjectStore::new();
        store.expect_put_object().times(1).returning(|_| {
            Err(UploadFailure::Service {
                code: "NoSuchBucket".to_string(),
                message: "The specified bucket does not exist".to_string(),
                status: Some(404),
                request_id: Some("REQ42".to_string()),
            })
        });

        let mut pipeline = Pipeline::new(&config, &store);
        let err = pipeline.run().await.unwrap_err();

        assert_eq!(err.stage(), Stage::Uploading);
        assert_eq!(pipeline.stage(), Stage::Failed);
        // The local archive is left in place
        assert!(temp_dir.path().join("capture.log.tar.gz").exists());
    }
}
