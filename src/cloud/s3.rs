use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, error, info, warn};
use regex::Regex;
use rusoto_core::request::BufferedHttpResponse;
use rusoto_core::{ByteStream, Region, RusotoError};
use rusoto_s3::{PutObjectError, PutObjectRequest, S3Client, S3};

#[cfg(test)]
use mockall::automock;

use crate::cloud::client::{create_s3_client, resolve_region};
use crate::constants::{
    ERROR_FAILED_TO_CREATE_CLIENT, ERROR_FAILED_TO_READ_ARCHIVE, METADATA_VERSION_KEY,
    S3_REQUEST_ID_HEADER, VERSION,
};
use crate::error::{UploadFailure, YarderError};
use crate::utils::hash::sha256_hex;
use crate::utils::sniff::detect_content_type;

lazy_static! {
    static ref ERROR_CODE: Regex = Regex::new(r"(?s)<Code>(.*?)</Code>").unwrap();
    static ref ERROR_MESSAGE: Regex = Regex::new(r"(?s)<Message>(.*?)</Message>").unwrap();
    static ref ERROR_REQUEST_ID: Regex = Regex::new(r"(?s)<RequestId>(.*?)</RequestId>").unwrap();
}

/// One object to store, fully buffered in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadObject {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub metadata: HashMap<String, String>,
}

impl UploadObject {
    /// Size of the body in bytes
    pub fn size(&self) -> u64 {
        self.body.len() as u64
    }
}

/// What was stored by a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub content_type: String,
    pub sha256: String,
    pub elapsed: Duration,
}

/// An object store accepting single put-object calls.
///
/// Implementations perform exactly one request per call; yarder never
/// retries.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `object` at its bucket and key
    async fn put_object(&self, object: UploadObject) -> std::result::Result<(), UploadFailure>;
}

/// Amazon S3 backed [`ObjectStore`].
pub struct S3Store {
    client: Arc<S3Client>,
    region: Region,
}

impl S3Store {
    /// Create a store for `region_name`.
    ///
    /// An unknown region logs a warning and falls back to the default region.
    /// Credentials come from the default AWS provider chain.
    pub fn new(region_name: &str) -> Result<Self> {
        let region = resolve_region(region_name);
        let client = create_s3_client(region.clone()).context(ERROR_FAILED_TO_CREATE_CLIENT)?;
        Ok(S3Store { client, region })
    }

    /// Get the AWS region being used for uploads
    pub fn region(&self) -> &Region {
        &self.region
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_object(&self, object: UploadObject) -> std::result::Result<(), UploadFailure> {
        let content_length = object.size() as i64;
        let request = PutObjectRequest {
            bucket: object.bucket,
            key: object.key,
            body: Some(ByteStream::from(object.body)),
            content_length: Some(content_length),
            content_type: Some(object.content_type),
            metadata: Some(object.metadata),
            ..Default::default()
        };

        self.client
            .put_object(request)
            .await
            .map(|_| ())
            .map_err(classify_put_error)
    }
}

/// Sort a rusoto put-object error into a client or service failure
pub fn classify_put_error(err: RusotoError<PutObjectError>) -> UploadFailure {
    match err {
        RusotoError::Unknown(response) => service_failure_from_response(&response),
        RusotoError::Service(e) => UploadFailure::Service {
            code: "PutObjectError".to_string(),
            message: e.to_string(),
            status: None,
            request_id: None,
        },
        RusotoError::Credentials(e) => UploadFailure::Client {
            message: format!("credentials error: {}", e),
        },
        RusotoError::HttpDispatch(e) => UploadFailure::Client {
            message: format!("request dispatch failed: {}", e),
        },
        other => UploadFailure::Client {
            message: other.to_string(),
        },
    }
}

fn service_failure_from_response(response: &BufferedHttpResponse) -> UploadFailure {
    let request_id = response.headers.get(S3_REQUEST_ID_HEADER).map(|id| id.as_str());
    service_failure(response.status.as_u16(), request_id, response.body_as_str())
}

/// Build a service failure from an S3 error response.
///
/// Code, message and request id come from the XML error document; the
/// request id falls back to the `x-amz-request-id` header.
pub fn service_failure(status: u16, request_id_header: Option<&str>, body: &str) -> UploadFailure {
    let capture = |re: &Regex| {
        re.captures(body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let code = capture(&ERROR_CODE).unwrap_or_else(|| format!("HTTP{}", status));
    let message = capture(&ERROR_MESSAGE).unwrap_or_else(|| {
        let body = body.trim();
        if body.is_empty() {
            "empty error response".to_string()
        } else {
            body.to_string()
        }
    });
    let request_id = capture(&ERROR_REQUEST_ID)
        .or_else(|| request_id_header.map(|id| id.to_string()));

    UploadFailure::Service {
        code,
        message,
        status: Some(status),
        request_id,
    }
}

/// Join a key prefix and a file name the way a slash-separated path is joined.
///
/// Empty elements are skipped and the result is cleaned: repeated slashes
/// collapse, `.` segments vanish and `..` removes the previous segment. A
/// leading slash on the prefix is kept.
///
/// ```
/// # use yarder::cloud::s3::join_key;
/// assert_eq!(join_key("", "out.log.tar.gz"), "out.log.tar.gz");
/// assert_eq!(join_key("logs/web/", "out.log.tar.gz"), "logs/web/out.log.tar.gz");
/// ```
pub fn join_key(prefix: &str, name: &str) -> String {
    let joined = [prefix, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        return joined;
    }
    clean_key(&joined)
}

fn clean_key(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().map_or(false, |last| *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let body = segments.join("/");
    match (rooted, body.is_empty()) {
        (true, _) => format!("/{}", body),
        (false, true) => ".".to_string(),
        (false, false) => body,
    }
}

/// Destination key for `archive` under `prefix`
pub fn destination_key(prefix: &str, archive: &Path) -> Option<String> {
    let name = archive.file_name()?.to_str()?;
    Some(join_key(prefix, name))
}

/// Read `archive` into memory and store it at `join(prefix, archive name)` in `bucket`.
///
/// One put-object call, no retry, no multipart. The object carries the
/// sniffed content type, its exact length and a `yarder-version` metadata
/// entry.
pub async fn upload_archive<S>(
    store: &S,
    archive: &Path,
    bucket: &str,
    prefix: &str,
) -> std::result::Result<UploadReceipt, YarderError>
where
    S: ObjectStore + ?Sized,
{
    let upload_error = |key: &str, failure: UploadFailure| YarderError::Upload {
        bucket: bucket.to_string(),
        key: key.to_string(),
        failure,
    };

    let key = destination_key(prefix, archive).ok_or_else(|| {
        upload_error(
            "",
            UploadFailure::Client {
                message: format!("archive path {} has no file name", archive.display()),
            },
        )
    })?;

    let body = tokio::fs::read(archive).await.map_err(|e| {
        let failure = UploadFailure::Client {
            message: format!("{} {}: {}", ERROR_FAILED_TO_READ_ARCHIVE, archive.display(), e),
        };
        log_failure(&failure);
        upload_error(&key, failure)
    })?;

    let content_type = detect_content_type(&body).to_string();
    let sha256 = sha256_hex(&body);
    let size = body.len() as u64;

    info!(
        "Uploading {} ({} bytes, {}) to s3://{}/{}",
        archive.display(),
        size,
        content_type,
        bucket,
        key
    );
    info!("Archive sha256: {}", sha256);

    let mut metadata = HashMap::new();
    metadata.insert(METADATA_VERSION_KEY.to_string(), VERSION.to_string());

    let object = UploadObject {
        bucket: bucket.to_string(),
        key: key.clone(),
        body,
        content_type: content_type.clone(),
        metadata,
    };

    let start = Instant::now();
    store.put_object(object).await.map_err(|failure| {
        log_failure(&failure);
        upload_error(&key, failure)
    })?;
    let elapsed = start.elapsed();

    let throughput = if elapsed.as_secs() > 0 {
        size / elapsed.as_secs()
    } else {
        size
    };
    debug!("Upload throughput {} KB/s", throughput / 1024);
    info!("Uploaded s3://{}/{} in {:?}", bucket, key, elapsed);

    Ok(UploadReceipt {
        bucket: bucket.to_string(),
        key,
        size,
        content_type,
        sha256,
        elapsed,
    })
}

fn log_failure(failure: &UploadFailure) {
    match failure {
        UploadFailure::Client { message } => {
            warn!("S3 client error: {}", message);
        }
        UploadFailure::Service {
            code,
            message,
            status,
            request_id,
        } => {
            error!(
                "S3 service error: code={} message={} status={} request_id={}",
                code,
                message,
                status.map_or_else(|| "unknown".to_string(), |s| s.to_string()),
                request_id.as_deref().unwrap_or("unknown")
            );
        }
    }
}
