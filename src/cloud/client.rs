use std::sync::Arc;

use anyhow::{Context, Result};
use log::warn;
use rusoto_core::{HttpClient, Region};
use rusoto_credential::ChainProvider;
use rusoto_s3::S3Client;

/// Parse `region_name`, falling back to the default region when it is not a known AWS region
pub fn resolve_region(region_name: &str) -> Region {
    match region_name.parse::<Region>() {
        Ok(region) => region,
        Err(_) => {
            warn!("Invalid region '{}', using default", region_name);
            Region::default()
        }
    }
}

/// Create an S3 client for `region` using the ambient AWS credential chain
pub fn create_s3_client(region: Region) -> Result<Arc<S3Client>> {
    let http_client = HttpClient::new().context("Failed to create HTTP client")?;
    Ok(Arc::new(S3Client::new_with(
        http_client,
        ChainProvider::new(),
        region,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_region_known() {
        assert_eq!(resolve_region("us-east-1"), Region::UsEast1);
        assert_eq!(resolve_region("eu-west-1").name(), "eu-west-1");
    }

    #[test]
    fn test_resolve_region_invalid_falls_back() {
        assert_eq!(resolve_region("mars-north-1").name(), Region::default().name());
    }
}
