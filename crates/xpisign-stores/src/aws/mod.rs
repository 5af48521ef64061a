//! AWS implementation of the store boundary
//!
//! S3 is the blob store, Lambda the invocation layer. Credentials and
//! region come from the standard AWS configuration chain, optionally
//! scoped to a named profile.

use std::path::Path;

use aws_sdk_lambda::primitives::Blob;
use aws_sdk_s3::primitives::ByteStream;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::traits::{BlobStore, SignerInvoker};
use crate::types::{InvocationResponse, ObjectLocation, SigningRequest};

/// S3 + Lambda backend
pub struct AwsBackend {
    s3: aws_sdk_s3::Client,
    lambda: aws_sdk_lambda::Client,
}

impl AwsBackend {
    /// Resolve AWS configuration and build the S3 and Lambda clients.
    ///
    /// Fails with [`StoreError::NoRegionConfigured`] when no region can be
    /// resolved, before any network call is made.
    pub async fn connect(profile: Option<&str>) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(name) = profile {
            debug!(profile = name, "using named AWS profile");
            loader = loader.profile_name(name);
        }
        let config = loader.load().await;

        if config.region().is_none() {
            return Err(StoreError::NoRegionConfigured);
        }

        Ok(Self {
            s3: aws_sdk_s3::Client::new(&config),
            lambda: aws_sdk_lambda::Client::new(&config),
        })
    }
}

#[async_trait::async_trait]
impl BlobStore for AwsBackend {
    async fn put_object(&self, location: &ObjectLocation, body: Vec<u8>) -> Result<()> {
        info!(bucket = %location.bucket, key = %location.key, bytes = body.len(), "uploading object");
        self.s3
            .put_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| StoreError::UploadFailed(err.to_string()))?;
        Ok(())
    }

    async fn get_object(&self, location: &ObjectLocation) -> Result<Vec<u8>> {
        debug!(bucket = %location.bucket, key = %location.key, "fetching object");
        let output = self
            .s3
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|err| StoreError::DownloadFailed(err.to_string()))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|err| StoreError::DownloadFailed(err.to_string()))?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn download_object(&self, location: &ObjectLocation, dest: &Path) -> Result<()> {
        let bytes = self.get_object(location).await?;
        std::fs::write(dest, bytes)?;
        info!(dest = %dest.display(), "downloaded object");
        Ok(())
    }
}

#[async_trait::async_trait]
impl SignerInvoker for AwsBackend {
    async fn invoke(
        &self,
        function_name: &str,
        request: &SigningRequest,
    ) -> Result<InvocationResponse> {
        let payload = serde_json::to_vec(request)?;
        info!(function = function_name, "invoking signing function");

        let output = self
            .lambda
            .invoke()
            .function_name(function_name)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|err| StoreError::InvocationFailed(err.to_string()))?;

        Ok(InvocationResponse {
            status_code: output.status_code(),
            function_error: output.function_error().map(String::from),
            payload: output
                .payload()
                .map(|blob| blob.as_ref().to_vec())
                .unwrap_or_default(),
        })
    }
}
