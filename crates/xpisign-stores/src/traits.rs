//! Store boundary traits

use std::path::Path;

use crate::error::Result;
use crate::types::{InvocationResponse, ObjectLocation, SigningRequest};

/// Trait for the blob store used as the hand-off medium with the signer
///
/// Uploads are at-least-once: re-uploading the same key overwrites the
/// object, so retries by the caller are idempotent.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Write an object, overwriting any existing one at the same location
    async fn put_object(&self, location: &ObjectLocation, body: Vec<u8>) -> Result<()>;

    /// Read an object's bytes
    async fn get_object(&self, location: &ObjectLocation) -> Result<Vec<u8>>;

    /// Download an object to a local file
    async fn download_object(&self, location: &ObjectLocation, dest: &Path) -> Result<()>;
}

/// Trait for invoking the remote signing function
#[async_trait::async_trait]
pub trait SignerInvoker: Send + Sync {
    /// Invoke the named function with the request as the sole payload.
    ///
    /// The call is synchronous from the caller's point of view; no local
    /// timeout is enforced beyond what the invocation layer provides.
    async fn invoke(
        &self,
        function_name: &str,
        request: &SigningRequest,
    ) -> Result<InvocationResponse>;
}
