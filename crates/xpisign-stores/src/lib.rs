//! Blob store and signing function clients for xpisign
//!
//! This crate owns the boundary to the remote signing infrastructure: a
//! blob store where packages are handed off and a remote function that
//! signs them. The boundary is expressed as two traits ([`BlobStore`] and
//! [`SignerInvoker`]) so the signing workflow can be driven against mocks;
//! the production implementation ([`aws::AwsBackend`]) talks to S3 and
//! Lambda.
//!
//! ## Usage
//!
//! ```ignore
//! use xpisign_stores::{aws::AwsBackend, SigningRequest};
//!
//! let backend = AwsBackend::connect(Some("my-profile")).await?;
//! let response = backend.invoke("addons-sign-xpi-system-addon-production", &request).await?;
//! ```

pub mod aws;
pub mod error;
pub mod traits;
pub mod types;

pub use error::StoreError;
pub use traits::{BlobStore, SignerInvoker};
pub use types::{
    classify_response, InvocationResponse, ObjectLocation, SigningRequest, SigningResult,
};
