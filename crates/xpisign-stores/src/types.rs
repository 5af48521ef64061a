//! Wire types for the remote signing service

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Location of an object in the blob store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

/// Payload sent to the signing function
///
/// The checksum is the hex-encoded SHA-256 of the original archive bytes;
/// the signer verifies it against the uploaded object before signing.
#[derive(Debug, Clone, Serialize)]
pub struct SigningRequest {
    pub source: ObjectLocation,
    pub checksum: String,
}

/// Raw response from one invocation of the signing function
#[derive(Debug, Clone)]
pub struct InvocationResponse {
    /// HTTP-level status code reported by the invocation layer
    pub status_code: i32,

    /// Out-of-band failure marker set by the invocation layer
    pub function_error: Option<String>,

    /// Raw response body
    pub payload: Vec<u8>,
}

impl InvocationResponse {
    /// True when the invocation layer signalled a failure independent of
    /// the payload structure.
    pub fn is_error(&self) -> bool {
        self.status_code >= 300 || self.function_error.is_some()
    }
}

/// Classified result of a signing invocation
///
/// Decoded up front from the raw response; no untyped payload flows
/// past this point.
#[derive(Debug, Clone)]
pub enum SigningResult {
    /// The signer produced a signed package at the given location
    Success {
        uploaded: ObjectLocation,
        payload: serde_json::Value,
    },

    /// The signer reported a structured error
    Failure {
        error_type: String,
        error_message: Option<String>,
        stack_trace: Option<serde_json::Value>,
    },

    /// The response body could not be decoded
    Malformed { raw: Vec<u8> },
}

/// Classify a raw invocation response into a [`SigningResult`].
///
/// The body is parsed first: an undecodable body is `Malformed` even when
/// the invocation layer also reported a failure. An out-of-band failure
/// marker yields `Failure` with whatever typed fields the body carries.
/// Otherwise the response must name an `uploaded` location to count as
/// `Success`; a well-formed body with neither marker is a `Failure` too.
pub fn classify_response(response: &InvocationResponse) -> SigningResult {
    let data: serde_json::Value = match serde_json::from_slice(&response.payload) {
        Ok(value) => value,
        Err(err) => {
            debug!(%err, "undecodable signer response");
            return SigningResult::Malformed {
                raw: response.payload.clone(),
            };
        }
    };

    if response.is_error() {
        return SigningResult::Failure {
            error_type: data
                .get("errorType")
                .and_then(|v| v.as_str())
                .unwrap_or("No error type")
                .to_string(),
            error_message: data
                .get("errorMessage")
                .and_then(|v| v.as_str())
                .map(String::from),
            stack_trace: data.get("stackTrace").cloned(),
        };
    }

    let uploaded = data.get("uploaded").and_then(|value| {
        Some(ObjectLocation {
            bucket: value.get("bucket")?.as_str()?.to_string(),
            key: value.get("key")?.as_str()?.to_string(),
        })
    });

    match uploaded {
        Some(uploaded) => SigningResult::Success {
            uploaded,
            payload: data,
        },
        None => SigningResult::Failure {
            error_type: "Something went wrong".to_string(),
            error_message: Some("response did not include an uploaded location".to_string()),
            stack_trace: None,
        },
    }
}
