//! Bugzilla REST client

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde_json::json;
use tracing::debug;

use crate::error::{BugzillaError, Result};
use crate::types::{Attachment, Flag, User};

const DEFAULT_API_BASE: &str = "https://bugzilla.mozilla.org/rest";

/// Client for the Bugzilla REST API
///
/// When an API key is supplied every request carries it in the
/// `X-BUGZILLA-API-KEY` header.
pub struct BugzillaClient {
    api_base: String,
    client: Client,
}

impl BugzillaClient {
    /// Build a client against the default Bugzilla instance
    pub fn new(api_key: Option<&str>) -> Result<Self> {
        Self::with_api_base(DEFAULT_API_BASE, api_key)
    }

    /// Build a client against a specific API base URL
    pub fn with_api_base(api_base: &str, api_key: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            headers.insert("X-BUGZILLA-API-KEY", HeaderValue::from_str(key)?);
        }

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Issue a request and decode the body, surfacing in-band API errors.
    ///
    /// Bugzilla can report errors with `"error": true` in a 200 body, so
    /// both the HTTP status and the decoded body are checked.
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.api_base, endpoint);
        debug!(%method, %url, "bugzilla request");

        let mut request = self.client.request(method, &url).query(params);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?.error_for_status()?;
        let data: serde_json::Value = response.json().await?;

        if data.get("error").and_then(|v| v.as_bool()).unwrap_or(false) {
            return Err(BugzillaError::Api(data.to_string()));
        }
        Ok(data)
    }

    /// List a bug's attachments, without their data payloads
    pub async fn attachments(&self, bug: &str) -> Result<Vec<Attachment>> {
        let data = self
            .request(
                Method::GET,
                &format!("/bug/{}/attachment", bug),
                &[("exclude_fields", "data")],
                None,
            )
            .await?;

        let listing = data
            .get("bugs")
            .and_then(|bugs| bugs.get(bug))
            .cloned()
            .ok_or_else(|| {
                BugzillaError::UnexpectedResponse(format!("no attachment listing for bug {}", bug))
            })?;
        Ok(serde_json::from_value(listing)?)
    }

    /// Fetch and decode one attachment's data payload
    pub async fn attachment_data(&self, attachment_id: u64) -> Result<Vec<u8>> {
        let data = self
            .request(
                Method::GET,
                &format!("/bug/attachment/{}", attachment_id),
                &[("include_fields", "data")],
                None,
            )
            .await?;

        let id = attachment_id.to_string();
        let encoded = data
            .get("attachments")
            .and_then(|a| a.get(id.as_str()))
            .and_then(|a| a.get("data"))
            .and_then(|d| d.as_str())
            .ok_or_else(|| {
                BugzillaError::UnexpectedResponse(format!(
                    "no data for attachment {}",
                    attachment_id
                ))
            })?;
        Ok(BASE64.decode(encoded)?)
    }

    /// Create a new attachment on a bug
    pub async fn create_attachment(
        &self,
        bug: &str,
        bytes: &[u8],
        file_name: &str,
        summary: &str,
        content_type: &str,
    ) -> Result<()> {
        let body = json!({
            "ids": [bug],
            "data": BASE64.encode(bytes),
            "file_name": file_name,
            "summary": summary,
            "content_type": content_type,
        });

        self.request(
            Method::POST,
            &format!("/bug/{}/attachment", bug),
            &[],
            Some(body),
        )
        .await?;
        Ok(())
    }

    /// Fetch a bug's flags
    pub async fn flags(&self, bug: &str) -> Result<Vec<Flag>> {
        let data = self
            .request(
                Method::GET,
                &format!("/bug/{}", bug),
                &[("include_fields", "flags")],
                None,
            )
            .await?;

        let flags = data
            .get("bugs")
            .and_then(|bugs| bugs.get(0))
            .and_then(|bug| bug.get("flags"))
            .cloned()
            .ok_or_else(|| {
                BugzillaError::UnexpectedResponse(format!("no flags for bug {}", bug))
            })?;
        Ok(serde_json::from_value(flags)?)
    }

    /// Transition a flag to the cleared state
    pub async fn clear_flag(&self, bug: &str, flag_id: u64) -> Result<()> {
        let body = json!({ "flags": [{ "id": flag_id, "status": "X" }] });
        self.request(Method::PUT, &format!("/bug/{}", bug), &[], Some(body))
            .await?;
        Ok(())
    }

    /// Fetch the current user's identity
    pub async fn whoami(&self) -> Result<User> {
        let data = self.request(Method::GET, "/whoami", &[], None).await?;
        Ok(serde_json::from_value(data)?)
    }
}
