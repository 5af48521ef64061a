//! Bugzilla REST client for xpisign
//!
//! A thin client over the Bugzilla REST API covering the endpoints the
//! signing workflow needs: listing and fetching bug attachments, creating
//! new attachments, and reading/updating bug flags for the needinfo flow.

pub mod client;
pub mod error;
pub mod types;

pub use client::BugzillaClient;
pub use error::BugzillaError;
pub use types::{filter_candidates, find_own_needinfo, Attachment, Flag, User, XPI_CONTENT_TYPE};
