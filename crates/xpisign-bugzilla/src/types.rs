//! Bugzilla resource types and candidate filtering

use serde::Deserialize;
use tracing::debug;

/// Content type Bugzilla uses for installable extension packages
pub const XPI_CONTENT_TYPE: &str = "application/x-xpinstall";

/// Content types accepted as signable attachments
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[XPI_CONTENT_TYPE, "application/zip"];

/// A bug attachment as returned by `GET /bug/{id}/attachment`
///
/// The `data` field is excluded from listings and fetched separately.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    pub id: u64,
    pub summary: String,
    pub creator: String,
    pub file_name: String,
    pub content_type: String,
    #[serde(default)]
    pub is_obsolete: u8,
}

/// A bug flag as returned by `GET /bug/{id}?include_fields=flags`
#[derive(Debug, Clone, Deserialize)]
pub struct Flag {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub setter: String,
    #[serde(default)]
    pub requestee: Option<String>,
}

/// The current user as returned by `GET /whoami`
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
}

/// Filter a bug's attachments down to signable candidates.
///
/// Keeps attachments whose content type is in the allow-list (plus any
/// caller-supplied extras), dropping obsolete ones unless asked not to.
/// The tracker's own listing order is preserved.
pub fn filter_candidates<'a>(
    attachments: &'a [Attachment],
    include_obsolete: bool,
    extra_content_types: &[String],
) -> Vec<&'a Attachment> {
    attachments
        .iter()
        .filter(|a| {
            if a.is_obsolete != 0 && !include_obsolete {
                debug!(summary = %a.summary, "excluding obsolete attachment");
                return false;
            }
            let allowed = ALLOWED_CONTENT_TYPES.contains(&a.content_type.as_str())
                || extra_content_types.iter().any(|t| t == &a.content_type);
            if !allowed {
                debug!(
                    summary = %a.summary,
                    content_type = %a.content_type,
                    "excluding non-extension attachment"
                );
            }
            allowed
        })
        .collect()
}

/// Find the first pending needinfo flag addressed to the given user.
///
/// Ties are broken by the tracker's own flag ordering; at most one flag
/// is ever cleared per invocation.
pub fn find_own_needinfo<'a>(flags: &'a [Flag], user: &str) -> Option<&'a Flag> {
    flags
        .iter()
        .find(|f| f.name == "needinfo" && f.status == "?" && f.requestee.as_deref() == Some(user))
}
