//! Package inspector
//!
//! Opens a zip-based addon archive, classifies it as a legacy bootstrapped
//! addon or a web extension, extracts identity metadata, detects an
//! existing signature, and computes the content digest of the original
//! archive bytes.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use tracing::debug;

use crate::error::XpiError;

/// Result type for package inspection
pub type Result<T> = std::result::Result<T, XpiError>;

/// Fixed archive path of the signature entry
pub const SIGNATURE_ENTRY: &str = "META-INF/mozilla.rsa";

const LEGACY_DESCRIPTOR: &str = "install.rdf";
const MANIFEST: &str = "manifest.json";

/// Addon package format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonKind {
    /// Legacy bootstrapped addon, described by an `install.rdf`
    BootstrappedAddon,
    /// Web extension, described by a `manifest.json`
    WebExtension,
}

/// An inspected addon package
///
/// Immutable after construction. The archive is fully extracted into a
/// scratch directory whose lifetime is tied to this value; the extracted
/// signature entry stays available for certificate inspection until the
/// descriptor is dropped.
#[derive(Debug)]
pub struct Xpi {
    path: PathBuf,
    kind: AddonKind,
    id: String,
    version: Option<String>,
    is_signed: bool,
    certificate_path: PathBuf,
    digest: OnceLock<String>,
    _scratch: TempDir,
}

impl Xpi {
    /// Inspect the archive at `path`.
    ///
    /// The extension id is required for both formats: a legacy descriptor
    /// without `em:id` or a web extension manifest without
    /// `applications.gecko.id` is rejected with [`XpiError::MissingId`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(XpiError::NotFound(path));
        }

        let scratch = TempDir::new()?;
        let file = std::fs::File::open(&path)?;
        let mut archive =
            zip::ZipArchive::new(file).map_err(|_| XpiError::CorruptArchive(path.clone()))?;
        archive
            .extract(scratch.path())
            .map_err(|_| XpiError::CorruptArchive(path.clone()))?;

        let certificate_path = scratch.path().join(SIGNATURE_ENTRY);
        let is_signed = certificate_path.is_file();

        let legacy_path = scratch.path().join(LEGACY_DESCRIPTOR);
        let manifest_path = scratch.path().join(MANIFEST);

        let (kind, id, version) = if legacy_path.is_file() {
            let descriptor = std::fs::read_to_string(&legacy_path)?;
            let id = rdf_field(&descriptor, "id").ok_or_else(|| XpiError::MissingId(path.clone()))?;
            (
                AddonKind::BootstrappedAddon,
                id,
                rdf_field(&descriptor, "version"),
            )
        } else if manifest_path.is_file() {
            let manifest: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(&manifest_path)?)?;
            let id = manifest
                .pointer("/applications/gecko/id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| XpiError::MissingId(path.clone()))?
                .to_string();
            let version = manifest
                .get("version")
                .and_then(|v| v.as_str())
                .map(String::from);
            (AddonKind::WebExtension, id, version)
        } else {
            return Err(XpiError::UnrecognizedFormat(path));
        };

        debug!(path = %path.display(), ?kind, id, is_signed, "inspected package");

        Ok(Self {
            path,
            kind,
            id,
            version,
            is_signed,
            certificate_path,
            digest: OnceLock::new(),
            _scratch: scratch,
        })
    }

    /// Location of the source archive
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Package format
    pub fn kind(&self) -> AddonKind {
        self.kind
    }

    /// Extension id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Extension version, when the metadata carries one
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// True iff the signature entry exists in the archive
    pub fn is_signed(&self) -> bool {
        self.is_signed
    }

    /// Path of the extracted signature entry
    ///
    /// Only meaningful while this descriptor is alive and
    /// [`is_signed`](Self::is_signed) is true.
    pub fn certificate_path(&self) -> &Path {
        &self.certificate_path
    }

    /// Hex-encoded SHA-256 of the original archive bytes.
    ///
    /// Computed over the archive file itself, never the extracted
    /// contents; memoized after the first call.
    pub fn sha256(&self) -> Result<String> {
        if let Some(hex) = self.digest.get() {
            return Ok(hex.clone());
        }
        let hex = sha256_hex(&self.path)?;
        Ok(self.digest.get_or_init(|| hex).clone())
    }

    /// Suggested output filename: `<id>[-<version>][-signed].xpi`.
    ///
    /// The `-signed` suffix is added when the package already carries a
    /// signature or when `mark_signed` is set.
    pub fn suggested_filename(&self, mark_signed: bool) -> String {
        let suffix = if self.is_signed || mark_signed {
            "-signed"
        } else {
            ""
        };
        match &self.version {
            Some(version) => format!("{}-{}{}.xpi", self.id, version, suffix),
            None => format!("{}{}.xpi", self.id, suffix),
        }
    }
}

/// Hex-encoded SHA-256 of a file's raw bytes
pub fn sha256_hex(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Pull a field's text content out of a legacy descriptor.
///
/// The descriptor is XML-like; the two fields of interest are plain text
/// element content, so a targeted regex beats a full XML parser here.
fn rdf_field(descriptor: &str, field: &str) -> Option<String> {
    let pattern = format!(r"<em:{0}>([^<]*)</em:{0}>", regex::escape(field));
    let re = Regex::new(&pattern).ok()?;
    re.captures(descriptor)
        .map(|caps| caps[1].trim().to_string())
        .filter(|value| !value.is_empty())
}
