//! The signing state machine
//!
//! Linear with branch points: Loaded -> TypeConfirmed ->
//! EnvironmentConfirmed -> Uploaded -> Invoked -> ResultClassified ->
//! {Downloaded | FetchedForAttach | Printed}. Aborting a confirmation
//! step surfaces as [`WorkflowError::Aborted`]. Network calls are never
//! retried; an object uploaded before a later failure is left in place.

use std::path::{Path, PathBuf};

use tracing::info;

use xpisign_stores::{
    classify_response, BlobStore, ObjectLocation, SignerInvoker, SigningRequest, SigningResult,
};

use crate::error::{WorkflowError, XpiError};
use crate::prompt::{Prompter, MAX_PROMPT_ATTEMPTS};
use crate::xpi::Xpi;

use super::{AddonType, Environment};

/// Caller intent for one run of the workflow
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    /// Addon type; invalid or absent values are elicited interactively
    pub addon_type: Option<String>,

    /// Environment; absent means production
    pub environment: Option<String>,

    /// Explicit input bucket, overriding the environment-derived one
    pub bucket_name: Option<String>,

    /// Destination path; absent means the package's suggested filename
    pub dest: Option<PathBuf>,

    /// Bug to attach the signed package to instead of downloading
    pub attach_bug: Option<String>,

    /// Render signer stack traces on failure
    pub verbose: bool,
}

/// Terminal outcome of a successful run
#[derive(Debug)]
pub enum SignOutcome {
    /// The signed package was written to `dest`
    Downloaded { dest: PathBuf },

    /// The signed bytes were fetched for the bug attachment flow
    FetchedForAttach {
        bug: String,
        bytes: Vec<u8>,
        filename: String,
    },

    /// Nothing was written; the structured result is handed back
    Printed { payload: serde_json::Value },
}

/// The signing workflow, generic over its collaborators
pub struct SignWorkflow<'a> {
    store: &'a dyn BlobStore,
    invoker: &'a dyn SignerInvoker,
    prompter: &'a mut dyn Prompter,
}

impl<'a> SignWorkflow<'a> {
    pub fn new(
        store: &'a dyn BlobStore,
        invoker: &'a dyn SignerInvoker,
        prompter: &'a mut dyn Prompter,
    ) -> Self {
        Self {
            store,
            invoker,
            prompter,
        }
    }

    /// Run the workflow over the package at `src`
    pub async fn run(
        &mut self,
        src: &Path,
        options: &SignOptions,
    ) -> Result<SignOutcome, WorkflowError> {
        let xpi = Xpi::open(src)?;
        let dest = options
            .dest
            .clone()
            .unwrap_or_else(|| PathBuf::from(xpi.suggested_filename(true)));

        if xpi.is_signed() {
            self.prompter.warn("XPI file is already signed.");
            if !self
                .prompter
                .confirm("Are you sure you want to sign this file?", false)?
            {
                return Err(WorkflowError::Aborted);
            }
        }

        let addon_type = self.resolve_addon_type(options.addon_type.as_deref())?;
        let environment = self.resolve_environment(options.environment.as_deref())?;

        let key = src
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| XpiError::NotFound(src.to_path_buf()))?;
        let bucket = options
            .bucket_name
            .clone()
            .unwrap_or_else(|| environment.default_bucket());
        let source = ObjectLocation { bucket, key };

        let body = std::fs::read(xpi.path())?;
        self.store.put_object(&source, body).await?;

        let request = SigningRequest {
            checksum: xpi.sha256()?,
            source,
        };
        let function = format!("addons-sign-xpi-{}-{}", addon_type, environment);
        let response = self.invoker.invoke(&function, &request).await?;

        let (uploaded, payload) = match classify_response(&response) {
            SigningResult::Success { uploaded, payload } => (uploaded, payload),
            SigningResult::Failure {
                error_type,
                error_message,
                stack_trace,
            } => {
                // The signer's typed error is verbose-only; without it the
                // failure stays a single generic line. The missing-uploaded
                // fallback is not an invocation error and always renders.
                let detail = if response.is_error() && !options.verbose {
                    "re-run with --verbose for details".to_string()
                } else {
                    let mut detail = String::new();
                    if options.verbose {
                        if let Some(trace) = &stack_trace {
                            detail.push_str(&render_stack_trace(trace));
                        }
                    }
                    detail.push_str(&error_type);
                    if let Some(message) = error_message {
                        detail.push_str(": ");
                        detail.push_str(&message);
                    }
                    detail
                };
                return Err(WorkflowError::RemoteInvocationFailure(detail));
            }
            SigningResult::Malformed { raw } => {
                return Err(WorkflowError::MalformedResponse(
                    String::from_utf8_lossy(&raw).into_owned(),
                ));
            }
        };
        info!(bucket = %uploaded.bucket, key = %uploaded.key, "package signed");

        if let Some(bug) = &options.attach_bug {
            let bytes = self.store.get_object(&uploaded).await?;
            let filename = dest
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| xpi.suggested_filename(true));
            return Ok(SignOutcome::FetchedForAttach {
                bug: bug.clone(),
                bytes,
                filename,
            });
        }

        self.resolve_download(dest, uploaded, payload).await
    }

    /// Download the signed package, never silently overwriting.
    ///
    /// An existing destination triggers an overwrite/alternate-path loop;
    /// declining both falls back to printing the structured result.
    async fn resolve_download(
        &mut self,
        mut dest: PathBuf,
        uploaded: ObjectLocation,
        payload: serde_json::Value,
    ) -> Result<SignOutcome, WorkflowError> {
        let mut should_download = true;
        let mut attempts = 0;

        while should_download && dest.exists() {
            attempts += 1;
            if attempts > MAX_PROMPT_ATTEMPTS {
                return Err(WorkflowError::DestinationConflict(dest));
            }

            self.prompter
                .warn(&format!("`{}` already exists.", dest.display()));
            should_download = self
                .prompter
                .confirm("Do you want to overwrite this file?", false)?;
            if !should_download
                && self
                    .prompter
                    .confirm("Would you like to pick another destination?", true)?
            {
                dest = PathBuf::from(self.prompter.input("Choose another destination path")?);
                should_download = true;
            }
        }

        if should_download {
            self.store.download_object(&uploaded, &dest).await?;
            Ok(SignOutcome::Downloaded { dest })
        } else {
            Ok(SignOutcome::Printed { payload })
        }
    }

    fn resolve_addon_type(&mut self, supplied: Option<&str>) -> Result<AddonType, WorkflowError> {
        if let Some(raw) = supplied {
            if let Ok(kind) = raw.parse() {
                return Ok(kind);
            }
            self.prompter.warn("You did not provide a valid addon type.");
        }

        let items: Vec<String> = AddonType::ALL.iter().map(|t| t.to_string()).collect();
        for _ in 0..MAX_PROMPT_ATTEMPTS {
            let index = self.prompter.select("Addon Type", &items, None)?;
            if let Some(kind) = AddonType::ALL.get(index) {
                return Ok(*kind);
            }
            self.prompter.warn("That is not one of the listed choices.");
        }
        Err(WorkflowError::InvalidSelection("addon type".to_string()))
    }

    fn resolve_environment(&mut self, supplied: Option<&str>) -> Result<Environment, WorkflowError> {
        let Some(raw) = supplied else {
            return Ok(Environment::default());
        };
        if let Ok(env) = raw.parse() {
            return Ok(env);
        }
        self.prompter.warn("You did not provide a valid environment.");

        let items: Vec<String> = Environment::ALL.iter().map(|e| e.to_string()).collect();
        for _ in 0..MAX_PROMPT_ATTEMPTS {
            let index = self.prompter.select("Environment", &items, Some(0))?;
            if let Some(env) = Environment::ALL.get(index) {
                return Ok(*env);
            }
            self.prompter.warn("That is not one of the listed choices.");
        }
        Err(WorkflowError::InvalidSelection("environment".to_string()))
    }
}

fn render_stack_trace(trace: &serde_json::Value) -> String {
    let mut out = String::new();
    if let Some(frames) = trace.as_array() {
        for frame in frames {
            out.push_str(&frame.to_string());
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    use xpisign_stores::InvocationResponse;

    fn write_xpi(dir: &Path, name: &str, signed: bool) -> PathBuf {
        let manifest = serde_json::json!({
            "manifest_version": 2,
            "version": "1.0.0",
            "applications": { "gecko": { "id": "empty@mozilla.com" } },
        })
        .to_string();

        let path = dir.join(name);
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("manifest.json", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(manifest.as_bytes()).unwrap();
        if signed {
            writer
                .start_file("META-INF/mozilla.rsa", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"\x30\x82fake-der").unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[derive(Default)]
    struct MockStore {
        puts: AtomicUsize,
        gets: AtomicUsize,
        downloads: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl BlobStore for MockStore {
        async fn put_object(
            &self,
            _location: &ObjectLocation,
            _body: Vec<u8>,
        ) -> xpisign_stores::error::Result<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn get_object(
            &self,
            _location: &ObjectLocation,
        ) -> xpisign_stores::error::Result<Vec<u8>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            Ok(b"signed-bytes".to_vec())
        }

        async fn download_object(
            &self,
            _location: &ObjectLocation,
            dest: &Path,
        ) -> xpisign_stores::error::Result<()> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            std::fs::write(dest, b"signed-bytes")?;
            Ok(())
        }
    }

    struct MockInvoker {
        response: InvocationResponse,
        invoked_function: Mutex<Option<String>>,
    }

    impl MockInvoker {
        fn success() -> Self {
            Self::with_payload(
                200,
                None,
                r#"{"uploaded": {"bucket": "out-bucket", "key": "empty-signed.xpi"}}"#,
            )
        }

        fn with_payload(status: i32, function_error: Option<&str>, payload: &str) -> Self {
            Self {
                response: InvocationResponse {
                    status_code: status,
                    function_error: function_error.map(String::from),
                    payload: payload.as_bytes().to_vec(),
                },
                invoked_function: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl SignerInvoker for MockInvoker {
        async fn invoke(
            &self,
            function_name: &str,
            _request: &SigningRequest,
        ) -> xpisign_stores::error::Result<InvocationResponse> {
            *self.invoked_function.lock().unwrap() = Some(function_name.to_string());
            Ok(self.response.clone())
        }
    }

    #[derive(Default)]
    struct ScriptedPrompter {
        confirms: VecDeque<bool>,
        selects: VecDeque<usize>,
        inputs: VecDeque<String>,
        warnings: Vec<String>,
    }

    impl Prompter for ScriptedPrompter {
        fn confirm(&mut self, _message: &str, default: bool) -> Result<bool, WorkflowError> {
            Ok(self.confirms.pop_front().unwrap_or(default))
        }

        fn select(
            &mut self,
            _message: &str,
            _items: &[String],
            default: Option<usize>,
        ) -> Result<usize, WorkflowError> {
            self.selects
                .pop_front()
                .or(default)
                .ok_or_else(|| WorkflowError::InvalidSelection("no scripted selection".into()))
        }

        fn input(&mut self, _message: &str) -> Result<String, WorkflowError> {
            self.inputs
                .pop_front()
                .ok_or_else(|| WorkflowError::Prompt("no scripted input".into()))
        }

        fn warn(&mut self, message: &str) {
            self.warnings.push(message.to_string());
        }
    }

    fn options(dest: &Path) -> SignOptions {
        SignOptions {
            addon_type: Some("system-addon".to_string()),
            dest: Some(dest.to_path_buf()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_success_downloads_exactly_once() {
        let temp = TempDir::new().unwrap();
        let src = write_xpi(temp.path(), "empty.xpi", false);
        let dest = temp.path().join("empty-signed.xpi");

        let store = MockStore::default();
        let invoker = MockInvoker::success();
        let mut prompter = ScriptedPrompter::default();

        let outcome = SignWorkflow::new(&store, &invoker, &mut prompter)
            .run(&src, &options(&dest))
            .await
            .unwrap();

        match outcome {
            SignOutcome::Downloaded { dest: written } => assert_eq!(written, dest),
            other => panic!("expected download, got {:?}", other),
        }
        assert_eq!(store.puts.load(Ordering::SeqCst), 1);
        assert_eq!(store.downloads.load(Ordering::SeqCst), 1);
        assert_eq!(store.gets.load(Ordering::SeqCst), 0);
        assert_eq!(
            invoker.invoked_function.lock().unwrap().as_deref(),
            Some("addons-sign-xpi-system-addon-production")
        );
    }

    #[tokio::test]
    async fn test_failure_marker_performs_no_output_calls() {
        let temp = TempDir::new().unwrap();
        let src = write_xpi(temp.path(), "empty.xpi", false);
        let dest = temp.path().join("empty-signed.xpi");

        let store = MockStore::default();
        let invoker = MockInvoker::with_payload(
            200,
            Some("Unhandled"),
            r#"{"errorType": "ChecksumMatchError", "errorMessage": "mismatch"}"#,
        );
        let mut prompter = ScriptedPrompter::default();

        let mut opts = options(&dest);
        opts.verbose = true;

        let err = SignWorkflow::new(&store, &invoker, &mut prompter)
            .run(&src, &opts)
            .await
            .unwrap_err();

        match err {
            WorkflowError::RemoteInvocationFailure(detail) => {
                assert!(detail.contains("ChecksumMatchError: mismatch"));
            }
            other => panic!("expected invocation failure, got {:?}", other),
        }
        assert_eq!(store.downloads.load(Ordering::SeqCst), 0);
        assert_eq!(store.gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_typed_error_detail_is_verbose_only() {
        let temp = TempDir::new().unwrap();
        let src = write_xpi(temp.path(), "empty.xpi", false);
        let dest = temp.path().join("empty-signed.xpi");

        let store = MockStore::default();
        let invoker = MockInvoker::with_payload(
            200,
            Some("Unhandled"),
            r#"{"errorType": "ChecksumMatchError", "errorMessage": "mismatch", "stackTrace": ["frame"]}"#,
        );
        let mut prompter = ScriptedPrompter::default();

        let err = SignWorkflow::new(&store, &invoker, &mut prompter)
            .run(&src, &options(&dest))
            .await
            .unwrap_err();

        match err {
            WorkflowError::RemoteInvocationFailure(detail) => {
                assert!(!detail.contains("ChecksumMatchError"));
                assert!(!detail.contains("mismatch"));
                assert!(!detail.contains("frame"));
            }
            other => panic!("expected invocation failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_response_is_terminal() {
        let temp = TempDir::new().unwrap();
        let src = write_xpi(temp.path(), "empty.xpi", false);
        let dest = temp.path().join("empty-signed.xpi");

        let store = MockStore::default();
        let invoker = MockInvoker::with_payload(200, None, "<html>oops</html>");
        let mut prompter = ScriptedPrompter::default();

        let err = SignWorkflow::new(&store, &invoker, &mut prompter)
            .run(&src, &options(&dest))
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::MalformedResponse(_)));
        assert_eq!(store.downloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_uploaded_descriptor_is_terminal() {
        let temp = TempDir::new().unwrap();
        let src = write_xpi(temp.path(), "empty.xpi", false);
        let dest = temp.path().join("empty-signed.xpi");

        let store = MockStore::default();
        let invoker = MockInvoker::with_payload(200, None, r#"{"status": "done"}"#);
        let mut prompter = ScriptedPrompter::default();

        let err = SignWorkflow::new(&store, &invoker, &mut prompter)
            .run(&src, &options(&dest))
            .await
            .unwrap_err();

        match err {
            WorkflowError::RemoteInvocationFailure(detail) => {
                assert!(detail.contains("Something went wrong"));
            }
            other => panic!("expected invocation failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signed_package_requires_confirmation() {
        let temp = TempDir::new().unwrap();
        let src = write_xpi(temp.path(), "presigned.xpi", true);
        let dest = temp.path().join("out.xpi");

        let store = MockStore::default();
        let invoker = MockInvoker::success();
        let mut prompter = ScriptedPrompter::default();
        prompter.confirms.push_back(false);

        let err = SignWorkflow::new(&store, &invoker, &mut prompter)
            .run(&src, &options(&dest))
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Aborted));
        assert_eq!(store.puts.load(Ordering::SeqCst), 0);
        assert!(prompter
            .warnings
            .iter()
            .any(|w| w.contains("already signed")));
    }

    #[tokio::test]
    async fn test_invalid_addon_type_is_re_elicited() {
        let temp = TempDir::new().unwrap();
        let src = write_xpi(temp.path(), "empty.xpi", false);
        let dest = temp.path().join("empty-signed.xpi");

        let store = MockStore::default();
        let invoker = MockInvoker::success();
        let mut prompter = ScriptedPrompter::default();
        prompter.selects.push_back(1); // generic-extension

        let mut opts = options(&dest);
        opts.addon_type = Some("mozillaextension".to_string());

        SignWorkflow::new(&store, &invoker, &mut prompter)
            .run(&src, &opts)
            .await
            .unwrap();

        assert_eq!(
            invoker.invoked_function.lock().unwrap().as_deref(),
            Some("addons-sign-xpi-generic-extension-production")
        );
        assert!(prompter
            .warnings
            .iter()
            .any(|w| w.contains("valid addon type")));
    }

    #[tokio::test]
    async fn test_out_of_range_selection_exhausts_bounded_loop() {
        let temp = TempDir::new().unwrap();
        let src = write_xpi(temp.path(), "empty.xpi", false);
        let dest = temp.path().join("empty-signed.xpi");

        let store = MockStore::default();
        let invoker = MockInvoker::success();
        let mut prompter = ScriptedPrompter::default();
        for _ in 0..MAX_PROMPT_ATTEMPTS {
            prompter.selects.push_back(99);
        }

        let mut opts = options(&dest);
        opts.addon_type = None;

        let err = SignWorkflow::new(&store, &invoker, &mut prompter)
            .run(&src, &opts)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::InvalidSelection(_)));
        assert_eq!(store.puts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_destination_conflict_resolved_by_alternate_path() {
        let temp = TempDir::new().unwrap();
        let src = write_xpi(temp.path(), "empty.xpi", false);
        let taken = temp.path().join("taken.xpi");
        std::fs::write(&taken, "already here").unwrap();
        let fresh = temp.path().join("fresh.xpi");

        let store = MockStore::default();
        let invoker = MockInvoker::success();
        let mut prompter = ScriptedPrompter::default();
        // Round 1: decline overwrite, pick another path that also exists.
        prompter.confirms.push_back(false);
        prompter.confirms.push_back(true);
        prompter.inputs.push_back(taken.display().to_string());
        // Round 2: decline overwrite again, pick a fresh path.
        prompter.confirms.push_back(false);
        prompter.confirms.push_back(true);
        prompter.inputs.push_back(fresh.display().to_string());

        let outcome = SignWorkflow::new(&store, &invoker, &mut prompter)
            .run(&src, &options(&taken))
            .await
            .unwrap();

        match outcome {
            SignOutcome::Downloaded { dest } => assert_eq!(dest, fresh),
            other => panic!("expected download, got {:?}", other),
        }
        assert_eq!(store.downloads.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read_to_string(&taken).unwrap(), "already here");
    }

    #[tokio::test]
    async fn test_declining_both_prompts_falls_back_to_print() {
        let temp = TempDir::new().unwrap();
        let src = write_xpi(temp.path(), "empty.xpi", false);
        let taken = temp.path().join("taken.xpi");
        std::fs::write(&taken, "already here").unwrap();

        let store = MockStore::default();
        let invoker = MockInvoker::success();
        let mut prompter = ScriptedPrompter::default();
        prompter.confirms.push_back(false); // no overwrite
        prompter.confirms.push_back(false); // no alternate path

        let outcome = SignWorkflow::new(&store, &invoker, &mut prompter)
            .run(&src, &options(&taken))
            .await
            .unwrap();

        match outcome {
            SignOutcome::Printed { payload } => {
                assert!(payload.get("uploaded").is_some());
            }
            other => panic!("expected print fallback, got {:?}", other),
        }
        assert_eq!(store.downloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_attach_mode_fetches_instead_of_downloading() {
        let temp = TempDir::new().unwrap();
        let src = write_xpi(temp.path(), "empty.xpi", false);
        let dest = temp.path().join("empty-signed.xpi");

        let store = MockStore::default();
        let invoker = MockInvoker::success();
        let mut prompter = ScriptedPrompter::default();

        let mut opts = options(&dest);
        opts.attach_bug = Some("1234567".to_string());

        let outcome = SignWorkflow::new(&store, &invoker, &mut prompter)
            .run(&src, &opts)
            .await
            .unwrap();

        match outcome {
            SignOutcome::FetchedForAttach {
                bug,
                bytes,
                filename,
            } => {
                assert_eq!(bug, "1234567");
                assert_eq!(bytes, b"signed-bytes");
                assert_eq!(filename, "empty-signed.xpi");
            }
            other => panic!("expected attach hand-off, got {:?}", other),
        }
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
        assert_eq!(store.downloads.load(Ordering::SeqCst), 0);
    }
}
