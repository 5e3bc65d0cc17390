//! Low-level protocol client for one remote job.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};

use offload_config::DestinationConfig;
use offload_core::{
    CancellationToken, ClientError, ClientResult, CompletionReport, FileAction, InputKind, JobId,
    JobStatus, OutputKind, StagedFile, Transport,
};

use crate::codec;
use crate::fs::copy_local;
use crate::resolver::{self, OutputRoute};
use crate::retry::RetryPolicy;

/// Cadence of completion polls inside [`JobClient::wait`].
const WAIT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Client for the lifecycle of one remote job.
///
/// Every operation forwards to the transport with an argument set keyed by
/// the job identifier. The client is immutable after construction and holds
/// no staging state beyond a single call, so it can be cloned cheaply and
/// shared across tasks.
#[derive(Clone)]
pub struct JobClient {
    transport: Arc<dyn Transport>,
    destination: DestinationConfig,
    job_id: JobId,
    retry: RetryPolicy,
}

impl JobClient {
    /// Build a client for `job_id` against the given destination.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        destination: DestinationConfig,
        job_id: JobId,
    ) -> Self {
        Self {
            transport,
            destination,
            job_id,
            retry: RetryPolicy::default(),
        }
    }

    /// Identifier of the job this client drives.
    #[must_use]
    pub const fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Destination configuration the client was built with.
    #[must_use]
    pub const fn destination(&self) -> &DestinationConfig {
        &self.destination
    }

    /// Transport handle, for callers layering extra commands on the same
    /// connection (the caching client uses this for the cache surface).
    #[must_use]
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    fn base_args(&self) -> BTreeMap<String, String> {
        let mut args = BTreeMap::new();
        args.insert("job_id".to_string(), self.job_id.as_str().to_string());
        args
    }

    async fn execute(
        &self,
        command: &'static str,
        args: BTreeMap<String, String>,
        payload: Option<&str>,
        input_path: Option<&Path>,
        output_path: Option<&Path>,
    ) -> ClientResult<String> {
        self.transport
            .execute(command, &args, payload, input_path, output_path)
            .await
            .map_err(|source| ClientError::Transport { command, source })
    }

    /// Ask the remote side where an input of `kind` should live.
    ///
    /// Only meaningful for the `copy` file action, where both sides see the
    /// same filesystem and the client moves the bytes itself.
    ///
    /// # Errors
    ///
    /// Returns a transport or decode error from the `input_path` command.
    pub async fn stage_input_path(
        &self,
        path: &Path,
        kind: InputKind,
        name: Option<&str>,
    ) -> ClientResult<String> {
        let name = name.map_or_else(|| base_name(path), ToOwned::to_owned);
        let mut args = self.base_args();
        args.insert("name".to_string(), name);
        args.insert("input_type".to_string(), kind.wire_name().to_string());
        let raw = self.execute("input_path", args, None, None, None).await?;
        codec::decode("input_path", &raw)
    }

    /// Stage one input file for the job.
    ///
    /// `name` defaults to the file's base name and `action` to the
    /// destination default. With [`FileAction::Copy`] the remote-visible
    /// path is queried and the bytes are copied locally; with
    /// [`FileAction::Transfer`] the kind-specific upload command moves them
    /// over the transport. Inline `contents`, when given, are sent as the
    /// payload and the local file is never read.
    ///
    /// # Errors
    ///
    /// Returns transport, decode, or local IO errors from the staging path.
    pub async fn put_file(
        &self,
        path: &Path,
        kind: InputKind,
        name: Option<&str>,
        contents: Option<&str>,
        action: Option<FileAction>,
    ) -> ClientResult<StagedFile> {
        let action = action.unwrap_or_else(|| self.destination.default_file_action());
        let name = name.map_or_else(|| base_name(path), ToOwned::to_owned);
        match action {
            FileAction::Copy => {
                let remote = self.stage_input_path(path, kind, Some(&name)).await?;
                copy_local(path, Path::new(&remote)).await?;
                Ok(StagedFile { path: remote })
            }
            FileAction::Transfer => {
                let input_path = if contents.is_some() { None } else { Some(path) };
                self.upload_file(&name, kind, contents, input_path, None)
                    .await
            }
        }
    }

    /// Dispatch one upload through the kind-specific command.
    ///
    /// The command name already encodes the input type, so `input_type`
    /// stays out of the argument set. `cache_token` registers content that
    /// the transfer cache already holds instead of re-sending it.
    ///
    /// # Errors
    ///
    /// Returns a transport or decode error from the upload command.
    pub async fn upload_file(
        &self,
        name: &str,
        kind: InputKind,
        contents: Option<&str>,
        input_path: Option<&Path>,
        cache_token: Option<&str>,
    ) -> ClientResult<StagedFile> {
        let mut args = self.base_args();
        args.insert("name".to_string(), name.to_string());
        if let Some(token) = cache_token {
            args.insert("cache_token".to_string(), token.to_string());
        }
        let command = kind.upload_command();
        let raw = self
            .execute(command, args, contents, input_path, None)
            .await?;
        codec::decode(command, &raw)
    }

    /// Submit the command line for execution or queuing.
    ///
    /// Destination submission parameters (`submit_`-prefixed) ride along as
    /// structured text in the `params` field when any are configured.
    ///
    /// # Errors
    ///
    /// Returns a transport error from the `launch` command, or a request
    /// encoding error for unserialisable submission parameters.
    pub async fn launch(&self, command_line: &str) -> ClientResult<()> {
        let mut args = self.base_args();
        args.insert("command_line".to_string(), command_line.to_string());
        let submit = self.destination.submit_params();
        if !submit.is_empty() {
            let params =
                serde_json::to_string(&submit).map_err(|source| ClientError::MalformedRequest {
                    command: "launch",
                    source,
                })?;
            args.insert("params".to_string(), params);
        }
        self.execute("launch", args, None, None, None).await?;
        Ok(())
    }

    /// Cancel the remote job, removing it from the queue or killing it.
    ///
    /// Idempotent on the server: killing an already-finished job succeeds.
    ///
    /// # Errors
    ///
    /// Returns a transport error from the `kill` command.
    pub async fn kill(&self) -> ClientResult<()> {
        self.execute("kill", self.base_args(), None, None, None)
            .await?;
        Ok(())
    }

    /// Best-effort remote cleanup. Fire and forget: failures are logged and
    /// swallowed, and the response is never inspected.
    pub async fn clean(&self) {
        if let Err(err) = self.execute("clean", self.base_args(), None, None, None).await {
            debug!(job_id = %self.job_id, error = %err, "remote cleanup failed");
        }
    }

    /// Announce which tool and version this job will run.
    ///
    /// Either field is omitted from the request when absent.
    ///
    /// # Errors
    ///
    /// Returns a transport or decode error from the `setup` command.
    pub async fn setup(
        &self,
        tool_id: Option<&str>,
        tool_version: Option<&str>,
    ) -> ClientResult<Value> {
        let mut args = self.base_args();
        if let Some(tool_id) = tool_id {
            args.insert("tool_id".to_string(), tool_id.to_string());
        }
        if let Some(tool_version) = tool_version {
            args.insert("tool_version".to_string(), tool_version.to_string());
        }
        let raw = self.execute("setup", args, None, None, None).await?;
        codec::decode("setup", &raw)
    }

    /// Poll remote completion state once.
    ///
    /// # Errors
    ///
    /// Returns a transport or decode error from the `check_complete` command.
    pub async fn raw_check_complete(&self) -> ClientResult<CompletionReport> {
        let raw = self
            .execute("check_complete", self.base_args(), None, None, None)
            .await?;
        codec::decode("check_complete", &raw)
    }

    /// Whether the job has finished.
    ///
    /// Pass a previously fetched report to avoid a redundant round trip.
    ///
    /// # Errors
    ///
    /// Returns a transport or decode error when a fresh poll is needed.
    pub async fn check_complete(&self, report: Option<&CompletionReport>) -> ClientResult<bool> {
        match report {
            Some(report) => Ok(report.is_complete()),
            None => Ok(self.raw_check_complete().await?.is_complete()),
        }
    }

    /// Coarse job status, retried per the client retry policy.
    ///
    /// Servers predating the `status` field, and a known server bug that
    /// reports an out-of-range value, both fall back to a status derived
    /// from the completion flag.
    ///
    /// # Errors
    ///
    /// Returns the final poll failure once the retry bound is exhausted.
    pub async fn get_status(&self) -> ClientResult<JobStatus> {
        self.retry.run("get_status", || self.fetch_status()).await
    }

    async fn fetch_status(&self) -> ClientResult<JobStatus> {
        let report = self.raw_check_complete().await?;
        let derived = if report.is_complete() {
            JobStatus::Complete
        } else {
            JobStatus::Running
        };
        let status = match report.status.as_deref() {
            Some(value) => JobStatus::parse(value).unwrap_or_else(|| {
                warn!(job_id = %self.job_id, status = %value, "ignoring invalid status from server");
                derived
            }),
            None => derived,
        };
        Ok(status)
    }

    /// Block until the job finishes, polling once per second.
    ///
    /// There is no upper bound on the wait; the caller's `cancel` token is
    /// the only way out of an unbounded poll.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Cancelled`] when `cancel` fires, or a
    /// transport/decode error from an individual poll.
    pub async fn wait(&self, cancel: &CancellationToken) -> ClientResult<CompletionReport> {
        loop {
            let report = self.raw_check_complete().await?;
            if report.is_complete() {
                return Ok(report);
            }
            tokio::select! {
                () = cancel.cancelled() => return Err(ClientError::Cancelled),
                () = sleep(WAIT_POLL_INTERVAL) => {}
            }
        }
    }

    /// Retrieve one job output to its local destination.
    ///
    /// The server classifies the output by base name; the classification
    /// decides the local target (see the resolver) and `action` decides how
    /// the bytes move. Downloads are retried per the client retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::OutputNotFound`] for a missing `none`-type
    /// output, [`ClientError::UnknownOutputType`] for an unrecognized
    /// classification, and transport/decode/IO errors from retrieval.
    pub async fn fetch_output(
        &self,
        path: &Path,
        working_directory: &Path,
        action: Option<FileAction>,
    ) -> ClientResult<()> {
        let name = base_name(path);
        let label = self.get_output_type(&name).await?;
        let route = resolver::resolve(&label, path, working_directory)?;
        let OutputRoute::Retrieve { kind, target } = route else {
            debug!(job_id = %self.job_id, path = %path.display(), "output already in place");
            return Ok(());
        };
        self.populate_output(
            &name,
            kind,
            &target,
            action.unwrap_or_else(|| self.destination.default_file_action()),
        )
        .await
    }

    /// Retrieve a working-directory-relative output into `output_path`.
    ///
    /// Bypasses the output classification entirely: the kind is always
    /// `work_dir` and the target is always the caller-supplied path.
    ///
    /// # Errors
    ///
    /// Returns transport/decode/IO errors from retrieval.
    pub async fn fetch_work_dir_output(
        &self,
        source: &Path,
        working_directory: &Path,
        output_path: &Path,
        action: Option<FileAction>,
    ) -> ClientResult<()> {
        let name = base_name(&working_directory.join(source));
        self.populate_output(
            &name,
            OutputKind::WorkDir,
            output_path,
            action.unwrap_or_else(|| self.destination.default_file_action()),
        )
        .await
    }

    async fn get_output_type(&self, name: &str) -> ClientResult<String> {
        let mut args = self.base_args();
        args.insert("name".to_string(), name.to_string());
        let raw = self
            .execute("get_output_type", args, None, None, None)
            .await?;
        codec::decode("get_output_type", &raw)
    }

    async fn populate_output(
        &self,
        name: &str,
        kind: OutputKind,
        target: &Path,
        action: FileAction,
    ) -> ClientResult<()> {
        match action {
            FileAction::Transfer => {
                self.retry
                    .run("download_output", || {
                        self.raw_download_output(name, kind, target)
                    })
                    .await
            }
            FileAction::Copy => {
                let staged = self.query_output_path(name, kind).await?;
                copy_local(Path::new(&staged.path), target).await
            }
        }
    }

    async fn query_output_path(&self, name: &str, kind: OutputKind) -> ClientResult<StagedFile> {
        let mut args = self.base_args();
        args.insert("name".to_string(), name.to_string());
        args.insert("output_type".to_string(), kind.wire_name().to_string());
        let raw = self.execute("output_path", args, None, None, None).await?;
        codec::decode("output_path", &raw)
    }

    async fn raw_download_output(
        &self,
        name: &str,
        kind: OutputKind,
        target: &Path,
    ) -> ClientResult<()> {
        let mut args = self.base_args();
        args.insert("name".to_string(), name.to_string());
        args.insert("output_type".to_string(), kind.wire_name().to_string());
        self.execute("download_output", args, None, None, Some(target))
            .await?;
        Ok(())
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(String::new, |name| name.to_string_lossy().into_owned())
}
