//! Job client that routes input uploads through the transfer cache.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use offload_client::{JobClient, codec};
use offload_core::{
    CacheAvailability, CancellationToken, ClientError, ClientResult, FileAction, InputKind,
    StagedFile,
};

use crate::coordinator::{TransferCoordinator, TransferRole};

/// Seam between the coordinator and whatever performs cache transfers.
///
/// Split out so the coordinator can be exercised without a full protocol
/// client behind it.
#[async_trait]
pub trait CacheTransfer: Send + Sync {
    /// Whether the remote cache still needs `path`'s content.
    async fn cache_required(&self, path: &Path) -> ClientResult<bool>;

    /// Move `path`'s content into the remote cache.
    async fn cache_insert(&self, path: &Path) -> ClientResult<()>;

    /// Remote availability of `path`'s content.
    async fn file_available(&self, path: &Path) -> ClientResult<CacheAvailability>;
}

/// [`JobClient`] specialisation that deduplicates input transfers.
///
/// Only the `transfer` branch of `put_file` changes: instead of uploading
/// directly, content goes through the shared [`TransferCoordinator`] so that
/// jobs staging the same file share one physical transfer. Everything else
/// is reachable through [`inner`](Self::inner).
#[derive(Clone)]
pub struct CachingJobClient {
    inner: JobClient,
    coordinator: Arc<TransferCoordinator>,
}

impl CachingJobClient {
    /// Wrap a protocol client with a shared transfer coordinator.
    #[must_use]
    pub const fn new(inner: JobClient, coordinator: Arc<TransferCoordinator>) -> Self {
        Self { inner, coordinator }
    }

    /// The wrapped protocol client, for all non-staging operations.
    #[must_use]
    pub const fn inner(&self) -> &JobClient {
        &self.inner
    }

    /// Stage one input file, deduplicating the transfer across jobs.
    ///
    /// Inline `contents` bypass the cache entirely (the content is already
    /// in hand, so there is nothing to deduplicate), as does the `copy`
    /// action, which never moves bytes over the transport. For everything
    /// else: register interest with the coordinator, let the owner check the
    /// remote cache and queue the transfer when required, then poll until
    /// the content is available and register the upload with its cache
    /// token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::TransferFailed`] when the shared transfer
    /// fails, [`ClientError::Cancelled`] when `cancel` fires during the
    /// availability wait, and any transport/decode error otherwise.
    pub async fn put_file(
        &self,
        path: &Path,
        kind: InputKind,
        name: Option<&str>,
        contents: Option<&str>,
        action: Option<FileAction>,
        cancel: &CancellationToken,
    ) -> ClientResult<StagedFile> {
        let action = action.unwrap_or_else(|| self.inner.destination().default_file_action());
        if contents.is_some() || action == FileAction::Copy {
            return self
                .inner
                .put_file(path, kind, name, contents, Some(action))
                .await;
        }

        let name = name.map_or_else(|| base_name(path), ToOwned::to_owned);
        let (slot, role) = self.coordinator.acquire(path);
        if role == TransferRole::Owner {
            // The registry entry is retired by whichever party resolves it:
            // the queued transfer task once the insert settles, or the owner
            // right here when no transfer ever starts. Waiters never retire
            // it, so a cancelled waiter cannot strand or poison the key.
            match self.cache_required(path).await {
                Ok(true) => self.coordinator.queue_transfer(self.clone(), path),
                Ok(false) => {
                    debug!(path = %path.display(), "input already present in remote cache");
                    self.coordinator.release(path);
                }
                Err(err) => {
                    slot.mark_failed();
                    self.coordinator.release(path);
                    return Err(err);
                }
            }
        }

        let token = self
            .coordinator
            .await_ready(self, path, &slot, cancel)
            .await?;

        self.inner
            .upload_file(&name, kind, None, None, Some(&token))
            .await
    }

    async fn execute_cache(
        &self,
        command: &'static str,
        path: &Path,
        input_path: Option<&Path>,
    ) -> ClientResult<String> {
        let mut args = BTreeMap::new();
        args.insert("path".to_string(), path.display().to_string());
        self.inner
            .transport()
            .execute(command, &args, None, input_path, None)
            .await
            .map_err(|source| ClientError::Transport { command, source })
    }
}

#[async_trait]
impl CacheTransfer for CachingJobClient {
    async fn cache_required(&self, path: &Path) -> ClientResult<bool> {
        let raw = self.execute_cache("cache_required", path, None).await?;
        codec::decode("cache_required", &raw)
    }

    async fn cache_insert(&self, path: &Path) -> ClientResult<()> {
        let raw = self.execute_cache("cache_insert", path, Some(path)).await?;
        let _: serde_json::Value = codec::decode("cache_insert", &raw)?;
        Ok(())
    }

    async fn file_available(&self, path: &Path) -> ClientResult<CacheAvailability> {
        let raw = self.execute_cache("file_available", path, None).await?;
        codec::decode("file_available", &raw)
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(String::new, |name| name.to_string_lossy().into_owned())
}
