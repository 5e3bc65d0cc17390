//! Local filesystem staging primitives.

use std::path::Path;

use offload_core::{ClientError, ClientResult};

/// Copy bytes between two locally visible paths.
///
/// Both ends are normalised to absolute paths first; when they coincide the
/// copy degenerates to a no-op, which is the expected case for shared
/// filesystems where the remote staging directory is mounted locally.
pub(crate) async fn copy_local(from: &Path, to: &Path) -> ClientResult<()> {
    let from = std::path::absolute(from).map_err(|source| ClientError::Io {
        operation: "absolutize",
        path: from.to_path_buf(),
        source,
    })?;
    let to = std::path::absolute(to).map_err(|source| ClientError::Io {
        operation: "absolutize",
        path: to.to_path_buf(),
        source,
    })?;
    if from == to {
        return Ok(());
    }

    tokio::fs::copy(&from, &to)
        .await
        .map_err(|source| ClientError::Io {
            operation: "copy",
            path: from,
            source,
        })?;
    Ok(())
}
