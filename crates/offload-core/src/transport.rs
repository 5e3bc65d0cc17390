//! Execution seam for remote job manager commands.
//!
//! The client never inspects transport framing; it supplies a command name,
//! an argument map, and optional payload/stream paths, and consumes the raw
//! response body. Implementations are expected to be already authenticated.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by transport implementations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The remote endpoint refused or could not service the command.
    #[error("remote rejected command")]
    Rejected {
        /// Command that was refused.
        command: String,
        /// Server-supplied detail, when available.
        detail: String,
    },
    /// IO failure while moving the request or response.
    #[error("transport io failure")]
    Io {
        /// Command in flight when the failure occurred.
        command: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Any other implementation-specific failure.
    #[error("transport failure")]
    Other {
        /// Command in flight when the failure occurred.
        command: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Executes named commands against the remote job manager.
///
/// `payload` carries inline request content; `input_path` streams a local
/// file as the request body; `output_path` streams the response body into a
/// local file. At most one of `payload`/`input_path` is supplied per call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `command` with the supplied arguments and return the raw
    /// response body.
    async fn execute(
        &self,
        command: &str,
        args: &BTreeMap<String, String>,
        payload: Option<&str>,
        input_path: Option<&Path>,
        output_path: Option<&Path>,
    ) -> Result<String, TransportError>;
}
