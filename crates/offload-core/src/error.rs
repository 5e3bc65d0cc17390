//! Error taxonomy for job staging and output retrieval.
//!
//! # Design
//!
//! - Constant messages; context travels in structured fields.
//! - Source errors are preserved rather than interpolated into messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::transport::TransportError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors produced by the job protocol client and the transfer coordinator.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The response body was not valid structured data.
    #[error("malformed response from remote command")]
    MalformedResponse {
        /// Command whose response failed to decode.
        command: &'static str,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// Request parameters could not be serialized.
    #[error("request parameters could not be serialized")]
    MalformedRequest {
        /// Command being prepared.
        command: &'static str,
        /// Underlying encode error.
        #[source]
        source: serde_json::Error,
    },
    /// A `none`-classified output was not found on the local filesystem.
    #[error("no output found for path")]
    OutputNotFound {
        /// Missing local path.
        path: PathBuf,
    },
    /// The server reported an output classification the client does not know.
    #[error("unknown output type reported by server")]
    UnknownOutputType {
        /// The unrecognized classification value.
        value: String,
    },
    /// An in-flight transfer for the named input failed; no partial success
    /// is observed by any waiter.
    #[error("failed to transfer input file")]
    TransferFailed {
        /// Local path whose transfer failed.
        path: PathBuf,
    },
    /// The transport reported a failure executing a command.
    #[error("remote command failed")]
    Transport {
        /// Command that failed.
        command: &'static str,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },
    /// Local filesystem failure while staging or retrieving content.
    #[error("local io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The caller's cancellation token fired inside a blocking wait.
    #[error("operation cancelled")]
    Cancelled,
}
