//! Transport-agnostic interfaces and DTOs for the offload job staging client.
//!
//! Layout: `model.rs` (wire vocabulary and typed payloads), `transport.rs`
//! (the remote command execution seam), `error.rs` (client error taxonomy).

pub mod error;
pub mod model;
pub mod transport;

pub use error::{ClientError, ClientResult};
pub use model::{
    CacheAvailability, CompletionReport, FileAction, InputKind, JobId, JobStatus, OutputKind,
    StagedFile,
};
pub use transport::{Transport, TransportError};

pub use tokio_util::sync::CancellationToken;
