//! Wire vocabulary and typed payloads shared across the client crates.
//!
//! The string values here are part of the remote command surface and must
//! match an unmodified server exactly.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque job identifier, stable for the lifetime of the owning client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wrap a server-assigned job identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// How an input reaches the remote side: moved over the transport, or copied
/// locally on the assumption of a shared filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    /// Move bytes over the transport.
    #[default]
    Transfer,
    /// Copy between paths visible to both sides.
    Copy,
}

impl FileAction {
    /// Parse the wire representation, returning `None` for unknown values.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "transfer" => Some(Self::Transfer),
            "copy" => Some(Self::Copy),
            _ => None,
        }
    }

    /// Wire representation of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Copy => "copy",
        }
    }
}

/// Classification of a staged input, which selects the upload command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// Primary input dataset.
    Input,
    /// Auxiliary file accompanying a primary input.
    InputExtra,
    /// Tool configuration file.
    Config,
    /// File placed in the job's working directory.
    WorkDir,
    /// Tool executable or wrapper script.
    Tool,
}

impl InputKind {
    /// Wire value carried in the `input_type` argument.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::InputExtra => "input_extra",
            Self::Config => "config",
            Self::WorkDir => "work_dir",
            Self::Tool => "tool",
        }
    }

    /// Kind-specific upload command. The command name encodes the input type,
    /// so dispatches through it omit the `input_type` argument.
    #[must_use]
    pub const fn upload_command(self) -> &'static str {
        match self {
            Self::Input => "upload_input",
            Self::InputExtra => "upload_extra_input",
            Self::Config => "upload_config_file",
            Self::WorkDir => "upload_working_directory_file",
            Self::Tool => "upload_tool_file",
        }
    }
}

/// Server-assigned classification of a job output, which selects the
/// retrieval strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Output already materialized locally; nothing to retrieve.
    None,
    /// Output's final location is the requested path itself.
    Direct,
    /// Output lives under the job working directory by base name.
    Task,
    /// Output addressed relative to the remote working directory.
    WorkDir,
}

impl OutputKind {
    /// Parse the wire representation, returning `None` for unknown values.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "direct" => Some(Self::Direct),
            "task" => Some(Self::Task),
            "work_dir" => Some(Self::WorkDir),
            _ => None,
        }
    }

    /// Wire value carried in the `output_type` argument.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Direct => "direct",
            Self::Task => "task",
            Self::WorkDir => "work_dir",
        }
    }
}

/// Coarse job state reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job finished, successfully or not.
    Complete,
    /// Job is executing.
    Running,
    /// Job is waiting for a slot.
    Queued,
}

impl JobStatus {
    /// Parse a server-reported status, returning `None` for anything outside
    /// the three valid values.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "complete" => Some(Self::Complete),
            "running" => Some(Self::Running),
            "queued" => Some(Self::Queued),
            _ => None,
        }
    }

    /// Wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Running => "running",
            Self::Queued => "queued",
        }
    }
}

/// Result of staging a single input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFile {
    /// Remote-visible path the input now occupies.
    pub path: String,
}

/// Decoded `check_complete` response.
///
/// `complete` is a literal string on the wire; older servers omit `status`
/// entirely, and some report values outside the valid set. Extra fields such
/// as `returncode`, `stdout` and `stderr` are passed through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionReport {
    /// Literal `"true"` once the job has finished.
    #[serde(default)]
    pub complete: Option<String>,
    /// Server-reported status, when the server supports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Any further fields the server attached to the response.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CompletionReport {
    /// Whether the job has finished. Only the literal string `"true"`
    /// counts; anything else, including an absent field, does not.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete.as_deref() == Some("true")
    }
}

/// Remote cache state for a transfer key. `token` is only meaningful when
/// `ready` is set and must accompany the subsequent upload registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheAvailability {
    /// Whether the cached content is ready for use.
    pub ready: bool,
    /// Token to attach to the upload registration call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}
