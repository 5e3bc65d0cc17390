//! Typed destination model.
//!
//! # Design
//! - Pure data carrier; construction and file IO live in `loader.rs`.
//! - The parameter map stays opaque beyond the two named keys and the
//!   `submit_` prefix convention.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use offload_core::FileAction;

/// Parameter key naming the default file action for the destination.
pub(crate) const DEFAULT_FILE_ACTION_KEY: &str = "default_file_action";
/// Parameter key pointing at a per-path file action configuration file.
pub(crate) const FILE_ACTION_CONFIG_KEY: &str = "file_action_config";
/// Prefix marking parameters forwarded to the server at launch time.
const SUBMIT_PARAM_PREFIX: &str = "submit_";

/// One remote destination: connection parameters plus staging defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationConfig {
    params: BTreeMap<String, String>,
    default_file_action: FileAction,
    file_action_config: Option<PathBuf>,
}

impl DestinationConfig {
    pub(crate) const fn new(
        params: BTreeMap<String, String>,
        default_file_action: FileAction,
        file_action_config: Option<PathBuf>,
    ) -> Self {
        Self {
            params,
            default_file_action,
            file_action_config,
        }
    }

    /// File action applied when a staging call does not name one.
    #[must_use]
    pub const fn default_file_action(&self) -> FileAction {
        self.default_file_action
    }

    /// Optional path to a per-path file action configuration file.
    #[must_use]
    pub fn file_action_config(&self) -> Option<&Path> {
        self.file_action_config.as_deref()
    }

    /// Look up a raw destination parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Submission parameters for `launch`: every parameter whose key starts
    /// with `submit_`, with the prefix stripped. Other keys are ignored.
    #[must_use]
    pub fn submit_params(&self) -> BTreeMap<String, String> {
        self.params
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(SUBMIT_PARAM_PREFIX)
                    .map(|name| (name.to_string(), value.clone()))
            })
            .collect()
    }
}
