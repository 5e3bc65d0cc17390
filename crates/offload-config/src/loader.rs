//! Destination construction from parameter maps and JSON files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use offload_core::FileAction;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{DEFAULT_FILE_ACTION_KEY, DestinationConfig, FILE_ACTION_CONFIG_KEY};

impl DestinationConfig {
    /// Build a destination from an in-memory parameter map.
    ///
    /// Unknown keys are retained untouched; only `default_file_action` is
    /// validated, defaulting to `transfer` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFileAction`] when `default_file_action`
    /// carries a value outside `transfer`/`copy`.
    pub fn from_params(params: BTreeMap<String, String>) -> ConfigResult<Self> {
        let default_file_action = match params.get(DEFAULT_FILE_ACTION_KEY) {
            Some(value) => {
                FileAction::parse(value).ok_or_else(|| ConfigError::InvalidFileAction {
                    value: value.clone(),
                })?
            }
            None => FileAction::default(),
        };
        let file_action_config = params.get(FILE_ACTION_CONFIG_KEY).map(PathBuf::from);

        Ok(Self::new(params, default_file_action, file_action_config))
    }

    /// Load a destination from a JSON file containing a flat string map.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read,
    /// [`ConfigError::Json`] when it is not a flat JSON string map, and
    /// [`ConfigError::InvalidFileAction`] for a bad `default_file_action`.
    pub fn from_json_file(path: &Path) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let params: BTreeMap<String, String> =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_params(params)
    }
}
