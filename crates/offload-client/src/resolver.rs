//! Output retrieval strategy.
//!
//! The server classifies each output by name; the classification decides
//! where the bytes land locally and whether any retrieval happens at all.

use std::path::{Path, PathBuf};

use offload_core::{ClientError, ClientResult, OutputKind};

/// Concrete retrieval decision for one output.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum OutputRoute {
    /// Output was already materialized locally as a side effect of the job
    /// sharing the filesystem; nothing to retrieve.
    InPlace,
    /// Retrieve the output into `target` using the reported `kind`.
    Retrieve {
        /// Classification to echo back in the download request.
        kind: OutputKind,
        /// Local path the bytes must end up at.
        target: PathBuf,
    },
}

/// Map a server-reported classification to a retrieval route.
///
/// `work_dir` never appears here: working-directory outputs are fetched
/// through the dedicated call with a caller-supplied target, so a server
/// reporting it for a regular output is out of contract.
pub(crate) fn resolve(
    label: &str,
    path: &Path,
    working_directory: &Path,
) -> ClientResult<OutputRoute> {
    match OutputKind::parse(label) {
        Some(OutputKind::None) => {
            if path.exists() {
                Ok(OutputRoute::InPlace)
            } else {
                Err(ClientError::OutputNotFound {
                    path: path.to_path_buf(),
                })
            }
        }
        Some(OutputKind::Direct) => Ok(OutputRoute::Retrieve {
            kind: OutputKind::Direct,
            target: path.to_path_buf(),
        }),
        Some(OutputKind::Task) => {
            let name = path.file_name().map_or_else(PathBuf::new, PathBuf::from);
            Ok(OutputRoute::Retrieve {
                kind: OutputKind::Task,
                target: working_directory.join(name),
            })
        }
        Some(OutputKind::WorkDir) | None => Err(ClientError::UnknownOutputType {
            value: label.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn direct_targets_the_requested_path() -> Result<()> {
        let route = resolve("direct", Path::new("/data/out.txt"), Path::new("/work"))?;
        assert_eq!(
            route,
            OutputRoute::Retrieve {
                kind: OutputKind::Direct,
                target: PathBuf::from("/data/out.txt"),
            }
        );
        Ok(())
    }

    #[test]
    fn task_targets_the_working_directory_by_base_name() -> Result<()> {
        let route = resolve("task", Path::new("/data/deep/out.txt"), Path::new("/work"))?;
        assert_eq!(
            route,
            OutputRoute::Retrieve {
                kind: OutputKind::Task,
                target: PathBuf::from("/work/out.txt"),
            }
        );
        Ok(())
    }

    #[test]
    fn none_requires_the_local_file_to_exist() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let present = dir.path().join("made-by-job.txt");
        std::fs::write(&present, "side effect")?;

        assert_eq!(
            resolve("none", &present, dir.path())?,
            OutputRoute::InPlace
        );

        let missing = dir.path().join("never-made.txt");
        let result = resolve("none", &missing, dir.path());
        assert!(matches!(
            result,
            Err(ClientError::OutputNotFound { path }) if path == missing
        ));
        Ok(())
    }

    #[test]
    fn unrecognized_labels_are_fatal() {
        let result = resolve("mysterious", Path::new("/data/out.txt"), Path::new("/work"));
        assert!(matches!(
            result,
            Err(ClientError::UnknownOutputType { value }) if value == "mysterious"
        ));
    }

    #[test]
    fn work_dir_is_out_of_contract_for_regular_outputs() {
        let result = resolve("work_dir", Path::new("/data/out.txt"), Path::new("/work"));
        assert!(matches!(
            result,
            Err(ClientError::UnknownOutputType { .. })
        ));
    }
}
