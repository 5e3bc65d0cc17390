//! Scripted fake transports for exercising the client without a server.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use offload_core::{Transport, TransportError};

/// One recorded transport invocation.
#[derive(Debug, Clone)]
pub struct TransportCall {
    /// Command name that was dispatched.
    pub command: String,
    /// Argument map as supplied by the client.
    pub args: BTreeMap<String, String>,
    /// Inline payload, when one was sent.
    pub payload: Option<String>,
    /// Local file streamed as the request body, when one was sent.
    pub input_path: Option<PathBuf>,
    /// Local file the response was streamed into, when requested.
    pub output_path: Option<PathBuf>,
}

enum Scripted {
    Response(String),
    Failure(String),
}

/// In-memory transport driven by per-command response scripts.
///
/// Responses queued with [`enqueue`](Self::enqueue) are consumed in order;
/// once a queue is drained the command falls back to its default response,
/// and a command with neither scripted nor default response is rejected.
/// When the client supplies an output path, the response body is also
/// written to that file, mimicking a streamed download.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    defaults: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<TransportCall>>,
}

impl ScriptedTransport {
    /// Create an empty transport; every command is rejected until scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one successful response for `command`.
    ///
    /// # Panics
    ///
    /// Panics if the script mutex has been poisoned.
    pub fn enqueue(&self, command: &str, response: &str) {
        self.scripts
            .lock()
            .expect("script mutex poisoned")
            .entry(command.to_string())
            .or_default()
            .push_back(Scripted::Response(response.to_string()));
    }

    /// Queue one failure for `command`.
    ///
    /// # Panics
    ///
    /// Panics if the script mutex has been poisoned.
    pub fn enqueue_failure(&self, command: &str, detail: &str) {
        self.scripts
            .lock()
            .expect("script mutex poisoned")
            .entry(command.to_string())
            .or_default()
            .push_back(Scripted::Failure(detail.to_string()));
    }

    /// Set the response returned whenever `command`'s queue is empty.
    ///
    /// # Panics
    ///
    /// Panics if the defaults mutex has been poisoned.
    pub fn set_default(&self, command: &str, response: &str) {
        self.defaults
            .lock()
            .expect("defaults mutex poisoned")
            .insert(command.to_string(), response.to_string());
    }

    /// Snapshot of every call made so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex has been poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().expect("call log mutex poisoned").clone()
    }

    /// Number of calls recorded for `command`.
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex has been poisoned.
    #[must_use]
    pub fn call_count(&self, command: &str) -> usize {
        self.calls
            .lock()
            .expect("call log mutex poisoned")
            .iter()
            .filter(|call| call.command == command)
            .count()
    }

    fn next_scripted(&self, command: &str) -> Option<Scripted> {
        self.scripts
            .lock()
            .expect("script mutex poisoned")
            .get_mut(command)
            .and_then(VecDeque::pop_front)
    }

    fn default_for(&self, command: &str) -> Option<String> {
        self.defaults
            .lock()
            .expect("defaults mutex poisoned")
            .get(command)
            .cloned()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(
        &self,
        command: &str,
        args: &BTreeMap<String, String>,
        payload: Option<&str>,
        input_path: Option<&Path>,
        output_path: Option<&Path>,
    ) -> Result<String, TransportError> {
        self.calls
            .lock()
            .expect("call log mutex poisoned")
            .push(TransportCall {
                command: command.to_string(),
                args: args.clone(),
                payload: payload.map(ToString::to_string),
                input_path: input_path.map(Path::to_path_buf),
                output_path: output_path.map(Path::to_path_buf),
            });

        let response = match self.next_scripted(command) {
            Some(Scripted::Response(body)) => body,
            Some(Scripted::Failure(detail)) => {
                return Err(TransportError::Rejected {
                    command: command.to_string(),
                    detail,
                });
            }
            None => match self.default_for(command) {
                Some(body) => body,
                None => {
                    return Err(TransportError::Rejected {
                        command: command.to_string(),
                        detail: "no scripted response".to_string(),
                    });
                }
            },
        };

        if let Some(target) = output_path {
            tokio::fs::write(target, &response)
                .await
                .map_err(|source| TransportError::Io {
                    command: command.to_string(),
                    source,
                })?;
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn scripted_responses_are_consumed_in_order() -> Result<()> {
        let transport = ScriptedTransport::new();
        transport.enqueue("check_complete", r#"{"complete": "false"}"#);
        transport.enqueue("check_complete", r#"{"complete": "true"}"#);

        let args = BTreeMap::new();
        let first = transport
            .execute("check_complete", &args, None, None, None)
            .await?;
        let second = transport
            .execute("check_complete", &args, None, None, None)
            .await?;
        assert!(first.contains("false"));
        assert!(second.contains("true"));
        assert_eq!(transport.call_count("check_complete"), 2);
        Ok(())
    }

    #[tokio::test]
    async fn unscripted_commands_are_rejected() {
        let transport = ScriptedTransport::new();
        let args = BTreeMap::new();
        let result = transport.execute("launch", &args, None, None, None).await;
        assert!(matches!(result, Err(TransportError::Rejected { .. })));
    }

    #[tokio::test]
    async fn defaults_back_drained_queues() -> Result<()> {
        let transport = ScriptedTransport::new();
        transport.set_default("file_available", r#"{"ready": false}"#);

        let args = BTreeMap::new();
        for _ in 0..3 {
            let body = transport
                .execute("file_available", &args, None, None, None)
                .await?;
            assert!(body.contains("false"));
        }
        Ok(())
    }

    #[tokio::test]
    async fn output_path_receives_the_response_body() -> Result<()> {
        let transport = ScriptedTransport::new();
        transport.enqueue("download_output", "payload-bytes");

        let dir = tempfile::tempdir()?;
        let target = dir.path().join("out.dat");
        let args = BTreeMap::new();
        transport
            .execute("download_output", &args, None, None, Some(&target))
            .await?;

        assert_eq!(std::fs::read_to_string(&target)?, "payload-bytes");
        Ok(())
    }
}
