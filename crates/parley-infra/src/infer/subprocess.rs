//! Subprocess inference bridge.
//!
//! Implements [`InferenceBridge`] by starting one external process per call
//! with the prompt as its sole positional argument. The process's stdout
//! must carry exactly one JSON object on success:
//!
//! - `{"response": "<text>"}` -- the reply, returned verbatim.
//! - `{"error": "<text>"}` -- a failure produced inside the generator.
//!
//! stderr is captured for diagnostics only and never parsed for the result.
//! A non-zero exit code wins over anything on stdout. Outcomes are
//! classified in priority order: spawn failure, process failure, protocol
//! failure, model error, success. A bounded wait kills hung processes and
//! surfaces a distinct timeout kind.
//!
//! No retry, no pooling: each call is an independent invocation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use parley_core::infer::InferenceBridge;
use parley_types::error::InferenceError;
use serde::Deserialize;
use tracing::debug;

use crate::config::InferenceConfig;

/// Wire shape of the generator's stdout on exit 0.
#[derive(Debug, Deserialize)]
struct GenerateOutput {
    response: Option<String>,
    error: Option<String>,
}

/// Inference bridge spawning one external process per call.
#[derive(Debug, Clone)]
pub struct SubprocessBridge {
    command: String,
    script: PathBuf,
    timeout: Duration,
}

impl SubprocessBridge {
    /// Create a bridge running `command script <prompt>` with a bounded wait.
    pub fn new(command: impl Into<String>, script: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            script: script.into(),
            timeout,
        }
    }

    /// Create a bridge from the loaded inference configuration.
    pub fn from_config(config: &InferenceConfig) -> Self {
        Self::new(
            &config.command,
            &config.script,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// The directory the process runs in: the script's parent, so the
    /// generator can resolve its model files relatively.
    fn working_dir(&self) -> &Path {
        self.script.parent().unwrap_or_else(|| Path::new("."))
    }
}

impl InferenceBridge for SubprocessBridge {
    async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let child = tokio::process::Command::new(&self.command)
            .arg(&self.script)
            .arg(prompt)
            .current_dir(self.working_dir())
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            // Dropping the wait future (timeout, caller disconnect) must
            // not leave the generator running.
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| InferenceError::Spawn(e.to_string()))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| InferenceError::Timeout {
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| InferenceError::Spawn(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(InferenceError::Process {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        if !output.stderr.is_empty() {
            debug!(
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Inference process diagnostics"
            );
        }

        let parsed: GenerateOutput =
            serde_json::from_slice(&output.stdout).map_err(|_| InferenceError::Protocol {
                output: String::from_utf8_lossy(&output.stdout).to_string(),
            })?;

        if let Some(error) = parsed.error {
            return Err(InferenceError::Model(error));
        }

        match parsed.response {
            Some(response) => Ok(response),
            None => Err(InferenceError::Protocol {
                output: String::from_utf8_lossy(&output.stdout).to_string(),
            }),
        }
    }
}
