//! Configuration loading for Parley.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` in production)
//! and deserializes the `[inference]` section into [`InferenceConfig`].
//! Falls back to defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default bounded wait on one inference invocation, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Settings for the subprocess inference bridge.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Interpreter used to run the generation script.
    pub command: String,
    /// Path to the generation script. Relative paths resolve against the
    /// data directory.
    pub script: PathBuf,
    /// Seconds to wait for one invocation before killing the process.
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            command: "python3".to_string(),
            script: PathBuf::from("generate.py"),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    inference: InferenceConfig,
}

/// Resolve the Parley data directory.
///
/// `PARLEY_DATA_DIR` wins; otherwise `~/.parley`.
pub fn resolve_data_dir() -> PathBuf {
    match std::env::var("PARLEY_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".parley")
        }
    }
}

/// Load the inference configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`InferenceConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the
///   default.
///
/// A relative script path is resolved against the data directory, so a bare
/// `script = "generate.py"` points at `{data_dir}/generate.py`.
pub async fn load_inference_config(data_dir: &Path) -> InferenceConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return resolve_script(InferenceConfig::default(), data_dir);
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return resolve_script(InferenceConfig::default(), data_dir);
        }
    };

    let config = match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => file.inference,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            InferenceConfig::default()
        }
    };

    resolve_script(config, data_dir)
}

fn resolve_script(mut config: InferenceConfig, data_dir: &Path) -> InferenceConfig {
    if config.script.is_relative() {
        config.script = data_dir.join(&config.script);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_inference_config(tmp.path()).await;
        assert_eq!(config.command, "python3");
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.script, tmp.path().join("generate.py"));
    }

    #[tokio::test]
    async fn valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[inference]
command = "python"
script = "/opt/model/generate.py"
timeout_secs = 30
"#,
        )
        .await
        .unwrap();

        let config = load_inference_config(tmp.path()).await;
        assert_eq!(config.command, "python");
        assert_eq!(config.script, PathBuf::from("/opt/model/generate.py"));
        assert_eq!(config.timeout_secs, 30);
    }

    #[tokio::test]
    async fn malformed_toml_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "not [valid toml")
            .await
            .unwrap();

        let config = load_inference_config(tmp.path()).await;
        assert_eq!(config.command, "python3");
    }

    #[tokio::test]
    async fn relative_script_resolves_against_data_dir() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[inference]
script = "models/run.py"
"#,
        )
        .await
        .unwrap();

        let config = load_inference_config(tmp.path()).await;
        assert_eq!(config.script, tmp.path().join("models/run.py"));
    }
}
