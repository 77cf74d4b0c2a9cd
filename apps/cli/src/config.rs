//! CLI configuration file support.
//!
//! Configuration precedence:
//! 1. CLI arguments (handled by clap)
//! 2. Local config file (./sadgpt.toml)
//! 3. Global config file (~/.sadgpt/config.toml)
//! 4. Defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Which model training service runs the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Local character-level bigram backend
    Bigram,
    /// External training program
    Process,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub base_model: Option<String>,
    #[serde(default)]
    pub tokenizer: Option<String>,
    #[serde(default)]
    pub epochs: Option<u32>,
    #[serde(default)]
    pub batch_size: Option<u32>,
    #[serde(default)]
    pub learning_rate: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub block_size: Option<usize>,
    #[serde(default)]
    pub loader_workers: Option<usize>,
    #[serde(default)]
    pub service: Option<ServiceKind>,
    /// Program and arguments for the `process` service.
    #[serde(default)]
    pub service_command: Option<Vec<String>>,
    #[serde(default)]
    pub log_level: Option<String>,
}

#[derive(Debug, Error)]
pub enum CliConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),
}

pub type CliConfigResult<T> = std::result::Result<T, CliConfigError>;

impl CliConfig {
    pub fn load_from_file(path: &Path) -> CliConfigResult<Self> {
        if !path.exists() {
            return Err(CliConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| CliConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content).map_err(|e| CliConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    pub fn default_global_path() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".sadgpt").join("config.toml")
    }

    pub fn default_local_path() -> PathBuf {
        PathBuf::from("sadgpt.toml")
    }

    /// Load global then local config; a file that fails to parse is reported
    /// and skipped.
    pub fn discover_and_load() -> Self {
        let mut config = Self::default();
        for path in [Self::default_global_path(), Self::default_local_path()] {
            match Self::load_from_file(&path) {
                Ok(found) => config.merge(found),
                Err(CliConfigError::NotFound(_)) => {}
                Err(e) => eprintln!("warning: {e}"),
            }
        }
        config
    }

    /// Values set in `other` override values in `self`.
    pub fn merge(&mut self, other: Self) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        take!(
            base_model,
            tokenizer,
            epochs,
            batch_size,
            learning_rate,
            seed,
            device,
            block_size,
            loader_workers,
            service,
            service_command,
            log_level
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sadgpt.toml");
        std::fs::write(
            &path,
            r#"
base_model = "gpt2-medium"
epochs = 5
learning_rate = 1e-4
service = "process"
service_command = ["python", "train.py"]
"#,
        )
        .unwrap();

        let config = CliConfig::load_from_file(&path).unwrap();
        assert_eq!(config.base_model.as_deref(), Some("gpt2-medium"));
        assert_eq!(config.epochs, Some(5));
        assert_eq!(config.service, Some(ServiceKind::Process));
        assert_eq!(config.service_command.unwrap(), vec!["python", "train.py"]);
        assert!(config.batch_size.is_none());
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            CliConfig::load_from_file(&temp.path().join("nope.toml")),
            Err(CliConfigError::NotFound(_))
        ));

        let path = temp.path().join("bad.toml");
        std::fs::write(&path, "epochs = \"many\"").unwrap();
        assert!(matches!(CliConfig::load_from_file(&path), Err(CliConfigError::ParseError(_))));
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut global = CliConfig { epochs: Some(3), batch_size: Some(2), ..Default::default() };
        let local = CliConfig { epochs: Some(1), device: Some("cuda".to_string()), ..Default::default() };
        global.merge(local);

        assert_eq!(global.epochs, Some(1));
        assert_eq!(global.batch_size, Some(2));
        assert_eq!(global.device.as_deref(), Some("cuda"));
    }
}
