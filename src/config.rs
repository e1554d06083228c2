//! Configuration loading
//!
//! This module provides:
//! - `AgentRuntimeConfig` - Runtime configuration for the agent loop (library-public)
//! - `ClientConfig` - Connection settings for the inference server (library-public)
//! - `Config` - Full application configuration loaded from config.toml

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default address of a local Ollama server
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model when none is configured
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Runtime configuration for an Agent instance.
///
/// # Example
///
/// ```
/// use kobold::AgentRuntimeConfig;
///
/// let config = AgentRuntimeConfig {
///     model: "qwen2.5-coder".to_string(),
///     max_loops: 5,
///     context_window: 32_768,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentRuntimeConfig {
    /// Initial model; can be changed later with `Agent::set_model`
    pub model: String,
    /// Maximum tool round-trips per chat invocation
    pub max_loops: usize,
    /// Context window size used for usage reporting
    pub context_window: usize,
}

impl Default for AgentRuntimeConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_loops: 10,
            context_window: 8_192,
        }
    }
}

/// Connection settings for the inference server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub temperature: f32,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.7,
            timeout_secs: 120,
        }
    }
}

/// Main configuration structure loaded from config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ClientConfig,
    pub agent: AgentRuntimeConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the config directory path (~/.config/kobold)
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("kobold"))
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub enabled: Vec<String>,
    /// Timeout for the shell tool
    pub shell_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: vec!["shell".to_string(), "read_file".to_string()],
            shell_timeout_secs: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.base_url, "http://localhost:11434");
        assert_eq!(config.server.timeout_secs, 120);
        assert_eq!(config.server.temperature, 0.7);
        assert_eq!(config.agent.max_loops, 10);
        assert!(config.tools.enabled.contains(&"shell".to_string()));
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
base_url = "http://gpu-box:11434"

[agent]
model = "qwen2.5-coder:14b"
max_loops = 4

[tools]
enabled = ["read_file"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.base_url, "http://gpu-box:11434");
        assert_eq!(config.server.timeout_secs, 120);
        assert_eq!(config.agent.model, "qwen2.5-coder:14b");
        assert_eq!(config.agent.max_loops, 4);
        assert_eq!(config.agent.context_window, 8_192);
        assert_eq!(config.tools.enabled, vec!["read_file".to_string()]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent]\ncontext_window = 32768\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.agent.context_window, 32_768);
        assert_eq!(config.agent.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent\nmodel = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }
}
