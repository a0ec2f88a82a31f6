//! Configuration management for rxhub.
//!
//! Handles loading and saving configuration from TOML files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the per-directory config file.
pub const LOCAL_CONFIG_FILE: &str = ".rxhub.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Project store settings
    pub store: StoreConfig,

    /// AI settings
    #[cfg(feature = "ai")]
    pub ai: AiConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Recorded as `completedBy` / `savedBy`
    pub user_name: Option<String>,

    /// Default output format for listings (`text` or `json`)
    pub default_format: String,
}

/// Project store settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Project collection file; defaults to `<data_dir>/rxhub/projects.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// AI integration settings.
#[cfg(feature = "ai")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Whether AI features are enabled
    pub enabled: bool,

    /// AI provider (claude)
    pub provider: String,

    /// Response token limit
    pub max_tokens: u32,

    /// Model per task tier
    pub models: ModelConfig,
}

/// Model identifiers per task tier.
#[cfg(feature = "ai")]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub simple: String,
    pub medium: String,
    pub complex: String,
}

impl Config {
    /// Load configuration.
    ///
    /// Looks for config in:
    /// 1. `explicit`, when given (errors are returned)
    /// 2. `.rxhub.toml` in current directory
    /// 3. `~/.config/rxhub/config.toml`
    /// 4. Falls back to defaults
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(global) = Self::global_path() {
            candidates.push(global);
        }

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Save configuration to the global config file.
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = Self::global_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Project collection file, honouring `[store] path`.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => Self::data_dir()
                .map(|d| d.join("projects.json"))
                .ok_or_else(|| anyhow::anyhow!("Could not determine data directory")),
        }
    }

    /// Path of the global config file.
    pub fn global_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("rxhub"))
    }

    /// Get the data directory path (for the project store).
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("rxhub"))
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { user_name: None, default_format: "text".to_string() }
    }
}

#[cfg(feature = "ai")]
impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "claude".to_string(),
            max_tokens: 8192,
            models: ModelConfig::default(),
        }
    }
}

#[cfg(feature = "ai")]
impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            simple: "claude-3-5-haiku-20241022".to_string(),
            medium: "claude-sonnet-4-20250514".to_string(),
            complex: "claude-opus-4-20250514".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.general.user_name.is_none());
        assert_eq!(config.general.default_format, "text");
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("default_format = \"text\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            user_name = "ana"

            [store]
            path = "/tmp/rx/projects.json"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.user_name.as_deref(), Some("ana"));
        assert_eq!(config.general.default_format, "text");
        assert_eq!(config.store_path().unwrap(), PathBuf::from("/tmp/rx/projects.json"));
    }

    #[cfg(feature = "ai")]
    #[test]
    fn test_ai_models_partial_override() {
        let toml_str = r#"
            [ai]
            max_tokens = 4096

            [ai.models]
            complex = "my-model"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.ai.enabled);
        assert_eq!(config.ai.max_tokens, 4096);
        assert_eq!(config.ai.models.complex, "my-model");
        assert_eq!(config.ai.models.simple, "claude-3-5-haiku-20241022");
    }

    #[test]
    fn test_save_and_load_explicit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.general.user_name = Some("luis".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
