use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://api.hevyapp.com/v1/";

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    /// Base URL of the Hevy API
    pub base_url: ConfigValue<String>,
    /// API key sent in the `api-key` header
    #[serde(skip_serializing)]
    pub api_key: Option<ConfigValue<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: ConfigValue::new(DEFAULT_API_URL.to_string(), ConfigSource::Default),
            api_key: None,
        }
    }
}

impl ApiConfig {
    /// Returns true if an API key is available
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// The `api` section as written in the config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ApiSection {
    base_url: Option<String>,
    api_key: Option<String>,
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Path to the SQLite mirror
    pub database_path: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Remote API configuration
    pub api: ApiConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    database_path: Option<PathBuf>,
    api: ApiSection,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let default_db_path = Self::default_data_dir().join("hevymirror.db");

        // Start with defaults
        let mut database_path = ConfigValue::new(default_db_path, ConfigSource::Default);
        let mut config_file = None;
        let mut api = ApiConfig::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(db_path) = file_config.database_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if db_path.is_relative() {
                    path.parent().map(|p| p.join(&db_path)).unwrap_or(db_path)
                } else {
                    db_path
                };
                database_path = ConfigValue::new(resolved_path, ConfigSource::File);
            }
            if let Some(url) = file_config.api.base_url {
                api.base_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(key) = file_config.api.api_key {
                api.api_key = Some(ConfigValue::new(key, ConfigSource::File));
            }
        }

        // Apply environment variable overrides
        if let Ok(db_path) = std::env::var("HEVYMIRROR_DATABASE_PATH") {
            database_path = ConfigValue::new(PathBuf::from(db_path), ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("HEVYMIRROR_API_URL") {
            api.base_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(key) = std::env::var("HEVY_API_KEY") {
            api.api_key = Some(ConfigValue::new(key, ConfigSource::Environment));
        }

        Ok(Self {
            database_path,
            config_file,
            api,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/hevymirror/
    /// - macOS: ~/Library/Application Support/hevymirror/
    /// - Windows: %APPDATA%/hevymirror/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hevymirror")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/hevymirror/
    /// - macOS: ~/Library/Application Support/hevymirror/
    /// - Windows: %APPDATA%/hevymirror/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hevymirror")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert!(config
            .database_path
            .value
            .to_string_lossy()
            .contains("hevymirror.db"));
        assert_eq!(config.database_path.source, ConfigSource::Default);
        assert_eq!(config.config_file, None);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path: /custom/path/mirror.sqlite").unwrap();
        writeln!(file, "api:").unwrap();
        writeln!(file, "  base_url: http://localhost:9000/v1/").unwrap();
        writeln!(file, "  api_key: file-key").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(
            config.database_path.value,
            PathBuf::from("/custom/path/mirror.sqlite")
        );
        assert_eq!(config.database_path.source, ConfigSource::File);
        assert_eq!(config.api.base_url.value, "http://localhost:9000/v1/");
        assert_eq!(config.api.base_url.source, ConfigSource::File);
        assert_eq!(
            config.api.api_key.map(|k| (k.value, k.source)),
            Some(("file-key".to_string(), ConfigSource::File))
        );
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_database_path_resolved_against_config_dir() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path: data/mirror.db").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(
            config.database_path.value,
            temp_dir.path().join("data/mirror.db")
        );
    }

    #[test]
    fn test_api_section_defaults_base_url() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "api:").unwrap();
        writeln!(file, "  api_key: only-a-key").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.api.base_url.value, DEFAULT_API_URL);
        assert_eq!(config.api.base_url.source, ConfigSource::Default);
        assert!(config.api.is_configured());
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "database_path: /from/file.db").unwrap();

        // Set env var
        std::env::set_var("HEVYMIRROR_DATABASE_PATH", "/from/env.db");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.database_path.value, PathBuf::from("/from/env.db"));
        assert_eq!(config.database_path.source, ConfigSource::Environment);

        // Clean up
        std::env::remove_var("HEVYMIRROR_DATABASE_PATH");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let api = ApiConfig {
            api_key: Some(ConfigValue::new("secret".to_string(), ConfigSource::File)),
            ..ApiConfig::default()
        };
        let json = serde_json::to_string(&api).unwrap();
        assert!(!json.contains("secret"));
    }
}
