use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CONFIG_DIR_NAME: &str = "guestworld";
const CONFIG_FILE_NAME: &str = "config.toml";
const CURRENT_SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_LOCALE: &str = "en-US";

/// Result returned by [`load_config`], capturing the source and any non-fatal issues.
#[derive(Debug, Clone)]
pub struct ConfigLoadResult {
    pub config: FileConfig,
    pub warnings: Vec<String>,
    pub source: ConfigSource,
}

/// Indicates where the configuration was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No persisted configuration was found or usable; defaults were synthesized.
    Default,
    /// Configuration was read from `config.toml`.
    File,
}

/// Errors that can occur when persisting configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Ser(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {err}"),
            ConfigError::Ser(err) => write!(f, "TOML serialization error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Ser(value)
    }
}

/// Disk-backed configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "FileConfig::schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub artifacts: ArtifactPreferences,
    #[serde(default)]
    pub speech: SpeechPreferences,
}

/// Where the query engine finds the snapshot artifacts.
///
/// `None` means the conventional name in the current working directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_csv: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_json: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechPreferences {
    #[serde(default = "default_locale")]
    pub default_locale: String,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

impl Default for SpeechPreferences {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            artifacts: ArtifactPreferences::default(),
            speech: SpeechPreferences::default(),
        }
    }
}

impl FileConfig {
    const fn schema_version() -> u32 {
        CURRENT_SCHEMA_VERSION
    }
}

pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path to `config.toml`.
pub fn config_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Load the configuration, falling back to defaults.
pub fn load_config() -> ConfigLoadResult {
    load_config_from(&config_path())
}

fn load_config_from(path: &PathBuf) -> ConfigLoadResult {
    let mut warnings = Vec::new();

    if path.exists() {
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str::<FileConfig>(&raw) {
                Ok(cfg) => {
                    let (cfg, mut sanitize_warnings) = sanitize_config(cfg);
                    warnings.append(&mut sanitize_warnings);
                    return ConfigLoadResult {
                        config: cfg,
                        warnings,
                        source: ConfigSource::File,
                    };
                }
                Err(err) => {
                    warnings.push(format!(
                        "Failed to parse {} as TOML: {}. Falling back to defaults.",
                        CONFIG_FILE_NAME, err
                    ));
                }
            },
            Err(err) => {
                warnings.push(format!(
                    "Failed to read {}: {}. Falling back to defaults.",
                    CONFIG_FILE_NAME, err
                ));
            }
        }
    }

    ConfigLoadResult {
        config: FileConfig::default(),
        warnings,
        source: ConfigSource::Default,
    }
}

/// Persist the configuration to disk.
pub fn save_config(config: &FileConfig) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(config)?;
    fs::write(path, serialized)?;
    Ok(())
}

fn sanitize_config(mut config: FileConfig) -> (FileConfig, Vec<String>) {
    let mut warnings = Vec::new();

    if config.schema_version != CURRENT_SCHEMA_VERSION {
        warnings.push(format!(
            "Unknown config schema version {}. Resetting to {}.",
            config.schema_version, CURRENT_SCHEMA_VERSION
        ));
        config.schema_version = CURRENT_SCHEMA_VERSION;
    }

    if config.speech.default_locale.trim().is_empty() {
        warnings.push("Empty default locale. Resetting to en-US.".to_string());
        config.speech.default_locale = default_locale();
    }

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = FileConfig::default();
        let raw = toml::to_string_pretty(&config).expect("serialize");
        let restored: FileConfig = toml::from_str(&raw).expect("deserialize");
        assert_eq!(restored, config);
        assert_eq!(restored.speech.default_locale, "en-US");
    }

    #[test]
    fn missing_sections_fill_in_defaults() {
        let restored: FileConfig = toml::from_str("schema_version = 1\n").expect("deserialize");
        assert_eq!(restored, FileConfig::default());
    }

    #[test]
    fn sanitize_resets_unknown_schema_and_empty_locale() {
        let mut config = FileConfig::default();
        config.schema_version = 99;
        config.speech.default_locale = " ".to_string();

        let (config, warnings) = sanitize_config(config);
        assert_eq!(config.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(config.speech.default_locale, "en-US");
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn missing_file_loads_defaults_without_warnings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = load_config_from(&dir.path().join("config.toml"));
        assert_eq!(result.source, ConfigSource::Default);
        assert!(result.warnings.is_empty());
        assert_eq!(result.config, FileConfig::default());
    }

    #[test]
    fn malformed_file_loads_defaults_with_warning() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "not = [valid").expect("write");

        let result = load_config_from(&path);
        assert_eq!(result.source, ConfigSource::Default);
        assert_eq!(result.warnings.len(), 1);
    }
}
