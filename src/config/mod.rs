// Layered settings: config/default.toml, config/local.toml, RADS_* environment
use serde::Deserialize;
use std::path::{Path, PathBuf};
use config::{Config, ConfigError, Environment, File};

/// Container runtime used for the image inventory
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// Path or name of the docker-compatible executable
    pub executable: PathBuf,
    /// Upper bound on the inventory query, in seconds
    pub inventory_timeout_secs: u64,
}

/// Local model manifests
#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    /// Directory holding one JSON manifest per model
    pub directory: PathBuf,
    /// Drop manifests whose image is not cached locally
    #[serde(default)]
    pub strict: bool,
    /// Delete dropped manifests from disk; needs `strict`
    #[serde(default)]
    pub delete_unmatched: bool,
}

/// Remote model listing
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CloudConfig {
    /// File path or http(s) URL of the listing
    pub listing: Option<String>,
}

/// Folder layout inside the backend container.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ContainerLayout {
    pub input_folder: String,
    pub output_folder: String,
    pub model_folder: String,
    pub reporting_folder: String,
}

impl Default for ContainerLayout {
    fn default() -> Self {
        Self {
            input_folder: "/workspace/resources/data".to_string(),
            output_folder: "/workspace/resources/output".to_string(),
            model_folder: "/workspace/resources/models".to_string(),
            reporting_folder: "/workspace/resources/reporting".to_string(),
        }
    }
}

/// Atlases the backend computes features for in the neuro target space.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NeuroAtlases {
    pub cortical_features: String,
    pub subcortical_features: String,
}

impl Default for NeuroAtlases {
    fn default() -> Self {
        Self {
            cortical_features: "MNI, Schaefer7, Schaefer17, Harvard-Oxford".to_string(),
            subcortical_features: "BCB".to_string(),
        }
    }
}

/// Backend configuration output
#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    /// Directory the backend configuration file is written to
    pub working_directory: PathBuf,
    #[serde(default)]
    pub layout: ContainerLayout,
    #[serde(default)]
    pub neuro: NeuroAtlases,
}

/// User choices forwarded to the backend.
///
/// Every field is optional here; the backend configuration generator
/// reports the ones it needs but cannot find.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct UserSettings {
    pub reconstruction_method: Option<String>,
    pub reconstruction_order: Option<String>,
    pub use_stripped_data: Option<String>,
    pub use_registered_data: Option<String>,
    /// Reporting template used in place of a model pipeline for reporting tasks
    pub reporting_document: Option<String>,
}

/// Configuration for application logging
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Optional log directory
    pub file: Option<PathBuf>,
}

/// Main settings struct that contains all configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub runtime: RuntimeConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub cloud: CloudConfig,
    pub backend: BackendSettings,
    #[serde(default)]
    pub user: UserSettings,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Loads settings from the `config` directory of the current working directory.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::current_dir()
            .map_err(|e| ConfigError::Message(
                format!("Failed to get current directory: {}", e)
            ))?
            .join("config");
        Self::from_dir(&config_dir)
    }

    /// Creates a Settings instance from the given directory, in the
    /// following order of precedence (highest to lowest):
    /// 1. Environment variables prefixed with RADS_ (sections split by `__`)
    /// 2. Local config file (local.toml) if present
    /// 3. Default config file (default.toml)
    pub fn from_dir(config_dir: &Path) -> Result<Self, ConfigError> {
        if !config_dir.exists() {
            return Err(ConfigError::Message(
                format!("Config directory not found at: {}", config_dir.display())
            ));
        }

        let default_config = config_dir.join("default.toml");
        if !default_config.exists() {
            return Err(ConfigError::Message(
                format!("Default configuration file not found at: {}", default_config.display())
            ));
        }
        let local_config = config_dir.join("local.toml");

        let default_config_path = default_config.to_string_lossy();
        let local_config_path = local_config.to_string_lossy();

        let settings = Config::builder()
            .add_source(File::with_name(&default_config_path))
            .add_source(File::with_name(&local_config_path).required(false))
            .add_source(
                Environment::with_prefix("RADS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<(), ConfigError> {
        if self.runtime.inventory_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "inventory_timeout_secs must be greater than 0".to_string()
            ));
        }

        if self.models.delete_unmatched && !self.models.strict {
            return Err(ConfigError::Message(
                "delete_unmatched requires strict reconciliation".to_string()
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            _ => Err(ConfigError::Message(
                format!("Invalid logging level: {}. Must be one of: error, warn, info, debug, trace",
                    self.logging.level)
            )),
        }?;

        if let Some(log_dir) = &self.logging.file {
            if !log_dir.exists() {
                std::fs::create_dir_all(log_dir).map_err(|e| {
                    ConfigError::Message(format!(
                        "Failed to create log directory at {}: {}",
                        log_dir.display(), e
                    ))
                })?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
[runtime]
executable = "docker"
inventory_timeout_secs = 10

[models]
directory = "resources/models"

[backend]
working_directory = "resources/backend"

[logging]
level = "info"
"#;

    fn config_dir(default: &str, local: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("default.toml"), default).unwrap();
        if let Some(local) = local {
            std::fs::write(dir.path().join("local.toml"), local).unwrap();
        }
        dir
    }

    #[test]
    fn test_minimal_settings_use_defaults() {
        let dir = config_dir(MINIMAL, None);
        let settings = Settings::from_dir(dir.path()).unwrap();

        assert!(!settings.models.strict);
        assert!(settings.cloud.listing.is_none());
        assert_eq!(settings.backend.layout.model_folder, "/workspace/resources/models");
        assert_eq!(settings.backend.neuro.subcortical_features, "BCB");
        assert_eq!(settings.user, UserSettings::default());
    }

    #[test]
    fn test_local_file_overrides_default() {
        let local = r#"
[models]
directory = "elsewhere"
strict = true

[user]
reconstruction_method = "probabilities"
"#;
        let dir = config_dir(MINIMAL, Some(local));
        let settings = Settings::from_dir(dir.path()).unwrap();

        assert_eq!(settings.models.directory, PathBuf::from("elsewhere"));
        assert!(settings.models.strict);
        assert_eq!(
            settings.user.reconstruction_method.as_deref(),
            Some("probabilities")
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = config_dir(&MINIMAL.replace("level = \"info\"", "level = \"loud\""), None);
        assert!(Settings::from_dir(dir.path()).is_err());

        let dir = config_dir(
            &MINIMAL.replace("inventory_timeout_secs = 10", "inventory_timeout_secs = 0"),
            None,
        );
        assert!(Settings::from_dir(dir.path()).is_err());

        let dir = config_dir(MINIMAL, Some("[models]\ndirectory = \"m\"\ndelete_unmatched = true\n"));
        assert!(Settings::from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(Settings::from_dir(&dir.path().join("nope")).is_err());
    }
}
