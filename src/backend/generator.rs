use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::ini::BackendConfig;
use crate::config::{BackendSettings, ContainerLayout, NeuroAtlases, UserSettings};
use crate::manifest::TaskKind;

/// File name of the backend configuration inside the working directory.
pub const CONFIG_FILENAME: &str = "rads_config.ini";
/// `gpu_id` value telling the backend to run on the CPU.
pub const CPU_ONLY_GPU_ID: &str = "-1";

/// Clinical domain of a processing request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetSpace {
    Neuro,
    Mediastinum,
    Other(String),
}

impl TargetSpace {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "neuro" => TargetSpace::Neuro,
            "mediastinum" => TargetSpace::Mediastinum,
            _ => TargetSpace::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TargetSpace::Neuro => "neuro",
            TargetSpace::Mediastinum => "mediastinum",
            TargetSpace::Other(name) => name,
        }
    }
}

impl fmt::Display for TargetSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One processing request: the selected model and what it is run for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRequest {
    pub model_name: String,
    pub task: TaskKind,
    pub target_space: TargetSpace,
    /// Free-form caller tag, may be empty
    pub caller: String,
}

impl BackendRequest {
    pub fn new(model_name: impl Into<String>, task: TaskKind, target_space: TargetSpace) -> Self {
        Self {
            model_name: model_name.into(),
            task,
            target_space,
            caller: String::new(),
        }
    }

    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = caller.into();
        self
    }
}

#[derive(Debug, Error)]
pub enum ConfigGenerationError {
    #[error("missing required setting `{0}`")]
    MissingSetting(&'static str),
    #[error("invalid model name `{0}`")]
    InvalidModelName(String),
    #[error("failed to write backend configuration to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Builds and writes the configuration file read by the processing backend.
#[derive(Debug, Clone, Default)]
pub struct ConfigGenerator {
    layout: ContainerLayout,
    neuro: NeuroAtlases,
}

impl ConfigGenerator {
    pub fn new(layout: ContainerLayout, neuro: NeuroAtlases) -> Self {
        Self { layout, neuro }
    }

    pub fn from_settings(settings: &BackendSettings) -> Self {
        Self::new(settings.layout.clone(), settings.neuro.clone())
    }

    /// Assembles the configuration for `request`.
    ///
    /// User settings are copied into the result, so later changes to them
    /// do not affect an assembled configuration.
    pub fn assemble(
        &self,
        request: &BackendRequest,
        user: &UserSettings,
    ) -> Result<BackendConfig, ConfigGenerationError> {
        let model_name = request.model_name.trim();
        if model_name.is_empty() || model_name.contains(['/', '\\']) || model_name == ".." {
            return Err(ConfigGenerationError::InvalidModelName(request.model_name.clone()));
        }

        let pipeline_filename = if request.task == TaskKind::Reporting {
            let document = required(&user.reporting_document, "user.reporting_document")?;
            join_folder(&self.layout.reporting_folder, document)
        } else {
            format!("{}/pipeline.json", join_folder(&self.layout.model_folder, model_name))
        };

        let mut config = BackendConfig::new();
        config.set("Default", "task", request.target_space.as_str());
        config.set("Default", "caller", request.caller.as_str());

        config.set("System", "gpu_id", CPU_ONLY_GPU_ID);
        config.set("System", "input_folder", self.layout.input_folder.as_str());
        config.set("System", "output_folder", self.layout.output_folder.as_str());
        config.set("System", "model_folder", self.layout.model_folder.as_str());
        config.set("System", "pipeline_filename", pipeline_filename);

        config.set(
            "Runtime",
            "reconstruction_method",
            required(&user.reconstruction_method, "user.reconstruction_method")?,
        );
        config.set(
            "Runtime",
            "reconstruction_order",
            required(&user.reconstruction_order, "user.reconstruction_order")?,
        );
        config.set(
            "Runtime",
            "use_stripped_data",
            required(&user.use_stripped_data, "user.use_stripped_data")?,
        );
        config.set(
            "Runtime",
            "use_registered_data",
            required(&user.use_registered_data, "user.use_registered_data")?,
        );

        if request.target_space == TargetSpace::Neuro {
            config.set("Neuro", "cortical_features", self.neuro.cortical_features.as_str());
            config.set("Neuro", "subcortical_features", self.neuro.subcortical_features.as_str());
        }

        debug!(
            "Assembled backend configuration for {} ({}, {})",
            model_name,
            request.task.backend_name(),
            request.target_space
        );
        Ok(config)
    }

    /// Assembles the configuration and writes it to
    /// `<working_dir>/rads_config.ini`, replacing any previous file whole.
    pub fn write(
        &self,
        request: &BackendRequest,
        user: &UserSettings,
        working_dir: &Path,
    ) -> Result<PathBuf, ConfigGenerationError> {
        let config = self.assemble(request, user)?;
        let path = working_dir.join(CONFIG_FILENAME);
        write_atomically(working_dir, &path, &config.render())?;
        info!("Backend configuration written to {}", path.display());
        Ok(path)
    }
}

fn required<'a>(
    value: &'a Option<String>,
    name: &'static str,
) -> Result<&'a str, ConfigGenerationError> {
    value
        .as_deref()
        .ok_or(ConfigGenerationError::MissingSetting(name))
}

fn join_folder(folder: &str, entry: &str) -> String {
    format!("{}/{}", folder.trim_end_matches('/'), entry)
}

fn write_atomically(dir: &Path, path: &Path, content: &str) -> Result<(), ConfigGenerationError> {
    let io_error = |source| ConfigGenerationError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::create_dir_all(dir).map_err(io_error)?;
    let staging = dir.join(format!(".{CONFIG_FILENAME}.tmp"));
    fs::write(&staging, content).map_err(io_error)?;
    fs::rename(&staging, path).map_err(|source| {
        let _ = fs::remove_file(&staging);
        io_error(source)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn user() -> UserSettings {
        UserSettings {
            reconstruction_method: Some("M".to_string()),
            reconstruction_order: Some("O".to_string()),
            use_stripped_data: Some("true".to_string()),
            use_registered_data: Some("false".to_string()),
            reporting_document: Some("neuro_report.json".to_string()),
        }
    }

    fn request(task: TaskKind, space: &str) -> BackendRequest {
        BackendRequest::new("MRI_GBM_Postop_FV_3p", task, TargetSpace::parse(space))
    }

    #[test]
    fn test_segmentation_layout() {
        let config = ConfigGenerator::default()
            .assemble(&request(TaskKind::Segmentation, "neuro"), &user())
            .unwrap();

        let sections: Vec<&str> = config.section_names().collect();
        assert_eq!(sections, vec!["Default", "System", "Runtime", "Neuro"]);
        assert_eq!(config.get("Default", "task"), Some("neuro"));
        assert_eq!(config.get("Default", "caller"), Some(""));
        assert_eq!(config.get("System", "gpu_id"), Some("-1"));
        assert_eq!(
            config.get("System", "pipeline_filename"),
            Some("/workspace/resources/models/MRI_GBM_Postop_FV_3p/pipeline.json")
        );
        assert_eq!(config.get("Runtime", "use_registered_data"), Some("false"));
        assert_eq!(
            config.get("Neuro", "cortical_features"),
            Some("MNI, Schaefer7, Schaefer17, Harvard-Oxford")
        );
    }

    #[test]
    fn test_reporting_uses_document_path() {
        let config = ConfigGenerator::default()
            .assemble(&request(TaskKind::parse("reporting"), "neuro"), &user())
            .unwrap();
        assert_eq!(
            config.get("System", "pipeline_filename"),
            Some("/workspace/resources/reporting/neuro_report.json")
        );
    }

    #[test]
    fn test_reporting_without_document_fails() {
        let mut settings = user();
        settings.reporting_document = None;
        let result = ConfigGenerator::default()
            .assemble(&request(TaskKind::Reporting, "neuro"), &settings);
        assert!(matches!(
            result,
            Err(ConfigGenerationError::MissingSetting("user.reporting_document"))
        ));
    }

    #[test]
    fn test_missing_runtime_setting_fails() {
        let mut settings = user();
        settings.reconstruction_order = None;
        let result = ConfigGenerator::default()
            .assemble(&request(TaskKind::Segmentation, "neuro"), &settings);
        assert!(matches!(
            result,
            Err(ConfigGenerationError::MissingSetting("user.reconstruction_order"))
        ));
    }

    #[test]
    fn test_neuro_section_only_for_neuro() {
        let config = ConfigGenerator::default()
            .assemble(&request(TaskKind::Segmentation, "mediastinum"), &user())
            .unwrap();
        assert!(!config.has_section("Neuro"));
        assert_eq!(config.get("Default", "task"), Some("mediastinum"));
    }

    #[test]
    fn test_invalid_model_name() {
        let bad = BackendRequest::new("../etc", TaskKind::Segmentation, TargetSpace::Neuro);
        assert!(matches!(
            ConfigGenerator::default().assemble(&bad, &user()),
            Err(ConfigGenerationError::InvalidModelName(_))
        ));
    }

    #[test]
    fn test_settings_are_snapshotted() {
        let generator = ConfigGenerator::default();
        let mut settings = user();
        let config = generator
            .assemble(&request(TaskKind::Segmentation, "neuro"), &settings)
            .unwrap();
        settings.reconstruction_method = Some("changed".to_string());
        assert_eq!(config.get("Runtime", "reconstruction_method"), Some("M"));
    }

    #[test]
    fn test_write_replaces_previous_file() {
        let dir = TempDir::new().unwrap();
        let generator = ConfigGenerator::default();

        let first = generator
            .write(&request(TaskKind::Segmentation, "neuro"), &user(), dir.path())
            .unwrap();
        let second = generator
            .write(
                &request(TaskKind::Segmentation, "neuro").with_caller("cli"),
                &user(),
                dir.path(),
            )
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(second, dir.path().join(CONFIG_FILENAME));
        let parsed = BackendConfig::parse(&fs::read_to_string(&second).unwrap()).unwrap();
        assert_eq!(parsed.get("Default", "caller"), Some("cli"));
        assert!(!dir.path().join(format!(".{CONFIG_FILENAME}.tmp")).exists());
    }

    #[test]
    fn test_unwritable_directory_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let result = ConfigGenerator::default().write(
            &request(TaskKind::Segmentation, "neuro"),
            &user(),
            &blocker,
        );
        assert!(matches!(result, Err(ConfigGenerationError::Io { .. })));
    }
}
