//! Pipeline project configuration
//!
//! Defines the `pipeline.toml` format. Every field has a default, so an empty file
//! (or no file at all) yields the production conventions.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "pipeline.toml";

/// Main pipeline configuration (pipeline.toml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Project prefix used in export folder names (e.g. `PKL_S01`)
    #[serde(default = "default_project_prefix")]
    pub project_prefix: String,

    /// Placeholder standing for the project root inside `Path` attributes
    #[serde(default = "default_workspace_token")]
    pub workspace_token: String,

    /// Export root template; `{prefix}`, `{sequence}` and `{shot}` are expanded
    #[serde(default = "default_export_template")]
    pub export_template: String,

    /// Extension of exported files
    #[serde(default = "default_export_extension")]
    pub export_extension: String,

    /// Hierarchy labels that act as containers when selected for export
    #[serde(default = "default_containers")]
    pub containers: Vec<String>,

    /// Reference file name prefixes subject to `_MASTER` validation
    #[serde(default = "default_master_prefixes")]
    pub master_prefixes: Vec<String>,

    /// Scene-name marker identifying animation scenes
    #[serde(default = "default_animation_marker")]
    pub animation_marker: String,
}

fn default_project_prefix() -> String {
    "PKL".to_string()
}

fn default_workspace_token() -> String {
    "<workspace_root>".to_string()
}

fn default_export_template() -> String {
    "<workspace_root>/Unreal/animation/{prefix}_{sequence}/{shot}".to_string()
}

fn default_export_extension() -> String {
    "fbx".to_string()
}

fn default_containers() -> Vec<String> {
    ["CH", "PR", "CAMERA"].iter().map(|s| s.to_string()).collect()
}

fn default_master_prefixes() -> Vec<String> {
    ["CH_", "PRP_"].iter().map(|s| s.to_string()).collect()
}

fn default_animation_marker() -> String {
    "_anim_".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project_prefix: default_project_prefix(),
            workspace_token: default_workspace_token(),
            export_template: default_export_template(),
            export_extension: default_export_extension(),
            containers: default_containers(),
            master_prefixes: default_master_prefixes(),
            animation_marker: default_animation_marker(),
        }
    }
}

/// Errors that can occur when loading a pipeline config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config file not found at {0}")]
    NotFound(String),
}

impl PipelineConfig {
    /// Parse a pipeline.toml file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Write this config as TOML
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load the config from an explicit path, the working directory, or the user
    /// config dir, falling back to defaults when none exists
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for candidate in config_search_paths() {
            if candidate.exists() {
                return Self::from_file(&candidate);
            }
        }
        Ok(Self::default())
    }

    /// Whether `label` names an export container
    pub fn is_container(&self, label: &str) -> bool {
        self.containers.iter().any(|c| c == label)
    }
}

/// Candidate config locations in lookup order
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("pkl").join(CONFIG_FILE_NAME));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.project_prefix, "PKL");
        assert_eq!(config.workspace_token, "<workspace_root>");
        assert_eq!(config.export_extension, "fbx");
        assert!(config.is_container("CAMERA"));
        assert!(!config.is_container("ANIMATION"));
    }

    #[test]
    fn test_partial_config() {
        let config: PipelineConfig = toml::from_str(
            r#"
projectPrefix = "XYZ"
exportExtension = "abc"
"#,
        )
        .unwrap();
        assert_eq!(config.project_prefix, "XYZ");
        assert_eq!(config.export_extension, "abc");
        assert_eq!(config.master_prefixes, vec!["CH_", "PRP_"]);
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);

        let config = PipelineConfig {
            project_prefix: "TST".to_string(),
            ..Default::default()
        };
        config.write_to(&path).unwrap();

        let loaded = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_explicit_config() {
        let temp_dir = TempDir::new().unwrap();
        let result = PipelineConfig::discover(Some(&temp_dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
