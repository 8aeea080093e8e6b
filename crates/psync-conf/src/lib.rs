use std::path::Path;

use config::Config;
use config::ConfigError as ExternalConfigError;
use config::File;
use config::FileFormat;
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

/// Number of versions remembered per document when nothing is configured.
pub const DEFAULT_VERSION_CACHE_CAPACITY: usize = 20;

/// Bound of the serialized task queue when nothing is configured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration build/deserialize error")]
    Config(#[from] ExternalConfigError),
    #[error("Invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub debug: bool,
    pub version_cache_capacity: usize,
    pub queue_capacity: usize,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            version_cache_capacity: DEFAULT_VERSION_CACHE_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn new(project_root: &Path) -> Result<Self, ConfigError> {
        let user_config_file = ProjectDirs::from("dev", "psync", "psync")
            .map(|proj_dirs| proj_dirs.config_dir().join("psync.toml"));

        Self::load_from_paths(project_root, user_config_file.as_deref())
    }

    fn load_from_paths(
        project_root: &Path,
        user_config_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = user_config_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        builder = builder.add_source(
            File::from(project_root.join(".psync.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        builder = builder.add_source(
            File::from(project_root.join("psync.toml"))
                .format(FileFormat::Toml)
                .required(false),
        );

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        tracing::debug!(?settings, "Loaded settings");
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.version_cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "version_cache_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "queue_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
