//! Configuration loader with multi-source merging.

use std::env;
use std::path::{Path, PathBuf};

use crate::{ConfigError, Paths, PatchesConfig};

/// Builder for loading [`PatchesConfig`] from layered sources.
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    /// A loader rooted at the current working directory, with the
    /// `PATCHES` environment prefix.
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "PATCHES".to_string(),
        }
    }

    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Loads configuration from all sources with proper precedence:
    /// defaults < user config < project config < local override < env.
    pub fn load(self) -> Result<PatchesConfig, ConfigError> {
        let mut builder = config::Config::builder();

        let defaults = PatchesConfig::default();
        builder = builder
            .add_source(config::Config::try_from(&defaults).map_err(|e| ConfigError::MergeError(e.to_string()))?);

        let paths = Paths::new();
        if let Ok(user_config_file) = paths.user_config_file() {
            if user_config_file.exists() {
                builder = builder
                    .add_source(config::File::from(user_config_file).required(false).format(config::FileFormat::Toml));
            }
        }

        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(
                config::File::from(project_config_file).required(false).format(config::FileFormat::Toml),
            );
        }

        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            builder = builder
                .add_source(config::File::from(local_config_file).required(false).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(config::Environment::with_prefix(&self.env_prefix).separator("_").try_parsing(true));

        let built = builder.build().map_err(|e| ConfigError::MergeError(e.to_string()))?;

        let mut patches_config: PatchesConfig =
            built.try_deserialize().map_err(|e| ConfigError::MergeError(e.to_string()))?;

        patches_config.resolve_paths(&self.project_dir);
        Ok(patches_config)
    }

    /// Loads configuration, falling back to defaults if anything fails.
    pub fn load_or_default(self) -> PatchesConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn load_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = ConfigLoader::new().with_project_dir(temp_dir.path()).load().unwrap();
        assert_eq!(config.sync.reconnect_debounce_ms, 300);
        assert_eq!(config.transport.endpoint, "ws://127.0.0.1:8787");
    }

    #[test]
    fn project_config_overrides_defaults() {
        let temp_dir = tempdir().unwrap();
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("patches.toml"),
            r#"
[transport]
endpoint = "wss://example.com/sync"

[sync]
reconnect_debounce_ms = 500
"#,
        )
        .unwrap();

        let config = ConfigLoader::new().with_project_dir(project_dir).load().unwrap();
        assert_eq!(config.transport.endpoint, "wss://example.com/sync");
        assert_eq!(config.sync.reconnect_debounce_ms, 500);
        assert_eq!(config.sync.max_payload_bytes, 64 * 1024);
    }

    #[test]
    fn local_override_wins_over_project_config() {
        let temp_dir = tempdir().unwrap();
        let project_dir = temp_dir.path();

        fs::write(project_dir.join("patches.toml"), "[transport]\nendpoint = \"wss://project.example\"\n").unwrap();
        fs::write(project_dir.join("patches.local.toml"), "[transport]\nendpoint = \"ws://localhost:9999\"\n").unwrap();

        let config = ConfigLoader::new().with_project_dir(project_dir).load().unwrap();
        assert_eq!(config.transport.endpoint, "ws://localhost:9999");
    }

    #[test]
    fn data_dir_resolves_to_absolute_path() {
        let temp_dir = tempdir().unwrap();
        let config = ConfigLoader::new().with_project_dir(temp_dir.path()).load().unwrap();
        assert!(config.store.data_dir.is_absolute());
    }
}
