//! Path utilities and XDG directory discovery.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::ConfigError;

/// XDG-compliant paths for patches config/state.
pub struct Paths {
    project_dirs: Option<ProjectDirs>,
}

impl Paths {
    pub fn new() -> Self {
        Self {
            project_dirs: ProjectDirs::from("com", "Patches", "patches"),
        }
    }

    /// `~/.config/patches/`
    pub fn user_config_dir(&self) -> Result<PathBuf, ConfigError> {
        self.project_dirs
            .as_ref()
            .map(|p| p.config_dir().to_path_buf())
            .ok_or_else(|| ConfigError::XdgError("failed to determine user config directory".to_string()))
    }

    /// `~/.local/share/patches/` — the default store location when the
    /// embedder doesn't override `store.data_dir`.
    pub fn user_data_dir(&self) -> Result<PathBuf, ConfigError> {
        self.project_dirs
            .as_ref()
            .map(|p| p.data_dir().to_path_buf())
            .ok_or_else(|| ConfigError::XdgError("failed to determine user data directory".to_string()))
    }

    /// `~/.config/patches/config.toml`
    pub fn user_config_file(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.user_config_dir()?.join("config.toml"))
    }

    /// `<project_dir>/patches.toml`, git-tracked.
    pub fn project_config_file(project_dir: impl AsRef<Path>) -> PathBuf {
        project_dir.as_ref().join("patches.toml")
    }

    /// `<project_dir>/patches.local.toml`, gitignored.
    pub fn local_config_file(project_dir: impl AsRef<Path>) -> PathBuf {
        project_dir.as_ref().join("patches.local.toml")
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn project_paths_are_relative_to_project_dir() {
        let temp_dir = tempdir().unwrap();
        let project_dir = temp_dir.path();

        assert_eq!(Paths::project_config_file(project_dir), project_dir.join("patches.toml"));
        assert_eq!(Paths::local_config_file(project_dir), project_dir.join("patches.local.toml"));
    }
}
