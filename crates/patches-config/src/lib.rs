//! Layered configuration for a `patches` deployment.
//!
//! Five sources merge in increasing precedence:
//! 1. Built-in defaults
//! 2. `~/.config/patches/config.toml` (user defaults)
//! 3. `<project>/patches.toml` (project config, typically git-tracked)
//! 4. `<project>/patches.local.toml` (local override, typically gitignored)
//! 5. `PATCHES_*` environment variables (highest precedence)
//!
//! This crate has no dependency on `patches-sync`, `patches-store`, or
//! `patches-transport`: it produces plain settings values, and it is up to
//! whatever embeds those crates (see `patches`) to turn `SyncSettings` into
//! a `patches_sync::SyncConfig` and `StoreSettings` into wherever a
//! concrete `Store` impl reads its data directory from.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Top-level configuration for a `patches` client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchesConfig {
    pub transport: TransportSettings,
    pub sync: SyncSettings,
    pub store: StoreSettings,
}

/// Where the one transport connection a session keeps points to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    pub endpoint: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self { endpoint: "ws://127.0.0.1:8787".to_string() }
    }
}

/// Mirrors `patches_sync::SyncConfig`'s fields as plain, serde-friendly
/// values (milliseconds rather than `Duration`, so TOML/env can express
/// them directly).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// `None` disables batching; represented in TOML/env as the literal
    /// absence of the key, or `0` meaning "no limit" — see
    /// [`SyncSettings::max_payload_bytes_opt`].
    pub max_payload_bytes: u64,
    pub reconnect_debounce_ms: u64,
    pub shutdown_grace_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_payload_bytes: 64 * 1024,
            reconnect_debounce_ms: 300,
            shutdown_grace_ms: 5_000,
        }
    }
}

impl SyncSettings {
    /// `0` means "no payload limit"; anything else is a concrete byte
    /// budget, matching `break_into_batches`'s `Option<usize>` contract.
    pub fn max_payload_bytes_opt(&self) -> Option<usize> {
        if self.max_payload_bytes == 0 { None } else { Some(self.max_payload_bytes as usize) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub data_dir: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { data_dir: PathBuf::from(".patches/data") }
    }
}

impl PatchesConfig {
    /// Loads configuration from the default locations relative to the
    /// current working directory.
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Resolves `store.data_dir` to an absolute path under `base_dir` if
    /// it was given relative.
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<std::path::Path>) {
        if self.store.data_dir.is_relative() {
            self.store.data_dir = base_dir.as_ref().join(&self.store.data_dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = PatchesConfig::default();
        assert_eq!(config.sync.max_payload_bytes, 64 * 1024);
        assert_eq!(config.sync.reconnect_debounce_ms, 300);
        assert_eq!(config.sync.shutdown_grace_ms, 5_000);
    }

    #[test]
    fn zero_payload_bytes_disables_batching() {
        let settings = SyncSettings { max_payload_bytes: 0, ..Default::default() };
        assert_eq!(settings.max_payload_bytes_opt(), None);
    }

    #[test]
    fn path_resolution() {
        let mut config = PatchesConfig::default();
        config.resolve_paths("/home/user/project");
        assert_eq!(config.store.data_dir, PathBuf::from("/home/user/project/.patches/data"));
    }
}
