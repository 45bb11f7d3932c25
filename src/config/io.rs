//! Configuration file I/O operations

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::Config;

/// `path` with `suffix` appended to its file name
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Write a file atomically under an exclusive lock.
///
/// 1. Exclusive lock on a sidecar `.lock` file serializes writers
/// 2. Content goes to a `.tmp` file, then is renamed over the target
/// 3. Parent directory is created if needed
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let lock_path = sibling(path, ".lock");
    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

    lock_file
        .lock_exclusive()
        .with_context(|| format!("Failed to acquire lock: {}", lock_path.display()))?;

    let temp_path = sibling(path, ".tmp");
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

    temp_file
        .write_all(content)
        .with_context(|| format!("Failed to write {}", temp_path.display()))?;
    temp_file
        .sync_all()
        .with_context(|| format!("Failed to sync {}", temp_path.display()))?;

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename into place: {}", path.display()))?;

    // Lock is released when lock_file is dropped
    Ok(())
}

impl Config {
    /// Get the global config directory path (~/.playledger/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".playledger")
    }

    /// Get the global config file path (~/.playledger/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a file with atomic write and file locking
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;
        write_atomic(path, content.as_bytes())
    }

    /// Load the config at `path`, creating it with defaults if missing.
    ///
    /// A player id is generated and saved on first use.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            let config = Self::with_defaults();
            config.save_to_file(path)?;
            eprintln!("Created {}", path.display());
            config
        };

        if config.profile.player_id.is_none() {
            let player_id = uuid::Uuid::new_v4().to_string();
            tracing::info!("Assigned new player id {}", player_id);
            config.profile.player_id = Some(player_id);
            if let Err(e) = config.save_to_file(path) {
                tracing::warn!("Failed to save config after assigning player id: {}", e);
            }
        }

        Ok(config)
    }

    /// Load global configuration from ~/.playledger/config.toml
    pub fn load() -> Result<Self> {
        Self::load_or_init(&Self::global_config_path())
    }

    /// Ledger database path, defaulting to ~/.playledger/ledger.db
    pub fn ledger_db_path(&self) -> PathBuf {
        self.storage
            .ledger_db
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("ledger.db"))
    }

    /// Device cache directory, defaulting to ~/.playledger/cache
    pub fn cache_dir(&self) -> PathBuf {
        self.storage
            .cache_dir
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("cache"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_or_init_creates_file_and_player() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_or_init(&path).unwrap();
        assert!(path.exists());
        let player_id = config.profile.player_id.clone().unwrap();

        // Second load keeps the same player
        let again = Config::load_or_init(&path).unwrap();
        assert_eq!(again.profile.player_id, Some(player_id));
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::with_defaults();
        config.energy.max_energy = 7;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.energy.max_energy, 7);
        assert_eq!(loaded.activity.len(), config.activity.len());
        assert!(!dir.path().join("config.toml.tmp").exists());
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[energy]\nmax_energy = 0\n").unwrap();
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_sibling_appends_suffix() {
        assert_eq!(
            sibling(Path::new("/a/b/p1.json"), ".tmp"),
            PathBuf::from("/a/b/p1.json.tmp")
        );
    }
}
