//! Device-local cache of the currency snapshot
//!
//! Mirrors only [`EconomySnapshot`], never the progress ledger, plus the queue
//! of remote writes that have not landed yet so they survive a restart. One
//! JSON file per player for each under the cache directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::models::EconomySnapshot;
use super::sync::PendingWrite;
use crate::config::write_atomic;

/// Storage for the on-device copy of the currency snapshot
pub trait DeviceCache: Send + Sync {
    fn load(&self, player_id: &str) -> Result<Option<EconomySnapshot>>;

    fn store(&self, player_id: &str, snapshot: &EconomySnapshot) -> Result<()>;

    /// Queued remote writes saved by an earlier session, oldest first
    fn load_pending(&self, player_id: &str) -> Result<Vec<PendingWrite>>;

    /// Replace the saved queue; an empty slice clears it
    fn store_pending(&self, player_id: &str, writes: &[PendingWrite]) -> Result<()>;
}

/// File-backed device cache
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a player's cache file
    pub fn path_for(&self, player_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(player_id)))
    }

    /// Path of a player's pending-write queue
    pub fn pending_path_for(&self, player_id: &str) -> PathBuf {
        self.dir.join(format!("{}.pending.json", sanitize(player_id)))
    }
}

/// Keep player ids from escaping the cache directory
fn sanitize(player_id: &str) -> String {
    player_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl DeviceCache for FileCache {
    fn load(&self, player_id: &str) -> Result<Option<EconomySnapshot>> {
        let path = self.path_for(player_id);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file {}", path.display()))?;
        let snapshot = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse cache file {}", path.display()))?;
        Ok(Some(snapshot))
    }

    fn store(&self, player_id: &str, snapshot: &EconomySnapshot) -> Result<()> {
        let content =
            serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;
        write_atomic(&self.path_for(player_id), content.as_bytes())
    }

    fn load_pending(&self, player_id: &str) -> Result<Vec<PendingWrite>> {
        let path = self.pending_path_for(player_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read pending file {}", path.display()))?;
        let writes = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse pending file {}", path.display()))?;
        Ok(writes)
    }

    fn store_pending(&self, player_id: &str, writes: &[PendingWrite]) -> Result<()> {
        let path = self.pending_path_for(player_id);
        if writes.is_empty() {
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
            return Ok(());
        }

        let content =
            serde_json::to_string_pretty(writes).context("Failed to serialize pending writes")?;
        write_atomic(&path, content.as_bytes())
    }
}
