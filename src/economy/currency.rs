//! Currency store - three-tier ownership of the currency snapshot
//!
//! ```text
//!   remote record  ─┐
//!   device cache   ─┼─► initialize() picks one, mirrors it to the rest
//!   fresh default  ─┘
//! ```
//!
//! No write spans the tiers, so the tiers are only eventually consistent.
//! `initialize` is the explicit reconciliation point.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::cache::DeviceCache;
use super::models::EconomySnapshot;
use super::remote::RemoteStore;
use super::sync::PendingWrite;

/// Which tier supplied the snapshot at initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Remote,
    LocalCache,
    Fresh,
}

impl SnapshotSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::LocalCache => "device cache",
            Self::Fresh => "fresh",
        }
    }
}

/// Outcome of [`CurrencyStore::initialize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Initialized {
    pub snapshot: EconomySnapshot,
    pub source: SnapshotSource,
    /// Whether the remote tier holds `snapshot` after initialization
    pub remote_confirmed: bool,
}

/// Owns reads and writes of the currency snapshot across tiers
#[derive(Clone)]
pub struct CurrencyStore {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<dyn DeviceCache>,
}

impl CurrencyStore {
    pub fn new(remote: Arc<dyn RemoteStore>, cache: Arc<dyn DeviceCache>) -> Self {
        Self { remote, cache }
    }

    /// Load the snapshot with precedence remote > device cache > fresh default,
    /// then mirror the winner into the other tiers
    pub fn initialize(&self, player_id: &str, max_energy: u32, now: DateTime<Utc>) -> Initialized {
        let remote = match self.remote.load_economy(player_id) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Remote economy read failed for {}: {:#}", player_id, e);
                None
            }
        };

        let (snapshot, source) = match remote {
            Some(snapshot) => (snapshot, SnapshotSource::Remote),
            None => match self.load_local(player_id) {
                Some(snapshot) => (snapshot, SnapshotSource::LocalCache),
                None => (EconomySnapshot::fresh(max_energy, now), SnapshotSource::Fresh),
            },
        };
        tracing::debug!("Economy for {} loaded from {}", player_id, source.label());

        if source != SnapshotSource::LocalCache {
            self.persist_local(player_id, &snapshot);
        }

        let remote_confirmed = match source {
            SnapshotSource::Remote => true,
            _ => match self.persist_remote(player_id, &snapshot) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Remote economy mirror failed for {}: {:#}", player_id, e);
                    false
                }
            },
        };

        Initialized {
            snapshot,
            source,
            remote_confirmed,
        }
    }

    fn load_local(&self, player_id: &str) -> Option<EconomySnapshot> {
        match self.cache.load(player_id) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Device cache read failed for {}: {:#}", player_id, e);
                None
            }
        }
    }

    /// Best-effort write to the device cache
    pub fn persist_local(&self, player_id: &str, snapshot: &EconomySnapshot) -> bool {
        match self.cache.store(player_id, snapshot) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Device cache write failed for {}: {:#}", player_id, e);
                false
            }
        }
    }

    /// Write-through to the authoritative record
    pub fn persist_remote(&self, player_id: &str, snapshot: &EconomySnapshot) -> Result<()> {
        self.remote.save_economy(player_id, snapshot)
    }

    /// Current remote snapshot, for noticing writes made by other sessions
    pub fn load_remote(&self, player_id: &str) -> Result<Option<EconomySnapshot>> {
        self.remote.load_economy(player_id)
    }

    /// Writes an earlier session queued but never delivered
    pub fn load_pending(&self, player_id: &str) -> Vec<PendingWrite> {
        match self.cache.load_pending(player_id) {
            Ok(writes) => writes,
            Err(e) => {
                tracing::warn!("Pending-write file unreadable for {}: {:#}", player_id, e);
                Vec::new()
            }
        }
    }

    /// Best-effort save of the pending-write queue next to the snapshot
    pub fn persist_pending(&self, player_id: &str, writes: &[PendingWrite]) -> bool {
        match self.cache.store_pending(player_id, writes) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Pending-write save failed for {}: {:#}", player_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::cache::FileCache;
    use crate::economy::db::LedgerDb;
    use chrono::Duration;
    use tempfile::tempdir;

    fn snap(energy: u32, gems: u32, at: DateTime<Utc>) -> EconomySnapshot {
        EconomySnapshot {
            energy,
            gems,
            last_energy_update: at,
        }
    }

    #[test]
    fn test_fresh_player_gets_defaults_everywhere() {
        let dir = tempdir().unwrap();
        let db = LedgerDb::open_in_memory().unwrap();
        let cache = FileCache::new(dir.path());
        let store = CurrencyStore::new(Arc::new(db.clone()), Arc::new(cache.clone()));
        let now = Utc::now();

        let init = store.initialize("p1", 5, now);
        assert_eq!(init.source, SnapshotSource::Fresh);
        assert_eq!(init.snapshot, EconomySnapshot::fresh(5, now));
        assert!(init.remote_confirmed);
        assert_eq!(db.load_economy("p1").unwrap(), Some(init.snapshot));
        assert_eq!(cache.load("p1").unwrap(), Some(init.snapshot));
    }

    #[test]
    fn test_remote_wins_over_cache() {
        let dir = tempdir().unwrap();
        let db = LedgerDb::open_in_memory().unwrap();
        let cache = FileCache::new(dir.path());
        let now = Utc::now();
        db.save_economy("p1", &snap(1, 80, now)).unwrap();
        cache.store("p1", &snap(4, 10, now - Duration::hours(1))).unwrap();

        let store = CurrencyStore::new(Arc::new(db), Arc::new(cache.clone()));
        let init = store.initialize("p1", 5, now);
        assert_eq!(init.source, SnapshotSource::Remote);
        assert_eq!(init.snapshot.gems, 80);
        assert_eq!(cache.load("p1").unwrap().unwrap().gems, 80);
    }

    #[test]
    fn test_cache_wins_when_remote_empty() {
        let dir = tempdir().unwrap();
        let db = LedgerDb::open_in_memory().unwrap();
        let cache = FileCache::new(dir.path());
        let now = Utc::now();
        cache.store("p1", &snap(2, 33, now)).unwrap();

        let store = CurrencyStore::new(Arc::new(db.clone()), Arc::new(cache));
        let init = store.initialize("p1", 5, now);
        assert_eq!(init.source, SnapshotSource::LocalCache);
        assert_eq!(db.load_economy("p1").unwrap().unwrap().gems, 33);
    }

    #[test]
    fn test_cache_write_failure_is_not_fatal() {
        let dir = tempdir().unwrap();
        // A regular file where the cache directory should be
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "x").unwrap();
        let store = CurrencyStore::new(
            Arc::new(LedgerDb::open_in_memory().unwrap()),
            Arc::new(FileCache::new(&blocker)),
        );

        assert!(!store.persist_local("p1", &snap(5, 0, Utc::now())));
        let init = store.initialize("p1", 5, Utc::now());
        assert_eq!(init.source, SnapshotSource::Fresh);
        assert!(init.remote_confirmed);
    }
}
