//! Shared test utilities for economy integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use chrono::{DateTime, TimeZone, Utc};

use playledger::config::Config;
use playledger::economy::{
    ChallengeClaim, ClaimInsert, ClaimKey, CompletionEvent, DeviceCache, EconomyManager,
    EconomySnapshot, LedgerDb, PendingWrite, PlayerStats, ProgressRecord, RemoteStore, Session,
    StatsDelta,
};

pub const PLAYER: &str = "player-1";

/// Fixed start time for deterministic sessions
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

/// Remote store over an in-memory ledger with switches that simulate outages
#[derive(Clone)]
pub struct FlakyRemote {
    pub db: LedgerDb,
    offline: Arc<AtomicBool>,
    stats_offline: Arc<AtomicBool>,
}

impl FlakyRemote {
    pub fn new() -> Self {
        Self {
            db: LedgerDb::open_in_memory().expect("Failed to open in-memory ledger"),
            offline: Arc::new(AtomicBool::new(false)),
            stats_offline: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fail every remote call
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fail only writes to the stats totals
    pub fn set_stats_offline(&self, offline: bool) {
        self.stats_offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            bail!("remote unreachable");
        }
        Ok(())
    }

    fn check_stats(&self) -> Result<()> {
        self.check()?;
        if self.stats_offline.load(Ordering::SeqCst) {
            bail!("stats write rejected");
        }
        Ok(())
    }
}

impl RemoteStore for FlakyRemote {
    fn load_economy(&self, player_id: &str) -> Result<Option<EconomySnapshot>> {
        self.check()?;
        self.db.load_economy(player_id)
    }

    fn save_economy(&self, player_id: &str, snapshot: &EconomySnapshot) -> Result<()> {
        self.check()?;
        self.db.save_economy(player_id, snapshot)
    }

    fn load_stats(&self, player_id: &str) -> Result<Option<PlayerStats>> {
        self.check()?;
        self.db.load_stats(player_id)
    }

    fn save_stats(&self, player_id: &str, stats: &PlayerStats) -> Result<()> {
        self.check_stats()?;
        self.db.save_stats(player_id, stats)
    }

    fn add_stats(&self, player_id: &str, delta: StatsDelta) -> Result<PlayerStats> {
        self.check_stats()?;
        self.db.add_stats(player_id, delta)
    }

    fn record_completion(&self, event: &CompletionEvent) -> Result<ProgressRecord> {
        self.check()?;
        self.db.record_completion(event)
    }

    fn load_progress(&self, player_id: &str, activity_id: &str) -> Result<Option<ProgressRecord>> {
        self.check()?;
        self.db.load_progress(player_id, activity_id)
    }

    fn list_progress(&self, player_id: &str) -> Result<Vec<ProgressRecord>> {
        self.check()?;
        self.db.list_progress(player_id)
    }

    fn list_completions(&self, player_id: &str) -> Result<Vec<CompletionEvent>> {
        self.check()?;
        self.db.list_completions(player_id)
    }

    fn find_claim(&self, key: &ClaimKey) -> Result<Option<ChallengeClaim>> {
        self.check()?;
        self.db.find_claim(key)
    }

    fn insert_claim(&self, claim: &ChallengeClaim) -> Result<ClaimInsert> {
        self.check()?;
        self.db.insert_claim(claim)
    }

    fn list_claims(&self, player_id: &str) -> Result<Vec<ChallengeClaim>> {
        self.check()?;
        self.db.list_claims(player_id)
    }
}

/// Device cache held in memory
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, EconomySnapshot>>>,
    pending: Arc<Mutex<HashMap<String, Vec<PendingWrite>>>>,
}

impl MemoryCache {
    pub fn get(&self, player_id: &str) -> Option<EconomySnapshot> {
        self.entries.lock().unwrap().get(player_id).copied()
    }

    /// Queue saved for the player, empty when nothing is waiting
    pub fn pending(&self, player_id: &str) -> Vec<PendingWrite> {
        self.pending
            .lock()
            .unwrap()
            .get(player_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl DeviceCache for MemoryCache {
    fn load(&self, player_id: &str) -> Result<Option<EconomySnapshot>> {
        Ok(self.get(player_id))
    }

    fn store(&self, player_id: &str, snapshot: &EconomySnapshot) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(player_id.to_string(), *snapshot);
        Ok(())
    }

    fn load_pending(&self, player_id: &str) -> Result<Vec<PendingWrite>> {
        Ok(self.pending(player_id))
    }

    fn store_pending(&self, player_id: &str, writes: &[PendingWrite]) -> Result<()> {
        let mut pending = self.pending.lock().unwrap();
        if writes.is_empty() {
            pending.remove(player_id);
        } else {
            pending.insert(player_id.to_string(), writes.to_vec());
        }
        Ok(())
    }
}

/// Backends plus a manager wired over them
pub struct Harness {
    pub remote: FlakyRemote,
    pub cache: MemoryCache,
    pub manager: EconomyManager,
}

impl Harness {
    pub fn new() -> Self {
        let remote = FlakyRemote::new();
        let cache = MemoryCache::default();
        let manager =
            EconomyManager::with_backends(Arc::new(remote.clone()), Arc::new(cache.clone()));
        Self {
            remote,
            cache,
            manager,
        }
    }

    pub fn open(&self, config: Config, now: DateTime<Utc>) -> Session {
        self.manager.open_session(PLAYER, config, now)
    }

    pub fn open_default(&self) -> Session {
        self.open(Config::with_defaults(), t0())
    }
}
