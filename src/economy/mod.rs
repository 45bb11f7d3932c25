//! Player economy: energy, gems, progress and points
//!
//! Balances live in three tiers. The remote tier (a SQLite ledger at
//! `~/.playledger/ledger.db`) is authoritative, a per-player JSON snapshot is
//! kept on the device, and a [`Session`] holds the in-memory state.
//!
//! # Architecture
//!
//! ```text
//!   callbacks (play / ad / purchase / claim / timer)
//!                      │
//!                      ▼
//!               ┌─────────────┐      ┌──────────────┐
//!               │   Session   │─────▶│ PendingWrites│ (retried on next op)
//!               └──────┬──────┘      └──────────────┘
//!        ┌─────────┬───┴─────┬──────────────┐
//!        ▼         ▼         ▼              ▼
//!   CurrencyStore ProgressLedger StatsAggregator RewardDispatcher
//!        │  │         │         │              │
//!  FileCache  └────────┴─────────┴──────────────┘
//!                              ▼
//!                         RemoteStore (LedgerDb)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let manager = EconomyManager::new(&config)?;
//! let mut session = manager.open_session(&player_id, config, Utc::now());
//!
//! let run = session.start_activity("math-quiz", Utc::now())?;
//! let outcome = session.on_activity_complete(run, 85, Utc::now())?;
//! ```

mod cache;
mod currency;
mod db;
mod energy;
mod error;
mod models;
mod progress;
mod remote;
mod rewards;
mod rounds;
mod session;
mod stats;
mod sync;

pub use cache::{DeviceCache, FileCache};
pub use currency::{CurrencyStore, Initialized, SnapshotSource};
pub use db::LedgerDb;
pub use energy::{credit_gems, EnergyRegenerator};
pub use error::{EconomyError, EconomyResult};
pub use models::{
    ChallengeClaim, ClaimInsert, ClaimKey, CompletionEvent, EconomySnapshot, PlayerId,
    PlayerStats, ProgressRecord, PurchasePackage, StatsDelta,
};
pub use progress::ProgressLedger;
pub use remote::RemoteStore;
pub use rewards::RewardDispatcher;
pub use rounds::{day_bucket, round_for, round_start, time_until_next_round, ChallengePeriod};
pub use session::{ActivityRun, CompletionOutcome, Session, SyncReport};
pub use stats::{LedgerSummary, Recomputed, StatsAggregator};
pub use sync::{Applied, PendingWrite, PendingWrites, SyncPhase, Tracked};

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::config::Config;

/// Owns the storage backends and opens sessions over them
#[derive(Clone)]
pub struct EconomyManager {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<dyn DeviceCache>,
}

impl EconomyManager {
    /// Open the ledger and device cache at the locations in `config`
    pub fn new(config: &Config) -> Result<Self> {
        let db = LedgerDb::open(&config.ledger_db_path())?;
        let cache = FileCache::new(config.cache_dir());
        Ok(Self::with_backends(Arc::new(db), Arc::new(cache)))
    }

    /// Build over explicit backends
    pub fn with_backends(remote: Arc<dyn RemoteStore>, cache: Arc<dyn DeviceCache>) -> Self {
        Self { remote, cache }
    }

    pub fn remote(&self) -> Arc<dyn RemoteStore> {
        self.remote.clone()
    }

    /// Start a session for `player_id`
    pub fn open_session(&self, player_id: &str, config: Config, now: DateTime<Utc>) -> Session {
        Session::open(
            player_id,
            config,
            self.remote.clone(),
            self.cache.clone(),
            now,
        )
    }
}
