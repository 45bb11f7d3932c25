//! Authoritative record interface
//!
//! The remote tier is reached only through [`RemoteStore`]. The bundled
//! implementation is [`LedgerDb`](super::db::LedgerDb); a hosted backend plugs
//! in the same way.

use anyhow::Result;

use super::models::{
    ChallengeClaim, ClaimInsert, ClaimKey, CompletionEvent, EconomySnapshot, PlayerStats,
    ProgressRecord, StatsDelta,
};

/// Storage operations backing the authoritative player record
pub trait RemoteStore: Send + Sync {
    /// Currency snapshot, `None` when the player row is missing or unpopulated
    fn load_economy(&self, player_id: &str) -> Result<Option<EconomySnapshot>>;

    fn save_economy(&self, player_id: &str, snapshot: &EconomySnapshot) -> Result<()>;

    /// Stored totals, `None` when the player row does not exist
    fn load_stats(&self, player_id: &str) -> Result<Option<PlayerStats>>;

    /// Overwrite stored totals
    fn save_stats(&self, player_id: &str, stats: &PlayerStats) -> Result<()>;

    /// Increment stored totals and return the new values
    fn add_stats(&self, player_id: &str, delta: StatsDelta) -> Result<PlayerStats>;

    /// Append a completion event and fold it into the progress row.
    ///
    /// Must be idempotent on `event.event_id`: recording the same event twice
    /// leaves the row as it was after the first call.
    fn record_completion(&self, event: &CompletionEvent) -> Result<ProgressRecord>;

    fn load_progress(&self, player_id: &str, activity_id: &str) -> Result<Option<ProgressRecord>>;

    fn list_progress(&self, player_id: &str) -> Result<Vec<ProgressRecord>>;

    /// Every recorded completion event for a player, oldest first
    fn list_completions(&self, player_id: &str) -> Result<Vec<CompletionEvent>>;

    fn find_claim(&self, key: &ClaimKey) -> Result<Option<ChallengeClaim>>;

    /// Insert a claim row; the key's uniqueness is enforced by the store
    fn insert_claim(&self, claim: &ChallengeClaim) -> Result<ClaimInsert>;

    fn list_claims(&self, player_id: &str) -> Result<Vec<ChallengeClaim>>;
}
