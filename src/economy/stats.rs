//! Stats aggregator - running totals with a self-healing recompute
//!
//! Totals accrue per completion *event*, so replaying an already-completed
//! activity pays again. The completion-event log is the authoritative accrual
//! record: `recompute` replays it (plus challenge claims) and therefore never
//! erases points earned by replays.

use std::sync::Arc;

use anyhow::Result;

use super::models::{CompletionEvent, PlayerStats, StatsDelta};
use super::remote::RemoteStore;

/// Result of [`StatsAggregator::recompute`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recomputed {
    pub stats: PlayerStats,
    /// Stored totals before the recompute (`None` if the row was missing)
    pub previous: Option<PlayerStats>,
}

impl Recomputed {
    /// Whether the stored totals had drifted and were overwritten
    pub fn healed(&self) -> bool {
        self.previous != Some(self.stats)
    }
}

/// Per-row view of the progress ledger, for profile display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerSummary {
    /// Sum of stored best scores, once per row
    pub best_score_sum: u64,
    /// Rows marked completed
    pub completed_activities: u32,
    /// Rows in the ledger
    pub activities_played: u32,
    pub total_time_spent_sec: u64,
}

/// Maintains [`PlayerStats`]
#[derive(Clone)]
pub struct StatsAggregator {
    remote: Arc<dyn RemoteStore>,
}

impl StatsAggregator {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    /// Accrue one completion event into in-memory totals.
    ///
    /// Returns the points awarded (`base_points + score`, zero for an
    /// unfinished attempt).
    pub fn on_completion_event(stats: &mut PlayerStats, event: &CompletionEvent) -> u64 {
        let delta = event.stats_delta();
        stats.apply(delta);
        delta.points
    }

    /// Add a one-shot reward into in-memory totals
    pub fn on_reward(stats: &mut PlayerStats, reward_points: u64) {
        stats.total_points = stats.total_points.saturating_add(reward_points);
    }

    /// Increment the stored totals, returning the new stored values
    pub fn persist_delta(&self, player_id: &str, delta: StatsDelta) -> Result<PlayerStats> {
        self.remote.add_stats(player_id, delta)
    }

    /// Load the stored totals, if the player row exists
    pub fn load(&self, player_id: &str) -> Result<Option<PlayerStats>> {
        self.remote.load_stats(player_id)
    }

    /// Totals derived from the event log and claims alone
    pub fn derive(&self, player_id: &str) -> Result<PlayerStats> {
        let mut stats = PlayerStats::default();
        for event in self.remote.list_completions(player_id)? {
            Self::on_completion_event(&mut stats, &event);
        }
        for claim in self.remote.list_claims(player_id)? {
            Self::on_reward(&mut stats, claim.reward_points);
        }
        Ok(stats)
    }

    /// Re-derive totals and overwrite the stored values if they drifted
    pub fn recompute(&self, player_id: &str) -> Result<Recomputed> {
        let stats = self.derive(player_id)?;
        let previous = self.remote.load_stats(player_id)?;
        let result = Recomputed { stats, previous };

        if result.healed() {
            tracing::info!(
                "Stats for {} drifted ({:?} -> {:?}), overwriting",
                player_id,
                previous,
                stats
            );
            self.remote.save_stats(player_id, &stats)?;
        }
        Ok(result)
    }

    /// Summarize ledger rows. Read-only; never touches stored totals.
    pub fn ledger_summary(&self, player_id: &str) -> Result<LedgerSummary> {
        let summary = self
            .remote
            .list_progress(player_id)?
            .iter()
            .fold(LedgerSummary::default(), |mut acc, row| {
                acc.best_score_sum += u64::from(row.best_score);
                acc.completed_activities += u32::from(row.completed);
                acc.activities_played += 1;
                acc.total_time_spent_sec += row.cumulative_time_spent_sec;
                acc
            });
        Ok(summary)
    }
}
