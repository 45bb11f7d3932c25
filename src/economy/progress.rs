//! Progress ledger - per-activity personal bests
//!
//! One row per (player, activity). The row keeps the skill record only;
//! points are paid per completion event and returned alongside.

use std::sync::Arc;

use super::error::{EconomyError, EconomyResult};
use super::models::{CompletionEvent, ProgressRecord};
use super::remote::RemoteStore;

impl ProgressRecord {
    /// Row created by the first completion of an activity
    pub fn first(event: &CompletionEvent) -> Self {
        Self {
            player_id: event.player_id.clone(),
            activity_id: event.activity_id.clone(),
            best_score: event.score,
            completed: event.completed,
            cumulative_time_spent_sec: event.time_spent_sec,
            updated_at: event.occurred_at,
        }
    }

    /// Fold a later completion into the row.
    ///
    /// `best_score` only rises and `completed` never reverts.
    pub fn absorb(&mut self, event: &CompletionEvent) {
        self.best_score = self.best_score.max(event.score);
        self.completed |= event.completed;
        self.cumulative_time_spent_sec = self
            .cumulative_time_spent_sec
            .saturating_add(event.time_spent_sec);
        self.updated_at = self.updated_at.max(event.occurred_at);
    }

    /// Merge an event into an optional existing row
    pub fn merged(existing: Option<ProgressRecord>, event: &CompletionEvent) -> Self {
        match existing {
            Some(mut record) => {
                record.absorb(event);
                record
            }
            None => Self::first(event),
        }
    }
}

/// Reads and writes progress rows through the remote store
#[derive(Clone)]
pub struct ProgressLedger {
    remote: Arc<dyn RemoteStore>,
}

impl ProgressLedger {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    /// Record a completion event and return the updated row together with the
    /// points this event earned
    pub fn upsert_completion(
        &self,
        event: &CompletionEvent,
    ) -> anyhow::Result<(ProgressRecord, u64)> {
        let record = self.remote.record_completion(event)?;
        Ok((record, event.points()))
    }

    /// Fetch a single row
    pub fn get(&self, player_id: &str, activity_id: &str) -> EconomyResult<ProgressRecord> {
        self.remote
            .load_progress(player_id, activity_id)
            .map_err(EconomyError::RemotePersistence)?
            .ok_or_else(|| {
                EconomyError::RecordNotFound(format!("progress {player_id}/{activity_id}"))
            })
    }

    /// All rows for a player, ordered by activity id
    pub fn list(&self, player_id: &str) -> anyhow::Result<Vec<ProgressRecord>> {
        self.remote.list_progress(player_id)
    }
}
