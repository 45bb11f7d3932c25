//! Data models for the player economy
//!
//! These structures represent the data held in memory, mirrored to the device
//! cache, and stored in the ledger database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Player identifier (opaque, assigned at first login)
pub type PlayerId = String;

/// Durable currency state: energy, gems and the regen clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomySnapshot {
    pub energy: u32,
    pub gems: u32,
    pub last_energy_update: DateTime<Utc>,
}

impl EconomySnapshot {
    /// Defaults for a player logging in for the first time
    pub fn fresh(max_energy: u32, now: DateTime<Utc>) -> Self {
        Self {
            energy: max_energy,
            gems: 0,
            last_energy_update: now,
        }
    }
}

/// Per-(player, activity) personal-best record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub player_id: PlayerId,
    pub activity_id: String,
    pub best_score: u32,
    pub completed: bool,
    pub cumulative_time_spent_sec: u64,
    pub updated_at: DateTime<Utc>,
}

/// Running totals for a player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub total_points: u64,
    pub completed_count: u32,
}

/// Increment applied to [`PlayerStats`] by a single write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsDelta {
    pub points: u64,
    pub completions: u32,
}

impl StatsDelta {
    pub fn points(points: u64) -> Self {
        Self {
            points,
            completions: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points == 0 && self.completions == 0
    }

    /// Merge another delta into this one
    pub fn absorb(&mut self, other: StatsDelta) {
        self.points = self.points.saturating_add(other.points);
        self.completions = self.completions.saturating_add(other.completions);
    }
}

impl PlayerStats {
    pub fn apply(&mut self, delta: StatsDelta) {
        self.total_points = self.total_points.saturating_add(delta.points);
        self.completed_count = self.completed_count.saturating_add(delta.completions);
    }
}

/// One instance of finishing (or abandoning) an activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    /// Unique per event; recording is idempotent on this id
    pub event_id: String,
    pub player_id: PlayerId,
    pub activity_id: String,
    pub base_points: u32,
    pub score: u32,
    pub time_spent_sec: u64,
    pub completed: bool,
    pub occurred_at: DateTime<Utc>,
}

impl CompletionEvent {
    /// Build an event with a freshly generated id
    pub fn new(
        player_id: &str,
        activity_id: &str,
        base_points: u32,
        score: u32,
        time_spent_sec: u64,
        completed: bool,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            player_id: player_id.to_string(),
            activity_id: activity_id.to_string(),
            base_points,
            score,
            time_spent_sec,
            completed,
            occurred_at,
        }
    }

    /// Points awarded for this event. Only completed events qualify.
    pub fn points(&self) -> u64 {
        if self.completed {
            u64::from(self.base_points) + u64::from(self.score)
        } else {
            0
        }
    }

    pub fn stats_delta(&self) -> StatsDelta {
        StatsDelta {
            points: self.points(),
            completions: u32::from(self.completed),
        }
    }
}

/// Uniqueness key of a challenge claim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimKey {
    pub player_id: PlayerId,
    pub challenge_id: String,
    pub round: u32,
}

/// An append-only record of a paid-out challenge reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeClaim {
    pub key: ClaimKey,
    pub reward_points: u64,
    pub claimed_at: DateTime<Utc>,
}

/// Result of inserting a claim row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimInsert {
    Inserted,
    Duplicate,
}

/// A gem package supplied by the purchase boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasePackage {
    pub id: String,
    pub gem_amount: u32,
}
