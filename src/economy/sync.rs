//! Optimistic writes and the pending-write queue
//!
//! Every balance change is applied locally first. Remote writes that fail are
//! parked in [`PendingWrites`] and retried at the next opportunity (the start
//! of the next session operation). [`Tracked`] exposes whether the local
//! value has been confirmed by the remote tier.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::models::{CompletionEvent, EconomySnapshot, PlayerStats, ProgressRecord, StatsDelta};

/// Where a locally held value stands relative to the remote tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    AppliedLocally,
    ConfirmedRemotely,
}

/// A value with its last remotely confirmed counterpart
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    local: T,
    confirmed: Option<T>,
}

impl<T: Clone + PartialEq> Tracked<T> {
    /// A value the remote tier already holds
    pub fn confirmed(value: T) -> Self {
        Self {
            confirmed: Some(value.clone()),
            local: value,
        }
    }

    /// A value only held locally
    pub fn unconfirmed(value: T) -> Self {
        Self {
            local: value,
            confirmed: None,
        }
    }

    pub fn get(&self) -> &T {
        &self.local
    }

    /// Apply a new value locally
    pub fn set(&mut self, value: T) {
        self.local = value;
    }

    /// Record that the remote tier now holds `value`
    pub fn confirm(&mut self, value: T) {
        self.confirmed = Some(value);
    }

    /// Replace both sides with an authoritative value
    pub fn reset(&mut self, value: T) {
        self.confirmed = Some(value.clone());
        self.local = value;
    }

    pub fn phase(&self) -> SyncPhase {
        if self.confirmed.as_ref() == Some(&self.local) {
            SyncPhase::ConfirmedRemotely
        } else {
            SyncPhase::AppliedLocally
        }
    }
}

/// A remote write that has not landed yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "write", rename_all = "snake_case")]
pub enum PendingWrite {
    Economy(EconomySnapshot),
    StatsDelta(StatsDelta),
    Completion(CompletionEvent),
}

impl PendingWrite {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Economy(_) => "economy",
            Self::StatsDelta(_) => "stats",
            Self::Completion(_) => "completion",
        }
    }
}

/// What the remote tier acknowledged
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Economy(EconomySnapshot),
    Stats(PlayerStats),
    Completion(ProgressRecord),
}

/// Queue of remote writes awaiting retry.
///
/// Economy snapshots coalesce (latest wins) and stats deltas coalesce by
/// summation; completion events keep their order.
#[derive(Debug, Default)]
pub struct PendingWrites {
    queue: VecDeque<PendingWrite>,
}

impl PendingWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a queue saved by an earlier session
    pub fn restore(writes: Vec<PendingWrite>) -> Self {
        let mut pending = Self::new();
        for write in writes {
            pending.push(write);
        }
        pending
    }

    /// Queue contents, oldest first, for saving
    pub fn to_vec(&self) -> Vec<PendingWrite> {
        self.queue.iter().cloned().collect()
    }

    /// Most recent queued currency snapshot
    pub fn latest_economy(&self) -> Option<EconomySnapshot> {
        self.queue.iter().rev().find_map(|w| match w {
            PendingWrite::Economy(snapshot) => Some(*snapshot),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingWrite> {
        self.queue.iter()
    }

    /// Queue a write, coalescing with an earlier one of the same kind
    pub fn push(&mut self, write: PendingWrite) {
        match write {
            PendingWrite::Economy(snapshot) => {
                self.queue.retain(|w| !matches!(w, PendingWrite::Economy(_)));
                self.queue.push_back(PendingWrite::Economy(snapshot));
            }
            PendingWrite::StatsDelta(delta) => {
                let existing = self.queue.iter_mut().find_map(|w| match w {
                    PendingWrite::StatsDelta(d) => Some(d),
                    _ => None,
                });
                match existing {
                    Some(d) => d.absorb(delta),
                    None => self.queue.push_back(PendingWrite::StatsDelta(delta)),
                }
            }
            PendingWrite::Completion(_) => self.queue.push_back(write),
        }
    }

    /// Retry queued writes in order, stopping at the first failure.
    ///
    /// Returns what landed; everything after a failure stays queued.
    pub fn flush<F>(&mut self, player_id: &str, mut perform: F) -> Vec<Applied>
    where
        F: FnMut(&PendingWrite) -> anyhow::Result<Applied>,
    {
        let mut applied = Vec::new();
        while let Some(write) = self.queue.front() {
            match perform(write) {
                Ok(done) => {
                    applied.push(done);
                    self.queue.pop_front();
                }
                Err(e) => {
                    tracing::warn!(
                        "Retry of {} write for {} failed, {} still pending: {:#}",
                        write.label(),
                        player_id,
                        self.queue.len(),
                        e
                    );
                    break;
                }
            }
        }
        applied
    }

    /// Sum of queued stats deltas
    pub fn pending_stats(&self) -> StatsDelta {
        let mut total = StatsDelta::default();
        for write in &self.queue {
            if let PendingWrite::StatsDelta(delta) = write {
                total.absorb(*delta);
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::db::LedgerDb;
    use crate::economy::remote::RemoteStore;
    use chrono::Utc;

    fn snap(energy: u32) -> EconomySnapshot {
        EconomySnapshot {
            energy,
            gems: 0,
            last_energy_update: Utc::now(),
        }
    }

    #[test]
    fn test_tracked_phases() {
        let mut tracked = Tracked::confirmed(3u32);
        assert_eq!(tracked.phase(), SyncPhase::ConfirmedRemotely);

        tracked.set(4);
        assert_eq!(tracked.phase(), SyncPhase::AppliedLocally);
        assert_eq!(*tracked.get(), 4);

        tracked.confirm(4);
        assert_eq!(tracked.phase(), SyncPhase::ConfirmedRemotely);

        assert_eq!(Tracked::unconfirmed(1u32).phase(), SyncPhase::AppliedLocally);
    }

    #[test]
    fn test_restore_keeps_latest_snapshot() {
        let saved = vec![
            PendingWrite::Economy(snap(5)),
            PendingWrite::StatsDelta(StatsDelta::points(10)),
            PendingWrite::Economy(snap(2)),
        ];
        let pending = PendingWrites::restore(saved);

        assert_eq!(pending.len(), 2);
        assert_eq!(pending.latest_economy().unwrap().energy, 2);
        assert_eq!(pending.pending_stats().points, 10);

        let json = serde_json::to_string(&pending.to_vec()).unwrap();
        let reloaded: Vec<PendingWrite> = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, pending.to_vec());
        assert!(PendingWrites::new().latest_economy().is_none());
    }

    #[test]
    fn test_economy_writes_coalesce() {
        let mut pending = PendingWrites::new();
        pending.push(PendingWrite::Economy(snap(5)));
        pending.push(PendingWrite::StatsDelta(StatsDelta::points(10)));
        pending.push(PendingWrite::Economy(snap(4)));
        pending.push(PendingWrite::StatsDelta(StatsDelta::points(5)));

        assert_eq!(pending.len(), 2);
        assert_eq!(pending.pending_stats().points, 15);
        let last = pending.iter().last().unwrap();
        assert!(matches!(last, PendingWrite::Economy(s) if s.energy == 4));
    }

    #[test]
    fn test_completions_keep_order() {
        let mut pending = PendingWrites::new();
        let now = Utc::now();
        let a = CompletionEvent::new("p1", "quiz", 10, 1, 1, true, now);
        let b = CompletionEvent::new("p1", "quiz", 10, 2, 1, true, now);
        pending.push(PendingWrite::Completion(a.clone()));
        pending.push(PendingWrite::Completion(b.clone()));

        let ids: Vec<_> = pending
            .iter()
            .filter_map(|w| match w {
                PendingWrite::Completion(e) => Some(e.event_id.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec![a.event_id, b.event_id]);
    }

    #[test]
    fn test_flush_drains_queue() {
        let db = LedgerDb::open_in_memory().unwrap();
        let mut pending = PendingWrites::new();
        pending.push(PendingWrite::Economy(snap(2)));
        pending.push(PendingWrite::StatsDelta(StatsDelta::points(7)));

        let applied = pending.flush("p1", |write| {
            Ok(match write {
                PendingWrite::Economy(s) => {
                    db.save_economy("p1", s)?;
                    Applied::Economy(*s)
                }
                PendingWrite::StatsDelta(d) => Applied::Stats(db.add_stats("p1", *d)?),
                PendingWrite::Completion(e) => Applied::Completion(db.record_completion(e)?),
            })
        });
        assert_eq!(applied.len(), 2);
        assert!(pending.is_empty());
        assert_eq!(db.load_economy("p1").unwrap().unwrap().energy, 2);
        assert_eq!(db.load_stats("p1").unwrap().unwrap().total_points, 7);
    }
}
