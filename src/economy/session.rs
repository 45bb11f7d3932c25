//! Player session - the context object every economy operation runs through
//!
//! A session owns the in-memory tier for one player: the currency snapshot,
//! the running totals, and the queue of remote writes that have not landed.
//! Each operation updates local state first, then writes through to the
//! remote tier. Failed writes are queued and retried at the start of the
//! next operation; they never fail the operation itself. The queue is saved
//! beside the device cache so a later session picks it up.
//!
//! Other sessions may write the same player (a `watch` loop next to one-shot
//! commands). Whenever no currency write of its own is queued, a session
//! re-reads the remote snapshot before changing it.

use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};

use super::cache::DeviceCache;
use super::currency::{CurrencyStore, Initialized, SnapshotSource};
use super::energy::{credit_gems, EnergyRegenerator};
use super::error::{EconomyError, EconomyResult};
use super::models::{
    ChallengeClaim, CompletionEvent, EconomySnapshot, PlayerId, PlayerStats, ProgressRecord,
    PurchasePackage, StatsDelta,
};
use super::progress::ProgressLedger;
use super::remote::RemoteStore;
use super::rewards::RewardDispatcher;
use super::rounds::round_for;
use super::stats::{LedgerSummary, Recomputed, StatsAggregator};
use super::sync::{Applied, PendingWrite, PendingWrites, SyncPhase, Tracked};
use crate::config::Config;

/// An activity in progress; energy has already been spent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRun {
    pub activity_id: String,
    pub base_points: u32,
    pub started_at: DateTime<Utc>,
}

/// Result of recording a completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// Points paid for this event (not the stored best)
    pub points_earned: u64,
    /// Updated ledger row, `None` while the write is pending
    pub record: Option<ProgressRecord>,
    pub stats: PlayerStats,
}

/// Consistency of the session's state against the remote tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub economy: SyncPhase,
    pub stats: SyncPhase,
    pub pending: usize,
}

/// Per-session economy context for one player
pub struct Session {
    player_id: PlayerId,
    config: Config,
    regenerator: EnergyRegenerator,
    currency: CurrencyStore,
    ledger: ProgressLedger,
    aggregator: StatsAggregator,
    rewards: RewardDispatcher,
    source: SnapshotSource,
    economy: Tracked<EconomySnapshot>,
    stats: Tracked<PlayerStats>,
    /// Whether `stats` is based on totals read from the remote tier
    stats_loaded: bool,
    pending: PendingWrites,
}

impl Session {
    /// Open a session: reconcile the currency tiers, load totals, and apply
    /// any energy regenerated while the player was away
    pub fn open(
        player_id: &str,
        config: Config,
        remote: Arc<dyn RemoteStore>,
        cache: Arc<dyn DeviceCache>,
        now: DateTime<Utc>,
    ) -> Self {
        let regenerator = config.energy.regenerator();
        let currency = CurrencyStore::new(remote.clone(), cache);
        let aggregator = StatsAggregator::new(remote.clone());

        let mut pending = PendingWrites::restore(currency.load_pending(player_id));
        if !pending.is_empty() {
            tracing::info!("Restored {} undelivered writes for {}", pending.len(), player_id);
        }

        let init = match pending.latest_economy() {
            // A queued snapshot is newer than the remote record
            Some(snapshot) => Initialized {
                snapshot,
                source: SnapshotSource::LocalCache,
                remote_confirmed: false,
            },
            None => currency.initialize(player_id, regenerator.max_energy(), now),
        };
        let economy = if init.remote_confirmed {
            Tracked::confirmed(init.snapshot)
        } else {
            pending.push(PendingWrite::Economy(init.snapshot));
            Tracked::unconfirmed(init.snapshot)
        };

        let stored_stats = match aggregator.load(player_id) {
            Ok(stored) => Some(stored.unwrap_or_default()),
            Err(e) => {
                tracing::warn!("Remote stats read failed for {}: {:#}", player_id, e);
                None
            }
        };

        tracing::info!(
            "Session opened for {} (economy from {})",
            player_id,
            init.source.label()
        );

        let mut session = Self {
            player_id: player_id.to_string(),
            config,
            regenerator,
            currency,
            ledger: ProgressLedger::new(remote.clone()),
            aggregator,
            rewards: RewardDispatcher::new(remote),
            source: init.source,
            economy,
            stats: Tracked::unconfirmed(PlayerStats::default()),
            stats_loaded: false,
            pending,
        };

        match stored_stats {
            Some(stored) => session.rebase_stats(stored),
            None => {
                let mut local = PlayerStats::default();
                local.apply(session.pending.pending_stats());
                session.stats.set(local);
            }
        }

        let loaded = *session.economy.get();
        let clamped = session.regenerator.clamp(&loaded);
        if clamped != loaded {
            tracing::info!(
                "Energy for {} above capacity ({} > {}), clamping",
                player_id,
                loaded.energy,
                clamped.energy
            );
            session.commit_economy(clamped);
        }
        if !session.pending.is_empty() {
            session.save_pending();
        }

        session.refresh_energy(now);
        session
    }

    // ========================================
    // ACCESSORS
    // ========================================

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn economy(&self) -> EconomySnapshot {
        *self.economy.get()
    }

    pub fn stats(&self) -> PlayerStats {
        *self.stats.get()
    }

    /// Tier that supplied the snapshot when the session opened
    pub fn source(&self) -> SnapshotSource {
        self.source
    }

    pub fn pending(&self) -> &PendingWrites {
        &self.pending
    }

    pub fn sync_report(&self) -> SyncReport {
        SyncReport {
            economy: self.economy.phase(),
            stats: self.stats.phase(),
            pending: self.pending.len(),
        }
    }

    /// Countdown to the next energy unit; `None` when full
    pub fn time_until_next_energy(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.regenerator.time_until_next_unit(self.economy.get(), now)
    }

    // ========================================
    // WRITE PLUMBING
    // ========================================

    /// Retry queued remote writes in order, then pick up currency changes
    /// made by other sessions
    pub fn flush_pending(&mut self) -> usize {
        self.reload_stats_if_needed();
        let flushed = self.flush_queue();
        self.reload_economy();
        flushed
    }

    fn flush_queue(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }

        let (currency, ledger, aggregator) = (&self.currency, &self.ledger, &self.aggregator);
        let player_id = self.player_id.as_str();
        let applied = self.pending.flush(player_id, |write| {
            perform(currency, ledger, aggregator, player_id, write)
        });

        for done in &applied {
            self.on_applied(done);
        }
        if !applied.is_empty() {
            tracing::debug!(
                "Flushed {} pending writes for {} ({} left)",
                applied.len(),
                self.player_id,
                self.pending.len()
            );
            self.save_pending();
        }
        applied.len()
    }

    /// Adopt the remote snapshot when it moved under us.
    ///
    /// Skipped while a currency write of our own is queued, since that write
    /// is newer than the remote record.
    fn reload_economy(&mut self) {
        if self.pending.latest_economy().is_some() {
            return;
        }

        match self.currency.load_remote(&self.player_id) {
            Ok(Some(remote)) if remote != *self.economy.get() => {
                tracing::debug!("Economy for {} changed remotely, reloading", self.player_id);
                self.economy.reset(remote);
                self.currency.persist_local(&self.player_id, &remote);

                let clamped = self.regenerator.clamp(&remote);
                if clamped != remote {
                    self.commit_economy(clamped);
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("Economy reload failed for {}: {:#}", self.player_id, e);
            }
        }
    }

    fn save_pending(&self) {
        self.currency.persist_pending(&self.player_id, &self.pending.to_vec());
    }

    /// Totals could not be read at open; retry so local deltas get a baseline
    fn reload_stats_if_needed(&mut self) {
        if self.stats_loaded {
            return;
        }
        if let Ok(stored) = self.aggregator.load(&self.player_id) {
            self.rebase_stats(stored.unwrap_or_default());
        }
    }

    /// Adopt remote totals, keeping deltas that have not landed yet on top
    fn rebase_stats(&mut self, remote: PlayerStats) {
        let mut local = remote;
        local.apply(self.pending.pending_stats());
        self.stats.set(local);
        self.stats.confirm(remote);
        self.stats_loaded = true;
    }

    fn on_applied(&mut self, applied: &Applied) {
        match applied {
            Applied::Economy(snapshot) => self.economy.confirm(*snapshot),
            Applied::Stats(totals) => self.rebase_stats(*totals),
            Applied::Completion(_) => {}
        }
    }

    /// Attempt a remote write now, queueing it if it fails or if earlier
    /// writes are still waiting
    fn write_through(&mut self, write: PendingWrite) -> Option<Applied> {
        if !self.pending.is_empty() {
            self.pending.push(write);
            self.save_pending();
            return None;
        }

        match perform(
            &self.currency,
            &self.ledger,
            &self.aggregator,
            &self.player_id,
            &write,
        ) {
            Ok(applied) => {
                self.on_applied(&applied);
                Some(applied)
            }
            Err(e) => {
                tracing::warn!(
                    "Remote {} write failed for {}, queued for retry: {:#}",
                    write.label(),
                    self.player_id,
                    e
                );
                self.pending.push(write);
                self.save_pending();
                None
            }
        }
    }

    /// Apply a new snapshot locally and mirror it to the other tiers
    fn commit_economy(&mut self, next: EconomySnapshot) {
        self.economy.set(next);
        self.currency.persist_local(&self.player_id, &next);
        self.write_through(PendingWrite::Economy(next));
    }

    fn commit_stats(&mut self, delta: StatsDelta) {
        if delta.is_empty() {
            return;
        }
        let mut local = *self.stats.get();
        local.apply(delta);
        self.stats.set(local);
        self.write_through(PendingWrite::StatsDelta(delta));
    }

    fn activity(&self, activity_id: &str) -> EconomyResult<u32> {
        self.config
            .get_activity(activity_id)
            .map(|a| a.base_points)
            .ok_or_else(|| EconomyError::RecordNotFound(format!("activity {activity_id}")))
    }

    // ========================================
    // ENERGY
    // ========================================

    /// Apply regenerated energy; called on foreground, by the periodic tick,
    /// and before every spend
    pub fn refresh_energy(&mut self, now: DateTime<Utc>) -> EconomySnapshot {
        let current = *self.economy.get();
        let next = self.regenerator.regenerate(&current, now);
        if next != current {
            tracing::debug!(
                "Regenerated {} energy for {}",
                next.energy.saturating_sub(current.energy),
                self.player_id
            );
            self.commit_economy(next);
        }
        next
    }

    /// Periodic timer entry point
    pub fn tick(&mut self, now: DateTime<Utc>) -> EconomySnapshot {
        self.flush_pending();
        self.refresh_energy(now)
    }

    /// Spend gems on a full energy tank
    pub fn refill_energy(&mut self, now: DateTime<Utc>) -> EconomyResult<EconomySnapshot> {
        self.flush_pending();
        let current = self.refresh_energy(now);
        let cost = self.config.energy.refill_cost;
        let next = self.regenerator.refill_full(&current, cost, now)?;
        self.commit_economy(next);
        tracing::info!("{} refilled energy for {} gems", self.player_id, cost);
        Ok(next)
    }

    // ========================================
    // ACTIVITIES
    // ========================================

    /// Spend energy to start an activity
    pub fn start_activity(
        &mut self,
        activity_id: &str,
        now: DateTime<Utc>,
    ) -> EconomyResult<ActivityRun> {
        self.flush_pending();
        let base_points = self.activity(activity_id)?;
        let current = self.refresh_energy(now);
        let next = self
            .regenerator
            .consume(&current, self.config.energy.cost_per_play, now)?;
        self.commit_economy(next);

        Ok(ActivityRun {
            activity_id: activity_id.to_string(),
            base_points,
            started_at: now,
        })
    }

    /// Completion callback for a started activity
    pub fn on_activity_complete(
        &mut self,
        run: ActivityRun,
        score: u32,
        now: DateTime<Utc>,
    ) -> EconomyResult<CompletionOutcome> {
        let elapsed = (now - run.started_at).num_seconds().max(0);
        let time_spent_sec = u64::try_from(elapsed).unwrap_or(0);
        self.record_completion(&run.activity_id, score, time_spent_sec, true, now)
    }

    /// Record a completion event: ledger upsert, then stats accrual
    pub fn record_completion(
        &mut self,
        activity_id: &str,
        score: u32,
        time_spent_sec: u64,
        completed: bool,
        now: DateTime<Utc>,
    ) -> EconomyResult<CompletionOutcome> {
        self.flush_pending();
        let base_points = self.activity(activity_id)?;
        let event = CompletionEvent::new(
            &self.player_id,
            activity_id,
            base_points,
            score,
            time_spent_sec,
            completed,
            now,
        );

        let record = match self.write_through(PendingWrite::Completion(event.clone())) {
            Some(Applied::Completion(record)) => Some(record),
            _ => None,
        };

        let points_earned = event.points();
        self.commit_stats(event.stats_delta());

        tracing::debug!(
            "{} completed {} (score {}, +{} points)",
            self.player_id,
            activity_id,
            score,
            points_earned
        );

        Ok(CompletionOutcome {
            points_earned,
            record,
            stats: *self.stats.get(),
        })
    }

    /// Read a ledger row
    pub fn progress(&self, activity_id: &str) -> EconomyResult<ProgressRecord> {
        self.ledger.get(&self.player_id, activity_id)
    }

    pub fn progress_list(&self) -> EconomyResult<Vec<ProgressRecord>> {
        self.ledger
            .list(&self.player_id)
            .map_err(EconomyError::RemotePersistence)
    }

    pub fn ledger_summary(&self) -> EconomyResult<LedgerSummary> {
        self.aggregator
            .ledger_summary(&self.player_id)
            .map_err(EconomyError::RemotePersistence)
    }

    // ========================================
    // REWARDS
    // ========================================

    /// Rewarded-ad callback. Every call is exactly one grant.
    pub fn on_ad_rewarded(&mut self, now: DateTime<Utc>) -> EconomySnapshot {
        self.flush_pending();
        let current = self.refresh_energy(now);
        let rewards = &self.config.rewards;
        let next = credit_gems(
            &self.regenerator.grant(&current, rewards.ad_energy),
            rewards.ad_gems,
        );
        tracing::info!(
            "{} watched an ad (+{} gems, +{} energy)",
            self.player_id,
            next.gems.saturating_sub(current.gems),
            next.energy.saturating_sub(current.energy)
        );
        self.commit_economy(next);
        next
    }

    /// Purchase callback with a confirmed package
    pub fn on_purchase_confirmed(&mut self, package: &PurchasePackage) -> EconomySnapshot {
        self.flush_pending();
        let next = credit_gems(self.economy.get(), package.gem_amount);
        tracing::info!(
            "{} purchased {} (+{} gems)",
            self.player_id,
            package.id,
            package.gem_amount
        );
        self.commit_economy(next);
        next
    }

    /// Purchase a package from the configured catalog
    pub fn purchase(&mut self, package_id: &str) -> EconomyResult<EconomySnapshot> {
        let package = self
            .config
            .get_package(package_id)
            .map(|p| p.to_package(package_id))
            .ok_or_else(|| EconomyError::RecordNotFound(format!("package {package_id}")))?;
        Ok(self.on_purchase_confirmed(&package))
    }

    /// Claim a challenge reward for an explicit round.
    ///
    /// The claim row must land remotely; the points increment is optimistic.
    pub fn claim_challenge(
        &mut self,
        challenge_id: &str,
        round: u32,
        reward_points: u64,
        now: DateTime<Utc>,
    ) -> EconomyResult<ChallengeClaim> {
        if self.config.get_challenge(challenge_id).is_none() {
            return Err(EconomyError::RecordNotFound(format!("challenge {challenge_id}")));
        }

        self.flush_pending();
        let claim = self
            .rewards
            .claim(&self.player_id, challenge_id, round, reward_points, now)?;
        self.commit_stats(StatsDelta::points(reward_points));
        Ok(claim)
    }

    /// Claim a configured challenge for the round containing `now`
    pub fn claim_current(
        &mut self,
        challenge_id: &str,
        now: DateTime<Utc>,
    ) -> EconomyResult<ChallengeClaim> {
        let challenge = self
            .config
            .get_challenge(challenge_id)
            .ok_or_else(|| EconomyError::RecordNotFound(format!("challenge {challenge_id}")))?;
        let round = round_for(challenge.period, now);
        let reward_points = challenge.reward_points;
        self.claim_challenge(challenge_id, round, reward_points, now)
    }

    pub fn claims(&self) -> EconomyResult<Vec<ChallengeClaim>> {
        self.rewards
            .claims(&self.player_id)
            .map_err(EconomyError::RemotePersistence)
    }

    // ========================================
    // RECONCILIATION
    // ========================================

    /// Re-derive totals from the event log and claims, overwriting drifted
    /// stored totals. Refused while writes are still pending.
    pub fn recompute_stats(&mut self) -> EconomyResult<Recomputed> {
        self.flush_pending();
        if !self.pending.is_empty() {
            return Err(EconomyError::RemotePersistence(anyhow!(
                "{} writes still pending",
                self.pending.len()
            )));
        }

        let result = self
            .aggregator
            .recompute(&self.player_id)
            .map_err(EconomyError::RemotePersistence)?;
        self.stats.reset(result.stats);
        self.stats_loaded = true;
        Ok(result)
    }
}

/// Perform one remote write through the owning component
fn perform(
    currency: &CurrencyStore,
    ledger: &ProgressLedger,
    aggregator: &StatsAggregator,
    player_id: &str,
    write: &PendingWrite,
) -> anyhow::Result<Applied> {
    Ok(match write {
        PendingWrite::Economy(snapshot) => {
            currency.persist_remote(player_id, snapshot)?;
            Applied::Economy(*snapshot)
        }
        PendingWrite::StatsDelta(delta) => {
            Applied::Stats(aggregator.persist_delta(player_id, *delta)?)
        }
        PendingWrite::Completion(event) => Applied::Completion(ledger.upsert_completion(event)?.0),
    })
}
