//! Energy regeneration
//!
//! Pure functions over [`EconomySnapshot`]. Safe to evaluate redundantly from
//! any call site: app foreground, the periodic tick, and before every spend.

use chrono::{DateTime, Duration, Utc};

use super::error::{EconomyError, EconomyResult};
use super::models::EconomySnapshot;

/// Capacity and recharge rate for energy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergyRegenerator {
    max_energy: u32,
    regen_interval: Duration,
}

impl EnergyRegenerator {
    pub fn new(max_energy: u32, regen_interval: Duration) -> Self {
        Self {
            max_energy,
            regen_interval,
        }
    }

    pub fn max_energy(&self) -> u32 {
        self.max_energy
    }

    pub fn regen_interval(&self) -> Duration {
        self.regen_interval
    }

    /// Bring a loaded snapshot back within capacity.
    ///
    /// Snapshots stored under a larger `max_energy`, or edited by hand, can
    /// hold more than the tank allows.
    pub fn clamp(&self, snapshot: &EconomySnapshot) -> EconomySnapshot {
        let mut next = *snapshot;
        next.energy = snapshot.energy.min(self.max_energy);
        next
    }

    /// Whole regen units elapsed since the snapshot's clock
    fn elapsed_units(&self, snapshot: &EconomySnapshot, now: DateTime<Utc>) -> i64 {
        let interval_ms = self.regen_interval.num_milliseconds();
        if interval_ms <= 0 {
            return 0;
        }
        let elapsed_ms = (now - snapshot.last_energy_update).num_milliseconds();
        elapsed_ms.div_euclid(interval_ms)
    }

    /// Apply all whole regen units accrued up to `now`.
    ///
    /// The clock advances by exactly `units * interval`, never to `now`, so the
    /// partial progress toward the next unit survives repeated calls.
    pub fn regenerate(&self, snapshot: &EconomySnapshot, now: DateTime<Utc>) -> EconomySnapshot {
        if snapshot.energy >= self.max_energy {
            return *snapshot;
        }

        let units = self.elapsed_units(snapshot, now);
        if units <= 0 {
            return *snapshot;
        }

        let gained = u32::try_from(units).unwrap_or(u32::MAX);
        let mut next = *snapshot;
        next.energy = snapshot.energy.saturating_add(gained).min(self.max_energy);
        // `units` fits in i32 comfortably for any realistic gap; clamp anyway
        let advance = i32::try_from(units).unwrap_or(i32::MAX);
        next.last_energy_update = snapshot.last_energy_update + self.regen_interval * advance;
        next
    }

    /// Spend energy.
    ///
    /// Spending from a full tank starts the regen clock at `now`; spending from
    /// a partially recharged tank keeps the clock where it is.
    pub fn consume(
        &self,
        snapshot: &EconomySnapshot,
        amount: u32,
        now: DateTime<Utc>,
    ) -> EconomyResult<EconomySnapshot> {
        if snapshot.energy < amount {
            return Err(EconomyError::InsufficientEnergy {
                needed: amount,
                available: snapshot.energy,
            });
        }

        let mut next = *snapshot;
        next.energy -= amount;
        if snapshot.energy >= self.max_energy {
            next.last_energy_update = now;
        }
        Ok(next)
    }

    /// Buy a full tank with gems
    pub fn refill_full(
        &self,
        snapshot: &EconomySnapshot,
        cost: u32,
        now: DateTime<Utc>,
    ) -> EconomyResult<EconomySnapshot> {
        if snapshot.gems < cost {
            return Err(EconomyError::InsufficientGems {
                needed: cost,
                available: snapshot.gems,
            });
        }

        Ok(EconomySnapshot {
            energy: self.max_energy,
            gems: snapshot.gems - cost,
            last_energy_update: now,
        })
    }

    /// Add bonus energy (e.g. from an ad), capped at capacity
    pub fn grant(&self, snapshot: &EconomySnapshot, amount: u32) -> EconomySnapshot {
        let mut next = *snapshot;
        if snapshot.energy < self.max_energy {
            next.energy = snapshot.energy.saturating_add(amount).min(self.max_energy);
        }
        next
    }

    /// Time remaining until the next energy unit; `None` when full
    pub fn time_until_next_unit(
        &self,
        snapshot: &EconomySnapshot,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        let current = self.regenerate(snapshot, now);
        if current.energy >= self.max_energy {
            return None;
        }
        let since = now - current.last_energy_update;
        if since < Duration::zero() {
            return Some(self.regen_interval);
        }
        Some(self.regen_interval - since)
    }
}

/// Add gems without overflowing
pub fn credit_gems(snapshot: &EconomySnapshot, amount: u32) -> EconomySnapshot {
    let mut next = *snapshot;
    next.gems = snapshot.gems.saturating_add(amount);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    fn regen() -> EnergyRegenerator {
        EnergyRegenerator::new(5, Duration::hours(2))
    }

    fn snap(energy: u32, gems: u32) -> EconomySnapshot {
        EconomySnapshot {
            energy,
            gems,
            last_energy_update: t0(),
        }
    }

    #[test]
    fn test_clamp_caps_overfull_snapshot() {
        let clamped = regen().clamp(&snap(9, 12));
        assert_eq!(clamped.energy, 5);
        assert_eq!(clamped.gems, 12);
        assert_eq!(clamped.last_energy_update, t0());
        assert_eq!(regen().clamp(&snap(3, 0)), snap(3, 0));
    }

    #[test]
    fn test_regenerate_keeps_remainder() {
        let next = regen().regenerate(&snap(2, 0), t0() + Duration::hours(5));
        assert_eq!(next.energy, 4);
        assert_eq!(next.last_energy_update, t0() + Duration::hours(4));
    }

    #[test]
    fn test_regenerate_idempotent_for_fixed_now() {
        let now = t0() + Duration::minutes(317);
        let once = regen().regenerate(&snap(1, 0), now);
        let twice = regen().regenerate(&once, now);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_regenerate_caps_at_max() {
        let next = regen().regenerate(&snap(3, 0), t0() + Duration::hours(48));
        assert_eq!(next.energy, 5);
    }

    #[test]
    fn test_regenerate_full_is_noop() {
        let full = snap(5, 0);
        assert_eq!(regen().regenerate(&full, t0() + Duration::hours(9)), full);
    }

    #[test]
    fn test_regenerate_ignores_clock_going_backwards() {
        let s = snap(1, 0);
        assert_eq!(regen().regenerate(&s, t0() - Duration::hours(3)), s);
    }

    #[test]
    fn test_consume_from_full_restarts_clock() {
        let now = t0() + Duration::hours(7);
        let next = regen().consume(&snap(5, 0), 1, now).unwrap();
        assert_eq!(next.energy, 4);
        assert_eq!(next.last_energy_update, now);
    }

    #[test]
    fn test_consume_from_partial_keeps_clock() {
        let now = t0() + Duration::minutes(90);
        let next = regen().consume(&snap(3, 0), 1, now).unwrap();
        assert_eq!(next.energy, 2);
        assert_eq!(next.last_energy_update, t0());
    }

    #[test]
    fn test_consume_insufficient() {
        let err = regen().consume(&snap(0, 0), 1, t0()).unwrap_err();
        assert!(matches!(
            err,
            EconomyError::InsufficientEnergy {
                needed: 1,
                available: 0
            }
        ));
    }

    #[test]
    fn test_refill_requires_gems() {
        let s = snap(1, 30);
        let err = regen().refill_full(&s, 50, t0()).unwrap_err();
        assert!(matches!(err, EconomyError::InsufficientGems { .. }));
        assert_eq!(s.gems, 30);

        let now = t0() + Duration::minutes(10);
        let filled = regen().refill_full(&snap(1, 80), 50, now).unwrap();
        assert_eq!(filled.energy, 5);
        assert_eq!(filled.gems, 30);
        assert_eq!(filled.last_energy_update, now);
    }

    #[test]
    fn test_grant_is_capped() {
        assert_eq!(regen().grant(&snap(4, 0), 3).energy, 5);
        assert_eq!(regen().grant(&snap(1, 0), 2).energy, 3);
    }

    #[test]
    fn test_countdown_to_next_unit() {
        let r = regen();
        let s = snap(2, 0);
        assert_eq!(
            r.time_until_next_unit(&s, t0() + Duration::minutes(30)),
            Some(Duration::minutes(90))
        );
        // Crossing a unit boundary keeps the remainder
        assert_eq!(
            r.time_until_next_unit(&s, t0() + Duration::minutes(150)),
            Some(Duration::minutes(90))
        );
        assert_eq!(r.time_until_next_unit(&snap(5, 0), t0()), None);
    }

    #[test]
    fn test_energy_stays_in_range_over_mixed_sequence() {
        let r = regen();
        let mut s = snap(5, 200);
        let mut now = t0();
        for step in 0..200u32 {
            now += Duration::minutes(i64::from(step % 7) * 13);
            s = r.regenerate(&s, now);
            s = match step % 5 {
                0 | 1 => r.consume(&s, 1, now).unwrap_or(s),
                2 => r.grant(&s, 2),
                3 => r.consume(&s, 3, now).unwrap_or(s),
                _ => r.refill_full(&s, 10, now).unwrap_or(s),
            };
            assert!(s.energy <= r.max_energy());
        }
    }
}
