//! Reward dispatcher - one-shot challenge claims
//!
//! A claim is two independent writes: insert the claim row, then increment
//! the player's points. The store's key uniqueness is the authoritative
//! double-claim guard; the increment is left to the caller so it can be queued.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::error::{EconomyError, EconomyResult};
use super::models::{ChallengeClaim, ClaimInsert, ClaimKey};
use super::remote::RemoteStore;

#[derive(Clone)]
pub struct RewardDispatcher {
    remote: Arc<dyn RemoteStore>,
}

impl RewardDispatcher {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    /// Record a claim row. Fails with `AlreadyClaimed` if the key exists.
    ///
    /// Only the claim row is written here; crediting `reward_points` is the
    /// caller's second write.
    pub fn claim(
        &self,
        player_id: &str,
        challenge_id: &str,
        round: u32,
        reward_points: u64,
        now: DateTime<Utc>,
    ) -> EconomyResult<ChallengeClaim> {
        let key = ClaimKey {
            player_id: player_id.to_string(),
            challenge_id: challenge_id.to_string(),
            round,
        };
        let already_claimed = || EconomyError::AlreadyClaimed {
            challenge_id: challenge_id.to_string(),
            round,
        };

        if self
            .remote
            .find_claim(&key)
            .map_err(EconomyError::RemotePersistence)?
            .is_some()
        {
            return Err(already_claimed());
        }

        let claim = ChallengeClaim {
            key,
            reward_points,
            claimed_at: now,
        };
        match self
            .remote
            .insert_claim(&claim)
            .map_err(EconomyError::RemotePersistence)?
        {
            ClaimInsert::Inserted => {
                tracing::info!(
                    "Claim recorded: {} {} round {} (+{} points)",
                    player_id,
                    challenge_id,
                    round,
                    reward_points
                );
                Ok(claim)
            }
            // Lost a race between lookup and insert
            ClaimInsert::Duplicate => Err(already_claimed()),
        }
    }

    pub fn is_claimed(&self, key: &ClaimKey) -> anyhow::Result<bool> {
        Ok(self.remote.find_claim(key)?.is_some())
    }

    pub fn claims(&self, player_id: &str) -> anyhow::Result<Vec<ChallengeClaim>> {
        self.remote.list_claims(player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::db::LedgerDb;

    #[test]
    fn test_duplicate_claim_rejected() {
        let dispatcher = RewardDispatcher::new(Arc::new(LedgerDb::open_in_memory().unwrap()));
        let now = Utc::now();

        dispatcher.claim("p1", "daily1", 1, 50, now).unwrap();
        let err = dispatcher.claim("p1", "daily1", 1, 50, now).unwrap_err();
        assert!(matches!(err, EconomyError::AlreadyClaimed { round: 1, .. }));
        assert_eq!(dispatcher.claims("p1").unwrap().len(), 1);
    }

    #[test]
    fn test_keys_are_scoped() {
        let dispatcher = RewardDispatcher::new(Arc::new(LedgerDb::open_in_memory().unwrap()));
        let now = Utc::now();

        dispatcher.claim("p1", "daily1", 1, 50, now).unwrap();
        dispatcher.claim("p1", "daily1", 2, 50, now).unwrap();
        dispatcher.claim("p1", "weekly", 1, 200, now).unwrap();
        dispatcher.claim("p2", "daily1", 1, 50, now).unwrap();

        assert_eq!(dispatcher.claims("p1").unwrap().len(), 3);
        assert!(dispatcher
            .is_claimed(&ClaimKey {
                player_id: "p2".into(),
                challenge_id: "daily1".into(),
                round: 1,
            })
            .unwrap());
    }
}
