//! Error taxonomy for economy operations
//!
//! Validation failures (balance checks, duplicate claims) are surfaced to the
//! player. Persistence failures are mostly swallowed by the session and only
//! reach callers where a remote write is not optimistic.

/// Errors returned by economy operations
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    #[error("Not enough energy: need {needed}, have {available}")]
    InsufficientEnergy { needed: u32, available: u32 },

    #[error("Not enough gems: need {needed}, have {available}")]
    InsufficientGems { needed: u32, available: u32 },

    #[error("Challenge {challenge_id} round {round} already claimed")]
    AlreadyClaimed { challenge_id: String, round: u32 },

    #[error("Remote persistence failed: {0:#}")]
    RemotePersistence(anyhow::Error),

    #[error("Record not found: {0}")]
    RecordNotFound(String),
}

impl EconomyError {
    /// Short hint for the player on how to resolve a validation failure
    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            Self::InsufficientEnergy { .. } => Some("Wait for energy to recharge or watch an ad"),
            Self::InsufficientGems { .. } => Some("Watch an ad or buy a gem package"),
            Self::AlreadyClaimed { .. } => Some("Come back for the next round"),
            Self::RemotePersistence(_) | Self::RecordNotFound(_) => None,
        }
    }
}

pub type EconomyResult<T> = std::result::Result<T, EconomyError>;
