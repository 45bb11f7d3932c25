//! Settings configuration types

use std::path::PathBuf;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::economy::EnergyRegenerator;

/// Longest accepted recharge interval: one year
pub const MAX_REGEN_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

/// Player profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileSettings {
    /// Player id assigned at first login (generated when absent)
    #[serde(default)]
    pub player_id: Option<String>,
}

/// Energy capacity, recharge rate and prices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergySettings {
    /// Energy capacity
    #[serde(default = "default_max_energy")]
    pub max_energy: u32,

    /// Seconds to recharge one unit
    #[serde(default = "default_regen_interval_secs")]
    pub regen_interval_secs: u64,

    /// Energy spent to start one activity
    #[serde(default = "default_cost_per_play")]
    pub cost_per_play: u32,

    /// Gems charged for an instant full refill
    #[serde(default = "default_refill_cost")]
    pub refill_cost: u32,
}

fn default_max_energy() -> u32 {
    5
}

fn default_regen_interval_secs() -> u64 {
    30 * 60
}

fn default_cost_per_play() -> u32 {
    1
}

fn default_refill_cost() -> u32 {
    50
}

impl Default for EnergySettings {
    fn default() -> Self {
        Self {
            max_energy: default_max_energy(),
            regen_interval_secs: default_regen_interval_secs(),
            cost_per_play: default_cost_per_play(),
            refill_cost: default_refill_cost(),
        }
    }
}

impl EnergySettings {
    /// Recharge interval, capped at [`MAX_REGEN_INTERVAL_SECS`]
    pub fn regen_interval(&self) -> Duration {
        let secs = self.regen_interval_secs.min(MAX_REGEN_INTERVAL_SECS);
        Duration::seconds(secs as i64)
    }

    pub fn regenerator(&self) -> EnergyRegenerator {
        EnergyRegenerator::new(self.max_energy, self.regen_interval())
    }
}

/// Payout for one watched rewarded ad
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardSettings {
    #[serde(default = "default_ad_gems")]
    pub ad_gems: u32,

    /// Bonus energy per ad (capped at capacity)
    #[serde(default = "default_ad_energy")]
    pub ad_energy: u32,
}

fn default_ad_gems() -> u32 {
    5
}

fn default_ad_energy() -> u32 {
    1
}

impl Default for RewardSettings {
    fn default() -> Self {
        Self {
            ad_gems: default_ad_gems(),
            ad_energy: default_ad_energy(),
        }
    }
}

/// Storage locations; unset paths resolve under `~/.playledger/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite file holding the authoritative record
    #[serde(default)]
    pub ledger_db: Option<PathBuf>,

    /// Directory for the device-local snapshot cache
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regen_interval_is_capped() {
        let settings = EnergySettings {
            regen_interval_secs: u64::MAX,
            ..EnergySettings::default()
        };
        assert_eq!(
            settings.regen_interval(),
            Duration::seconds(MAX_REGEN_INTERVAL_SECS as i64)
        );
    }
}
