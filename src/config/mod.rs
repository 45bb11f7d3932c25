//! Configuration loading and management

mod catalog;
mod io;
mod settings;

pub use catalog::{ActivityConfig, ChallengeConfig, PackageConfig};
pub(crate) use io::write_atomic;
pub use settings::{
    EnergySettings, ProfileSettings, RewardSettings, StorageSettings, MAX_REGEN_INTERVAL_SECS,
};

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Player profile
    #[serde(default)]
    pub profile: ProfileSettings,

    /// Energy capacity and prices
    #[serde(default)]
    pub energy: EnergySettings,

    /// Rewarded-ad payout
    #[serde(default)]
    pub rewards: RewardSettings,

    /// Storage locations
    #[serde(default)]
    pub storage: StorageSettings,

    /// Activities by id
    #[serde(default)]
    pub activity: BTreeMap<String, ActivityConfig>,

    /// Gem packages by id
    #[serde(default)]
    pub package: BTreeMap<String, PackageConfig>,

    /// Challenges by id
    #[serde(default)]
    pub challenge: BTreeMap<String, ChallengeConfig>,
}

impl Config {
    /// Create a config with sensible defaults
    pub fn with_defaults() -> Self {
        let mut config = Self::default();

        for (id, name, base_points) in catalog::default_activities() {
            config.activity.insert(
                id.to_string(),
                ActivityConfig {
                    name: name.to_string(),
                    base_points,
                },
            );
        }

        for (id, gem_amount, price_label) in catalog::default_packages() {
            config.package.insert(
                id.to_string(),
                PackageConfig {
                    gem_amount,
                    price_label: price_label.to_string(),
                },
            );
        }

        for (id, name, period, reward_points) in catalog::default_challenges() {
            config.challenge.insert(
                id.to_string(),
                ChallengeConfig {
                    name: name.to_string(),
                    period,
                    reward_points,
                },
            );
        }

        config
    }

    /// Reject settings the economy cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.energy.max_energy == 0 {
            bail!("energy.max_energy must be at least 1");
        }
        if self.energy.regen_interval_secs == 0 {
            bail!("energy.regen_interval_secs must be at least 1");
        }
        if self.energy.regen_interval_secs > MAX_REGEN_INTERVAL_SECS {
            bail!(
                "energy.regen_interval_secs ({}) exceeds one year ({})",
                self.energy.regen_interval_secs,
                MAX_REGEN_INTERVAL_SECS
            );
        }
        if self.energy.cost_per_play > self.energy.max_energy {
            bail!(
                "energy.cost_per_play ({}) exceeds energy.max_energy ({})",
                self.energy.cost_per_play,
                self.energy.max_energy
            );
        }
        Ok(())
    }

    pub fn get_activity(&self, id: &str) -> Option<&ActivityConfig> {
        self.activity.get(id)
    }

    pub fn get_package(&self, id: &str) -> Option<&PackageConfig> {
        self.package.get(id)
    }

    pub fn get_challenge(&self, id: &str) -> Option<&ChallengeConfig> {
        self.challenge.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::with_defaults();
        config.validate().unwrap();
        assert_eq!(config.get_activity("math-quiz").unwrap().base_points, 40);
        assert!(config.get_package("pouch").is_some());
        assert!(config.get_challenge("daily-bonus").is_some());
    }

    #[test]
    fn test_validate_rejects_huge_interval() {
        let mut config = Config::with_defaults();
        config.energy.regen_interval_secs = u64::MAX;
        assert!(config.validate().is_err());

        config.energy.regen_interval_secs = MAX_REGEN_INTERVAL_SECS;
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [energy]
            max_energy = 8

            [activity.sudoku]
            base_points = 60

            [challenge.streak]
            period = "weekly"
            reward_points = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.energy.max_energy, 8);
        assert_eq!(config.energy.regen_interval_secs, 1800);
        assert_eq!(config.rewards.ad_gems, 5);
        assert_eq!(config.activity["sudoku"].base_points, 60);
        assert_eq!(
            config.challenge["streak"].period,
            crate::economy::ChallengePeriod::Weekly
        );
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::with_defaults();
        config.energy.regen_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
