//! Catalog entries: activities, gem packages and challenges

use serde::{Deserialize, Serialize};

use crate::economy::{ChallengePeriod, PurchasePackage};

/// A mini-game as the economy sees it: an id and a fixed base point value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Display name
    #[serde(default)]
    pub name: String,

    /// Points paid on every completion, on top of the score
    pub base_points: u32,
}

/// A purchasable gem package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
    pub gem_amount: u32,

    /// Shown to the player; purchases are confirmed client-side
    #[serde(default)]
    pub price_label: String,
}

impl PackageConfig {
    pub fn to_package(&self, id: &str) -> PurchasePackage {
        PurchasePackage {
            id: id.to_string(),
            gem_amount: self.gem_amount,
        }
    }
}

/// A time-boxed challenge paying points once per round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub period: ChallengePeriod,

    pub reward_points: u64,
}

pub(super) fn default_activities() -> Vec<(&'static str, &'static str, u32)> {
    vec![
        ("math-quiz", "Arithmetic Quiz", 40),
        ("memory-match", "Memory Match", 30),
        ("word-puzzle", "Word Puzzle", 35),
        ("tic-tac-toe", "Tic-Tac-Toe", 20),
        ("minesweeper", "Minesweeper", 50),
        ("liquid-sort", "Liquid Sort", 45),
    ]
}

pub(super) fn default_packages() -> Vec<(&'static str, u32, &'static str)> {
    vec![
        ("handful", 100, "$0.99"),
        ("pouch", 550, "$4.99"),
        ("chest", 1200, "$9.99"),
    ]
}

pub(super) fn default_challenges() -> Vec<(&'static str, &'static str, ChallengePeriod, u64)> {
    vec![
        ("daily-bonus", "Daily Bonus", ChallengePeriod::Daily, 50),
        ("weekly-marathon", "Weekly Marathon", ChallengePeriod::Weekly, 300),
        ("welcome", "Welcome Gift", ChallengePeriod::Once, 100),
    ]
}
