//! CLI command implementations

pub mod init;
pub mod ledger;
pub mod play;
pub mod rewards;
pub mod shop;
pub mod status;
pub mod watch;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};

use playledger::config::Config;
use playledger::economy::{EconomyError, EconomyManager, Session};

/// Options shared by every command
pub struct Globals {
    pub config: Option<PathBuf>,
    pub player: Option<String>,
}

impl Globals {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(Config::global_config_path)
    }

    /// Load the config and open a session for the selected player
    pub fn open_session(&self) -> Result<Session> {
        let path = self.config_path();
        let config = Config::load_or_init(&path)?;
        let player_id = self
            .player
            .clone()
            .or_else(|| config.profile.player_id.clone())
            .with_context(|| format!("No player id in {}", path.display()))?;

        let manager = EconomyManager::new(&config)?;
        Ok(manager.open_session(&player_id, config, Utc::now()))
    }
}

/// Convert an economy failure for the CLI, printing the player hint first
pub fn surface(err: EconomyError) -> anyhow::Error {
    if let Some(hint) = err.prompt() {
        eprintln!("Hint: {}", hint);
    }
    err.into()
}

/// Warn when the last operation left writes queued
pub fn report_pending(session: &Session) {
    let pending = session.pending().len();
    if pending > 0 {
        eprintln!(
            "Warning: {} change(s) saved locally only; they will sync on the next command",
            pending
        );
    }
}

/// `1h 05m 09s` style countdown
pub fn format_duration(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else {
        format!("{}m {:02}s", m, s)
    }
}
