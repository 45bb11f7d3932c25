//! Init command implementation

use anyhow::{bail, Result};
use std::path::Path;
use tracing::info;

use playledger::config::Config;

/// Write a default config with a freshly assigned player id
pub fn init_command(path: &Path, force: bool, player: Option<String>) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    let mut config = Config::with_defaults();
    config.profile.player_id =
        Some(player.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()));
    config.save_to_file(path)?;

    info!("Created configuration at {}", path.display());
    println!("Created {}", path.display());
    if let Some(player_id) = &config.profile.player_id {
        println!("Player id: {}", player_id);
    }
    println!("Ledger:    {}", config.ledger_db_path().display());
    println!("Cache:     {}", config.cache_dir().display());
    Ok(())
}
