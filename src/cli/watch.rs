//! Watch command: the periodic energy timer

use anyhow::Result;
use chrono::Utc;
use tokio::time::{interval, Duration};
use tracing::info;

use super::{format_duration, Globals};

/// Tick the session every `every_secs` until Ctrl-C
pub async fn watch_command(globals: &Globals, every_secs: u64) -> Result<()> {
    let mut session = globals.open_session()?;
    let mut ticker = interval(Duration::from_secs(every_secs.max(1)));
    let max_energy = session.config().energy.max_energy;

    info!("Watching {} every {}s", session.player_id(), every_secs);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Utc::now();
                let snapshot = session.tick(now);
                let next = session
                    .time_until_next_energy(now)
                    .map(|d| format!("next in {}", format_duration(d)))
                    .unwrap_or_else(|| "full".to_string());
                println!(
                    "[{}] energy {}/{} ({}), gems {}, pending {}",
                    now.format("%H:%M:%S"),
                    snapshot.energy,
                    max_energy,
                    next,
                    snapshot.gems,
                    session.pending().len()
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watch");
                break;
            }
        }
    }
    Ok(())
}
