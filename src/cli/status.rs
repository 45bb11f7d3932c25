//! Status command implementation

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use playledger::economy::{EconomySnapshot, PlayerStats, SyncPhase};

use super::{format_duration, Globals};

#[derive(Serialize)]
struct StatusView<'a> {
    player_id: &'a str,
    economy: EconomySnapshot,
    max_energy: u32,
    next_energy_in_secs: Option<i64>,
    stats: PlayerStats,
    source: &'static str,
    economy_synced: bool,
    stats_synced: bool,
    pending_writes: usize,
}

fn phase_label(phase: SyncPhase) -> &'static str {
    match phase {
        SyncPhase::ConfirmedRemotely => "synced",
        SyncPhase::AppliedLocally => "local only",
    }
}

/// Show balances, totals and sync state for the current player
pub fn status_command(globals: &Globals, json: bool) -> Result<()> {
    let mut session = globals.open_session()?;
    let now = Utc::now();
    session.tick(now);

    let economy = session.economy();
    let stats = session.stats();
    let report = session.sync_report();
    let max_energy = session.config().energy.max_energy;
    let next_energy = session.time_until_next_energy(now);

    if json {
        let view = StatusView {
            player_id: session.player_id(),
            economy,
            max_energy,
            next_energy_in_secs: next_energy.map(|d| d.num_seconds()),
            stats,
            source: session.source().label(),
            economy_synced: report.economy == SyncPhase::ConfirmedRemotely,
            stats_synced: report.stats == SyncPhase::ConfirmedRemotely,
            pending_writes: report.pending,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("Player {}\n", session.player_id());
    match next_energy {
        Some(wait) => println!(
            "  Energy:      {}/{} (next in {})",
            economy.energy,
            max_energy,
            format_duration(wait)
        ),
        None => println!("  Energy:      {}/{} (full)", economy.energy, max_energy),
    }
    println!("  Gems:        {}", economy.gems);
    println!("  Points:      {}", stats.total_points);
    println!("  Completions: {}", stats.completed_count);
    println!();
    println!(
        "  Sync:        economy {}, stats {}, {} pending",
        phase_label(report.economy),
        phase_label(report.stats),
        report.pending
    );
    println!("  Loaded from: {}", session.source().label());

    Ok(())
}
