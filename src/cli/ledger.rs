//! Progress ledger and recompute commands

use anyhow::Result;

use super::{surface, Globals};

/// Show ledger rows, or a single activity's row
pub fn progress_command(globals: &Globals, activity_id: Option<&str>, json: bool) -> Result<()> {
    let session = globals.open_session()?;

    let records = match activity_id {
        Some(id) => vec![session.progress(id).map_err(surface)?],
        None => session.progress_list().map_err(surface)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No activities played yet.");
        return Ok(());
    }

    println!(
        "{:<16} {:>6} {:>10} {:>10} {:<16}",
        "ACTIVITY", "BEST", "COMPLETED", "TIME (s)", "UPDATED"
    );
    println!("{}", "-".repeat(62));
    for record in &records {
        println!(
            "{:<16} {:>6} {:>10} {:>10} {:<16}",
            record.activity_id,
            record.best_score,
            if record.completed { "yes" } else { "no" },
            record.cumulative_time_spent_sec,
            record.updated_at.format("%Y-%m-%d %H:%M")
        );
    }

    if activity_id.is_none() {
        let summary = session.ledger_summary().map_err(surface)?;
        println!(
            "\n{} played, {} completed, best scores sum to {}",
            summary.activities_played, summary.completed_activities, summary.best_score_sum
        );
    }
    Ok(())
}

/// Re-derive point totals from the completion log and claims
pub fn recompute_command(globals: &Globals) -> Result<()> {
    let mut session = globals.open_session()?;
    let result = session.recompute_stats().map_err(surface)?;

    if result.healed() {
        let before = result.previous.unwrap_or_default();
        println!(
            "Totals corrected: {} -> {} points, {} -> {} completions",
            before.total_points,
            result.stats.total_points,
            before.completed_count,
            result.stats.completed_count
        );
    } else {
        println!(
            "Totals consistent: {} points, {} completions",
            result.stats.total_points, result.stats.completed_count
        );
    }
    Ok(())
}
