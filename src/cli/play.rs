//! Play and refill commands

use anyhow::Result;
use chrono::{Duration, Utc};

use super::{report_pending, surface, Globals};

/// Longest accepted activity duration
pub const MAX_PLAY_SECONDS: u64 = 24 * 60 * 60;

/// Spend energy on an activity and record its result.
///
/// The CLI has no game loop, so the score and duration come from arguments.
pub fn play_command(
    globals: &Globals,
    activity_id: &str,
    score: u32,
    seconds: u64,
    abandoned: bool,
) -> Result<()> {
    let mut session = globals.open_session()?;
    let started_at = Utc::now();
    let run = session
        .start_activity(activity_id, started_at)
        .map_err(surface)?;

    let seconds = seconds.min(MAX_PLAY_SECONDS);
    let finished_at = started_at + Duration::seconds(seconds as i64);
    let outcome = if abandoned {
        session.record_completion(activity_id, score, seconds, false, finished_at)
    } else {
        session.on_activity_complete(run, score, finished_at)
    }
    .map_err(surface)?;

    println!(
        "{} {} with score {} (+{} points)",
        if abandoned { "Abandoned" } else { "Completed" },
        activity_id,
        score,
        outcome.points_earned
    );
    if let Some(record) = &outcome.record {
        println!(
            "  Best score {}, {}s played in total",
            record.best_score, record.cumulative_time_spent_sec
        );
    }
    println!(
        "  Energy {}, total points {}",
        session.economy().energy,
        outcome.stats.total_points
    );
    report_pending(&session);
    Ok(())
}

/// Spend gems on a full energy refill
pub fn refill_command(globals: &Globals) -> Result<()> {
    let mut session = globals.open_session()?;
    let snapshot = session.refill_energy(Utc::now()).map_err(surface)?;
    println!(
        "Energy refilled to {} ({} gems left)",
        snapshot.energy, snapshot.gems
    );
    report_pending(&session);
    Ok(())
}
