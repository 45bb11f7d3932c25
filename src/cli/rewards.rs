//! Challenge commands

use anyhow::Result;
use chrono::Utc;

use playledger::economy::{round_for, time_until_next_round, ClaimKey, EconomyError};

use super::{format_duration, report_pending, surface, Globals};

/// Claim a challenge for the current round, or an explicit one
pub fn claim_command(globals: &Globals, challenge_id: &str, round: Option<u32>) -> Result<()> {
    let mut session = globals.open_session()?;
    let now = Utc::now();

    let claim = match round {
        Some(round) => match session.config().get_challenge(challenge_id) {
            Some(challenge) => {
                let reward_points = challenge.reward_points;
                session.claim_challenge(challenge_id, round, reward_points, now)
            }
            None => Err(EconomyError::RecordNotFound(format!("challenge {challenge_id}"))),
        },
        None => session.claim_current(challenge_id, now),
    }
    .map_err(surface)?;

    println!(
        "Claimed {} round {} (+{} points, total {})",
        claim.key.challenge_id,
        claim.key.round,
        claim.reward_points,
        session.stats().total_points
    );
    report_pending(&session);
    Ok(())
}

/// List configured challenges with their state in the current round
pub fn challenges_command(globals: &Globals) -> Result<()> {
    let session = globals.open_session()?;
    let now = Utc::now();
    let claims = session.claims().map_err(surface)?;

    println!("Challenges:\n");
    for (id, challenge) in &session.config().challenge {
        let key = ClaimKey {
            player_id: session.player_id().to_string(),
            challenge_id: id.clone(),
            round: round_for(challenge.period, now),
        };
        let state = if claims.iter().any(|c| c.key == key) {
            "claimed"
        } else {
            "open"
        };
        let resets = time_until_next_round(challenge.period, now)
            .map(|d| format!(", resets in {}", format_duration(d)))
            .unwrap_or_default();

        println!(
            "  {:<16} {:<7} {:>5} points  round {} {}{}",
            id,
            challenge.period.as_str(),
            challenge.reward_points,
            key.round,
            state,
            resets
        );
    }
    Ok(())
}
