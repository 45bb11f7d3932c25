use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "playledger")]
#[command(about = "Energy, gems and points for a casual mini-game collection")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.playledger/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Act as this player instead of the one in the config
    #[arg(short, long, global = true)]
    player: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a config file with a new player id
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show energy, gems, points and sync state
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Spend energy on an activity and record the result
    Play {
        /// Activity id (see [activity.*] in the config)
        activity: String,

        /// Score reached
        #[arg(long, default_value_t = 0)]
        score: u32,

        /// Seconds spent in the activity (at most one day)
        #[arg(
            long,
            default_value_t = 60,
            value_parser = clap::value_parser!(u64).range(..=cli::play::MAX_PLAY_SECONDS)
        )]
        seconds: u64,

        /// Record an unfinished attempt (no points)
        #[arg(long)]
        abandon: bool,
    },

    /// Record a watched rewarded ad
    Ad,

    /// Buy a gem package (lists packages when omitted)
    Buy { package: Option<String> },

    /// Spend gems to refill energy to capacity
    Refill,

    /// Claim a challenge reward
    Claim {
        challenge: String,

        /// Round number (defaults to the current round)
        #[arg(long)]
        round: Option<u32>,
    },

    /// List challenges and whether this round is claimed
    Challenges,

    /// Show the progress ledger
    Progress {
        /// Only this activity
        activity: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-derive point totals from the completion log
    Recompute,

    /// Run the energy timer until interrupted
    Watch {
        /// Seconds between ticks
        #[arg(long, default_value_t = 60)]
        every: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let globals = cli::Globals {
        config: cli.config,
        player: cli.player,
    };

    match cli.command {
        Some(Commands::Init { force }) => {
            cli::init::init_command(&globals.config_path(), force, globals.player.clone())?;
        }
        Some(Commands::Status { json }) => {
            cli::status::status_command(&globals, json)?;
        }
        Some(Commands::Play {
            activity,
            score,
            seconds,
            abandon,
        }) => {
            cli::play::play_command(&globals, &activity, score, seconds, abandon)?;
        }
        Some(Commands::Ad) => {
            cli::shop::ad_command(&globals)?;
        }
        Some(Commands::Buy { package }) => {
            cli::shop::buy_command(&globals, package.as_deref())?;
        }
        Some(Commands::Refill) => {
            cli::play::refill_command(&globals)?;
        }
        Some(Commands::Claim { challenge, round }) => {
            cli::rewards::claim_command(&globals, &challenge, round)?;
        }
        Some(Commands::Challenges) => {
            cli::rewards::challenges_command(&globals)?;
        }
        Some(Commands::Progress { activity, json }) => {
            cli::ledger::progress_command(&globals, activity.as_deref(), json)?;
        }
        Some(Commands::Recompute) => {
            cli::ledger::recompute_command(&globals)?;
        }
        Some(Commands::Watch { every }) => {
            cli::watch::watch_command(&globals, every).await?;
        }
        None => {
            // Default: show status
            cli::status::status_command(&globals, false)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_seconds_are_bounded() {
        let cli = Cli::try_parse_from(["playledger", "play", "math-quiz", "--seconds", "86400"])
            .unwrap();
        assert!(matches!(cli.command, Some(Commands::Play { seconds: 86_400, .. })));

        let huge = u64::MAX.to_string();
        assert!(
            Cli::try_parse_from(["playledger", "play", "math-quiz", "--seconds", &huge]).is_err()
        );
    }
}
