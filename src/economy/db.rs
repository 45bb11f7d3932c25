//! SQLite ledger database
//!
//! Holds the authoritative player record (`~/.playledger/ledger.db` by
//! default) with automatic schema migration.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};

use super::models::{
    ChallengeClaim, ClaimInsert, ClaimKey, CompletionEvent, EconomySnapshot, PlayerStats,
    ProgressRecord, StatsDelta,
};
use super::remote::RemoteStore;

/// Database wrapper shared between session components
#[derive(Clone)]
pub struct LedgerDb {
    conn: Arc<Mutex<Connection>>,
}

impl LedgerDb {
    /// Open or create the ledger database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create ledger dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open ledger db: {}", path.display()))?;

        // WAL so sessions in other processes can read while one writes
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory ledger db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Lock the connection
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Ledger DB lock poisoned"))
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA_SQL)?;
        drop(conn);
        self.run_migrations()?;
        Ok(())
    }

    /// Run any pending migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        let version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |r| r.get(0),
            )
            .unwrap_or(0);

        // Migration 2: completion event log
        if version < 2 {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS completion_events (
                    event_id TEXT PRIMARY KEY,
                    player_id TEXT NOT NULL,
                    activity_id TEXT NOT NULL,
                    base_points INTEGER NOT NULL,
                    score INTEGER NOT NULL,
                    time_spent_sec INTEGER NOT NULL,
                    completed INTEGER NOT NULL,
                    occurred_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_events_player ON completion_events(player_id);
                "#,
            )?;
            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (2)", [])?;
        }

        Ok(())
    }

    /// Current schema version
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.conn()?;
        let version = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )?;
        Ok(version)
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn utc_from_ms(idx: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
}

fn progress_from_row(row: &Row<'_>) -> rusqlite::Result<ProgressRecord> {
    Ok(ProgressRecord {
        player_id: row.get(0)?,
        activity_id: row.get(1)?,
        best_score: row.get(2)?,
        completed: row.get::<_, i32>(3)? != 0,
        cumulative_time_spent_sec: row.get(4)?,
        updated_at: utc_from_ms(5, row.get(5)?)?,
    })
}

fn claim_from_row(row: &Row<'_>) -> rusqlite::Result<ChallengeClaim> {
    Ok(ChallengeClaim {
        key: ClaimKey {
            player_id: row.get(0)?,
            challenge_id: row.get(1)?,
            round: row.get(2)?,
        },
        reward_points: row.get(3)?,
        claimed_at: utc_from_ms(4, row.get(4)?)?,
    })
}

const PROGRESS_COLUMNS: &str =
    "player_id, activity_id, best_score, completed, cumulative_time_sec, updated_at";

fn query_progress(
    conn: &Connection,
    player_id: &str,
    activity_id: &str,
) -> Result<Option<ProgressRecord>> {
    let record = conn
        .query_row(
            &format!(
                "SELECT {PROGRESS_COLUMNS} FROM progress WHERE player_id = ?1 AND activity_id = ?2"
            ),
            (player_id, activity_id),
            progress_from_row,
        )
        .optional()?;
    Ok(record)
}

fn query_stats(conn: &Connection, player_id: &str) -> Result<Option<PlayerStats>> {
    let stats = conn
        .query_row(
            "SELECT total_points, completed_count FROM players WHERE player_id = ?1",
            [player_id],
            |r| {
                Ok(PlayerStats {
                    total_points: r.get(0)?,
                    completed_count: r.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(stats)
}

impl RemoteStore for LedgerDb {
    fn load_economy(&self, player_id: &str) -> Result<Option<EconomySnapshot>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT energy, gems, last_energy_update FROM players WHERE player_id = ?1",
                [player_id],
                |r| {
                    Ok((
                        r.get::<_, Option<u32>>(0)?,
                        r.get::<_, Option<u32>>(1)?,
                        r.get::<_, Option<i64>>(2)?,
                    ))
                },
            )
            .optional()?;

        // A row created by stats or claim writes has no currency columns yet
        let Some((Some(energy), Some(gems), Some(last_ms))) = row else {
            return Ok(None);
        };
        let last_energy_update = DateTime::from_timestamp_millis(last_ms)
            .ok_or_else(|| anyhow!("Invalid last_energy_update for {player_id}: {last_ms}"))?;

        Ok(Some(EconomySnapshot {
            energy,
            gems,
            last_energy_update,
        }))
    }

    fn save_economy(&self, player_id: &str, snapshot: &EconomySnapshot) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"INSERT INTO players (player_id, energy, gems, last_energy_update, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT(player_id) DO UPDATE SET
                   energy = ?2, gems = ?3, last_energy_update = ?4, updated_at = ?5"#,
            rusqlite::params![
                player_id,
                snapshot.energy,
                snapshot.gems,
                snapshot.last_energy_update.timestamp_millis(),
                now_ms(),
            ],
        )?;
        Ok(())
    }

    fn load_stats(&self, player_id: &str) -> Result<Option<PlayerStats>> {
        let conn = self.conn()?;
        query_stats(&conn, player_id)
    }

    fn save_stats(&self, player_id: &str, stats: &PlayerStats) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"INSERT INTO players (player_id, total_points, completed_count, updated_at)
               VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(player_id) DO UPDATE SET
                   total_points = ?2, completed_count = ?3, updated_at = ?4"#,
            rusqlite::params![player_id, stats.total_points, stats.completed_count, now_ms()],
        )?;
        Ok(())
    }

    fn add_stats(&self, player_id: &str, delta: StatsDelta) -> Result<PlayerStats> {
        let conn = self.conn()?;
        conn.execute(
            r#"INSERT INTO players (player_id, total_points, completed_count, updated_at)
               VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(player_id) DO UPDATE SET
                   total_points = total_points + ?2,
                   completed_count = completed_count + ?3,
                   updated_at = ?4"#,
            rusqlite::params![player_id, delta.points, delta.completions, now_ms()],
        )?;
        query_stats(&conn, player_id)?
            .ok_or_else(|| anyhow!("Player row missing after stats update: {player_id}"))
    }

    fn record_completion(&self, event: &CompletionEvent) -> Result<ProgressRecord> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            r#"INSERT OR IGNORE INTO completion_events
               (event_id, player_id, activity_id, base_points, score, time_spent_sec, completed, occurred_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
            rusqlite::params![
                event.event_id,
                event.player_id,
                event.activity_id,
                event.base_points,
                event.score,
                event.time_spent_sec,
                event.completed as i32,
                event.occurred_at.timestamp_millis(),
            ],
        )?;

        let existing = query_progress(&tx, &event.player_id, &event.activity_id)?;
        if inserted == 0 {
            if let Some(record) = existing {
                // Replayed event: already folded into the row
                tx.commit()?;
                return Ok(record);
            }
        }

        let record = ProgressRecord::merged(existing, event);
        tx.execute(
            r#"INSERT INTO progress
               (player_id, activity_id, best_score, completed, cumulative_time_sec, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(player_id, activity_id) DO UPDATE SET
                   best_score = ?3, completed = ?4, cumulative_time_sec = ?5, updated_at = ?6"#,
            rusqlite::params![
                record.player_id,
                record.activity_id,
                record.best_score,
                record.completed as i32,
                record.cumulative_time_spent_sec,
                record.updated_at.timestamp_millis(),
            ],
        )?;
        tx.commit()?;
        Ok(record)
    }

    fn load_progress(&self, player_id: &str, activity_id: &str) -> Result<Option<ProgressRecord>> {
        let conn = self.conn()?;
        query_progress(&conn, player_id, activity_id)
    }

    fn list_progress(&self, player_id: &str) -> Result<Vec<ProgressRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress WHERE player_id = ?1 ORDER BY activity_id"
        ))?;
        let records = stmt
            .query_map([player_id], progress_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn list_completions(&self, player_id: &str) -> Result<Vec<CompletionEvent>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT event_id, player_id, activity_id, base_points, score, time_spent_sec,
                      completed, occurred_at
               FROM completion_events WHERE player_id = ?1
               ORDER BY occurred_at, rowid"#,
        )?;
        let events = stmt
            .query_map([player_id], |r| {
                Ok(CompletionEvent {
                    event_id: r.get(0)?,
                    player_id: r.get(1)?,
                    activity_id: r.get(2)?,
                    base_points: r.get(3)?,
                    score: r.get(4)?,
                    time_spent_sec: r.get(5)?,
                    completed: r.get::<_, i32>(6)? != 0,
                    occurred_at: utc_from_ms(7, r.get(7)?)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    fn find_claim(&self, key: &ClaimKey) -> Result<Option<ChallengeClaim>> {
        let conn = self.conn()?;
        let claim = conn
            .query_row(
                r#"SELECT player_id, challenge_id, round, reward_points, claimed_at
                   FROM challenge_claims
                   WHERE player_id = ?1 AND challenge_id = ?2 AND round = ?3"#,
                rusqlite::params![key.player_id, key.challenge_id, key.round],
                claim_from_row,
            )
            .optional()?;
        Ok(claim)
    }

    fn insert_claim(&self, claim: &ChallengeClaim) -> Result<ClaimInsert> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            r#"INSERT OR IGNORE INTO challenge_claims
               (player_id, challenge_id, round, reward_points, claimed_at)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            rusqlite::params![
                claim.key.player_id,
                claim.key.challenge_id,
                claim.key.round,
                claim.reward_points,
                claim.claimed_at.timestamp_millis(),
            ],
        )?;
        Ok(if inserted == 0 {
            ClaimInsert::Duplicate
        } else {
            ClaimInsert::Inserted
        })
    }

    fn list_claims(&self, player_id: &str) -> Result<Vec<ChallengeClaim>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT player_id, challenge_id, round, reward_points, claimed_at
               FROM challenge_claims WHERE player_id = ?1
               ORDER BY claimed_at, challenge_id, round"#,
        )?;
        let claims = stmt
            .query_map([player_id], claim_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(claims)
    }
}

/// SQL schema for the ledger database
const SCHEMA_SQL: &str = r#"
-- One row per player: currency snapshot and running totals
CREATE TABLE IF NOT EXISTS players (
    player_id TEXT PRIMARY KEY,
    energy INTEGER,
    gems INTEGER,
    last_energy_update INTEGER,
    total_points INTEGER NOT NULL DEFAULT 0,
    completed_count INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL
);

-- Personal bests, one row per (player, activity)
CREATE TABLE IF NOT EXISTS progress (
    player_id TEXT NOT NULL,
    activity_id TEXT NOT NULL,
    best_score INTEGER NOT NULL DEFAULT 0,
    completed INTEGER NOT NULL DEFAULT 0,
    cumulative_time_sec INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (player_id, activity_id)
);

-- Append-only challenge claims; the key is the double-claim guard
CREATE TABLE IF NOT EXISTS challenge_claims (
    player_id TEXT NOT NULL,
    challenge_id TEXT NOT NULL,
    round INTEGER NOT NULL,
    reward_points INTEGER NOT NULL,
    claimed_at INTEGER NOT NULL,
    PRIMARY KEY (player_id, challenge_id, round)
);

-- Schema version
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);
"#;
