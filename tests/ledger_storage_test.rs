//! On-disk storage tests: SQLite ledger plus JSON device cache

use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

use playledger::config::Config;
use playledger::economy::{EconomyManager, SnapshotSource, SyncPhase};

fn config_in(dir: &TempDir) -> Config {
    let mut config = Config::with_defaults();
    config.profile.player_id = Some("disk-player".to_string());
    config.storage.ledger_db = Some(dir.path().join("data").join("ledger.db"));
    config.storage.cache_dir = Some(dir.path().join("cache"));
    config
}

#[test]
fn test_balances_survive_restart() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = config_in(&dir);
    let now = Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap();

    {
        let manager = EconomyManager::new(&config).unwrap();
        let mut session = manager.open_session("disk-player", config.clone(), now);
        assert_eq!(session.source(), SnapshotSource::Fresh);

        let run = session.start_activity("minesweeper", now).unwrap();
        session
            .on_activity_complete(run, 25, now + Duration::seconds(120))
            .unwrap();
        session.on_ad_rewarded(now);
        session.claim_current("welcome", now).unwrap();
    }

    assert!(dir.path().join("data").join("ledger.db").exists());
    assert!(dir.path().join("cache").join("disk-player.json").exists());

    let manager = EconomyManager::new(&config).unwrap();
    let session = manager.open_session("disk-player", config.clone(), now);
    assert_eq!(session.source(), SnapshotSource::Remote);
    assert_eq!(session.economy().gems, 5);
    assert_eq!(session.economy().energy, 5);
    assert_eq!(session.stats().total_points, 50 + 25 + 100);
    assert_eq!(session.stats().completed_count, 1);
    assert_eq!(session.progress("minesweeper").unwrap().best_score, 25);
    assert_eq!(session.sync_report().stats, SyncPhase::ConfirmedRemotely);
}

#[test]
fn test_config_roundtrip_points_at_storage() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.toml");
    config_in(&dir).save_to_file(&path).unwrap();

    let loaded = Config::load_or_init(&path).unwrap();
    assert_eq!(loaded.profile.player_id.as_deref(), Some("disk-player"));
    assert_eq!(
        loaded.ledger_db_path(),
        dir.path().join("data").join("ledger.db")
    );
    assert_eq!(loaded.cache_dir(), dir.path().join("cache"));
}
