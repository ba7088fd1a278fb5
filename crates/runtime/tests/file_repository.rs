//! File-backed repositories surviving a runtime restart.
use std::path::Path;
use std::sync::Arc;

use anticheat_runtime::violation::CounterKey;
use anticheat_runtime::{
    AntiCheatConfig, BanSubject, ManualClock, PlayerIdentity, Repositories, Runtime,
    ViolationType,
};
use chrono::Duration;
use tempfile::TempDir;

const ACCOUNT: u32 = 5;
const CHARACTER: u32 = 50;

async fn start(dir: &Path, clock: Arc<ManualClock>) -> Runtime {
    let repositories = Repositories::file(dir).expect("repositories should open");
    Runtime::builder()
        .config(AntiCheatConfig::default())
        .repositories(repositories)
        .clock(clock)
        .enable_sweepers(false)
        .build()
        .await
        .expect("runtime should build")
}

fn speed_key() -> CounterKey {
    CounterKey {
        account_id: ACCOUNT,
        character_id: CHARACTER,
        violation_type: ViolationType::SpeedHack,
    }
}

#[tokio::test]
async fn test_state_survives_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let clock = Arc::new(ManualClock::default());
    let player = PlayerIdentity::new(ACCOUNT, CHARACTER, "10.1.1.1");

    // ================================================================
    // First run: three counted speed hacks and one banning duplication
    // ================================================================
    let runtime = start(temp_dir.path(), clock.clone()).await;
    let detector = runtime.detector();
    for _ in 0..3 {
        detector.detect_speed_hack(&player, 300.0, 100.0).unwrap();
        clock.advance(Duration::seconds(10));
    }
    let ban = detector
        .detect_duplication(&player, 2_070_000, "same serial twice")
        .unwrap()
        .and_then(|outcome| outcome.enforcement().and_then(|e| e.ban().cloned()))
        .expect("duplication bans");
    drop(detector);
    runtime.shutdown().await.expect("shutdown should succeed");

    assert!(temp_dir.path().join("bans.json").exists());
    assert!(temp_dir.path().join("violation_logs.jsonl").exists());

    // ================================================================
    // Second run over the same directory
    // ================================================================
    clock.advance(Duration::minutes(1));
    let runtime = start(temp_dir.path(), clock.clone()).await;

    let counter = runtime
        .detector()
        .counter(&speed_key())
        .unwrap()
        .expect("counter restored from mirror");
    assert_eq!(counter.count, 3);

    // Two more reports complete the window that began before the restart.
    let detector = runtime.detector();
    detector.detect_speed_hack(&player, 300.0, 100.0).unwrap();
    let outcome = detector
        .detect_speed_hack(&player, 300.0, 100.0)
        .unwrap()
        .expect("recorded");
    assert!(outcome.enforcement().is_some());

    let bans = runtime.bans();
    assert!(bans.is_account_banned(ACCOUNT).unwrap());
    assert!(bans.account_flagged(ACCOUNT).unwrap());
    let history = bans.ban_history(BanSubject::Character(CHARACTER), 10).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1], ban);

    let logs = detector.violation_history(CHARACTER, 10).unwrap();
    assert_eq!(logs.len(), 6);
    let duplication = logs
        .iter()
        .find(|row| row.event.violation_type == ViolationType::ItemDuplication)
        .expect("duplication logged");
    assert_eq!(
        duplication.action_taken.as_deref(),
        Some("Ban issued: item_duplication")
    );

    drop(detector);
    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn test_stale_counters_are_not_restored() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let clock = Arc::new(ManualClock::default());
    let player = PlayerIdentity::new(ACCOUNT, CHARACTER, "10.1.1.1");

    let runtime = start(temp_dir.path(), clock.clone()).await;
    runtime
        .detector()
        .detect_speed_hack(&player, 300.0, 100.0)
        .unwrap();
    runtime.shutdown().await.expect("shutdown should succeed");

    // Idle for more than twice the five-minute window.
    clock.advance(Duration::minutes(11));
    let runtime = start(temp_dir.path(), clock).await;
    assert_eq!(runtime.detector().counter(&speed_key()).unwrap(), None);
    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn test_corrupted_table_is_reported() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(temp_dir.path().join("bans.json"), b"not json").unwrap();

    let result = Repositories::file(temp_dir.path());
    assert!(matches!(
        result,
        Err(anticheat_runtime::RepositoryError::CorruptedData(_))
    ));
}
