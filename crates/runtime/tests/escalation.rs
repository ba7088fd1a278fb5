//! Temporary bans escalating to a single permanent ban.
use std::sync::Arc;

use anticheat_runtime::ban::ESCALATION_ISSUER;
use anticheat_runtime::{
    AntiCheatConfig, BanRequest, BanSubject, BanType, Enforcement, ManualClock, PlayerIdentity,
    RecordOutcome, Runtime, ViolationDetector,
};
use chrono::Duration;

const ACCOUNT: u32 = 42;

async fn start(config: AntiCheatConfig) -> (Runtime, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let runtime = Runtime::builder()
        .config(config)
        .clock(clock.clone())
        .enable_sweepers(false)
        .build()
        .await
        .expect("runtime should build");
    (runtime, clock)
}

/// Five speed-hack reports in a row: enough for one temporary ban.
fn trip_speed_hack(detector: &ViolationDetector, player: &PlayerIdentity) -> RecordOutcome {
    let mut last = None;
    for _ in 0..5 {
        last = detector
            .detect_speed_hack(player, 250.0, 100.0)
            .expect("detection should succeed");
    }
    last.expect("speed hack over margin is always recorded")
}

#[tokio::test]
async fn test_three_temporary_bans_escalate_once() {
    let (runtime, clock) = start(AntiCheatConfig::default()).await;
    let detector = runtime.detector();
    let player = PlayerIdentity::new(ACCOUNT, 7, "198.51.100.4");

    // ================================================================
    // Two temporary bans: no escalation yet
    // ================================================================
    for _ in 0..2 {
        let outcome = trip_speed_hack(&detector, &player);
        let enforcement = outcome.enforcement().expect("threshold reached");
        assert_eq!(enforcement.ban().map(|b| b.ban_type), Some(BanType::Temporary));
        assert_eq!(enforcement.escalated(), None);
        clock.advance(Duration::hours(1));
    }

    // ================================================================
    // Third temporary ban: exactly one permanent ban follows
    // ================================================================
    let outcome = trip_speed_hack(&detector, &player);
    let enforcement = outcome.enforcement().expect("threshold reached");
    let permanent = enforcement.escalated().cloned().expect("should escalate");
    assert_eq!(permanent.ban_type, BanType::Permanent);
    assert_eq!(permanent.issued_by, ESCALATION_ISSUER);
    assert_eq!(permanent.reason, "Automatic escalation after 3 temporary bans");
    assert_eq!(permanent.ban_end, None);
    assert_eq!(permanent.ip_address, None);

    let bans = runtime.bans();
    let record = bans.escalation_record(ACCOUNT).unwrap().expect("record exists");
    assert_eq!(record.temp_ban_count, 3);
    assert!(record.permanent_ban_issued);

    // ================================================================
    // Fourth breach: suppressed, nothing new stored
    // ================================================================
    clock.advance(Duration::hours(1));
    let outcome = trip_speed_hack(&detector, &player);
    assert_eq!(
        outcome.enforcement(),
        Some(&Enforcement::Suppressed {
            permanent_ban_id: Some(permanent.id)
        })
    );

    let history = bans.ban_history(BanSubject::Account(ACCOUNT), 10).unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(
        history.iter().filter(|ban| ban.is_permanent()).count(),
        1,
        "exactly one permanent ban"
    );
    assert_eq!(history[0].id, permanent.id);

    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn test_unban_keeps_escalation_state() {
    let (runtime, clock) = start(AntiCheatConfig::default()).await;
    let detector = runtime.detector();
    let player = PlayerIdentity::new(ACCOUNT, 7, "198.51.100.4");

    for _ in 0..3 {
        trip_speed_hack(&detector, &player);
        clock.advance(Duration::hours(1));
    }

    let bans = runtime.bans();
    let lifted = bans.unban_account(ACCOUNT, "GM_Appeal").unwrap();
    assert_eq!(lifted, 4, "three temporary bans and the permanent one");
    assert!(!bans.is_account_banned(ACCOUNT).unwrap());
    assert!(!bans.account_flagged(ACCOUNT).unwrap());

    let record = bans.escalation_record(ACCOUNT).unwrap().expect("record exists");
    assert_eq!(record.temp_ban_count, 3);
    assert!(record.permanent_ban_issued);

    // The account stays escalated: further automated temporary bans are
    // suppressed even though nothing is in force.
    let permanent_id = bans
        .ban_history(BanSubject::Account(ACCOUNT), 10)
        .unwrap()
        .iter()
        .find(|ban| ban.is_permanent())
        .map(|ban| ban.id);
    let outcome = trip_speed_hack(&detector, &player);
    assert_eq!(
        outcome.enforcement(),
        Some(&Enforcement::Suppressed {
            permanent_ban_id: permanent_id
        })
    );
    assert!(!bans.is_account_banned(ACCOUNT).unwrap());
    assert_eq!(bans.ban_history(BanSubject::Account(ACCOUNT), 10).unwrap().len(), 4);

    // GM bans are never suppressed.
    let gm = runtime
        .enforcer()
        .enforce(BanRequest::account(ACCOUNT, BanType::Temporary, "appeal revoked").by_gm("GM_Eve"))
        .unwrap();
    assert!(gm.ban().is_some());

    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn test_gm_bans_count_only_when_configured() {
    let (runtime, _) = start(AntiCheatConfig::default()).await;
    let enforcer = runtime.enforcer();

    for _ in 0..3 {
        let request = BanRequest::account(ACCOUNT, BanType::Temporary, "botting")
            .by_gm("GM_Dana");
        let enforcement = enforcer.enforce(request).unwrap();
        assert_eq!(enforcement.escalated(), None);
    }
    assert_eq!(runtime.bans().escalation_record(ACCOUNT).unwrap(), None);
    runtime.shutdown().await.expect("shutdown should succeed");

    let config = AntiCheatConfig {
        gm_bans_increment_counter: true,
        ..AntiCheatConfig::default()
    };
    let (runtime, _) = start(config).await;
    let enforcer = runtime.enforcer();
    let escalated = (0..3)
        .filter_map(|_| {
            let request =
                BanRequest::account(ACCOUNT, BanType::Temporary, "botting")
                    .by_gm("GM_Dana");
            enforcer.enforce(request).unwrap().escalated().cloned()
        })
        .count();
    assert_eq!(escalated, 1);

    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn test_single_duplication_bans_permanently_with_ip() {
    let (runtime, _) = start(AntiCheatConfig::default()).await;
    let player = PlayerIdentity::new(ACCOUNT, 7, "198.51.100.4");

    let outcome = runtime
        .detector()
        .detect_duplication(&player, 1_302_000, "duplicate serial")
        .unwrap()
        .expect("duplication is always recorded");
    let ban = outcome
        .enforcement()
        .and_then(|e| e.ban())
        .cloned()
        .expect("first duplication bans");

    assert!(ban.is_permanent());
    assert_eq!(ban.ip_address.as_deref(), Some("198.51.100.4"));
    // Permanent bans never feed the escalation counter.
    assert_eq!(runtime.bans().escalation_record(ACCOUNT).unwrap(), None);

    runtime.shutdown().await.expect("shutdown should succeed");
}
