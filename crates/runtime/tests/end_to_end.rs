//! Attack audit through to ban issuance on a fully built runtime.
use std::sync::Arc;

use anticheat_runtime::{
    AntiCheatConfig, BanCheck, BanTarget, BanType, IpBanMode, ManualClock, PlayerIdentity,
    RecordOutcome, Runtime, ViolationType,
};
use chrono::Duration;
use combat_core::{
    AttackContext, AttackType, AttackerSnapshot, JobId, MobSnapshot, MobTable, SkillTable,
    TargetHits,
};

const ACCOUNT: u32 = 1_001;
const CHARACTER: u32 = 2_002;
const IP: &str = "203.0.113.7";

async fn runtime(config: AntiCheatConfig, clock: Arc<ManualClock>) -> Runtime {
    Runtime::builder()
        .config(config)
        .clock(clock)
        .enable_sweepers(false)
        .build()
        .await
        .expect("runtime should build")
}

/// Level-50 bare-handed attacker with 100 STR punching a level-40 mob.
fn punch(reported: i32) -> AttackContext {
    let attacker = AttackerSnapshot::new(CHARACTER, 50, JobId(0)).with_stats(100, 4, 4, 4);
    AttackContext::new(attacker, AttackType::Melee).with_target(TargetHits::new(9, vec![reported]))
}

fn mobs() -> MobTable {
    std::iter::once(MobSnapshot::new(9, 40, 5_000)).collect()
}

#[tokio::test]
async fn test_fifth_excessive_hit_issues_seven_day_ban() {
    let clock = Arc::new(ManualClock::default());
    let runtime = runtime(AntiCheatConfig::default(), clock.clone()).await;
    let auditor = runtime.auditor();
    let player = PlayerIdentity::new(ACCOUNT, CHARACTER, IP);

    for minute in 0..4 {
        let audit = auditor
            .audit(&player, punch(500), &mobs(), &SkillTable::new())
            .expect("audit should succeed");
        assert_eq!(audit.invalid_hits(), 1);
        assert!(matches!(
            audit.outcomes(),
            [RecordOutcome::Counted { count, threshold: 5 }] if *count == minute + 1
        ));
        clock.advance(Duration::minutes(1));
    }

    let audit = auditor
        .audit(&player, punch(500), &mobs(), &SkillTable::new())
        .expect("audit should succeed");
    let ban = audit.outcomes()[0]
        .enforcement()
        .and_then(|e| e.ban())
        .cloned()
        .expect("fifth violation should ban");

    assert_eq!(ban.ban_type, BanType::Temporary);
    assert_eq!(ban.target, BanTarget::Account);
    assert_eq!(ban.character_id, Some(CHARACTER));
    assert_eq!(ban.ban_end, Some(ban.ban_start + Duration::days(7)));
    assert_eq!(
        ban.reason,
        "Anti-cheat: excessive_damage violation detected (5 occurrences within window)"
    );
    // Temporary ban under the default permanent-only IP policy.
    assert_eq!(ban.ip_address, None);

    let bans = runtime.bans();
    assert!(bans.is_account_banned(ACCOUNT).unwrap());
    assert!(!bans.is_ip_banned(IP).unwrap());
    assert_eq!(
        bans.is_banned(ACCOUNT, "", "").unwrap(),
        BanCheck::Banned {
            ban_id: ban.id,
            reason: ban.reason.clone()
        }
    );

    let history = runtime.detector().violation_history(CHARACTER, 10).unwrap();
    assert_eq!(history.len(), 5);
    assert!(history.iter().all(|row| {
        row.event.violation_type == ViolationType::ExcessiveDamage
            && row.action_taken.as_deref() == Some("Ban issued: excessive_damage")
    }));

    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn test_always_policy_attaches_ip_to_temporary_ban() {
    let clock = Arc::new(ManualClock::default());
    let config = AntiCheatConfig {
        ip_ban_mode: IpBanMode::Always,
        ..AntiCheatConfig::default()
    };
    let runtime = runtime(config, clock).await;
    let auditor = runtime.auditor();
    let player = PlayerIdentity::new(ACCOUNT, CHARACTER, IP);

    let outcome = (0..5)
        .map(|_| {
            auditor
                .audit(&player, punch(500), &mobs(), &SkillTable::new())
                .expect("audit should succeed")
        })
        .last()
        .expect("five audits");

    let ban = outcome.outcomes()[0]
        .enforcement()
        .and_then(|e| e.ban())
        .cloned()
        .expect("fifth violation should ban");
    assert_eq!(ban.ip_address.as_deref(), Some(IP));

    // Another account on the same address is rejected at connect time.
    assert!(runtime.bans().is_banned(9_999, IP, "").unwrap().is_banned());

    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn test_hits_within_tolerance_are_silent() {
    let clock = Arc::new(ManualClock::default());
    let runtime = runtime(AntiCheatConfig::default(), clock).await;
    let player = PlayerIdentity::new(ACCOUNT, CHARACTER, IP);

    let audit = runtime
        .auditor()
        .audit(&player, punch(60), &mobs(), &SkillTable::new())
        .expect("audit should succeed");

    assert_eq!(audit.invalid_hits(), 0);
    assert!(audit.outcomes().is_empty());
    assert!(
        runtime
            .detector()
            .violation_history(CHARACTER, 10)
            .unwrap()
            .is_empty()
    );

    runtime.shutdown().await.expect("shutdown should succeed");
}

#[tokio::test]
async fn test_disabled_runtime_records_nothing() {
    let clock = Arc::new(ManualClock::default());
    let config = AntiCheatConfig {
        enabled: false,
        ..AntiCheatConfig::default()
    };
    let runtime = runtime(config, clock).await;
    let player = PlayerIdentity::new(ACCOUNT, CHARACTER, IP);

    let audit = runtime
        .auditor()
        .audit(&player, punch(5_000), &mobs(), &SkillTable::new())
        .expect("audit should succeed");

    // The hit is still judged; nothing is reported.
    assert_eq!(audit.invalid_hits(), 1);
    assert!(audit.outcomes().is_empty());

    runtime.shutdown().await.expect("shutdown should succeed");
}
