//! Bridge from damage validation to violation reporting.
//!
//! The calculator only judges hits; the auditor gives every attack a fresh
//! seed, runs the calculator and reports each over-limit hit as an
//! `excessive_damage` violation.

use std::sync::Arc;

use combat_core::{
    AttackContext, CombatConfig, CombatEnv, DamageCalculator, DynCombatEnv, MobOracle,
    OracleError, PcgRng, RngOracle, SkillOracle, TargetResult,
};
use tracing::{debug, warn};

use crate::api::Result;
use crate::violation::{
    PlayerInfo, RecordOutcome, Severity, ViolationCategory, ViolationDetector, ViolationEvent,
    ViolationType,
};

/// Outcome of auditing one attack.
#[derive(Debug, Clone, PartialEq)]
pub enum AttackAudit {
    /// Context was missing; nothing was judged.
    Skipped { reason: OracleError },
    Judged {
        results: Vec<TargetResult>,
        /// One entry per reported invalid hit.
        outcomes: Vec<RecordOutcome>,
    },
}

impl AttackAudit {
    pub fn invalid_hits(&self) -> usize {
        match self {
            Self::Skipped { .. } => 0,
            Self::Judged { results, .. } => results
                .iter()
                .map(|target| target.invalid_hits().count())
                .sum(),
        }
    }

    pub fn outcomes(&self) -> &[RecordOutcome] {
        match self {
            Self::Skipped { .. } => &[],
            Self::Judged { outcomes, .. } => outcomes,
        }
    }
}

pub struct AttackAuditor {
    detector: Arc<ViolationDetector>,
    combat: CombatConfig,
}

impl AttackAuditor {
    pub fn new(detector: Arc<ViolationDetector>, combat: CombatConfig) -> Self {
        Self { detector, combat }
    }

    pub fn combat_config(&self) -> &CombatConfig {
        &self.combat
    }

    /// Validates `ctx` with a fresh seed and reports every invalid hit.
    pub fn audit(
        &self,
        player: &dyn PlayerInfo,
        mut ctx: AttackContext,
        mobs: &dyn MobOracle,
        skills: &dyn SkillOracle,
    ) -> Result<AttackAudit> {
        ctx.attack_seed = rand::random();

        let rng: &dyn RngOracle = &PcgRng;
        let env: DynCombatEnv<'_> = CombatEnv::new(mobs, skills, rng);

        let calculator = match DamageCalculator::new(&ctx, env, &self.combat) {
            Ok(calculator) => calculator,
            Err(reason) => {
                debug!(
                    target: "anticheat::audit",
                    character_id = ctx.attacker.character_id,
                    skill_id = ctx.skill_id,
                    "Attack skipped: {}", reason
                );
                return Ok(AttackAudit::Skipped { reason });
            }
        };

        let results = calculator.validate_attack();
        let report = self.detector.config().enabled
            && self
                .detector
                .config()
                .categories
                .is_enabled(ViolationCategory::Combat);

        let mut outcomes = Vec::new();
        for target in &results {
            if let TargetResult::Skipped { spawn_id, reason } = target {
                debug!(target: "anticheat::audit", spawn_id, "Target skipped: {}", reason);
                continue;
            }

            for hit in target.invalid_hits() {
                let accepted = self.combat.accepted_max(hit.max_damage);
                let details = format!(
                    "Skill ID: {}, Target: {}, Damage: {}, Computed max: {:.0} (accepted: {:.0})",
                    ctx.skill_id,
                    target.spawn_id(),
                    hit.client_damage,
                    hit.max_damage,
                    accepted
                );
                warn!(
                    target: "anticheat::audit",
                    character_id = ctx.attacker.character_id,
                    "Invalid hit: {}", details
                );

                if report {
                    let event = ViolationEvent::new(
                        player,
                        ViolationType::ExcessiveDamage,
                        ViolationCategory::Combat,
                        Severity::High,
                        details,
                        self.detector.now(),
                    );
                    outcomes.push(self.detector.record_violation(event)?);
                }
            }
        }

        Ok(AttackAudit::Judged { results, outcomes })
    }
}

#[cfg(test)]
mod tests {
    use combat_core::{
        AttackType, AttackerSnapshot, JobId, MobSnapshot, MobTable, SkillTable, TargetHits,
    };

    use super::*;
    use crate::ban::{BanService, Enforcer};
    use crate::clock::ManualClock;
    use crate::config::{AntiCheatConfig, CategoryToggles};
    use crate::repository::Repositories;
    use crate::violation::PlayerIdentity;

    fn auditor(config: AntiCheatConfig) -> AttackAuditor {
        let clock = Arc::new(ManualClock::default());
        let repos = Repositories::in_memory();
        let bans = Arc::new(BanService::new(&repos, &config, clock.clone()));
        let combat = config.combat();
        let detector = ViolationDetector::new(
            Arc::new(config),
            &repos,
            Arc::new(Enforcer::new(bans)),
            clock,
        );
        AttackAuditor::new(Arc::new(detector), combat)
    }

    fn punch(damages: Vec<i32>) -> AttackContext {
        let attacker = AttackerSnapshot::new(1, 50, JobId(0)).with_stats(100, 4, 4, 4);
        AttackContext::new(attacker, AttackType::Melee).with_target(TargetHits::new(9, damages))
    }

    fn mobs() -> MobTable {
        std::iter::once(MobSnapshot::new(9, 40, 5_000)).collect()
    }

    #[test]
    fn invalid_hits_are_reported() {
        let auditor = auditor(AntiCheatConfig::default());
        let player = PlayerIdentity::new(1, 1, "10.0.0.1");

        let audit = auditor
            .audit(&player, punch(vec![50, 500, 900]), &mobs(), &SkillTable::new())
            .unwrap();

        assert_eq!(audit.invalid_hits(), 2);
        assert_eq!(audit.outcomes().len(), 2);
        assert!(matches!(
            audit.outcomes()[1],
            RecordOutcome::Counted { count: 2, .. }
        ));
    }

    #[test]
    fn missing_mob_is_skipped_not_reported() {
        let auditor = auditor(AntiCheatConfig::default());
        let player = PlayerIdentity::new(1, 1, "10.0.0.1");

        let audit = auditor
            .audit(&player, punch(vec![99_999]), &MobTable::new(), &SkillTable::new())
            .unwrap();

        assert_eq!(audit.invalid_hits(), 0);
        assert!(audit.outcomes().is_empty());
    }

    #[test]
    fn unknown_skill_skips_the_attack() {
        let auditor = auditor(AntiCheatConfig::default());
        let player = PlayerIdentity::new(1, 1, "10.0.0.1");

        let audit = auditor
            .audit(
                &player,
                punch(vec![99_999]).with_skill(1_001_004, 20),
                &mobs(),
                &SkillTable::new(),
            )
            .unwrap();

        assert!(matches!(
            audit,
            AttackAudit::Skipped {
                reason: OracleError::SkillNotFound { .. }
            }
        ));
    }

    #[test]
    fn combat_toggle_silences_reports() {
        let auditor = auditor(AntiCheatConfig {
            categories: CategoryToggles {
                combat: false,
                ..CategoryToggles::default()
            },
            ..AntiCheatConfig::default()
        });
        let player = PlayerIdentity::new(1, 1, "10.0.0.1");

        let audit = auditor
            .audit(&player, punch(vec![500]), &mobs(), &SkillTable::new())
            .unwrap();

        assert_eq!(audit.invalid_hits(), 1);
        assert!(audit.outcomes().is_empty());
    }
}
