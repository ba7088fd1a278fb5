//! Attack validation entry point.
//!
//! # Hit pipeline
//!
//! ```text
//! 1. special-formula skill      -> own rolled envelope, done
//! 2. magic vs magic-immune mob  -> exactly 1, done
//! 3. miss roll                  -> 0, done
//! 4. base range (weapon/stat formula)
//! 5. element amplification      (magic only)
//! 6. defense reduction          (50%..60% of capped defense, floor 0)
//! 7. skill damage% x critical multiplier
//! 8. clamp to [1, 99999]
//! 9. multi-target after-modifier
//! 10. floor
//! ```
//!
//! The order fixes which draw each step consumes, so it is part of the
//! contract. A report is valid iff `client <= max * (1 + tolerance)`;
//! under-reporting is never flagged.

use crate::config::CombatConfig;
use crate::env::{DynCombatEnv, MobSnapshot, OracleError, Roller, SkillLevelData};
use crate::weapon::WeaponType;

use super::context::{AttackContext, AttackType};
use super::result::{CalcHitResult, DamageRange, TargetResult};

/// Per-attack damage oracle.
///
/// Resolves skill, mastery, critical skill, and weapon attack once at
/// construction; each target then gets its own [`Roller`].
pub struct DamageCalculator<'a> {
    pub(super) ctx: &'a AttackContext,
    pub(super) env: DynCombatEnv<'a>,
    pub(super) config: &'a CombatConfig,
    pub(super) weapon: WeaponType,
    pub(super) skill: Option<SkillLevelData>,
    pub(super) crit_skill: Option<SkillLevelData>,
    pub(super) mastery: f64,
    pub(super) watk: f64,
}

impl<'a> DamageCalculator<'a> {
    /// Prepares a calculator for `ctx`.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::SkillNotFound` if the declared skill is unknown
    /// at the declared level, and `OracleError::UnsupportedWeapon` for a
    /// weapon attack with a weapon class that has no formula. Callers skip
    /// such attacks entirely.
    pub fn new(
        ctx: &'a AttackContext,
        env: DynCombatEnv<'a>,
        config: &'a CombatConfig,
    ) -> Result<Self, OracleError> {
        let skill = if ctx.has_skill() {
            Some(env.skill(ctx.skill_id, ctx.skill_level)?)
        } else {
            None
        };

        let weapon = ctx.attacker.weapon_type();
        let weapon_attack = matches!(ctx.attack_type, AttackType::Melee | AttackType::Ranged);
        if weapon == WeaponType::Unknown && weapon_attack {
            return Err(OracleError::UnsupportedWeapon(ctx.attacker.weapon_id()));
        }

        let mut calc = Self {
            ctx,
            env,
            config,
            weapon,
            skill,
            crit_skill: None,
            mastery: 0.0,
            watk: f64::from(ctx.attacker.total_weapon_attack()),
        };
        calc.mastery = calc.mastery_modifier();
        calc.crit_skill = calc.critical_skill();
        Ok(calc)
    }

    /// Judges every reported hit of every target.
    ///
    /// Targets whose mob is gone are reported as [`TargetResult::Skipped`].
    pub fn validate_attack(&self) -> Vec<TargetResult> {
        self.ctx
            .targets
            .iter()
            .enumerate()
            .map(|(target_index, target)| {
                let mob = match self.env.mob(target.spawn_id) {
                    Ok(mob) => mob,
                    Err(reason) => {
                        return TargetResult::Skipped {
                            spawn_id: target.spawn_id,
                            reason,
                        };
                    }
                };

                let mut roller = Roller::new(
                    self.env.rng(),
                    self.ctx.attack_seed,
                    self.ctx.attacker.character_id,
                    target.spawn_id,
                    self.config.rolls_per_target,
                );
                let amplification = self.element_amplification();
                let accuracy = self.target_accuracy(&mob);

                let hits = target
                    .damages
                    .iter()
                    .map(|&reported| {
                        self.calculate_hit(
                            &mob,
                            &mut roller,
                            amplification,
                            accuracy,
                            target_index,
                            reported,
                        )
                    })
                    .collect();

                TargetResult::Checked {
                    spawn_id: target.spawn_id,
                    hits,
                }
            })
            .collect()
    }

    /// Computes the envelope for one hit and judges `reported` against it.
    pub fn calculate_hit(
        &self,
        mob: &MobSnapshot,
        roller: &mut Roller,
        amplification: f64,
        accuracy: f64,
        target_index: usize,
        reported: i32,
    ) -> CalcHitResult {
        // 1. Special formulas short-circuit.
        if let Some(range) = self.special_range(mob, roller) {
            return self.judge(range.range, range.range.midpoint(), range.is_crit, reported);
        }

        // 2. Magic against a magic-immune mob always lands for exactly 1.
        if self.ctx.is_magic() && mob.magic_immune {
            return self.judge(DamageRange::exact(1.0), 1.0, false, reported);
        }

        // 3. Miss.
        if self.is_miss(roller, accuracy, mob) {
            let mut result = self.judge(DamageRange::ZERO, 0.0, false, reported);
            result.is_miss = true;
            return result;
        }

        // 4. Base range.
        let mut range = self.base_damage_range(mob);

        // 5. Element amplification.
        if self.ctx.is_magic() {
            range = range.scale(amplification);
        }

        // 6. Defense.
        range = range.reduce(self.defense_reduction(mob, roller));
        let mut expected = range.midpoint();

        // 7. Skill damage% and critical.
        let is_crit = self.roll_critical(roller);
        let multiplier = self.skill_multiplier() * self.critical_multiplier(is_crit);
        range = range.scale(multiplier);
        expected *= multiplier;

        // 8. Clamp.
        range = range.clamp(CombatConfig::MIN_DAMAGE, CombatConfig::MAX_DAMAGE);

        // 9. After-modifiers.
        let after = self.after_modifier(target_index, expected);
        range = range.scale(after);
        expected *= after;

        // 10. Truncate.
        self.judge(range.floor(), expected, is_crit, reported)
    }

    fn judge(
        &self,
        range: DamageRange,
        expected: f64,
        is_crit: bool,
        reported: i32,
    ) -> CalcHitResult {
        CalcHitResult {
            is_miss: false,
            is_crit,
            min_damage: range.min,
            max_damage: range.max,
            expected_damage: expected,
            client_damage: reported,
            is_valid: f64::from(reported) <= self.config.accepted_max(range.max),
        }
    }

    fn skill_multiplier(&self) -> f64 {
        self.skill
            .as_ref()
            .map_or(1.0, SkillLevelData::damage_multiplier)
    }

    pub fn weapon(&self) -> WeaponType {
        self.weapon
    }

    pub fn skill_id(&self) -> u32 {
        self.ctx.skill_id
    }
}
