//! Per-attack modifiers and the randomized per-hit checks.
//!
//! # Formulas
//!
//! ```text
//! mastery_modifier = min(1, (mastery * 5 + 10) * 0.009)
//! target_accuracy  = acc * 100 / (max(0, mob_level - level) * 10 + 255)
//!     acc = 5 * (int / 10 + luk / 10)   magic
//!     acc = dex                         physical
//! miss             = lerp(tacc * lo, tacc * hi, roll) < min(999, evasion)
//!     (lo, hi) = (0.5, 1.2) magic, (0.7, 1.3) physical
//! defense          = def * 0.5 + def * 0.1 * roll,  def = min(999, pdef|mdef)
//! critical         = roll(0..100) < critical_skill.prop
//! ```

use crate::config::CombatConfig;
use crate::env::{MobSnapshot, Roller, SkillLevelData};
use crate::skill;

use super::calculator::DamageCalculator;
use super::context::AttackOption;

impl DamageCalculator<'_> {
    /// Interpolation factor for the dominant stat's lower bound.
    pub(super) fn mastery_modifier(&self) -> f64 {
        let mastery = if self.ctx.is_magic() {
            self.skill.map_or(0, |skill| skill.mastery)
        } else {
            self.weapon_mastery()
        };
        ((f64::from(mastery) * 5.0 + 10.0) * 0.009).min(1.0)
    }

    /// Mastery from the weapon's mastery skill, zero when the weapon does not
    /// match the attack (a bow swung in melee, a sword "fired").
    fn weapon_mastery(&self) -> u16 {
        if self.weapon.is_ranged() != self.ctx.is_ranged() {
            return 0;
        }
        self.weapon
            .mastery_skill(self.ctx.attacker.job)
            .and_then(|id| self.learned(id))
            .map_or(0, |data| data.mastery)
    }

    /// Critical skill for ranged attacks with a crit-capable weapon.
    pub(super) fn critical_skill(&self) -> Option<SkillLevelData> {
        if !self.ctx.is_ranged() {
            return None;
        }
        self.weapon.critical_skill().and_then(|id| self.learned(id))
    }

    /// Element amplification multiplier for fire/poison and ice/lightning mages.
    pub(super) fn element_amplification(&self) -> f64 {
        let amp_skill = match self.ctx.attacker.job.branch() {
            21 => skill::ELEMENT_AMPLIFICATION,
            22 => skill::IL_ELEMENT_AMPLIFICATION,
            _ => return 1.0,
        };
        self.learned(amp_skill)
            .map(|data| data.y)
            .filter(|percent| *percent > 0)
            .map_or(1.0, |percent| f64::from(percent) / 100.0)
    }

    pub(super) fn target_accuracy(&self, mob: &MobSnapshot) -> f64 {
        let attacker = &self.ctx.attacker;
        let level_diff = i32::from(mob.level) - i32::from(attacker.level);
        let level_diff = level_diff.max(0);

        let accuracy = if self.ctx.is_magic() {
            5 * (u32::from(attacker.int) / 10 + u32::from(attacker.luk) / 10)
        } else {
            u32::from(attacker.dex)
        };

        f64::from(accuracy * 100) / (f64::from(level_diff * 10) + 255.0)
    }

    pub(super) fn is_miss(&self, roller: &mut Roller, accuracy: f64, mob: &MobSnapshot) -> bool {
        let roll = roller.roll(CombatConfig::STAT_MODIFIER);
        let (low, high) = if self.ctx.is_magic() {
            (0.5, 1.2)
        } else {
            (0.7, 1.3)
        };

        let min_accuracy = accuracy * low;
        let rolled = min_accuracy + (accuracy * high - min_accuracy) * roll;
        let avoid = f64::from(u32::from(mob.evasion).min(CombatConfig::MAX_MOB_STAT));
        rolled < avoid
    }

    /// Randomized defense cut. Defense-ignoring skills consume no draw.
    pub(super) fn defense_reduction(&self, mob: &MobSnapshot, roller: &mut Roller) -> f64 {
        if skill::ignores_defense(self.ctx.skill_id) {
            return 0.0;
        }
        let defense = if self.ctx.is_magic() {
            mob.magic_defense
        } else {
            mob.physical_defense
        };
        let defense = f64::from(u32::from(defense).min(CombatConfig::MAX_MOB_STAT));

        let roll = roller.roll(CombatConfig::STAT_MODIFIER);
        defense * 0.5 + defense * 0.1 * roll
    }

    /// Rolls for a critical hit. Consumes a draw only when a crit is possible.
    pub(super) fn roll_critical(&self, roller: &mut Roller) -> bool {
        let Some(crit) = self.crit_skill else {
            return false;
        };
        if self.config.never_crits(self.ctx.skill_id) {
            return false;
        }
        roller.roll(CombatConfig::PROP_MODIFIER) < f64::from(crit.prop)
    }

    pub(super) fn critical_multiplier(&self, is_crit: bool) -> f64 {
        match self.crit_skill {
            Some(crit) if is_crit => 1.0 + (f64::from(crit.damage) - 100.0) / 100.0,
            _ => 1.0,
        }
    }

    /// Falloff for the `target_index`-th target of a multi-target skill.
    pub(super) fn after_modifier(&self, target_index: usize, expected: f64) -> f64 {
        let Some(data) = self.skill else {
            return 1.0;
        };
        match self.ctx.skill_id {
            skill::SLASH_BLAST if self.ctx.option == AttackOption::SlashBlastFinalAttack => {
                skill::falloff(&skill::SLASH_BLAST_FINAL_ATTACK_FALLOFF, target_index)
            }
            skill::ARROW_BOMB if target_index > 0 => f64::from(data.x.max(0)) * 0.01,
            skill::ARROW_BOMB if expected > 0.0 => 0.5,
            skill::ARROW_BOMB => 0.0,
            skill::IRON_ARROW => skill::falloff(&skill::IRON_ARROW_FALLOFF, target_index),
            _ => 1.0,
        }
    }

    /// Data for a skill the attacker has learned, if the tables know it.
    pub(super) fn learned(&self, skill_id: u32) -> Option<SkillLevelData> {
        let level = self.ctx.attacker.skill_level(skill_id)?;
        self.env.skill(skill_id, level).ok()
    }
}
