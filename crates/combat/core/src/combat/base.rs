//! Base damage ranges before defense and skill multipliers.
//!
//! # Physical formula
//!
//! ```text
//! stat_min = primary * mastery * factor + secondary
//! stat_max = primary * factor + secondary
//! range    = stat * watk / 100
//! ```
//!
//! `factor` depends on the weapon class and swing/stab motion. A few
//! weapon/skill pairs use their own stat mix and a `/150` scale. Attackers
//! below the mob's level lose `(mob_level - level)%` of physical damage.
//!
//! # Magic formula
//!
//! ```text
//! min = int * 0.5 + (matk * 0.058)^2 + matk * mastery * 3.3
//! max = int * 0.5 + (matk * 0.058)^2 + matk * 3.3
//! heal: (int * {0.3, 1.2} + luk) * matk / 1000 * (1.5 + 5 / (targets + 1))
//! ```

use crate::env::MobSnapshot;
use crate::skill;
use crate::weapon::WeaponType;

use super::calculator::DamageCalculator;
use super::context::AttackMotion;
use super::result::DamageRange;

impl DamageCalculator<'_> {
    /// Base `[min, max]` for this attack against `mob`.
    pub fn base_damage_range(&self, mob: &MobSnapshot) -> DamageRange {
        if self.ctx.is_magic() {
            return self.magic_damage_range();
        }

        let attacker = &self.ctx.attacker;
        let str = f64::from(attacker.str);
        let dex = f64::from(attacker.dex);
        let luk = f64::from(attacker.luk);
        let mastery = self.mastery;
        let swing = self.ctx.motion == AttackMotion::Swing;
        let skill_id = self.ctx.skill_id;

        let (min_stat, max_stat) = match self.weapon {
            WeaponType::Bow | WeaponType::Crossbow if skill::is_power_knockback(skill_id) => {
                let min_stat = dex * 3.4 * 0.1 * 0.9 + str;
                let max_stat = dex * 3.4 + str;
                return self.scaled_by_watk(min_stat, max_stat, 150.0);
            }
            WeaponType::Bow => (dex * mastery * 3.4 + str, dex * 3.4 + str),
            WeaponType::Crossbow => (dex * mastery * 3.6 + str, dex * 3.6 + str),
            WeaponType::Axe2H | WeaponType::Blunt2H => {
                let factor = if swing { 4.8 } else { 3.4 };
                (str * mastery * factor + dex, str * factor + dex)
            }
            WeaponType::Spear | WeaponType::Polearm if skill_id == skill::DRAGON_ROAR => {
                (str * 4.0 * mastery * 0.9 + dex, str * 4.0 + dex)
            }
            WeaponType::Spear | WeaponType::Polearm => {
                // Spears favour stabbing, polearms favour swinging.
                let favoured = swing != (self.weapon == WeaponType::Spear);
                let factor = if favoured { 5.0 } else { 3.0 };
                (str * mastery * factor + dex, str * factor + dex)
            }
            WeaponType::Sword2H => (str * mastery * 4.6 + dex, str * 4.6 + dex),
            WeaponType::Axe1H | WeaponType::Blunt1H | WeaponType::Wand | WeaponType::Staff => {
                let factor = if swing { 4.4 } else { 3.2 };
                (str * mastery * factor + dex, str * factor + dex)
            }
            WeaponType::Dagger if attacker.job.is_thief() => {
                (luk * mastery * 3.6 + str + dex, luk * 3.6 + str + dex)
            }
            WeaponType::Sword1H | WeaponType::Dagger => {
                (str * mastery * 4.0 + dex, str * 4.0 + dex)
            }
            WeaponType::Claw if skill_id == skill::LUCKY_SEVEN => (luk * 2.5, luk * 5.0),
            WeaponType::Claw if swing || self.ctx.motion == AttackMotion::Prone => {
                // Punching with a claw, no stars thrown.
                return self.scaled_by_watk(luk * 0.1 + str + dex, luk + str + dex, 150.0);
            }
            WeaponType::Claw => (luk * mastery * 3.6 + str + dex, luk * 3.6 + str + dex),
            WeaponType::None => return self.bare_hands_range(),
            WeaponType::Unknown => return DamageRange::ZERO,
        };

        let range = self.scaled_by_watk(min_stat, max_stat, 100.0);
        range.scale(self.level_penalty(mob))
    }

    fn scaled_by_watk(&self, min_stat: f64, max_stat: f64, divisor: f64) -> DamageRange {
        DamageRange::new(min_stat * self.watk / divisor, max_stat * self.watk / divisor)
    }

    /// Bare hands use a level-derived attack power instead of weapon attack.
    fn bare_hands_range(&self) -> DamageRange {
        let attacker = &self.ctx.attacker;
        let str = f64::from(attacker.str);
        let dex = f64::from(attacker.dex);

        let attack = ((2.0 * f64::from(attacker.level) + 31.0) / 3.0).floor().min(31.0);
        let factor = if attacker.job.is_pirate() { 4.2 } else { 3.0 };

        let min_stat = str * factor * 0.1 * 0.9 + dex;
        let max_stat = str * factor + dex;
        DamageRange::new(min_stat * attack / 100.0, max_stat * attack / 100.0)
    }

    fn level_penalty(&self, mob: &MobSnapshot) -> f64 {
        let level = self.ctx.attacker.level;
        if level >= mob.level {
            return 1.0;
        }
        let gap = f64::from(mob.level - level);
        ((100.0 - gap) / 100.0).max(0.0)
    }

    fn magic_damage_range(&self) -> DamageRange {
        let attacker = &self.ctx.attacker;
        let int = f64::from(attacker.int);
        let luk = f64::from(attacker.luk);
        let matk = f64::from(attacker.total_magic_attack());

        if self.ctx.skill_id == skill::HEAL {
            let targets = self.ctx.targets.len() as f64 + 1.0;
            let target_multiplier = 1.5 + 5.0 / targets;
            let scale = matk / 1000.0 * target_multiplier;
            return DamageRange::new((int * 0.3 + luk) * scale, (int * 1.2 + luk) * scale);
        }

        let common = int * 0.5 + (matk * 0.058) * (matk * 0.058);
        DamageRange::new(
            common + matk * self.mastery * 3.3,
            common + matk * 3.3,
        )
    }
}
