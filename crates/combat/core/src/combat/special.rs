//! Skills whose damage ignores the weapon pipeline.
//!
//! # Formulas
//!
//! ```text
//! Shadow Meso   10 * x, times (100 + x)% when roll(0..100) < prop
//! Shadow Web    mob_max_hp / (50 - level)
//! Drain         ({8, 18.5} * (str + luk) + 2 * dex) / 100 * watk
//! Poison Myst   mob_max_hp / (70 - level)
//! summons       (dex * 2.5 * {0.7, 1} + str) * rate / 100
//! ```

use crate::config::CombatConfig;
use crate::env::{MobSnapshot, Roller};
use crate::skill;

use super::calculator::DamageCalculator;
use super::context::AttackType;
use super::result::DamageRange;

/// Envelope produced by a special formula.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct SpecialRange {
    pub range: DamageRange,
    pub is_crit: bool,
}

impl SpecialRange {
    fn plain(range: DamageRange) -> Self {
        Self {
            range: DamageRange::new(range.min.max(0.0), range.max.max(0.0)),
            is_crit: false,
        }
    }
}

impl DamageCalculator<'_> {
    /// Envelope for special-formula skills, `None` for everything else.
    pub(super) fn special_range(
        &self,
        mob: &MobSnapshot,
        roller: &mut Roller,
    ) -> Option<SpecialRange> {
        let attacker = &self.ctx.attacker;
        let str = f64::from(attacker.str);
        let dex = f64::from(attacker.dex);
        let luk = f64::from(attacker.luk);
        let level = self.ctx.skill_level;

        match (self.ctx.skill_id, self.skill) {
            (skill::SHADOW_MESO, Some(data)) => {
                let mesos = f64::from(data.x);
                let mut special = SpecialRange::plain(DamageRange::exact(10.0 * mesos));
                if data.prop > 0
                    && roller.roll(CombatConfig::PROP_MODIFIER) < f64::from(data.prop)
                {
                    special.is_crit = true;
                    special.range = special.range.scale((100.0 + mesos.max(0.0)) * 0.01);
                }
                Some(special)
            }
            (skill::SHADOW_WEB, Some(_)) if level > 0 => Some(SpecialRange::plain(
                DamageRange::exact(hp_fraction(mob.max_hp, 50, level)),
            )),
            (skill::DRAIN, _) => {
                let stat = str + luk;
                Some(SpecialRange::plain(DamageRange::new(
                    (8.0 * stat + dex * 2.0) / 100.0 * self.watk,
                    (18.5 * stat + dex * 2.0) / 100.0 * self.watk,
                )))
            }
            (skill::POISON_MYST, _) if level > 0 => Some(SpecialRange::plain(
                DamageRange::exact(hp_fraction(mob.max_hp, 70, level)),
            )),
            (_, data) if self.ctx.attack_type == AttackType::Summon => {
                let rate = data
                    .filter(|data| data.damage > 0)
                    .map_or(100.0, |data| f64::from(data.damage));
                Some(SpecialRange::plain(DamageRange::new(
                    (dex * 2.5 * 0.7 + str) * rate / 100.0,
                    (dex * 2.5 + str) * rate / 100.0,
                )))
            }
            _ => None,
        }
    }
}

/// `max_hp / (base - level)`, with a divisor of at least one.
fn hp_fraction(max_hp: u32, base: u8, level: u8) -> f64 {
    let divisor = f64::from(base.saturating_sub(level).max(1));
    f64::from(max_hp) / divisor
}
