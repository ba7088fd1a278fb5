//! Weapon classification derived from equipped item ids.

use crate::skill;
use crate::stats::JobId;

/// Weapon category selecting the base damage formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WeaponType {
    /// Bare hands.
    None,
    Sword1H,
    Axe1H,
    Blunt1H,
    Dagger,
    Wand,
    Staff,
    Sword2H,
    Axe2H,
    Blunt2H,
    Spear,
    Polearm,
    Bow,
    Crossbow,
    Claw,
    /// Equipped item whose category has no damage formula.
    Unknown,
}

impl WeaponType {
    /// Classifies a weapon by the category digits of its item id
    /// (`item_id / 10_000 % 100`).
    pub fn from_item_id(item_id: u32) -> Self {
        if item_id == 0 {
            return Self::None;
        }
        match (item_id / 10_000) % 100 {
            30 => Self::Sword1H,
            31 => Self::Axe1H,
            32 => Self::Blunt1H,
            33 => Self::Dagger,
            37 => Self::Wand,
            38 => Self::Staff,
            40 => Self::Sword2H,
            41 => Self::Axe2H,
            42 => Self::Blunt2H,
            43 => Self::Spear,
            44 => Self::Polearm,
            45 => Self::Bow,
            46 => Self::Crossbow,
            47 => Self::Claw,
            _ => Self::Unknown,
        }
    }

    /// Whether the weapon is built for ranged attacks.
    pub fn is_ranged(self) -> bool {
        matches!(self, Self::Bow | Self::Crossbow | Self::Claw)
    }

    /// Mastery skill that sharpens this weapon's damage floor for `job`.
    pub fn mastery_skill(self, job: JobId) -> Option<u32> {
        let id = match self {
            Self::Sword1H | Self::Sword2H => {
                if job.branch() == 11 {
                    skill::SWORD_MASTERY
                } else {
                    skill::PAGE_SWORD_MASTERY
                }
            }
            Self::Axe1H | Self::Axe2H => skill::AXE_MASTERY,
            Self::Blunt1H | Self::Blunt2H => skill::BW_MASTERY,
            Self::Dagger => skill::DAGGER_MASTERY,
            Self::Spear => skill::SPEAR_MASTERY,
            Self::Polearm => skill::POLEARM_MASTERY,
            Self::Bow => skill::BOW_MASTERY,
            Self::Crossbow => skill::CROSSBOW_MASTERY,
            Self::Claw => skill::CLAW_MASTERY,
            Self::None | Self::Wand | Self::Staff | Self::Unknown => return None,
        };
        Some(id)
    }

    /// Skill granting critical hits with this weapon.
    pub fn critical_skill(self) -> Option<u32> {
        match self {
            Self::Bow | Self::Crossbow => Some(skill::CRITICAL_SHOT),
            Self::Claw => Some(skill::CRITICAL_THROW),
            _ => None,
        }
    }
}
