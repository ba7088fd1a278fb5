//! Attacker snapshot consumed by the damage calculator.
//!
//! The snapshot is a plain value captured by the combat handler at the
//! moment the attack packet arrives. The calculator never reads live player
//! state, so buffs or equipment swaps that race the attack cannot skew a
//! single validation pass.

use std::collections::BTreeMap;

use crate::config::CombatConfig;
use crate::weapon::WeaponType;

/// Equipment slot that holds the weapon.
pub const WEAPON_SLOT: i16 = -11;

/// Job identifier, e.g. `0` beginner, `410` assassin, `212` fire/poison arch mage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JobId(pub u16);

impl JobId {
    /// First-job class: 1 warrior, 2 magician, 3 bowman, 4 thief, 5 pirate.
    pub fn class(self) -> u16 {
        self.0 / 100
    }

    /// Second-job branch, e.g. `21` for the fire/poison line.
    pub fn branch(self) -> u16 {
        self.0 / 10
    }

    pub fn is_thief(self) -> bool {
        self.class() == 4
    }

    pub fn is_pirate(self) -> bool {
        (500..600).contains(&self.0)
    }
}

/// Single equipped item. Negative slots are worn, non-negative are inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquippedItem {
    pub slot: i16,
    pub item_id: u32,
    pub watk: u16,
    pub matk: u16,
}

impl EquippedItem {
    pub fn weapon(item_id: u32, watk: u16) -> Self {
        Self {
            slot: WEAPON_SLOT,
            item_id,
            watk,
            matk: 0,
        }
    }

    pub fn is_worn(&self) -> bool {
        self.slot < 0
    }
}

/// Stats, equipment, and learned skills of the attacking character.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackerSnapshot {
    pub character_id: u32,
    pub level: u8,
    pub job: JobId,
    pub str: u16,
    pub dex: u16,
    pub int: u16,
    pub luk: u16,
    pub equipment: Vec<EquippedItem>,
    /// Learned skills: skill id to level.
    pub skills: BTreeMap<u32, u8>,
}

impl AttackerSnapshot {
    pub fn new(character_id: u32, level: u8, job: JobId) -> Self {
        Self {
            character_id,
            level,
            job,
            ..Self::default()
        }
    }

    pub fn with_stats(mut self, str: u16, dex: u16, int: u16, luk: u16) -> Self {
        self.str = str;
        self.dex = dex;
        self.int = int;
        self.luk = luk;
        self
    }

    pub fn with_item(mut self, item: EquippedItem) -> Self {
        self.equipment.push(item);
        self
    }

    pub fn with_skill(mut self, skill_id: u32, level: u8) -> Self {
        self.skills.insert(skill_id, level);
        self
    }

    pub fn weapon_id(&self) -> u32 {
        self.equipment
            .iter()
            .find(|item| item.slot == WEAPON_SLOT)
            .map_or(0, |item| item.item_id)
    }

    pub fn weapon_type(&self) -> WeaponType {
        WeaponType::from_item_id(self.weapon_id())
    }

    /// Learned level of `skill_id`, `None` if unlearned or level zero.
    pub fn skill_level(&self, skill_id: u32) -> Option<u8> {
        self.skills.get(&skill_id).copied().filter(|level| *level > 0)
    }

    /// Total weapon attack: worn `watk` plus `str / 10`, capped.
    pub fn total_weapon_attack(&self) -> u32 {
        let worn: u32 = self
            .equipment
            .iter()
            .filter(|item| item.is_worn())
            .map(|item| u32::from(item.watk))
            .sum();
        (worn + u32::from(self.str) / 10).min(CombatConfig::MAX_WEAPON_ATTACK)
    }

    /// Total magic attack: `int` plus worn `matk`, capped.
    pub fn total_magic_attack(&self) -> u32 {
        let worn: u32 = self
            .equipment
            .iter()
            .filter(|item| item.is_worn())
            .map(|item| u32::from(item.matk))
            .sum();
        (u32::from(self.int) + worn).min(CombatConfig::MAX_MAGIC_ATTACK)
    }
}
