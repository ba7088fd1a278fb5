//! Attack description handed to the calculator by the combat handler.

use crate::stats::AttackerSnapshot;

/// How the attack was delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AttackType {
    Melee,
    Ranged,
    Magic,
    Summon,
}

/// Animation class of the attack, as decoded from the action byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AttackMotion {
    Swing,
    #[default]
    Stab,
    Prone,
    Shoot,
    Cast,
}

/// Extra attack option flags that change multi-target falloff.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AttackOption {
    #[default]
    Normal,
    SlashBlastFinalAttack,
}

/// Reported hits against a single target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetHits {
    pub spawn_id: u32,
    pub damages: Vec<i32>,
}

impl TargetHits {
    pub fn new(spawn_id: u32, damages: impl Into<Vec<i32>>) -> Self {
        Self {
            spawn_id,
            damages: damages.into(),
        }
    }
}

/// Everything the calculator needs to judge one attack packet.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackContext {
    pub attacker: AttackerSnapshot,
    /// Declared skill, `0` for a basic attack.
    pub skill_id: u32,
    pub skill_level: u8,
    pub attack_type: AttackType,
    pub motion: AttackMotion,
    pub option: AttackOption,
    /// Per-attack entropy feeding every target's roller.
    pub attack_seed: u64,
    pub targets: Vec<TargetHits>,
}

impl AttackContext {
    pub fn new(attacker: AttackerSnapshot, attack_type: AttackType) -> Self {
        Self {
            attacker,
            skill_id: 0,
            skill_level: 0,
            attack_type,
            motion: AttackMotion::default(),
            option: AttackOption::default(),
            attack_seed: 0,
            targets: Vec::new(),
        }
    }

    pub fn with_skill(mut self, skill_id: u32, skill_level: u8) -> Self {
        self.skill_id = skill_id;
        self.skill_level = skill_level;
        self
    }

    pub fn with_motion(mut self, motion: AttackMotion) -> Self {
        self.motion = motion;
        self
    }

    pub fn with_option(mut self, option: AttackOption) -> Self {
        self.option = option;
        self
    }

    pub fn with_seed(mut self, attack_seed: u64) -> Self {
        self.attack_seed = attack_seed;
        self
    }

    pub fn with_target(mut self, target: TargetHits) -> Self {
        self.targets.push(target);
        self
    }

    pub fn has_skill(&self) -> bool {
        self.skill_id != 0
    }

    pub fn is_magic(&self) -> bool {
        self.attack_type == AttackType::Magic
    }

    pub fn is_ranged(&self) -> bool {
        self.attack_type == AttackType::Ranged
    }
}
