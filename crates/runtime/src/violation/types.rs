//! Violation vocabulary shared by the detector, the logs and the helpers.
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of suspicious behaviour.
///
/// The known kinds carry default thresholds; anything else is kept verbatim
/// in [`ViolationType::Other`] and judged against the fallback rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ViolationType {
    ExcessiveDamage,
    AttackSpeedHack,
    InvalidSkillUse,
    SpeedHack,
    TeleportHack,
    InvalidPosition,
    InvalidEquip,
    InvalidItemUse,
    InvalidTrade,
    ItemDuplication,
    OverflowExploit,
    CooldownBypass,
    UnlearnedSkill,
    InvalidPacketSequence,
    MalformedPacket,
    Other(String),
}

impl ViolationType {
    pub const KNOWN: [ViolationType; 15] = [
        ViolationType::ExcessiveDamage,
        ViolationType::AttackSpeedHack,
        ViolationType::InvalidSkillUse,
        ViolationType::SpeedHack,
        ViolationType::TeleportHack,
        ViolationType::InvalidPosition,
        ViolationType::InvalidEquip,
        ViolationType::InvalidItemUse,
        ViolationType::InvalidTrade,
        ViolationType::ItemDuplication,
        ViolationType::OverflowExploit,
        ViolationType::CooldownBypass,
        ViolationType::UnlearnedSkill,
        ViolationType::InvalidPacketSequence,
        ViolationType::MalformedPacket,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::ExcessiveDamage => "excessive_damage",
            Self::AttackSpeedHack => "attack_speed_hack",
            Self::InvalidSkillUse => "invalid_skill_use",
            Self::SpeedHack => "speed_hack",
            Self::TeleportHack => "teleport_hack",
            Self::InvalidPosition => "invalid_position",
            Self::InvalidEquip => "invalid_equip",
            Self::InvalidItemUse => "invalid_item_use",
            Self::InvalidTrade => "invalid_trade",
            Self::ItemDuplication => "item_duplication",
            Self::OverflowExploit => "overflow_exploit",
            Self::CooldownBypass => "cooldown_bypass",
            Self::UnlearnedSkill => "unlearned_skill",
            Self::InvalidPacketSequence => "invalid_packet_sequence",
            Self::MalformedPacket => "malformed_packet",
            Self::Other(name) => name,
        }
    }

    /// Category the kind belongs to, `None` for unrecognised kinds.
    pub fn category(&self) -> Option<ViolationCategory> {
        let category = match self {
            Self::ExcessiveDamage | Self::AttackSpeedHack | Self::InvalidSkillUse => {
                ViolationCategory::Combat
            }
            Self::SpeedHack | Self::TeleportHack | Self::InvalidPosition => {
                ViolationCategory::Movement
            }
            Self::InvalidEquip | Self::InvalidItemUse => ViolationCategory::Inventory,
            Self::InvalidTrade | Self::ItemDuplication | Self::OverflowExploit => {
                ViolationCategory::Economy
            }
            Self::CooldownBypass | Self::UnlearnedSkill => ViolationCategory::Skill,
            Self::InvalidPacketSequence | Self::MalformedPacket => ViolationCategory::Packet,
            Self::Other(_) => return None,
        };
        Some(category)
    }
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViolationType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::KNOWN
            .iter()
            .find(|known| known.as_str() == s)
            .cloned()
            .unwrap_or_else(|| Self::Other(s.to_string())))
    }
}

impl From<String> for ViolationType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(parsed) => parsed,
            Err(never) => match never {},
        }
    }
}

impl From<ViolationType> for String {
    fn from(value: ViolationType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ViolationCategory {
    Combat,
    Movement,
    Inventory,
    Economy,
    Skill,
    Packet,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Identity accessors a detection helper needs from a connected entity.
///
/// Both player sessions and server-driven characters implement this.
pub trait PlayerInfo {
    fn account_id(&self) -> u32;
    fn character_id(&self) -> u32;
    fn ip_address(&self) -> &str;
    fn map_id(&self) -> u32;
}

/// Plain-value [`PlayerInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub account_id: u32,
    pub character_id: u32,
    pub ip_address: String,
    pub map_id: u32,
}

impl PlayerIdentity {
    pub fn new(account_id: u32, character_id: u32, ip_address: impl Into<String>) -> Self {
        Self {
            account_id,
            character_id,
            ip_address: ip_address.into(),
            map_id: 0,
        }
    }

    pub fn on_map(mut self, map_id: u32) -> Self {
        self.map_id = map_id;
        self
    }
}

impl PlayerInfo for PlayerIdentity {
    fn account_id(&self) -> u32 {
        self.account_id
    }

    fn character_id(&self) -> u32 {
        self.character_id
    }

    fn ip_address(&self) -> &str {
        &self.ip_address
    }

    fn map_id(&self) -> u32 {
        self.map_id
    }
}

/// One observed violation. Write-once once logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationEvent {
    pub account_id: u32,
    pub character_id: u32,
    pub ip_address: String,
    pub violation_type: ViolationType,
    pub category: ViolationCategory,
    pub severity: Severity,
    pub details: String,
    pub map_id: u32,
    pub timestamp: DateTime<Utc>,
}

impl ViolationEvent {
    pub fn new(
        player: &(impl PlayerInfo + ?Sized),
        violation_type: ViolationType,
        category: ViolationCategory,
        severity: Severity,
        details: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id: player.account_id(),
            character_id: player.character_id(),
            ip_address: player.ip_address().to_string(),
            violation_type,
            category,
            severity,
            details: details.into(),
            map_id: player.map_id(),
            timestamp,
        }
    }
}

/// Persisted audit row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationLogEntry {
    pub id: u64,
    pub event: ViolationEvent,
    pub action_taken: Option<String>,
}
