//! Anti-cheat configuration.
//!
//! Loaded in three layers: built-in defaults, an optional TOML file, then
//! environment overrides. Durations are written as whole seconds.
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use combat_core::CombatConfig;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::ban::BanType;
use crate::violation::{ViolationCategory, ViolationType};

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// When an IP address is attached to an automated ban.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IpBanMode {
    Never,
    #[default]
    PermanentOnly,
    Always,
}

impl IpBanMode {
    pub fn attaches_ip(self, ban_type: BanType) -> bool {
        match self {
            Self::Never => false,
            Self::PermanentOnly => ban_type == BanType::Permanent,
            Self::Always => true,
        }
    }
}

/// What a rolling window is measured from.
///
/// `WindowStart` expires the window a fixed time after its first event.
/// `LastViolation` keeps it alive as long as events keep arriving within
/// one window of each other.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WindowAnchor {
    #[default]
    WindowStart,
    LastViolation,
}

/// Threshold, window and resulting ban for one violation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub threshold: u32,
    pub window_secs: u64,
    pub ban_type: BanType,
}

impl ThresholdRule {
    /// Applied to violation types without a rule of their own.
    pub const FALLBACK: ThresholdRule = ThresholdRule::temporary(5, 5 * MINUTE);

    pub const fn temporary(threshold: u32, window_secs: u64) -> Self {
        Self {
            threshold,
            window_secs,
            ban_type: BanType::Temporary,
        }
    }

    pub const fn permanent(threshold: u32, window_secs: u64) -> Self {
        Self {
            threshold,
            window_secs,
            ban_type: BanType::Permanent,
        }
    }

    pub fn window(&self) -> chrono::Duration {
        i64::try_from(self.window_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Built-in rule for `violation_type`.
    pub fn builtin(violation_type: &ViolationType) -> Self {
        use ViolationType::*;

        let window = 5 * MINUTE;
        match violation_type {
            ExcessiveDamage | AttackSpeedHack | SpeedHack | InvalidPosition | InvalidItemUse
            | CooldownBypass | MalformedPacket => Self::temporary(5, window),
            InvalidSkillUse | TeleportHack | InvalidEquip | UnlearnedSkill => {
                Self::temporary(3, window)
            }
            InvalidPacketSequence => Self::temporary(10, window),
            InvalidTrade | OverflowExploit => Self::permanent(3, window),
            ItemDuplication => Self::permanent(1, window),
            Other(_) => Self::FALLBACK,
        }
    }
}

/// Per-category detection switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryToggles {
    pub combat: bool,
    pub movement: bool,
    pub inventory: bool,
    pub economy: bool,
    pub skill: bool,
    pub packet: bool,
}

impl CategoryToggles {
    pub fn is_enabled(&self, category: ViolationCategory) -> bool {
        match category {
            ViolationCategory::Combat => self.combat,
            ViolationCategory::Movement => self.movement,
            ViolationCategory::Inventory => self.inventory,
            ViolationCategory::Economy => self.economy,
            ViolationCategory::Skill => self.skill,
            ViolationCategory::Packet => self.packet,
        }
    }
}

impl Default for CategoryToggles {
    fn default() -> Self {
        Self {
            combat: true,
            movement: true,
            inventory: true,
            economy: true,
            skill: true,
            packet: true,
        }
    }
}

/// Top-level anti-cheat settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntiCheatConfig {
    pub enabled: bool,
    #[serde(with = "secs")]
    pub temp_ban_duration: Duration,
    pub temp_bans_before_permanent: u32,
    pub ip_ban_mode: IpBanMode,
    pub gm_bans_increment_counter: bool,
    pub damage_tolerance: f64,
    pub counter_window_anchor: WindowAnchor,
    #[serde(with = "secs")]
    pub cleanup_interval: Duration,
    #[serde(with = "secs")]
    pub ban_expiry_interval: Duration,
    #[serde(with = "secs")]
    pub tracker_sweep_interval: Duration,
    #[serde(with = "secs")]
    pub tracker_retention: Duration,
    pub categories: CategoryToggles,
    /// Overrides for the built-in threshold table.
    pub thresholds: BTreeMap<ViolationType, ThresholdRule>,
    pub data_dir: Option<PathBuf>,
}

impl Default for AntiCheatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            temp_ban_duration: Duration::from_secs(7 * DAY),
            temp_bans_before_permanent: 3,
            ip_ban_mode: IpBanMode::default(),
            gm_bans_increment_counter: false,
            damage_tolerance: CombatConfig::DEFAULT_TOLERANCE,
            counter_window_anchor: WindowAnchor::default(),
            cleanup_interval: Duration::from_secs(10 * MINUTE),
            ban_expiry_interval: Duration::from_secs(MINUTE),
            tracker_sweep_interval: Duration::from_secs(5 * MINUTE),
            tracker_retention: Duration::from_secs(HOUR),
            categories: CategoryToggles::default(),
            thresholds: ViolationType::KNOWN
                .into_iter()
                .map(|kind| {
                    let rule = ThresholdRule::builtin(&kind);
                    (kind, rule)
                })
                .collect(),
            data_dir: None,
        }
    }
}

impl AntiCheatConfig {
    /// Defaults, then `ANTICHEAT_CONFIG` (if set), then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match env::var("ANTICHEAT_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.with_env_overrides()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides.
    ///
    /// Environment variables:
    /// - `ANTICHEAT_ENABLED` - Master switch (default: true)
    /// - `ANTICHEAT_IP_BAN_MODE` - `never`, `permanent_only` or `always`
    /// - `ANTICHEAT_TEMP_BAN_HOURS` - Temporary ban length (default: 168)
    /// - `ANTICHEAT_TEMP_BANS_BEFORE_PERMANENT` - Escalation threshold (default: 3)
    /// - `ANTICHEAT_GM_BANS_COUNT` - GM bans count toward escalation (default: false)
    /// - `ANTICHEAT_DAMAGE_TOLERANCE` - Accepted overshoot fraction (default: 0.1)
    /// - `ANTICHEAT_DATA_DIR` - Directory for file-backed repositories
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(enabled) = read_env::<bool>("ANTICHEAT_ENABLED") {
            self.enabled = enabled;
        }
        if let Some(mode) = read_env::<IpBanMode>("ANTICHEAT_IP_BAN_MODE") {
            self.ip_ban_mode = mode;
        }
        if let Some(hours) = read_env::<u64>("ANTICHEAT_TEMP_BAN_HOURS") {
            self.temp_ban_duration = Duration::from_secs(hours.saturating_mul(HOUR));
        }
        if let Some(count) = read_env::<u32>("ANTICHEAT_TEMP_BANS_BEFORE_PERMANENT") {
            self.temp_bans_before_permanent = count;
        }
        if let Some(counts) = read_env::<bool>("ANTICHEAT_GM_BANS_COUNT") {
            self.gm_bans_increment_counter = counts;
        }
        if let Some(tolerance) = read_env::<f64>("ANTICHEAT_DAMAGE_TOLERANCE") {
            self.damage_tolerance = tolerance;
        }
        if let Ok(dir) = env::var("ANTICHEAT_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.damage_tolerance.is_finite() || self.damage_tolerance < 0.0 {
            return Err(ConfigError::Invalid {
                key: "damage_tolerance",
                reason: format!("{} is not a non-negative number", self.damage_tolerance),
            });
        }
        if self.temp_bans_before_permanent == 0 {
            return Err(ConfigError::Invalid {
                key: "temp_bans_before_permanent",
                reason: "must be at least 1".to_string(),
            });
        }
        for (key, interval) in [
            ("cleanup_interval", self.cleanup_interval),
            ("ban_expiry_interval", self.ban_expiry_interval),
            ("tracker_sweep_interval", self.tracker_sweep_interval),
        ] {
            if interval.is_zero() {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be longer than zero seconds".to_string(),
                });
            }
        }
        for (kind, rule) in &self.thresholds {
            if rule.threshold == 0 {
                return Err(ConfigError::Invalid {
                    key: "thresholds",
                    reason: format!("{kind} has a zero threshold"),
                });
            }
            if rule.window_secs == 0 {
                return Err(ConfigError::Invalid {
                    key: "thresholds",
                    reason: format!("{kind} has a zero window"),
                });
            }
        }
        Ok(())
    }

    /// Rule for `violation_type`: configured, else built-in, else fallback.
    pub fn rule_for(&self, violation_type: &ViolationType) -> ThresholdRule {
        self.thresholds
            .get(violation_type)
            .copied()
            .unwrap_or_else(|| ThresholdRule::builtin(violation_type))
    }

    pub fn temp_ban_duration(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.temp_ban_duration).unwrap_or(chrono::Duration::MAX)
    }

    pub fn combat(&self) -> CombatConfig {
        CombatConfig::with_tolerance(self.damage_tolerance)
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let config = AntiCheatConfig::default();

        assert!(config.enabled);
        assert_eq!(config.temp_ban_duration, Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.temp_bans_before_permanent, 3);
        assert_eq!(config.ip_ban_mode, IpBanMode::PermanentOnly);
        assert!(!config.gm_bans_increment_counter);
        assert_eq!(config.cleanup_interval, Duration::from_secs(600));
        assert_eq!(config.thresholds.len(), 15);
    }

    #[test]
    fn builtin_table_rows() {
        let config = AntiCheatConfig::default();

        let dup = config.rule_for(&ViolationType::ItemDuplication);
        assert_eq!((dup.threshold, dup.ban_type), (1, BanType::Permanent));

        let packets = config.rule_for(&ViolationType::InvalidPacketSequence);
        assert_eq!(packets.threshold, 10);

        let teleport = config.rule_for(&ViolationType::TeleportHack);
        assert_eq!((teleport.threshold, teleport.window_secs), (3, 300));
    }

    #[test]
    fn unknown_type_falls_back_to_safe_default() {
        let config = AntiCheatConfig::default();
        let rule = config.rule_for(&ViolationType::Other("wall_hack".into()));
        assert_eq!(rule, ThresholdRule::FALLBACK);
        assert_eq!(rule.window(), chrono::Duration::minutes(5));
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config = AntiCheatConfig::from_toml_str(
            r#"
            ip_ban_mode = "always"
            temp_ban_duration = 3600
            counter_window_anchor = "last_violation"

            [categories]
            movement = false

            [thresholds.excessive_damage]
            threshold = 2
            window_secs = 60
            ban_type = "permanent"
            "#,
        )
        .unwrap();

        assert_eq!(config.ip_ban_mode, IpBanMode::Always);
        assert_eq!(config.temp_ban_duration, Duration::from_secs(3600));
        assert_eq!(config.counter_window_anchor, WindowAnchor::LastViolation);
        assert!(!config.categories.movement);
        assert!(config.categories.combat);
        assert_eq!(config.temp_bans_before_permanent, 3);

        let damage = config.rule_for(&ViolationType::ExcessiveDamage);
        assert_eq!(damage, ThresholdRule::permanent(2, 60));

        // Types missing from a user table keep their built-in rule.
        let dup = config.rule_for(&ViolationType::ItemDuplication);
        assert_eq!(dup, ThresholdRule::permanent(1, 300));
    }

    #[test]
    fn rejects_negative_tolerance() {
        let err = AntiCheatConfig::from_toml_str("damage_tolerance = -0.5").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "damage_tolerance",
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_sweep_interval() {
        let err = AntiCheatConfig::from_toml_str("ban_expiry_interval = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "ban_expiry_interval",
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_threshold_window() {
        let err = AntiCheatConfig::from_toml_str(
            r#"
            [thresholds.speed_hack]
            threshold = 5
            window_secs = 0
            ban_type = "temporary"
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Invalid { key, reason } => {
                assert_eq!(key, "thresholds");
                assert_eq!(reason, "speed_hack has a zero window");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ip_policy_matrix() {
        assert!(!IpBanMode::Never.attaches_ip(BanType::Permanent));
        assert!(!IpBanMode::PermanentOnly.attaches_ip(BanType::Temporary));
        assert!(IpBanMode::PermanentOnly.attaches_ip(BanType::Permanent));
        assert!(IpBanMode::Always.attaches_ip(BanType::Temporary));
    }
}
