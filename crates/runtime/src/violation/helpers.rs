//! Detection helpers for game handlers.
//!
//! Each helper checks its category switch, applies its own margin where it
//! has one, and records a fully described event. `Ok(None)` means nothing
//! was recorded.

use std::time::Duration;

use super::detector::{RecordOutcome, ViolationDetector};
use super::types::{PlayerInfo, Severity, ViolationEvent, ViolationType};
use crate::api::Result;

/// Reported damage may exceed the expected maximum by this factor.
pub const DAMAGE_MARGIN: f64 = 1.5;
/// Slack granted to attack intervals for network jitter.
pub const ATTACK_LATENCY_SLACK: Duration = Duration::from_millis(50);
/// Measured speed may exceed the allowed speed by this factor.
pub const SPEED_MARGIN: f64 = 1.1;

impl ViolationDetector {
    fn report(
        &self,
        player: &dyn PlayerInfo,
        violation_type: ViolationType,
        severity: Severity,
        details: String,
    ) -> Result<Option<RecordOutcome>> {
        let Some(category) = violation_type.category() else {
            return Ok(None);
        };
        if !self.config().categories.is_enabled(category) {
            return Ok(None);
        }

        let event = ViolationEvent::new(
            player,
            violation_type,
            category,
            severity,
            details,
            self.now(),
        );
        self.record_violation(event).map(Some)
    }

    pub fn detect_excessive_damage(
        &self,
        player: &dyn PlayerInfo,
        damage: i64,
        expected_max: i64,
    ) -> Result<Option<RecordOutcome>> {
        let threshold = expected_max as f64 * DAMAGE_MARGIN;
        if damage as f64 <= threshold {
            return Ok(None);
        }
        self.report(
            player,
            ViolationType::ExcessiveDamage,
            Severity::High,
            format!("Damage: {damage}, Expected max: {expected_max} (threshold: {threshold:.0})"),
        )
    }

    pub fn detect_attack_speed_hack(
        &self,
        player: &dyn PlayerInfo,
        since_last_attack: Duration,
        minimum_delay: Duration,
    ) -> Result<Option<RecordOutcome>> {
        if since_last_attack >= minimum_delay.saturating_sub(ATTACK_LATENCY_SLACK) {
            return Ok(None);
        }
        self.report(
            player,
            ViolationType::AttackSpeedHack,
            Severity::Medium,
            format!(
                "Attack interval: {since_last_attack:?}, Minimum allowed: {minimum_delay:?}"
            ),
        )
    }

    pub fn detect_invalid_skill_use(
        &self,
        player: &dyn PlayerInfo,
        skill_id: u32,
        reason: &str,
    ) -> Result<Option<RecordOutcome>> {
        self.report(
            player,
            ViolationType::InvalidSkillUse,
            Severity::Medium,
            format!("Skill ID: {skill_id}, Reason: {reason}"),
        )
    }

    pub fn detect_speed_hack(
        &self,
        player: &dyn PlayerInfo,
        speed: f64,
        max_allowed: f64,
    ) -> Result<Option<RecordOutcome>> {
        if speed <= max_allowed * SPEED_MARGIN {
            return Ok(None);
        }
        self.report(
            player,
            ViolationType::SpeedHack,
            Severity::Medium,
            format!("Speed: {speed:.2}, Max allowed: {max_allowed:.2}"),
        )
    }

    pub fn detect_teleport_hack(
        &self,
        player: &dyn PlayerInfo,
        from: (i16, i16),
        to: (i16, i16),
        reason: &str,
    ) -> Result<Option<RecordOutcome>> {
        self.report(
            player,
            ViolationType::TeleportHack,
            Severity::High,
            format!(
                "Moved from ({},{}) to ({},{}). Reason: {reason}",
                from.0, from.1, to.0, to.1
            ),
        )
    }

    pub fn detect_invalid_position(
        &self,
        player: &dyn PlayerInfo,
        x: i16,
        y: i16,
        reason: &str,
    ) -> Result<Option<RecordOutcome>> {
        self.report(
            player,
            ViolationType::InvalidPosition,
            Severity::Medium,
            format!("Position: ({x},{y}). Reason: {reason}"),
        )
    }

    pub fn detect_invalid_equip(
        &self,
        player: &dyn PlayerInfo,
        item_id: u32,
        reason: &str,
    ) -> Result<Option<RecordOutcome>> {
        self.report(
            player,
            ViolationType::InvalidEquip,
            Severity::High,
            format!("Item ID: {item_id}, Reason: {reason}"),
        )
    }

    pub fn detect_invalid_item_use(
        &self,
        player: &dyn PlayerInfo,
        item_id: u32,
        reason: &str,
    ) -> Result<Option<RecordOutcome>> {
        self.report(
            player,
            ViolationType::InvalidItemUse,
            Severity::Medium,
            format!("Item ID: {item_id}, Reason: {reason}"),
        )
    }

    pub fn detect_invalid_trade(
        &self,
        player: &dyn PlayerInfo,
        reason: &str,
    ) -> Result<Option<RecordOutcome>> {
        self.report(
            player,
            ViolationType::InvalidTrade,
            Severity::High,
            reason.to_string(),
        )
    }

    pub fn detect_duplication(
        &self,
        player: &dyn PlayerInfo,
        item_id: u32,
        reason: &str,
    ) -> Result<Option<RecordOutcome>> {
        self.report(
            player,
            ViolationType::ItemDuplication,
            Severity::Critical,
            format!("Item ID: {item_id}, Reason: {reason}"),
        )
    }

    pub fn detect_overflow(
        &self,
        player: &dyn PlayerInfo,
        reason: &str,
    ) -> Result<Option<RecordOutcome>> {
        self.report(
            player,
            ViolationType::OverflowExploit,
            Severity::Critical,
            reason.to_string(),
        )
    }

    pub fn detect_cooldown_bypass(
        &self,
        player: &dyn PlayerInfo,
        skill_id: u32,
        cooldown_remaining: Duration,
    ) -> Result<Option<RecordOutcome>> {
        self.report(
            player,
            ViolationType::CooldownBypass,
            Severity::Medium,
            format!("Skill ID: {skill_id}, Cooldown remaining: {cooldown_remaining:?}"),
        )
    }

    pub fn detect_unlearned_skill(
        &self,
        player: &dyn PlayerInfo,
        skill_id: u32,
    ) -> Result<Option<RecordOutcome>> {
        self.report(
            player,
            ViolationType::UnlearnedSkill,
            Severity::High,
            format!("Skill ID: {skill_id}"),
        )
    }

    pub fn detect_invalid_packet_sequence(
        &self,
        player: &dyn PlayerInfo,
        reason: &str,
    ) -> Result<Option<RecordOutcome>> {
        self.report(
            player,
            ViolationType::InvalidPacketSequence,
            Severity::Medium,
            reason.to_string(),
        )
    }

    pub fn detect_malformed_packet(
        &self,
        player: &dyn PlayerInfo,
        packet_type: &str,
        reason: &str,
    ) -> Result<Option<RecordOutcome>> {
        self.report(
            player,
            ViolationType::MalformedPacket,
            Severity::High,
            format!("Packet type: {packet_type}, Reason: {reason}"),
        )
    }
}
