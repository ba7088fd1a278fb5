use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BanType {
    Temporary,
    Permanent,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BanTarget {
    Account,
    Character,
    Ip,
}

/// Persisted ban row. Bans are deactivated, never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ban {
    pub id: u64,
    pub account_id: Option<u32>,
    pub character_id: Option<u32>,
    pub ip_address: Option<String>,
    #[serde(default)]
    pub hwid: Option<String>,
    pub ban_type: BanType,
    pub target: BanTarget,
    pub reason: String,
    pub issued_by: String,
    pub issued_by_gm: bool,
    pub is_active: bool,
    pub ban_start: DateTime<Utc>,
    /// `None` iff the ban is permanent.
    pub ban_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ban {
    pub fn is_permanent(&self) -> bool {
        self.ban_type == BanType::Permanent
    }

    /// Active and either permanent or not yet ended.
    pub fn is_in_force(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.ban_end.is_none_or(|end| end > now)
    }

    /// Connect-time match: any single dimension is enough. Empty IPs and
    /// hardware ids never match.
    pub fn matches(&self, account_id: u32, ip_address: &str, hwid: &str) -> bool {
        let account = self.account_id == Some(account_id);
        let ip = !ip_address.is_empty() && self.ip_address.as_deref() == Some(ip_address);
        let hardware = !hwid.is_empty() && self.hwid.as_deref() == Some(hwid);
        account || ip || hardware
    }

    /// Temporary ban whose end has passed but is still flagged active.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.ban_type == BanType::Temporary
            && self.ban_end.is_some_and(|end| end < now)
    }

    pub fn deactivate(&mut self, at: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = at;
    }
}

/// Everything needed to issue a ban.
#[derive(Debug, Clone, PartialEq)]
pub struct BanRequest {
    pub account_id: Option<u32>,
    pub character_id: Option<u32>,
    pub ip_address: Option<String>,
    pub hwid: Option<String>,
    pub ban_type: BanType,
    pub target: BanTarget,
    pub reason: String,
    pub issued_by: String,
    pub issued_by_gm: bool,
    /// Overrides the configured temporary duration.
    pub duration: Option<Duration>,
}

impl BanRequest {
    pub fn account(account_id: u32, ban_type: BanType, reason: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id),
            character_id: None,
            ip_address: None,
            hwid: None,
            ban_type,
            target: BanTarget::Account,
            reason: reason.into(),
            issued_by: "SYSTEM".to_string(),
            issued_by_gm: false,
            duration: None,
        }
    }

    pub fn character(mut self, character_id: u32) -> Self {
        self.character_id = Some(character_id);
        self
    }

    /// Attaches an IP address. Empty addresses are ignored.
    pub fn ip(mut self, ip_address: impl Into<String>) -> Self {
        let ip_address = ip_address.into();
        self.ip_address = (!ip_address.is_empty()).then_some(ip_address);
        self
    }

    /// Attaches a hardware id. Empty ids are ignored.
    pub fn hwid(mut self, hwid: impl Into<String>) -> Self {
        let hwid = hwid.into();
        self.hwid = (!hwid.is_empty()).then_some(hwid);
        self
    }

    pub fn issued_by(mut self, issuer: impl Into<String>) -> Self {
        self.issued_by = issuer.into();
        self
    }

    pub fn by_gm(mut self, gm: impl Into<String>) -> Self {
        self.issued_by = gm.into();
        self.issued_by_gm = true;
        self
    }

    pub fn lasting(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Per-account escalation state.
///
/// `Normal -> AtThreshold -> PermanentIssued`. `permanent_ban_issued` is
/// sticky: unbanning never clears it and `temp_ban_count` never decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub account_id: u32,
    pub temp_ban_count: u32,
    pub last_temp_ban_time: Option<DateTime<Utc>>,
    pub permanent_ban_issued: bool,
}

impl EscalationRecord {
    pub fn new(account_id: u32) -> Self {
        Self {
            account_id,
            temp_ban_count: 0,
            last_temp_ban_time: None,
            permanent_ban_issued: false,
        }
    }
}

/// Whether issuing a ban pushed the account over the escalation threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationSignal {
    None,
    Recommended { account_id: u32, temp_ban_count: u32 },
}

/// Result of [`BanService::issue_ban`](super::BanService::issue_ban).
#[derive(Debug, Clone, PartialEq)]
pub enum BanOutcome {
    Issued {
        ban: Ban,
        escalation: EscalationSignal,
    },
    /// Automated temporary ban skipped: the account was already escalated.
    /// Carries the newest permanent ban of the account, lifted or not.
    Suppressed { permanent_ban_id: Option<u64> },
}

/// Connect-time verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BanCheck {
    Clear,
    Banned { ban_id: u64, reason: String },
}

impl BanCheck {
    pub fn is_banned(&self) -> bool {
        matches!(self, Self::Banned { .. })
    }
}
