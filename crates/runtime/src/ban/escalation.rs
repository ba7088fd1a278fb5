//! Second phase of ban issuance: acting on escalation signals.

use std::sync::Arc;

use tracing::{error, info};

use super::service::BanService;
use super::types::{Ban, BanOutcome, BanRequest, BanType, EscalationSignal};
use crate::api::Result;

/// Issuer recorded on automatic escalation bans.
pub const ESCALATION_ISSUER: &str = "SYSTEM";

/// What an [`Enforcer::enforce`] call did.
#[derive(Debug, Clone, PartialEq)]
pub enum Enforcement {
    Banned {
        ban: Ban,
        /// Permanent ban issued because `ban` crossed the escalation threshold.
        escalated: Option<Ban>,
    },
    Suppressed {
        permanent_ban_id: Option<u64>,
    },
}

impl Enforcement {
    pub fn ban(&self) -> Option<&Ban> {
        match self {
            Self::Banned { ban, .. } => Some(ban),
            Self::Suppressed { .. } => None,
        }
    }

    pub fn escalated(&self) -> Option<&Ban> {
        match self {
            Self::Banned { escalated, .. } => escalated.as_ref(),
            Self::Suppressed { .. } => None,
        }
    }
}

/// Issues bans and follows escalation recommendations with exactly one
/// permanent ban per account.
pub struct Enforcer {
    bans: Arc<BanService>,
}

impl Enforcer {
    pub fn new(bans: Arc<BanService>) -> Self {
        Self { bans }
    }

    pub fn bans(&self) -> &Arc<BanService> {
        &self.bans
    }

    /// Issues `request` and follows any escalation recommendation.
    ///
    /// Fails only when `request` itself could not be stored. A failed
    /// escalation is logged and the claim released, so the next temporary
    /// ban recommends it again.
    pub fn enforce(&self, request: BanRequest) -> Result<Enforcement> {
        let (ban, escalation) = match self.bans.issue_ban(request)? {
            BanOutcome::Issued { ban, escalation } => (ban, escalation),
            BanOutcome::Suppressed { permanent_ban_id } => {
                return Ok(Enforcement::Suppressed { permanent_ban_id });
            }
        };

        let escalated = match escalation {
            EscalationSignal::None => None,
            EscalationSignal::Recommended {
                account_id,
                temp_ban_count,
            } => self.escalate(account_id, temp_ban_count),
        };

        Ok(Enforcement::Banned { ban, escalated })
    }

    /// Claims the account's escalation slot first so two racing temporary
    /// bans produce a single permanent ban.
    fn escalate(&self, account_id: u32, temp_ban_count: u32) -> Option<Ban> {
        match self.bans.claim_escalation(account_id) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                error!(
                    target: "anticheat::bans",
                    account_id, "Failed to claim escalation: {}", e
                );
                return None;
            }
        }

        let request = BanRequest::account(
            account_id,
            BanType::Permanent,
            format!("Automatic escalation after {temp_ban_count} temporary bans"),
        )
        .issued_by(ESCALATION_ISSUER);

        match self.bans.issue_ban(request) {
            Ok(BanOutcome::Issued { ban, .. }) => {
                info!(
                    target: "anticheat::bans",
                    account_id,
                    ban_id = ban.id,
                    temp_ban_count,
                    "Escalated to permanent ban"
                );
                Some(ban)
            }
            Ok(BanOutcome::Suppressed { .. }) => None,
            Err(e) => {
                error!(
                    target: "anticheat::bans",
                    account_id, "Escalation ban failed, releasing claim: {}", e
                );
                if let Err(release) = self.bans.release_escalation(account_id) {
                    error!(
                        target: "anticheat::bans",
                        account_id, "Failed to release escalation claim: {}", release
                    );
                }
                None
            }
        }
    }
}
