//! Ban issuance, lookup and revocation.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::types::{
    Ban, BanCheck, BanOutcome, BanRequest, BanType, EscalationRecord, EscalationSignal,
};
use crate::api::{Result, RuntimeError};
use crate::clock::Clock;
use crate::config::AntiCheatConfig;
use crate::repository::{
    AccountFlagRepository, BanRepository, EscalationRepository, Repositories,
};

/// Whose ban history to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanSubject {
    Account(u32),
    Character(u32),
}

/// Persists bans and keeps the escalation counters.
///
/// `issue_ban` never issues a follow-up ban itself. When a temporary ban
/// pushes an account over the escalation threshold it returns
/// [`EscalationSignal::Recommended`] and leaves the decision to the
/// [`Enforcer`](super::Enforcer).
pub struct BanService {
    bans: Arc<dyn BanRepository>,
    escalation: Arc<dyn EscalationRepository>,
    accounts: Arc<dyn AccountFlagRepository>,
    clock: Arc<dyn Clock>,
    temp_ban_duration: chrono::Duration,
    temp_bans_before_permanent: u32,
    gm_bans_increment_counter: bool,
}

impl BanService {
    pub fn new(repos: &Repositories, config: &AntiCheatConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            bans: Arc::clone(&repos.bans),
            escalation: Arc::clone(&repos.escalation),
            accounts: Arc::clone(&repos.accounts),
            clock,
            temp_ban_duration: config.temp_ban_duration(),
            temp_bans_before_permanent: config.temp_bans_before_permanent,
            gm_bans_increment_counter: config.gm_bans_increment_counter,
        }
    }

    pub fn temp_bans_before_permanent(&self) -> u32 {
        self.temp_bans_before_permanent
    }

    /// Persists a ban and flags its account.
    ///
    /// Once an account has been escalated, automated temporary bans are
    /// suppressed instead of stored, even after the permanent ban is lifted.
    pub fn issue_ban(&self, request: BanRequest) -> Result<BanOutcome> {
        let now = self.clock.now();

        if let Some(account_id) = self.suppressed_account(&request)? {
            let permanent_ban_id = self.latest_permanent_ban(account_id)?;
            info!(
                target: "anticheat::bans",
                account_id,
                permanent_ban_id = ?permanent_ban_id,
                "Temporary ban suppressed: account already escalated"
            );
            return Ok(BanOutcome::Suppressed { permanent_ban_id });
        }

        let ban_end = match request.ban_type {
            BanType::Temporary => Some(now + request.duration.unwrap_or(self.temp_ban_duration)),
            BanType::Permanent => None,
        };

        let ban = self.bans.insert(Ban {
            id: 0,
            account_id: request.account_id,
            character_id: request.character_id,
            ip_address: request.ip_address,
            hwid: request.hwid,
            ban_type: request.ban_type,
            target: request.target,
            reason: request.reason,
            issued_by: request.issued_by,
            issued_by_gm: request.issued_by_gm,
            is_active: true,
            ban_start: now,
            ban_end,
            created_at: now,
            updated_at: now,
        })?;

        info!(
            target: "anticheat::bans",
            ban_id = ban.id,
            account_id = ?ban.account_id,
            character_id = ?ban.character_id,
            ip = ?ban.ip_address,
            ban_type = %ban.ban_type,
            issued_by = %ban.issued_by,
            reason = %ban.reason,
            "Ban issued"
        );

        if let Some(account_id) = ban.account_id
            && let Err(e) = self.accounts.set_banned(account_id, true)
        {
            warn!(target: "anticheat::bans", account_id, "Failed to set account ban flag: {}", e);
        }

        let escalation = self.count_toward_escalation(&ban, now);
        Ok(BanOutcome::Issued { ban, escalation })
    }

    fn suppressed_account(&self, request: &BanRequest) -> Result<Option<u32>> {
        let Some(account_id) = request.account_id else {
            return Ok(None);
        };
        if request.ban_type != BanType::Temporary || request.issued_by_gm {
            return Ok(None);
        }
        Ok(self
            .escalation
            .get(account_id)?
            .filter(|record| record.permanent_ban_issued)
            .map(|_| account_id))
    }

    fn latest_permanent_ban(&self, account_id: u32) -> Result<Option<u64>> {
        let permanent = self
            .bans
            .find(&|ban| ban.account_id == Some(account_id) && ban.is_permanent())?;
        Ok(permanent.iter().map(|ban| ban.id).max())
    }

    fn count_toward_escalation(&self, ban: &Ban, now: DateTime<Utc>) -> EscalationSignal {
        let Some(account_id) = ban.account_id else {
            return EscalationSignal::None;
        };
        if ban.ban_type != BanType::Temporary
            || (ban.issued_by_gm && !self.gm_bans_increment_counter)
        {
            return EscalationSignal::None;
        }

        let record = self.escalation.update(account_id, &mut |record| {
            record.temp_ban_count = record.temp_ban_count.saturating_add(1);
            record.last_temp_ban_time = Some(now);
        });

        match record {
            Ok(record)
                if record.temp_ban_count >= self.temp_bans_before_permanent
                    && !record.permanent_ban_issued =>
            {
                EscalationSignal::Recommended {
                    account_id,
                    temp_ban_count: record.temp_ban_count,
                }
            }
            Ok(_) => EscalationSignal::None,
            Err(e) => {
                warn!(
                    target: "anticheat::bans",
                    account_id, "Failed to update escalation record: {}", e
                );
                EscalationSignal::None
            }
        }
    }

    /// Sets the sticky `permanent_ban_issued` flag and returns whether this
    /// call was the one that set it.
    pub(crate) fn claim_escalation(&self, account_id: u32) -> Result<bool> {
        let mut claimed = false;
        self.escalation.update(account_id, &mut |record| {
            claimed = !record.permanent_ban_issued;
            record.permanent_ban_issued = true;
        })?;
        Ok(claimed)
    }

    pub(crate) fn release_escalation(&self, account_id: u32) -> Result<()> {
        self.escalation.update(account_id, &mut |record| {
            record.permanent_ban_issued = false;
        })?;
        Ok(())
    }

    /// Connect-time check. A ban in force matching the account, the IP or a
    /// non-empty hardware id rejects the session with its reason.
    pub fn is_banned(&self, account_id: u32, ip_address: &str, hwid: &str) -> Result<BanCheck> {
        let now = self.clock.now();
        let matches = self
            .bans
            .find(&|ban| ban.is_in_force(now) && ban.matches(account_id, ip_address, hwid))?;

        Ok(match matches.into_iter().next_back() {
            Some(ban) => BanCheck::Banned {
                ban_id: ban.id,
                reason: ban.reason,
            },
            None => BanCheck::Clear,
        })
    }

    pub fn is_account_banned(&self, account_id: u32) -> Result<bool> {
        let now = self.clock.now();
        self.any_in_force(now, &|ban| ban.account_id == Some(account_id))
    }

    pub fn is_character_banned(&self, character_id: u32) -> Result<bool> {
        let now = self.clock.now();
        self.any_in_force(now, &|ban| ban.character_id == Some(character_id))
    }

    pub fn is_ip_banned(&self, ip_address: &str) -> Result<bool> {
        if ip_address.is_empty() {
            return Ok(false);
        }
        let now = self.clock.now();
        self.any_in_force(now, &|ban| ban.ip_address.as_deref() == Some(ip_address))
    }

    /// Fast-path flag as last written, without consulting ban rows.
    pub fn account_flagged(&self, account_id: u32) -> Result<bool> {
        Ok(self.accounts.is_banned(account_id)?)
    }

    fn any_in_force(&self, now: DateTime<Utc>, filter: &dyn Fn(&Ban) -> bool) -> Result<bool> {
        Ok(!self
            .bans
            .find(&|ban| ban.is_in_force(now) && filter(ban))?
            .is_empty())
    }

    /// Deactivates one ban. The escalation record is left untouched.
    pub fn unban(&self, ban_id: u64, unbanned_by: &str) -> Result<Ban> {
        let now = self.clock.now();
        let mut ban = self
            .bans
            .get(ban_id)?
            .ok_or(RuntimeError::BanNotFound(ban_id))?;

        ban.deactivate(now);
        if !self.bans.update(&ban)? {
            return Err(RuntimeError::BanNotFound(ban_id));
        }

        info!(
            target: "anticheat::bans",
            ban_id,
            account_id = ?ban.account_id,
            unbanned_by,
            "Ban lifted"
        );

        if let Some(account_id) = ban.account_id {
            self.refresh_account_flag(account_id, now)?;
        }
        Ok(ban)
    }

    /// Deactivates every active ban of an account and returns how many.
    pub fn unban_account(&self, account_id: u32, unbanned_by: &str) -> Result<usize> {
        let now = self.clock.now();
        let active = self
            .bans
            .find(&|ban| ban.account_id == Some(account_id) && ban.is_active)?;

        for mut ban in active.iter().cloned() {
            ban.deactivate(now);
            self.bans.update(&ban)?;
        }
        self.accounts.set_banned(account_id, false)?;

        info!(
            target: "anticheat::bans",
            account_id,
            unbanned_by,
            lifted = active.len(),
            "Account unbanned"
        );
        Ok(active.len())
    }

    /// Deactivates temporary bans whose end has passed. Permanent bans are
    /// never touched.
    pub fn expire_old_bans(&self) -> Result<usize> {
        let now = self.clock.now();
        let expired = self.bans.find(&|ban| ban.is_expired(now))?;

        let mut accounts = BTreeSet::new();
        for mut ban in expired.iter().cloned() {
            ban.deactivate(now);
            self.bans.update(&ban)?;
            accounts.extend(ban.account_id);
        }
        for account_id in accounts {
            self.refresh_account_flag(account_id, now)?;
        }

        if !expired.is_empty() {
            info!(target: "anticheat::bans", expired = expired.len(), "Expired temporary bans");
        }
        Ok(expired.len())
    }

    /// Most recent bans first.
    pub fn ban_history(&self, subject: BanSubject, limit: usize) -> Result<Vec<Ban>> {
        let mut bans = self.bans.find(&|ban| match subject {
            BanSubject::Account(id) => ban.account_id == Some(id),
            BanSubject::Character(id) => ban.character_id == Some(id),
        })?;
        bans.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        bans.truncate(limit);
        Ok(bans)
    }

    pub fn escalation_record(&self, account_id: u32) -> Result<Option<EscalationRecord>> {
        Ok(self.escalation.get(account_id)?)
    }

    fn refresh_account_flag(&self, account_id: u32, now: DateTime<Utc>) -> Result<()> {
        let still_banned = self.any_in_force(now, &|ban| ban.account_id == Some(account_id))?;
        self.accounts.set_banned(account_id, still_banned)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::ban::BanTarget;
    use crate::clock::ManualClock;

    fn setup(config: AntiCheatConfig) -> (BanService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let service = BanService::new(&Repositories::in_memory(), &config, clock.clone());
        (service, clock)
    }

    fn issued(outcome: BanOutcome) -> (Ban, EscalationSignal) {
        match outcome {
            BanOutcome::Issued { ban, escalation } => (ban, escalation),
            BanOutcome::Suppressed { .. } => panic!("ban was suppressed"),
        }
    }

    fn temp(account_id: u32) -> BanRequest {
        BanRequest::account(account_id, BanType::Temporary, "speed hack").issued_by("ANTICHEAT")
    }

    #[test]
    fn temporary_ban_ends_after_configured_duration() {
        let (service, clock) = setup(AntiCheatConfig::default());
        let (ban, _) = issued(service.issue_ban(temp(1)).unwrap());

        assert_eq!(ban.ban_end, Some(clock.now() + Duration::days(7)));
        assert!(service.account_flagged(1).unwrap());
        assert!(service.is_account_banned(1).unwrap());

        clock.advance(Duration::days(7));
        assert!(!service.is_account_banned(1).unwrap());
    }

    #[test]
    fn duration_override_wins() {
        let (service, clock) = setup(AntiCheatConfig::default());
        let (ban, _) = issued(service.issue_ban(temp(1).lasting(Duration::hours(2))).unwrap());
        assert_eq!(ban.ban_end, Some(clock.now() + Duration::hours(2)));
    }

    #[test]
    fn permanent_ban_has_no_end() {
        let (service, _) = setup(AntiCheatConfig::default());
        let request = BanRequest::account(1, BanType::Permanent, "duping");
        let (ban, escalation) = issued(service.issue_ban(request).unwrap());

        assert_eq!(ban.ban_end, None);
        assert_eq!(escalation, EscalationSignal::None);
        assert_eq!(service.escalation_record(1).unwrap(), None);
    }

    #[test]
    fn third_temporary_ban_recommends_escalation() {
        let (service, _) = setup(AntiCheatConfig::default());

        let signals: Vec<_> = (0..3)
            .map(|_| issued(service.issue_ban(temp(5)).unwrap()).1)
            .collect();

        assert_eq!(signals[0], EscalationSignal::None);
        assert_eq!(signals[1], EscalationSignal::None);
        assert_eq!(
            signals[2],
            EscalationSignal::Recommended {
                account_id: 5,
                temp_ban_count: 3
            }
        );
        // Only one row per request: the service never escalates by itself.
        assert_eq!(
            service.ban_history(BanSubject::Account(5), 10).unwrap().len(),
            3
        );
    }

    #[test]
    fn gm_bans_do_not_count_unless_configured() {
        let (service, _) = setup(AntiCheatConfig::default());
        for _ in 0..3 {
            service.issue_ban(temp(5).by_gm("GM_Alice")).unwrap();
        }
        assert_eq!(service.escalation_record(5).unwrap(), None);

        let config = AntiCheatConfig {
            gm_bans_increment_counter: true,
            ..AntiCheatConfig::default()
        };
        let (service, _) = setup(config);
        service.issue_ban(temp(5).by_gm("GM_Alice")).unwrap();
        assert_eq!(service.escalation_record(5).unwrap().unwrap().temp_ban_count, 1);
    }

    #[test]
    fn unban_keeps_escalation_count() {
        let (service, _) = setup(AntiCheatConfig::default());
        let (ban, _) = issued(service.issue_ban(temp(3)).unwrap());

        let lifted = service.unban(ban.id, "GM_Bob").unwrap();

        assert!(!lifted.is_active);
        assert!(!service.is_account_banned(3).unwrap());
        assert!(!service.account_flagged(3).unwrap());
        assert_eq!(service.escalation_record(3).unwrap().unwrap().temp_ban_count, 1);
        // Soft delete: the row is still there.
        assert_eq!(service.ban_history(BanSubject::Account(3), 10).unwrap().len(), 1);
    }

    #[test]
    fn unban_of_unknown_ban_fails() {
        let (service, _) = setup(AntiCheatConfig::default());
        assert!(matches!(
            service.unban(77, "GM_Bob"),
            Err(RuntimeError::BanNotFound(77))
        ));
    }

    #[test]
    fn unban_keeps_flag_while_another_ban_is_in_force() {
        let (service, _) = setup(AntiCheatConfig::default());
        let (first, _) = issued(service.issue_ban(temp(3)).unwrap());
        service
            .issue_ban(BanRequest::account(3, BanType::Permanent, "rmt"))
            .unwrap();

        service.unban(first.id, "GM_Bob").unwrap();
        assert!(service.account_flagged(3).unwrap());
    }

    #[test]
    fn unban_account_lifts_everything() {
        let (service, _) = setup(AntiCheatConfig::default());
        service.issue_ban(temp(3)).unwrap();
        service
            .issue_ban(BanRequest::account(3, BanType::Permanent, "rmt"))
            .unwrap();

        assert_eq!(service.unban_account(3, "GM_Bob").unwrap(), 2);
        assert!(!service.is_account_banned(3).unwrap());
        assert_eq!(service.unban_account(3, "GM_Bob").unwrap(), 0);
    }

    #[test]
    fn expiry_sweep_only_touches_lapsed_temporary_bans() {
        let (service, clock) = setup(AntiCheatConfig::default());
        service.issue_ban(temp(1)).unwrap();
        service
            .issue_ban(BanRequest::account(2, BanType::Permanent, "bot"))
            .unwrap();

        assert_eq!(service.expire_old_bans().unwrap(), 0);

        clock.advance(Duration::days(8));
        assert_eq!(service.expire_old_bans().unwrap(), 1);
        assert!(!service.account_flagged(1).unwrap());
        assert!(service.is_account_banned(2).unwrap());
        assert_eq!(service.expire_old_bans().unwrap(), 0);
    }

    #[test]
    fn connect_check_matches_any_dimension() {
        let (service, _) = setup(AntiCheatConfig::default());
        service
            .issue_ban(
                BanRequest::account(1, BanType::Permanent, "aimbot")
                    .ip("10.0.0.9")
                    .hwid("HW-42"),
            )
            .unwrap();

        let banned = |account, ip, hwid| service.is_banned(account, ip, hwid).unwrap();

        assert!(matches!(
            banned(1, "", ""),
            BanCheck::Banned { ref reason, .. } if reason == "aimbot"
        ));
        assert!(banned(2, "10.0.0.9", "").is_banned());
        assert!(banned(2, "", "HW-42").is_banned());
        assert_eq!(banned(2, "10.0.0.10", ""), BanCheck::Clear);
        assert_eq!(banned(2, "", ""), BanCheck::Clear);
        assert!(service.is_ip_banned("10.0.0.9").unwrap());
        assert!(!service.is_ip_banned("").unwrap());
    }

    #[test]
    fn character_bans_are_scoped_to_the_character() {
        let (service, _) = setup(AntiCheatConfig::default());
        let mut request = BanRequest::account(1, BanType::Temporary, "trade scam").character(11);
        request.target = BanTarget::Character;
        service.issue_ban(request).unwrap();

        assert!(service.is_character_banned(11).unwrap());
        assert!(!service.is_character_banned(12).unwrap());
        assert_eq!(
            service.ban_history(BanSubject::Character(11), 5).unwrap().len(),
            1
        );
    }

    #[test]
    fn history_is_newest_first_and_limited() {
        let (service, clock) = setup(AntiCheatConfig::default());
        for reason in ["first", "second", "third"] {
            service
                .issue_ban(BanRequest::account(8, BanType::Temporary, reason).by_gm("GM"))
                .unwrap();
            clock.advance(Duration::minutes(1));
        }

        let history = service.ban_history(BanSubject::Account(8), 2).unwrap();
        let reasons: Vec<_> = history.iter().map(|ban| ban.reason.as_str()).collect();
        assert_eq!(reasons, ["third", "second"]);
    }
}
