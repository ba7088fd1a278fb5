//! Cloneable facade over the tracker worker and the ban pipeline.
//!
//! [`AntiCheat`] serves callers that lack full violation metadata: login
//! throttling and coarse "N events in a window" checks. Counter updates go
//! through the tracker queue; bans go through the shared [`Enforcer`].
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use super::errors::{Result, RuntimeError};
use crate::ban::{Ban, BanCheck, BanRequest, BanSubject, BanType, Enforcement, Enforcer};
use crate::config::AntiCheatConfig;
use crate::violation::{ATTACK_LATENCY_SLACK, DAMAGE_MARGIN, PlayerInfo};
use crate::workers::Command;

/// Issuer recorded on bans raised by the facade.
pub const FACADE_ISSUER: &str = "ANTICHEAT";

/// Length of every ban issued by a failed check.
pub const FACADE_BAN_DURATION: chrono::Duration = chrono::Duration::days(7);

/// One "N events in a window" rule used by the `check_*` helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackRule {
    pub kind: &'static str,
    pub threshold: usize,
    pub window: Duration,
    pub description: &'static str,
}

impl TrackRule {
    const fn new(
        kind: &'static str,
        threshold: usize,
        window_secs: u64,
        description: &'static str,
    ) -> Self {
        Self {
            kind,
            threshold,
            window: Duration::from_secs(window_secs),
            description,
        }
    }

    pub const DAMAGE: TrackRule = TrackRule::new("damage", 5, 300, "excessive damage");
    pub const ATTACK_SPEED: TrackRule = TrackRule::new("attack_speed", 10, 60, "attack speed hack");
    pub const TELEPORT: TrackRule = TrackRule::new("teleport", 3, 300, "teleport hack");
    pub const INVALID_ITEM: TrackRule = TrackRule::new("invalid_item", 3, 600, "invalid item use");
    pub const INVALID_TRADE: TrackRule =
        TrackRule::new("invalid_trade", 3, 600, "invalid trade");
    pub const SKILL_ABUSE: TrackRule = TrackRule::new("skill_abuse", 5, 300, "skill abuse");

    fn reason(&self) -> String {
        format!(
            "Auto-ban: {} ({} times within {} min)",
            self.description,
            self.threshold,
            self.window.as_secs() / 60
        )
    }
}

/// Client-facing handle to the anti-cheat facade.
#[derive(Clone)]
pub struct AntiCheat {
    command_tx: mpsc::Sender<Command>,
    enforcer: Arc<Enforcer>,
    config: Arc<AntiCheatConfig>,
}

impl AntiCheat {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        enforcer: Arc<Enforcer>,
        config: Arc<AntiCheatConfig>,
    ) -> Self {
        Self {
            command_tx,
            enforcer,
            config,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Records one `kind` event for the account and returns `true` once
    /// `threshold` events fall inside `window`.
    pub async fn track(
        &self,
        account_id: u32,
        kind: &str,
        threshold: usize,
        window: Duration,
    ) -> Result<bool> {
        self.record(account_id, kind, threshold, window, false).await
    }

    async fn record(
        &self,
        account_id: u32,
        kind: &str,
        threshold: usize,
        window: Duration,
        reset_on_trip: bool,
    ) -> Result<bool> {
        let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX);
        self.request(|reply| Command::Track {
            account_id,
            kind: kind.to_string(),
            threshold,
            window,
            reset_on_trip,
            reply,
        })
        .await
    }

    pub async fn reset(&self, account_id: u32, kind: &str) -> Result<()> {
        self.request(|reply| Command::Reset {
            account_id,
            kind: kind.to_string(),
            reply,
        })
        .await
    }

    /// Records a failed login for `identifier` (user name, IP or hardware
    /// id). Returns `true` at ten failures within thirty minutes; the caller
    /// decides what to ban.
    pub async fn track_failed_auth(&self, identifier: impl Into<String>) -> Result<bool> {
        let identifier = identifier.into();
        self.request(|reply| Command::TrackFailedAuth { identifier, reply })
            .await
    }

    /// Forgets failed logins after a successful one.
    pub async fn clear_auth<I, S>(&self, identifiers: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let identifiers = identifiers.into_iter().map(Into::into).collect();
        self.request(|reply| Command::ClearAuth { identifiers, reply })
            .await
    }

    /// Drops tracker entries older than the configured retention.
    pub async fn sweep(&self) -> Result<usize> {
        self.request(|reply| Command::Sweep { reply }).await
    }

    pub async fn check_damage(
        &self,
        player: &(impl PlayerInfo + ?Sized),
        damage: i64,
        expected_max: i64,
    ) -> Result<Option<Enforcement>> {
        if damage as f64 <= expected_max as f64 * DAMAGE_MARGIN {
            return Ok(None);
        }
        self.check(player, TrackRule::DAMAGE).await
    }

    pub async fn check_attack_speed(
        &self,
        player: &(impl PlayerInfo + ?Sized),
        since_last_attack: Duration,
        minimum_delay: Duration,
    ) -> Result<Option<Enforcement>> {
        if since_last_attack >= minimum_delay.saturating_sub(ATTACK_LATENCY_SLACK) {
            return Ok(None);
        }
        self.check(player, TrackRule::ATTACK_SPEED).await
    }

    /// Counts one movement the caller already judged impossible.
    pub async fn check_teleport(
        &self,
        player: &(impl PlayerInfo + ?Sized),
    ) -> Result<Option<Enforcement>> {
        self.check(player, TrackRule::TELEPORT).await
    }

    pub async fn check_invalid_item(
        &self,
        player: &(impl PlayerInfo + ?Sized),
    ) -> Result<Option<Enforcement>> {
        self.check(player, TrackRule::INVALID_ITEM).await
    }

    pub async fn check_invalid_trade(
        &self,
        player: &(impl PlayerInfo + ?Sized),
    ) -> Result<Option<Enforcement>> {
        self.check(player, TrackRule::INVALID_TRADE).await
    }

    pub async fn check_skill_abuse(
        &self,
        player: &(impl PlayerInfo + ?Sized),
    ) -> Result<Option<Enforcement>> {
        self.check(player, TrackRule::SKILL_ABUSE).await
    }

    async fn check(
        &self,
        player: &(impl PlayerInfo + ?Sized),
        rule: TrackRule,
    ) -> Result<Option<Enforcement>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let account_id = player.account_id();
        let character_id = player.character_id();
        let ip_address = player.ip_address().to_string();

        // The tracker clears the key when it trips, so concurrent checks on
        // one key yield a single ban per full window.
        if !self
            .record(account_id, rule.kind, rule.threshold, rule.window, true)
            .await?
        {
            return Ok(None);
        }

        warn!(
            target: "anticheat::tracker",
            account_id,
            character_id,
            kind = rule.kind,
            "Track threshold exceeded, issuing ban"
        );

        let mut request = BanRequest::account(account_id, BanType::Temporary, rule.reason())
            .character(character_id)
            .issued_by(FACADE_ISSUER)
            .lasting(FACADE_BAN_DURATION);
        if self.config.ip_ban_mode.attaches_ip(BanType::Temporary) {
            request = request.ip(ip_address);
        }

        Ok(Some(self.enforcer.enforce(request)?))
    }

    /// Issues a ban on the account; `hours == 0` means permanent. Empty IP
    /// and hardware ids are not attached.
    pub async fn issue_ban(
        &self,
        account_id: u32,
        hours: u32,
        reason: &str,
        ip_address: &str,
        hwid: &str,
    ) -> Result<Enforcement> {
        let ban_type = if hours == 0 {
            BanType::Permanent
        } else {
            BanType::Temporary
        };
        let mut request = BanRequest::account(account_id, ban_type, reason)
            .issued_by(FACADE_ISSUER)
            .ip(ip_address)
            .hwid(hwid);
        if hours > 0 {
            request = request.lasting(chrono::Duration::hours(i64::from(hours)));
        }
        self.enforcer.enforce(request)
    }

    pub async fn is_banned(&self, account_id: u32, ip_address: &str, hwid: &str) -> Result<BanCheck> {
        self.enforcer.bans().is_banned(account_id, ip_address, hwid)
    }

    /// Lifts every active ban of the account.
    pub async fn unban(&self, account_id: u32, unbanned_by: &str) -> Result<usize> {
        self.enforcer.bans().unban_account(account_id, unbanned_by)
    }

    pub async fn ban_history(&self, account_id: u32, limit: usize) -> Result<Vec<Ban>> {
        self.enforcer
            .bans()
            .ban_history(BanSubject::Account(account_id), limit)
    }
}
