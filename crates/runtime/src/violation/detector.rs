//! Rolling-window violation detector.
//!
//! Every reported event is logged first, then counted per
//! `(account, character, type)`. Crossing the type's threshold issues a ban
//! through the [`Enforcer`] and resets the counter.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use super::counter::{CounterKey, ViolationCounter};
use super::types::{ViolationEvent, ViolationLogEntry};
use crate::api::{Result, RuntimeError};
use crate::ban::{BanRequest, Enforcement, Enforcer};
use crate::clock::Clock;
use crate::config::AntiCheatConfig;
use crate::repository::{CounterRepository, Repositories, ViolationLogRepository};

/// Issuer recorded on bans the detector hands out.
pub const DETECTOR_ISSUER: &str = "ANTICHEAT";

/// What recording one event led to.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Anti-cheat is switched off; nothing was logged or counted.
    Disabled,
    Counted { count: u32, threshold: u32 },
    ActionTaken { count: u32, enforcement: Enforcement },
    /// The threshold was reached but the ban could not be stored. The
    /// counter is kept, so the next event of the key retries the ban.
    BanDeferred { count: u32, threshold: u32 },
}

impl RecordOutcome {
    pub fn enforcement(&self) -> Option<&Enforcement> {
        match self {
            Self::ActionTaken { enforcement, .. } => Some(enforcement),
            _ => None,
        }
    }
}

struct Decision {
    count: u32,
    breached: bool,
    snapshot: ViolationCounter,
}

pub struct ViolationDetector {
    config: Arc<AntiCheatConfig>,
    counters: Mutex<HashMap<CounterKey, ViolationCounter>>,
    logs: Arc<dyn ViolationLogRepository>,
    mirror: Arc<dyn CounterRepository>,
    enforcer: Arc<Enforcer>,
    clock: Arc<dyn Clock>,
}

impl ViolationDetector {
    pub fn new(
        config: Arc<AntiCheatConfig>,
        repos: &Repositories,
        enforcer: Arc<Enforcer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            counters: Mutex::new(HashMap::new()),
            logs: Arc::clone(&repos.violations),
            mirror: Arc::clone(&repos.counters),
            enforcer,
            clock,
        }
    }

    pub fn config(&self) -> &AntiCheatConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Logs, counts and, past the threshold, bans.
    ///
    /// Log, mirror and ban-store failures are reported and otherwise
    /// ignored; the in-memory counter is the source of truth. Only a
    /// poisoned counter lock is returned as an error.
    pub fn record_violation(&self, event: ViolationEvent) -> Result<RecordOutcome> {
        if !self.config.enabled {
            return Ok(RecordOutcome::Disabled);
        }

        if let Err(e) = self.logs.append(&event) {
            warn!(
                target: "anticheat::detector",
                account_id = event.account_id,
                violation = %event.violation_type,
                "Failed to persist violation: {}", e
            );
        }

        let rule = self.config.rule_for(&event.violation_type);
        let key = CounterKey::from(&event);
        let now = self.clock.now();

        let decision = {
            let mut counters = self
                .counters
                .lock()
                .map_err(|_| RuntimeError::LockPoisoned)?;

            let (count, snapshot) = match counters.get_mut(&key) {
                Some(counter) => {
                    let count =
                        counter.record(now, rule.window(), self.config.counter_window_anchor);
                    (count, counter.clone())
                }
                None => {
                    let counter = ViolationCounter::start(
                        key.account_id,
                        key.character_id,
                        key.violation_type.clone(),
                        now,
                    );
                    counters.insert(key.clone(), counter.clone());
                    (1, counter)
                }
            };

            let breached = count >= rule.threshold;
            if breached {
                counters.remove(&key);
            }
            Decision {
                count,
                breached,
                snapshot,
            }
        };

        self.mirror_counter(&key, &decision);

        debug!(
            target: "anticheat::detector",
            account_id = event.account_id,
            character_id = event.character_id,
            violation = %event.violation_type,
            severity = %event.severity,
            count = decision.count,
            threshold = rule.threshold,
            "Violation recorded: {}", event.details
        );

        if !decision.breached {
            return Ok(RecordOutcome::Counted {
                count: decision.count,
                threshold: rule.threshold,
            });
        }

        warn!(
            target: "anticheat::detector",
            account_id = event.account_id,
            character_id = event.character_id,
            violation = %event.violation_type,
            count = decision.count,
            ban_type = %rule.ban_type,
            "Violation threshold reached"
        );

        let mut request = BanRequest::account(
            event.account_id,
            rule.ban_type,
            format!(
                "Anti-cheat: {} violation detected ({} occurrences within window)",
                event.violation_type, decision.count
            ),
        )
        .character(event.character_id)
        .issued_by(DETECTOR_ISSUER);
        if self.config.ip_ban_mode.attaches_ip(rule.ban_type) {
            request = request.ip(event.ip_address.clone());
        }

        let enforcement = match self.enforcer.enforce(request) {
            Ok(enforcement) => enforcement,
            Err(e) => {
                error!(
                    target: "anticheat::detector",
                    account_id = event.account_id,
                    violation = %event.violation_type,
                    count = decision.count,
                    "Ban could not be issued, keeping counter: {}", e
                );
                self.reinstate(decision.snapshot)?;
                return Ok(RecordOutcome::BanDeferred {
                    count: decision.count,
                    threshold: rule.threshold,
                });
            }
        };
        self.amend_logs(&key, decision.count, &event);

        Ok(RecordOutcome::ActionTaken {
            count: decision.count,
            enforcement,
        })
    }

    fn mirror_counter(&self, key: &CounterKey, decision: &Decision) {
        let mirrored = if decision.breached {
            self.mirror.remove(key)
        } else {
            self.mirror.upsert(&decision.snapshot)
        };
        if let Err(e) = mirrored {
            warn!(
                target: "anticheat::detector",
                account_id = key.account_id,
                violation = %key.violation_type,
                "Failed to mirror violation counter: {}", e
            );
        }
    }

    /// Puts a breached counter back after a failed ban. An event counted
    /// meanwhile keeps its timestamps but never lowers the count.
    fn reinstate(&self, snapshot: ViolationCounter) -> Result<()> {
        let current = {
            let mut counters = self
                .counters
                .lock()
                .map_err(|_| RuntimeError::LockPoisoned)?;
            match counters.entry(snapshot.key()) {
                Entry::Occupied(mut entry) => {
                    let counter = entry.get_mut();
                    counter.count = counter.count.max(snapshot.count);
                    counter.window_start = counter.window_start.min(snapshot.window_start);
                    counter.clone()
                }
                Entry::Vacant(entry) => entry.insert(snapshot).clone(),
            }
        };

        if let Err(e) = self.mirror.upsert(&current) {
            warn!(
                target: "anticheat::detector",
                account_id = current.account_id,
                violation = %current.violation_type,
                "Failed to mirror violation counter: {}", e
            );
        }
        Ok(())
    }

    /// Marks the rows that made up the breach with the action taken.
    fn amend_logs(&self, key: &CounterKey, count: u32, event: &ViolationEvent) {
        let action = format!("Ban issued: {}", event.violation_type);
        let amended = self
            .logs
            .find(
                &|entry| {
                    entry.event.account_id == key.account_id
                        && entry.event.character_id == key.character_id
                        && entry.event.violation_type == key.violation_type
                },
                count as usize,
            )
            .and_then(|rows| {
                let ids: Vec<u64> = rows.iter().map(|row| row.id).collect();
                self.logs.amend(&ids, &action)
            });

        if let Err(e) = amended {
            warn!(
                target: "anticheat::detector",
                account_id = key.account_id,
                "Failed to record action taken on violation logs: {}", e
            );
        }
    }

    /// Drops counters idle for more than twice their window, here and in
    /// the mirror. Returns how many were dropped.
    pub fn cleanup_expired(&self) -> Result<usize> {
        let now = self.clock.now();

        let removed: Vec<CounterKey> = {
            let mut counters = self
                .counters
                .lock()
                .map_err(|_| RuntimeError::LockPoisoned)?;
            let stale: Vec<CounterKey> = counters
                .iter()
                .filter(|(key, counter)| {
                    counter.is_stale(now, self.config.rule_for(&key.violation_type).window())
                })
                .map(|(key, _)| key.clone())
                .collect();
            for key in &stale {
                counters.remove(key);
            }
            stale
        };

        for key in &removed {
            if let Err(e) = self.mirror.remove(key) {
                warn!(
                    target: "anticheat::detector",
                    account_id = key.account_id,
                    "Failed to drop mirrored counter: {}", e
                );
            }
        }

        if !removed.is_empty() {
            debug!(
                target: "anticheat::detector",
                removed = removed.len(),
                "Cleaned up idle violation counters"
            );
        }
        Ok(removed.len())
    }

    /// Reloads live counters from the mirror. Returns how many were restored.
    pub fn restore(&self) -> Result<usize> {
        let now = self.clock.now();
        let persisted = self.mirror.load_all()?;

        let mut counters = self
            .counters
            .lock()
            .map_err(|_| RuntimeError::LockPoisoned)?;
        let mut restored = 0;
        for counter in persisted {
            let window = self.config.rule_for(&counter.violation_type).window();
            if counter.is_stale(now, window) {
                continue;
            }
            counters.insert(counter.key(), counter);
            restored += 1;
        }

        info!(target: "anticheat::detector", restored, "Restored violation counters");
        Ok(restored)
    }

    /// Current counter for `key`, if its window is live.
    pub fn counter(&self, key: &CounterKey) -> Result<Option<ViolationCounter>> {
        let counters = self
            .counters
            .lock()
            .map_err(|_| RuntimeError::LockPoisoned)?;
        Ok(counters.get(key).cloned())
    }

    /// Logged violations of a character, newest first.
    pub fn violation_history(
        &self,
        character_id: u32,
        limit: usize,
    ) -> Result<Vec<ViolationLogEntry>> {
        Ok(self
            .logs
            .find(&|entry| entry.event.character_id == character_id, limit)?)
    }
}
