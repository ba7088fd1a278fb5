//! Rolling-window violation counters.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::types::{ViolationEvent, ViolationType};
use crate::config::WindowAnchor;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CounterKey {
    pub account_id: u32,
    pub character_id: u32,
    pub violation_type: ViolationType,
}

impl From<&ViolationEvent> for CounterKey {
    fn from(event: &ViolationEvent) -> Self {
        Self {
            account_id: event.account_id,
            character_id: event.character_id,
            violation_type: event.violation_type.clone(),
        }
    }
}

/// Events of one kind by one character inside the current window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCounter {
    pub account_id: u32,
    pub character_id: u32,
    pub violation_type: ViolationType,
    pub count: u32,
    pub window_start: DateTime<Utc>,
    pub last_violation: DateTime<Utc>,
}

impl ViolationCounter {
    /// Counter for a first event at `now`.
    pub fn start(
        account_id: u32,
        character_id: u32,
        violation_type: ViolationType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            character_id,
            violation_type,
            count: 1,
            window_start: now,
            last_violation: now,
        }
    }

    pub fn key(&self) -> CounterKey {
        CounterKey {
            account_id: self.account_id,
            character_id: self.character_id,
            violation_type: self.violation_type.clone(),
        }
    }

    /// Counts another event at `now` and returns the new count.
    ///
    /// If more than `window` has passed since the anchor the window restarts
    /// with this event as its first.
    pub fn record(&mut self, now: DateTime<Utc>, window: Duration, anchor: WindowAnchor) -> u32 {
        let anchor_time = match anchor {
            WindowAnchor::WindowStart => self.window_start,
            WindowAnchor::LastViolation => self.last_violation,
        };

        if now - anchor_time > window {
            self.count = 1;
            self.window_start = now;
        } else {
            self.count = self.count.saturating_add(1);
        }
        self.last_violation = now;
        self.count
    }

    /// Inactive for more than twice the window.
    pub fn is_stale(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let limit = window.checked_mul(2).unwrap_or(Duration::MAX);
        now - self.last_violation > limit
    }
}
