//! Repository contracts for ban, escalation and violation data.
//!
//! Every contract is synchronous and takes `&self`; implementations do their
//! own locking. Callers treat failures as non-fatal: the in-memory state of
//! the detector and the tracker stays authoritative.

use crate::ban::{Ban, EscalationRecord};
use crate::repository::Result;
use crate::violation::{CounterKey, ViolationCounter, ViolationEvent, ViolationLogEntry};

/// Ban rows. Rows are updated in place, never removed.
pub trait BanRepository: Send + Sync {
    /// Stores `ban` under a freshly assigned id and returns the stored row.
    fn insert(&self, ban: Ban) -> Result<Ban>;

    fn get(&self, id: u64) -> Result<Option<Ban>>;

    /// Overwrites the row with `ban.id`. Returns `false` if no such row exists.
    fn update(&self, ban: &Ban) -> Result<bool>;

    /// All rows matching `predicate`, in id order.
    fn find(&self, predicate: &dyn Fn(&Ban) -> bool) -> Result<Vec<Ban>>;
}

/// Per-account escalation records.
pub trait EscalationRepository: Send + Sync {
    fn get(&self, account_id: u32) -> Result<Option<EscalationRecord>>;

    /// Applies `change` to the account's record (created on demand) under a
    /// single write and returns the updated record.
    fn update(
        &self,
        account_id: u32,
        change: &mut dyn FnMut(&mut EscalationRecord),
    ) -> Result<EscalationRecord>;
}

/// Fast-path "account is banned" flag read at login.
pub trait AccountFlagRepository: Send + Sync {
    fn set_banned(&self, account_id: u32, banned: bool) -> Result<()>;

    fn is_banned(&self, account_id: u32) -> Result<bool>;
}

/// Append-only violation audit log.
pub trait ViolationLogRepository: Send + Sync {
    /// Appends `event` and returns its id.
    fn append(&self, event: &ViolationEvent) -> Result<u64>;

    /// Records the action taken for the given rows.
    fn amend(&self, ids: &[u64], action_taken: &str) -> Result<()>;

    /// Up to `limit` rows matching `predicate`, newest first.
    fn find(
        &self,
        predicate: &dyn Fn(&ViolationLogEntry) -> bool,
        limit: usize,
    ) -> Result<Vec<ViolationLogEntry>>;
}

/// Best-effort mirror of the detector's rolling counters.
pub trait CounterRepository: Send + Sync {
    fn upsert(&self, counter: &ViolationCounter) -> Result<()>;

    fn remove(&self, key: &CounterKey) -> Result<()>;

    fn load_all(&self) -> Result<Vec<ViolationCounter>>;
}
