//! Repository layer for ban and violation data.
//!
//! Repositories hold the durable side of the anti-cheat state:
//! - Bans and the per-account fast-path flag
//! - Escalation records
//! - The violation audit log
//! - A best-effort mirror of the detector's rolling counters
//!
//! In-memory counters stay authoritative; the stores exist for audit and
//! recovery.

mod error;
mod table;
mod traits;

pub mod file;
pub mod memory;

use std::path::Path;
use std::sync::Arc;

pub use error::{RepositoryError, Result};
pub use file::{FileTable, FileViolationLog};
pub use memory::{InMemoryViolationLog, MemoryTable};
pub use table::TableStore;
pub use traits::{
    AccountFlagRepository, BanRepository, CounterRepository, EscalationRepository,
    ViolationLogRepository,
};

use crate::ban::{Ban, EscalationRecord};
use crate::violation::{CounterKey, ViolationCounter};

/// Every store the runtime writes to.
#[derive(Clone)]
pub struct Repositories {
    pub bans: Arc<dyn BanRepository>,
    pub escalation: Arc<dyn EscalationRepository>,
    pub accounts: Arc<dyn AccountFlagRepository>,
    pub violations: Arc<dyn ViolationLogRepository>,
    pub counters: Arc<dyn CounterRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            bans: Arc::new(MemoryTable::<u64, Ban>::new()),
            escalation: Arc::new(MemoryTable::<u32, EscalationRecord>::new()),
            accounts: Arc::new(MemoryTable::<u32, bool>::new()),
            violations: Arc::new(InMemoryViolationLog::new()),
            counters: Arc::new(MemoryTable::<CounterKey, ViolationCounter>::new()),
        }
    }

    /// File-backed stores under `base_dir`.
    pub fn file(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        Ok(Self {
            bans: Arc::new(FileTable::<u64, Ban>::open(base_dir, "bans.json")?),
            escalation: Arc::new(FileTable::<u32, EscalationRecord>::open(
                base_dir,
                "ban_escalation.json",
            )?),
            accounts: Arc::new(FileTable::<u32, bool>::open(base_dir, "accounts.json")?),
            violations: Arc::new(FileViolationLog::open_or_create(
                base_dir,
                "violation_logs.jsonl",
            )?),
            counters: Arc::new(FileTable::<CounterKey, ViolationCounter>::open(
                base_dir,
                "violation_counters.json",
            )?),
        })
    }
}

impl Default for Repositories {
    fn default() -> Self {
        Self::in_memory()
    }
}
