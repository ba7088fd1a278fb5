use std::sync::RwLock;

use crate::repository::{RepositoryError, Result, ViolationLogRepository};
use crate::violation::{ViolationEvent, ViolationLogEntry};

/// Violation log kept in a vector, oldest first.
#[derive(Default)]
pub struct InMemoryViolationLog {
    entries: RwLock<Vec<ViolationLogEntry>>,
}

impl InMemoryViolationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the log with already persisted rows.
    pub(crate) fn from_entries(entries: Vec<ViolationLogEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn next_id(&self) -> Result<u64> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(entries.last().map_or(1, |last| last.id + 1))
    }

    pub(crate) fn push(&self, entry: ViolationLogEntry) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?
            .push(entry);
        Ok(())
    }
}

impl ViolationLogRepository for InMemoryViolationLog {
    fn append(&self, event: &ViolationEvent) -> Result<u64> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let id = entries.last().map_or(1, |last| last.id + 1);
        entries.push(ViolationLogEntry {
            id,
            event: event.clone(),
            action_taken: None,
        });
        Ok(id)
    }

    fn amend(&self, ids: &[u64], action_taken: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        for entry in entries.iter_mut().filter(|entry| ids.contains(&entry.id)) {
            entry.action_taken = Some(action_taken.to_string());
        }
        Ok(())
    }

    fn find(
        &self,
        predicate: &dyn Fn(&ViolationLogEntry) -> bool,
        limit: usize,
    ) -> Result<Vec<ViolationLogEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(entries
            .iter()
            .rev()
            .filter(|entry| predicate(entry))
            .take(limit)
            .cloned()
            .collect())
    }
}
