use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::repository::table::TableStore;
use crate::repository::{RepositoryError, Result};

/// Table held entirely in memory.
pub struct MemoryTable<K, V> {
    rows: RwLock<BTreeMap<K, V>>,
}

impl<K, V> MemoryTable<K, V> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<K, V> Default for MemoryTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> TableStore<K, V> for MemoryTable<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
    fn read<R>(&self, f: impl FnOnce(&BTreeMap<K, V>) -> R) -> Result<R> {
        let rows = self.rows.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(f(&rows))
    }

    fn write<R>(&self, f: impl FnOnce(&mut BTreeMap<K, V>) -> R) -> Result<R> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(f(&mut rows))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::ban::{Ban, BanTarget, BanType, EscalationRecord};
    use crate::repository::{AccountFlagRepository, BanRepository, EscalationRepository};

    fn ban(account_id: u32) -> Ban {
        let now = DateTime::<Utc>::UNIX_EPOCH;
        Ban {
            id: 0,
            account_id: Some(account_id),
            character_id: None,
            ip_address: None,
            hwid: None,
            ban_type: BanType::Temporary,
            target: BanTarget::Account,
            reason: "test".into(),
            issued_by: "SYSTEM".into(),
            issued_by_gm: false,
            is_active: true,
            ban_start: now,
            ban_end: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn ban_ids_are_assigned_in_sequence() {
        let repo = MemoryTable::<u64, Ban>::new();

        let first = repo.insert(ban(1)).unwrap();
        let second = repo.insert(ban(2)).unwrap();

        assert_eq!((first.id, second.id), (1, 2));
        let stored = BanRepository::get(&repo, 2).unwrap().unwrap();
        assert_eq!(stored.account_id, Some(2));
    }

    #[test]
    fn update_of_missing_row_reports_false() {
        let repo = MemoryTable::<u64, Ban>::new();
        let mut row = ban(1);
        row.id = 42;
        assert!(!repo.update(&row).unwrap());
    }

    #[test]
    fn escalation_update_creates_record_on_demand() {
        let repo = MemoryTable::<u32, EscalationRecord>::new();

        let record = repo
            .update(9, &mut |record| record.temp_ban_count += 1)
            .unwrap();
        assert_eq!(record.temp_ban_count, 1);

        let record = repo
            .update(9, &mut |record| record.temp_ban_count += 1)
            .unwrap();
        assert_eq!(record.temp_ban_count, 2);
        assert_eq!(EscalationRepository::get(&repo, 9).unwrap(), Some(record));
    }

    #[test]
    fn unknown_account_is_not_flagged() {
        let repo = MemoryTable::<u32, bool>::new();
        assert!(!repo.is_banned(5).unwrap());

        repo.set_banned(5, true).unwrap();
        assert!(repo.is_banned(5).unwrap());
    }
}
