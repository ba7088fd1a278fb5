//! Keyed tables shared by the in-memory and file-backed repositories.
//!
//! A table only knows how to hand out its rows for reading or writing; the
//! repository contracts are implemented once on top of that for every store.

use std::collections::BTreeMap;

use crate::ban::{Ban, EscalationRecord};
use crate::repository::traits::{
    AccountFlagRepository, BanRepository, CounterRepository, EscalationRepository,
};
use crate::repository::Result;
use crate::violation::{CounterKey, ViolationCounter};

/// Keyed row storage.
pub trait TableStore<K, V>: Send + Sync {
    fn read<R>(&self, f: impl FnOnce(&BTreeMap<K, V>) -> R) -> Result<R>;

    /// Runs `f` with exclusive access. Durable stores persist afterwards and
    /// log, rather than return, a failed save.
    fn write<R>(&self, f: impl FnOnce(&mut BTreeMap<K, V>) -> R) -> Result<R>;
}

impl<T> BanRepository for T
where
    T: TableStore<u64, Ban>,
{
    fn insert(&self, mut ban: Ban) -> Result<Ban> {
        self.write(|rows| {
            ban.id = rows.keys().next_back().map_or(1, |last| last + 1);
            rows.insert(ban.id, ban.clone());
            ban
        })
    }

    fn get(&self, id: u64) -> Result<Option<Ban>> {
        self.read(|rows| rows.get(&id).cloned())
    }

    fn update(&self, ban: &Ban) -> Result<bool> {
        self.write(|rows| match rows.get_mut(&ban.id) {
            Some(row) => {
                *row = ban.clone();
                true
            }
            None => false,
        })
    }

    fn find(&self, predicate: &dyn Fn(&Ban) -> bool) -> Result<Vec<Ban>> {
        self.read(|rows| rows.values().filter(|ban| predicate(ban)).cloned().collect())
    }
}

impl<T> EscalationRepository for T
where
    T: TableStore<u32, EscalationRecord>,
{
    fn get(&self, account_id: u32) -> Result<Option<EscalationRecord>> {
        self.read(|rows| rows.get(&account_id).cloned())
    }

    fn update(
        &self,
        account_id: u32,
        change: &mut dyn FnMut(&mut EscalationRecord),
    ) -> Result<EscalationRecord> {
        self.write(|rows| {
            let record = rows
                .entry(account_id)
                .or_insert_with(|| EscalationRecord::new(account_id));
            change(record);
            record.clone()
        })
    }
}

impl<T> AccountFlagRepository for T
where
    T: TableStore<u32, bool>,
{
    fn set_banned(&self, account_id: u32, banned: bool) -> Result<()> {
        self.write(|rows| {
            rows.insert(account_id, banned);
        })
    }

    fn is_banned(&self, account_id: u32) -> Result<bool> {
        self.read(|rows| rows.get(&account_id).copied().unwrap_or(false))
    }
}

impl<T> CounterRepository for T
where
    T: TableStore<CounterKey, ViolationCounter>,
{
    fn upsert(&self, counter: &ViolationCounter) -> Result<()> {
        self.write(|rows| {
            rows.insert(counter.key(), counter.clone());
        })
    }

    fn remove(&self, key: &CounterKey) -> Result<()> {
        self.write(|rows| {
            rows.remove(key);
        })
    }

    fn load_all(&self) -> Result<Vec<ViolationCounter>> {
        self.read(|rows| rows.values().cloned().collect())
    }
}
