use std::collections::HashMap;

/// Live mob lookup by spawn id.
pub trait MobOracle: Send + Sync {
    fn mob(&self, spawn_id: u32) -> Option<MobSnapshot>;
}

/// Combat-relevant view of a live mob.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MobSnapshot {
    pub spawn_id: u32,
    pub level: u8,
    pub max_hp: u32,
    pub physical_defense: u16,
    pub magic_defense: u16,
    pub evasion: u16,
    pub magic_immune: bool,
}

impl MobSnapshot {
    pub fn new(spawn_id: u32, level: u8, max_hp: u32) -> Self {
        Self {
            spawn_id,
            level,
            max_hp,
            ..Self::default()
        }
    }

    pub fn with_defense(mut self, physical: u16, magic: u16) -> Self {
        self.physical_defense = physical;
        self.magic_defense = magic;
        self
    }

    pub fn with_evasion(mut self, evasion: u16) -> Self {
        self.evasion = evasion;
        self
    }

    pub fn magic_immune(mut self) -> Self {
        self.magic_immune = true;
        self
    }
}

/// Fixed set of mobs, keyed by spawn id.
#[derive(Clone, Debug, Default)]
pub struct MobTable {
    mobs: HashMap<u32, MobSnapshot>,
}

impl MobTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mob: MobSnapshot) {
        self.mobs.insert(mob.spawn_id, mob);
    }

    pub fn remove(&mut self, spawn_id: u32) -> Option<MobSnapshot> {
        self.mobs.remove(&spawn_id)
    }
}

impl FromIterator<MobSnapshot> for MobTable {
    fn from_iter<T: IntoIterator<Item = MobSnapshot>>(iter: T) -> Self {
        Self {
            mobs: iter.into_iter().map(|mob| (mob.spawn_id, mob)).collect(),
        }
    }
}

impl MobOracle for MobTable {
    fn mob(&self, spawn_id: u32) -> Option<MobSnapshot> {
        self.mobs.get(&spawn_id).copied()
    }
}
