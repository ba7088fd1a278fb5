use std::collections::HashMap;

/// Skill metadata lookup by id and level.
pub trait SkillOracle: Send + Sync {
    fn skill_level(&self, skill_id: u32, level: u8) -> Option<SkillLevelData>;
}

/// Per-level skill data.
///
/// `x` and `y` are skill-specific auxiliary values (meso count, element
/// amplification, multi-target falloff).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillLevelData {
    pub damage: u16,
    pub mastery: u16,
    pub prop: u16,
    pub x: i32,
    pub y: i32,
    pub duration: u32,
}

impl SkillLevelData {
    pub fn damage(damage: u16) -> Self {
        Self {
            damage,
            ..Self::default()
        }
    }

    pub fn mastery(mastery: u16) -> Self {
        Self {
            mastery,
            ..Self::default()
        }
    }

    /// Damage percent as a multiplier; zero or unset means 100%.
    pub fn damage_multiplier(&self) -> f64 {
        if self.damage > 0 {
            f64::from(self.damage) / 100.0
        } else {
            1.0
        }
    }
}

/// Skill tables, one entry per level starting at level 1.
#[derive(Clone, Debug, Default)]
pub struct SkillTable {
    levels: HashMap<u32, Vec<SkillLevelData>>,
}

impl SkillTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, skill_id: u32, levels: Vec<SkillLevelData>) {
        self.levels.insert(skill_id, levels);
    }

    /// Builder form of [`SkillTable::insert`].
    pub fn with(mut self, skill_id: u32, levels: Vec<SkillLevelData>) -> Self {
        self.insert(skill_id, levels);
        self
    }
}

impl SkillOracle for SkillTable {
    fn skill_level(&self, skill_id: u32, level: u8) -> Option<SkillLevelData> {
        let index = usize::from(level).checked_sub(1)?;
        self.levels.get(&skill_id)?.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_one_based() {
        let table = SkillTable::new().with(
            3_100_000,
            vec![SkillLevelData::mastery(1), SkillLevelData::mastery(2)],
        );
        assert_eq!(table.skill_level(3_100_000, 0), None);
        assert_eq!(table.skill_level(3_100_000, 1).map(|s| s.mastery), Some(1));
        assert_eq!(table.skill_level(3_100_000, 2).map(|s| s.mastery), Some(2));
        assert_eq!(table.skill_level(3_100_000, 3), None);
        assert_eq!(table.skill_level(9, 1), None);
    }

    #[test]
    fn unset_damage_is_full_damage() {
        assert_eq!(SkillLevelData::default().damage_multiplier(), 1.0);
        assert_eq!(SkillLevelData::damage(260).damage_multiplier(), 2.6);
    }
}
