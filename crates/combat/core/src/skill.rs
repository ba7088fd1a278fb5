//! Skill identifiers referenced by the damage formulas.
//!
//! Only skills that change formula selection are listed here; every other
//! skill flows through the generic path using its [`SkillLevelData`].
//!
//! [`SkillLevelData`]: crate::env::SkillLevelData

// ===== warrior =====
pub const SWORD_MASTERY: u32 = 1_100_000;
pub const AXE_MASTERY: u32 = 1_100_001;
pub const PAGE_SWORD_MASTERY: u32 = 1_200_000;
pub const BW_MASTERY: u32 = 1_200_001;
pub const SPEAR_MASTERY: u32 = 1_300_000;
pub const POLEARM_MASTERY: u32 = 1_300_001;
pub const SLASH_BLAST: u32 = 1_001_005;
pub const SACRIFICE: u32 = 1_311_005;
pub const DRAGON_ROAR: u32 = 1_311_006;

// ===== magician =====
pub const ELEMENT_AMPLIFICATION: u32 = 2_110_001;
pub const POISON_MYST: u32 = 2_111_003;
pub const IL_ELEMENT_AMPLIFICATION: u32 = 2_210_001;
pub const BLIZZARD: u32 = 2_221_007;
pub const HEAL: u32 = 2_301_002;

// ===== bowman =====
pub const CRITICAL_SHOT: u32 = 3_000_001;
pub const BOW_MASTERY: u32 = 3_100_000;
pub const POWER_KNOCKBACK: u32 = 3_101_003;
pub const ARROW_BOMB: u32 = 3_101_005;
pub const CROSSBOW_MASTERY: u32 = 3_200_000;
pub const CB_POWER_KNOCKBACK: u32 = 3_201_003;
pub const IRON_ARROW: u32 = 3_201_005;

// ===== thief =====
pub const LUCKY_SEVEN: u32 = 4_001_344;
pub const CLAW_MASTERY: u32 = 4_100_000;
pub const CRITICAL_THROW: u32 = 4_100_001;
pub const DRAIN: u32 = 4_101_005;
pub const SHADOW_WEB: u32 = 4_111_003;
pub const SHADOW_MESO: u32 = 4_111_004;
pub const DAGGER_MASTERY: u32 = 4_200_000;
pub const ASSAULTER: u32 = 4_211_002;

/// Per-target damage falloff for Slash Blast's final-attack option.
pub const SLASH_BLAST_FINAL_ATTACK_FALLOFF: [f64; 6] = [
    0.666_667, 0.222_222, 0.074_074, 0.024_691, 0.008_229, 0.002_743,
];

/// Per-target damage falloff for Iron Arrow piercing.
pub const IRON_ARROW_FALLOFF: [f64; 6] = [1.0, 0.8, 0.64, 0.512, 0.4096, 0.327_68];

/// Skills that bypass mob defense entirely.
pub fn ignores_defense(skill_id: u32) -> bool {
    matches!(skill_id, SACRIFICE | ASSAULTER)
}

pub fn is_power_knockback(skill_id: u32) -> bool {
    matches!(skill_id, POWER_KNOCKBACK | CB_POWER_KNOCKBACK)
}

/// Looks up a falloff table, reusing the last entry past its end.
pub fn falloff(table: &[f64], target_index: usize) -> f64 {
    table
        .get(target_index)
        .or_else(|| table.last())
        .copied()
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falloff_reuses_last_entry() {
        assert_eq!(falloff(&IRON_ARROW_FALLOFF, 0), 1.0);
        assert_eq!(falloff(&IRON_ARROW_FALLOFF, 2), 0.64);
        assert_eq!(falloff(&IRON_ARROW_FALLOFF, 40), 0.327_68);
        assert_eq!(falloff(&[], 3), 1.0);
    }

    #[test]
    fn falloff_tables_never_increase() {
        for table in [&SLASH_BLAST_FINAL_ATTACK_FALLOFF, &IRON_ARROW_FALLOFF] {
            assert!(table.windows(2).all(|pair| pair[0] >= pair[1]));
        }
    }
}
