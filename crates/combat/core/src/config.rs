/// Tunable parameters for damage validation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatConfig {
    /// Fraction above the computed maximum that a reported hit may exceed.
    pub tolerance: f64,
    /// Number of pre-drawn values in each per-target roller.
    pub rolls_per_target: usize,
    /// Skills that never roll a critical hit.
    pub no_crit_skills: Vec<u32>,
}

impl CombatConfig {
    // ===== roll scaling =====
    /// Scales a raw draw into `[0, 1)`.
    pub const STAT_MODIFIER: f64 = 1e-7;
    /// Scales a raw draw into `[0, 100)` for percentage procs.
    pub const PROP_MODIFIER: f64 = 1e-5;

    // ===== caps =====
    pub const MAX_WEAPON_ATTACK: u32 = 1999;
    pub const MAX_MAGIC_ATTACK: u32 = 999;
    pub const MAX_MOB_STAT: u32 = 999;
    pub const MIN_DAMAGE: f64 = 1.0;
    pub const MAX_DAMAGE: f64 = 99_999.0;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TOLERANCE: f64 = 0.1;
    pub const DEFAULT_ROLLS_PER_TARGET: usize = 7;

    pub fn new() -> Self {
        Self {
            tolerance: Self::DEFAULT_TOLERANCE,
            rolls_per_target: Self::DEFAULT_ROLLS_PER_TARGET,
            no_crit_skills: vec![crate::skill::BLIZZARD],
        }
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::new()
        }
    }

    /// Largest reported value still accepted for a computed maximum.
    pub fn accepted_max(&self, max_damage: f64) -> f64 {
        max_damage * (1.0 + self.tolerance)
    }

    pub fn never_crits(&self, skill_id: u32) -> bool {
        self.no_crit_skills.contains(&skill_id)
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
