//! Oracle lookup errors.

/// Missing combat context.
///
/// A missing mob or skill is almost always a benign race (the mob died, the
/// skill table reloaded). Callers skip the affected target instead of
/// treating the attack as a violation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    /// No live mob with this spawn id.
    #[error("mob with spawn id {0} not found")]
    MobNotFound(u32),

    /// Skill id/level pair missing from the skill tables.
    #[error("skill {skill_id} level {level} not found")]
    SkillNotFound { skill_id: u32, level: u8 },

    /// Equipped weapon has no damage formula.
    #[error("no damage formula for weapon item {0}")]
    UnsupportedWeapon(u32),
}
