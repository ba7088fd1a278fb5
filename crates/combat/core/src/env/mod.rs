//! Read-only collaborators of the damage calculator.
//!
//! Mob and skill data come from the host server through [`MobOracle`] and
//! [`SkillOracle`]; draws come from an [`RngOracle`]. The [`CombatEnv`]
//! aggregate bundles them so formulas never couple to concrete sources.
mod error;
mod mobs;
mod rng;
mod skills;

pub use error::OracleError;
pub use mobs::{MobOracle, MobSnapshot, MobTable};
pub use rng::{PcgRng, RngOracle, Roller, compute_seed};
pub use skills::{SkillLevelData, SkillOracle, SkillTable};

/// Aggregates the oracles a validation pass reads from.
pub struct CombatEnv<'a, M, S, R>
where
    M: MobOracle + ?Sized,
    S: SkillOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    mobs: &'a M,
    skills: &'a S,
    rng: &'a R,
}

// Manual impls: derives would demand `Clone` on the (possibly unsized) oracles.
impl<M, S, R> Clone for CombatEnv<'_, M, S, R>
where
    M: MobOracle + ?Sized,
    S: SkillOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<M, S, R> Copy for CombatEnv<'_, M, S, R>
where
    M: MobOracle + ?Sized,
    S: SkillOracle + ?Sized,
    R: RngOracle + ?Sized,
{
}

pub type DynCombatEnv<'a> =
    CombatEnv<'a, dyn MobOracle + 'a, dyn SkillOracle + 'a, dyn RngOracle + 'a>;

impl<'a, M, S, R> CombatEnv<'a, M, S, R>
where
    M: MobOracle + ?Sized,
    S: SkillOracle + ?Sized,
    R: RngOracle + ?Sized,
{
    pub fn new(mobs: &'a M, skills: &'a S, rng: &'a R) -> Self {
        Self { mobs, skills, rng }
    }

    /// Returns the live mob for `spawn_id`.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::MobNotFound` if the mob is gone.
    pub fn mob(&self, spawn_id: u32) -> Result<MobSnapshot, OracleError> {
        self.mobs
            .mob(spawn_id)
            .ok_or(OracleError::MobNotFound(spawn_id))
    }

    /// Returns the data for `skill_id` at `level`.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::SkillNotFound` if the id or level is unknown.
    pub fn skill(&self, skill_id: u32, level: u8) -> Result<SkillLevelData, OracleError> {
        self.skills
            .skill_level(skill_id, level)
            .ok_or(OracleError::SkillNotFound { skill_id, level })
    }

    pub fn rng(&self) -> &'a R {
        self.rng
    }
}

impl<'a, M, S, R> CombatEnv<'a, M, S, R>
where
    M: MobOracle + 'a,
    S: SkillOracle + 'a,
    R: RngOracle + 'a,
{
    /// Erases the concrete oracle types.
    pub fn into_dyn(self) -> DynCombatEnv<'a> {
        let mobs: &'a dyn MobOracle = self.mobs;
        let skills: &'a dyn SkillOracle = self.skills;
        let rng: &'a dyn RngOracle = self.rng;
        CombatEnv::new(mobs, skills, rng)
    }
}
