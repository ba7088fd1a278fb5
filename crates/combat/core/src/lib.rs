//! Deterministic damage oracle for server-side combat validation.
//!
//! `combat-core` recomputes the damage envelope a client *should* have
//! produced for a reported attack and judges each reported hit against it.
//! Everything here is pure: mob and skill data arrive through the oracle
//! traits in [`env`], randomness comes from a pre-drawn [`Roller`], and the
//! calculator never logs, persists, or bans. Turning an invalid hit into a
//! violation is the caller's job.
pub mod combat;
pub mod config;
pub mod env;
pub mod skill;
pub mod stats;
pub mod weapon;

pub use combat::{
    AttackContext, AttackMotion, AttackOption, AttackType, CalcHitResult, DamageCalculator,
    DamageRange, TargetHits, TargetResult,
};
pub use config::CombatConfig;
pub use env::{
    CombatEnv, DynCombatEnv, MobOracle, MobSnapshot, MobTable, OracleError, PcgRng, RngOracle,
    Roller, SkillLevelData, SkillOracle, SkillTable, compute_seed,
};
pub use stats::{AttackerSnapshot, EquippedItem, JobId};
pub use weapon::WeaponType;
