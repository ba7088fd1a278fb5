//! Server-side damage validation.
//!
//! # Core Types
//!
//! - [`AttackContext`]: the reported attack (attacker, skill, targets, hits)
//! - [`DamageCalculator`]: resolves per-attack modifiers and judges each hit
//! - [`CalcHitResult`]: envelope plus verdict for one reported hit
//!
//! Formula families live in their own files: weapon and magic base ranges in
//! `base`, special skills in `special`, rolls and modifiers in `hit`.

mod base;
mod calculator;
mod context;
mod hit;
mod result;
mod special;

pub use calculator::DamageCalculator;
pub use context::{AttackContext, AttackMotion, AttackOption, AttackType, TargetHits};
pub use result::{CalcHitResult, DamageRange, TargetResult};
