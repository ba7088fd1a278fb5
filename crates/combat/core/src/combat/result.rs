//! Per-hit and per-target validation results.

use crate::env::OracleError;

/// Inclusive damage envelope. Invariant: `0 <= min <= max`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageRange {
    pub min: f64,
    pub max: f64,
}

impl DamageRange {
    pub const ZERO: Self = Self { min: 0.0, max: 0.0 };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn exact(value: f64) -> Self {
        Self::new(value, value)
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Multiplies both bounds by a non-negative factor.
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }

    /// Subtracts `amount` from both bounds, flooring each at zero.
    pub fn reduce(self, amount: f64) -> Self {
        Self::new((self.min - amount).max(0.0), (self.max - amount).max(0.0))
    }

    pub fn clamp(self, low: f64, high: f64) -> Self {
        Self::new(self.min.clamp(low, high), self.max.clamp(low, high))
    }

    pub fn floor(self) -> Self {
        Self::new(self.min.floor(), self.max.floor())
    }

    pub fn is_ordered(&self) -> bool {
        0.0 <= self.min && self.min <= self.max
    }
}

/// Outcome of validating one reported hit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalcHitResult {
    pub is_miss: bool,
    pub is_crit: bool,
    pub min_damage: f64,
    pub max_damage: f64,
    pub expected_damage: f64,
    pub client_damage: i32,
    pub is_valid: bool,
}

impl CalcHitResult {
    pub fn range(&self) -> DamageRange {
        DamageRange::new(self.min_damage, self.max_damage)
    }
}

/// Validation outcome for one target of an attack.
#[derive(Clone, Debug, PartialEq)]
pub enum TargetResult {
    /// Every reported hit was judged.
    Checked {
        spawn_id: u32,
        hits: Vec<CalcHitResult>,
    },
    /// Context was missing; nothing was judged and nothing is a violation.
    Skipped { spawn_id: u32, reason: OracleError },
}

impl TargetResult {
    pub fn spawn_id(&self) -> u32 {
        match self {
            Self::Checked { spawn_id, .. } | Self::Skipped { spawn_id, .. } => *spawn_id,
        }
    }

    /// Judged hits; empty when the target was skipped.
    pub fn hits(&self) -> &[CalcHitResult] {
        match self {
            Self::Checked { hits, .. } => hits,
            Self::Skipped { .. } => &[],
        }
    }

    pub fn invalid_hits(&self) -> impl Iterator<Item = &CalcHitResult> {
        self.hits().iter().filter(|hit| !hit.is_valid)
    }
}
