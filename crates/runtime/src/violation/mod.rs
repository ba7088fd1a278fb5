//! Violation events, rolling counters and the detector that turns repeated
//! violations into bans.

mod counter;
mod detector;
mod helpers;
mod types;

pub use counter::{CounterKey, ViolationCounter};
pub use detector::{DETECTOR_ISSUER, RecordOutcome, ViolationDetector};
pub use helpers::{ATTACK_LATENCY_SLACK, DAMAGE_MARGIN, SPEED_MARGIN};
pub use types::{
    PlayerIdentity, PlayerInfo, Severity, ViolationCategory, ViolationEvent, ViolationLogEntry,
    ViolationType,
};
