//! Bans and escalation.
//!
//! [`BanService`] persists and queries bans and keeps per-account escalation
//! counters; [`Enforcer`] acts on the escalation signal it returns.

mod escalation;
mod service;
mod types;

pub use escalation::{ESCALATION_ISSUER, Enforcement, Enforcer};
pub use service::{BanService, BanSubject};
pub use types::{
    Ban, BanCheck, BanOutcome, BanRequest, BanTarget, BanType, EscalationRecord,
    EscalationSignal,
};
