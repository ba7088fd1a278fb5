//! Server-side combat integrity and anti-cheat services.
//!
//! This crate turns the pure damage oracle in `combat-core` into live
//! enforcement: suspicious hits and other violations are logged, counted in
//! rolling windows and, past a threshold, converted into bans that escalate
//! to a permanent ban after repeated temporary ones.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the [`AntiCheat`] facade and the error types
//! - [`violation`] owns the detector, its counters and the `detect_*` helpers
//! - [`ban`] persists bans and drives escalation
//! - [`audit`] bridges damage validation to violation reporting
//! - [`repository`] provides in-memory and file-backed storage
//! - [`config`] and [`clock`] carry settings and the time source
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod audit;
pub mod ban;
pub mod clock;
pub mod config;
pub mod repository;
pub mod runtime;
pub mod violation;

mod workers;

pub use api::{AntiCheat, Result, RuntimeError, TrackRule};
pub use audit::{AttackAudit, AttackAuditor};
pub use ban::{
    Ban, BanCheck, BanRequest, BanService, BanSubject, BanTarget, BanType, Enforcement, Enforcer,
    EscalationRecord,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AntiCheatConfig, ConfigError, IpBanMode, ThresholdRule, WindowAnchor};
pub use repository::{Repositories, RepositoryError};
pub use runtime::{Runtime, RuntimeBuilder};
pub use violation::{
    PlayerIdentity, PlayerInfo, RecordOutcome, Severity, ViolationCategory, ViolationDetector,
    ViolationEvent, ViolationType,
};
pub use workers::{FAILED_AUTH_THRESHOLD, FAILED_AUTH_WINDOW};
