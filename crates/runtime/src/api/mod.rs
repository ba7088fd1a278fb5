//! Public runtime API surface.
//!
//! Gathers the error types and the [`AntiCheat`] facade handle so callers do
//! not need to reach into workers or infrastructure modules.

pub mod errors;
pub mod handle;

pub use errors::{ConfigError, RepositoryError, Result, RuntimeError};
pub use handle::{AntiCheat, FACADE_BAN_DURATION, FACADE_ISSUER, TrackRule};
