//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories and configuration
//! so callers can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

pub use crate::config::ConfigError;
pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("ban {0} not found")]
    BanNotFound(u64),

    #[error("tracker worker command channel closed")]
    CommandChannelClosed,

    #[error("tracker worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("violation counter lock was poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
