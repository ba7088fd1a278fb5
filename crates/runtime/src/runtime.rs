//! High-level runtime orchestrator.
//!
//! The runtime wires the detector, the ban pipeline and the facade worker
//! over one set of repositories and one clock, then keeps the background
//! sweepers running until shutdown.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::{AntiCheat, Result, RuntimeError};
use crate::audit::AttackAuditor;
use crate::ban::{BanService, Enforcer};
use crate::clock::{Clock, SystemClock};
use crate::config::AntiCheatConfig;
use crate::repository::Repositories;
use crate::violation::ViolationDetector;
use crate::workers::{Command, TrackerWorker, spawn_sweeper};

/// Default capacity of the facade command queue.
pub const DEFAULT_COMMAND_BUFFER: usize = 256;

/// Running anti-cheat services.
///
/// [`AntiCheat`] is the cloneable facade for connection-layer callers; the
/// detector, ban service and auditor are shared through `Arc`s.
pub struct Runtime {
    handle: AntiCheat,
    detector: Arc<ViolationDetector>,
    enforcer: Arc<Enforcer>,
    auditor: Arc<AttackAuditor>,

    shutdown_tx: watch::Sender<bool>,
    tracker_handle: JoinHandle<()>,
    sweeper_handles: Vec<JoinHandle<()>>,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn handle(&self) -> AntiCheat {
        self.handle.clone()
    }

    pub fn detector(&self) -> Arc<ViolationDetector> {
        Arc::clone(&self.detector)
    }

    pub fn enforcer(&self) -> Arc<Enforcer> {
        Arc::clone(&self.enforcer)
    }

    pub fn bans(&self) -> Arc<BanService> {
        Arc::clone(self.enforcer.bans())
    }

    pub fn auditor(&self) -> Arc<AttackAuditor> {
        Arc::clone(&self.auditor)
    }

    /// Stops the sweepers, then waits for the tracker to drain its queue.
    ///
    /// Clones of the [`AntiCheat`] handle held elsewhere keep the tracker
    /// alive; drop them before awaiting this.
    pub async fn shutdown(self) -> Result<()> {
        // Receivers may already be gone if every sweeper was disabled.
        let _ = self.shutdown_tx.send(true);

        for sweeper in self.sweeper_handles {
            sweeper.await.map_err(RuntimeError::WorkerJoin)?;
        }

        drop(self.handle);
        self.tracker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        info!("Anti-cheat runtime stopped");
        Ok(())
    }
}

/// Builder for [`Runtime`].
pub struct RuntimeBuilder {
    config: AntiCheatConfig,
    repositories: Option<Repositories>,
    clock: Option<Arc<dyn Clock>>,
    command_buffer_size: usize,
    enable_sweepers: bool,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: AntiCheatConfig::default(),
            repositories: None,
            clock: None,
            command_buffer_size: DEFAULT_COMMAND_BUFFER,
            enable_sweepers: true,
        }
    }

    pub fn config(mut self, config: AntiCheatConfig) -> Self {
        self.config = config;
        self
    }

    /// Storage backends. Defaults to in-memory repositories.
    pub fn repositories(mut self, repositories: Repositories) -> Self {
        self.repositories = Some(repositories);
        self
    }

    /// Time source. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn command_buffer_size(mut self, size: usize) -> Self {
        self.command_buffer_size = size.max(1);
        self
    }

    /// Enable the periodic counter cleanup, ban expiry and tracker sweeps
    /// (default: true).
    pub fn enable_sweepers(mut self, enable: bool) -> Self {
        self.enable_sweepers = enable;
        self
    }

    /// Build the runtime. Must be called inside a Tokio runtime.
    pub async fn build(self) -> Result<Runtime> {
        self.config.validate()?;

        let config = Arc::new(self.config);
        let repositories = self.repositories.unwrap_or_default();
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let bans = Arc::new(BanService::new(&repositories, &config, Arc::clone(&clock)));
        let enforcer = Arc::new(Enforcer::new(bans));
        let detector = Arc::new(ViolationDetector::new(
            Arc::clone(&config),
            &repositories,
            Arc::clone(&enforcer),
            Arc::clone(&clock),
        ));
        let restored = detector.restore()?;
        let auditor = Arc::new(AttackAuditor::new(Arc::clone(&detector), config.combat()));

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.command_buffer_size);
        let handle = AntiCheat::new(command_tx, Arc::clone(&enforcer), Arc::clone(&config));

        let retention =
            chrono::Duration::from_std(config.tracker_retention).unwrap_or(chrono::Duration::MAX);
        let tracker = TrackerWorker::new(command_rx, retention, clock);
        let tracker_handle = tokio::spawn(async move {
            tracker.run().await;
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut sweeper_handles = Vec::new();
        if self.enable_sweepers {
            let counters = Arc::clone(&detector);
            sweeper_handles.push(spawn_sweeper(
                "violation_counters",
                config.cleanup_interval,
                shutdown_rx.clone(),
                move || {
                    let counters = Arc::clone(&counters);
                    async move { counters.cleanup_expired() }
                },
            ));

            let expiry = Arc::clone(enforcer.bans());
            sweeper_handles.push(spawn_sweeper(
                "ban_expiry",
                config.ban_expiry_interval,
                shutdown_rx.clone(),
                move || {
                    let expiry = Arc::clone(&expiry);
                    async move { expiry.expire_old_bans() }
                },
            ));

            let tracker = handle.clone();
            sweeper_handles.push(spawn_sweeper(
                "tracker",
                config.tracker_sweep_interval,
                shutdown_rx,
                move || {
                    let tracker = tracker.clone();
                    async move { tracker.sweep().await }
                },
            ));
        }

        info!(
            enabled = config.enabled,
            restored_counters = restored,
            sweepers = sweeper_handles.len(),
            "Anti-cheat runtime started"
        );

        Ok(Runtime {
            handle,
            detector,
            enforcer,
            auditor,
            shutdown_tx,
            tracker_handle,
            sweeper_handles,
        })
    }
}
