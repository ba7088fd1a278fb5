//! Tracker worker that owns the facade's N-in-window counters.
//!
//! Every mutation arrives through one [`mpsc`] queue, so the maps need no
//! locking and updates for one key apply in submission order.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::clock::Clock;

/// Failed logins tolerated per identifier inside [`FAILED_AUTH_WINDOW`].
pub const FAILED_AUTH_THRESHOLD: usize = 10;
pub const FAILED_AUTH_WINDOW: Duration = Duration::minutes(30);

/// Commands accepted by the tracker worker.
pub enum Command {
    /// Records one event for `account_id:kind` and reports whether the
    /// key reached `threshold` inside `window`. With `reset_on_trip` a key
    /// that reaches the threshold is cleared in the same step, so exactly
    /// one of any number of queued events reports it.
    Track {
        account_id: u32,
        kind: String,
        threshold: usize,
        window: Duration,
        reset_on_trip: bool,
        reply: oneshot::Sender<bool>,
    },
    /// Forgets every event recorded for `account_id:kind`.
    Reset {
        account_id: u32,
        kind: String,
        reply: oneshot::Sender<()>,
    },
    TrackFailedAuth {
        identifier: String,
        reply: oneshot::Sender<bool>,
    },
    ClearAuth {
        identifiers: Vec<String>,
        reply: oneshot::Sender<()>,
    },
    /// Drops timestamps older than the retention; replies with the number
    /// of keys removed.
    Sweep { reply: oneshot::Sender<usize> },
}

pub struct TrackerWorker {
    violations: HashMap<String, Vec<DateTime<Utc>>>,
    failed_auth: HashMap<String, Vec<DateTime<Utc>>>,
    retention: Duration,
    clock: Arc<dyn Clock>,
    command_rx: mpsc::Receiver<Command>,
}

impl TrackerWorker {
    pub fn new(
        command_rx: mpsc::Receiver<Command>,
        retention: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            violations: HashMap::new(),
            failed_auth: HashMap::new(),
            retention,
            clock,
            command_rx,
        }
    }

    /// Drains the queue until every sender is dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    self.handle_command(cmd);
                }
                else => break,
            }
        }

        info!(target: "anticheat::tracker", "Tracker worker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Track {
                account_id,
                kind,
                threshold,
                window,
                reset_on_trip,
                reply,
            } => {
                let key = violation_key(account_id, &kind);
                let now = self.clock.now();
                let exceeded = record(&mut self.violations, key.clone(), now, window, threshold);
                if exceeded {
                    debug!(
                        target: "anticheat::tracker",
                        account_id,
                        kind = %kind,
                        threshold,
                        reset_on_trip,
                        "Track threshold reached"
                    );
                    if reset_on_trip {
                        self.violations.remove(&key);
                    }
                }
                if reply.send(exceeded).is_err() {
                    debug!("Track reply channel closed (caller dropped)");
                }
            }
            Command::Reset {
                account_id,
                kind,
                reply,
            } => {
                self.violations.remove(&violation_key(account_id, &kind));
                if reply.send(()).is_err() {
                    debug!("Reset reply channel closed (caller dropped)");
                }
            }
            Command::TrackFailedAuth { identifier, reply } => {
                let now = self.clock.now();
                let exceeded = record(
                    &mut self.failed_auth,
                    identifier,
                    now,
                    FAILED_AUTH_WINDOW,
                    FAILED_AUTH_THRESHOLD,
                );
                if reply.send(exceeded).is_err() {
                    debug!("TrackFailedAuth reply channel closed (caller dropped)");
                }
            }
            Command::ClearAuth { identifiers, reply } => {
                for identifier in &identifiers {
                    self.failed_auth.remove(identifier);
                }
                if reply.send(()).is_err() {
                    debug!("ClearAuth reply channel closed (caller dropped)");
                }
            }
            Command::Sweep { reply } => {
                let cutoff = self.clock.now() - self.retention;
                let removed =
                    prune(&mut self.violations, cutoff) + prune(&mut self.failed_auth, cutoff);
                if removed > 0 {
                    debug!(target: "anticheat::tracker", removed, "Swept idle tracker keys");
                }
                if reply.send(removed).is_err() {
                    debug!("Sweep reply channel closed (caller dropped)");
                }
            }
        }
    }
}

fn violation_key(account_id: u32, kind: &str) -> String {
    format!("{account_id}:{kind}")
}

/// Keeps the timestamps still inside `window`, adds `now`, and reports
/// whether the key holds at least `threshold` events.
fn record(
    map: &mut HashMap<String, Vec<DateTime<Utc>>>,
    key: String,
    now: DateTime<Utc>,
    window: Duration,
    threshold: usize,
) -> bool {
    let cutoff = now - window;
    let timestamps = map.entry(key).or_default();
    timestamps.retain(|t| *t > cutoff);
    timestamps.push(now);
    timestamps.len() >= threshold
}

fn prune(map: &mut HashMap<String, Vec<DateTime<Utc>>>, cutoff: DateTime<Utc>) -> usize {
    let before = map.len();
    map.retain(|_, timestamps| {
        timestamps.retain(|t| *t > cutoff);
        !timestamps.is_empty()
    });
    before - map.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn worker(clock: Arc<ManualClock>) -> TrackerWorker {
        let (_tx, rx) = mpsc::channel(1);
        TrackerWorker::new(rx, Duration::hours(1), clock)
    }

    fn track_with(
        worker: &mut TrackerWorker,
        threshold: usize,
        window: Duration,
        reset_on_trip: bool,
    ) -> bool {
        let (reply, mut rx) = oneshot::channel();
        worker.handle_command(Command::Track {
            account_id: 1,
            kind: "damage".into(),
            threshold,
            window,
            reset_on_trip,
            reply,
        });
        rx.try_recv().unwrap()
    }

    fn track(worker: &mut TrackerWorker, threshold: usize, window: Duration) -> bool {
        track_with(worker, threshold, window, false)
    }

    #[test]
    fn threshold_counts_only_events_inside_window() {
        let clock = Arc::new(ManualClock::default());
        let mut worker = worker(clock.clone());

        assert!(!track(&mut worker, 3, Duration::minutes(5)));
        clock.advance(Duration::minutes(6));
        assert!(!track(&mut worker, 3, Duration::minutes(5)));
        assert!(!track(&mut worker, 3, Duration::minutes(5)));
        assert!(track(&mut worker, 3, Duration::minutes(5)));
    }

    #[test]
    fn plain_track_keeps_reporting_a_full_window() {
        let clock = Arc::new(ManualClock::default());
        let mut worker = worker(clock);

        assert!(!track(&mut worker, 2, Duration::minutes(5)));
        assert!(track(&mut worker, 2, Duration::minutes(5)));
        assert!(track(&mut worker, 2, Duration::minutes(5)));
    }

    #[test]
    fn reset_on_trip_reports_each_full_window_once() {
        let clock = Arc::new(ManualClock::default());
        let mut worker = worker(clock);

        let trips: Vec<bool> = (0..6)
            .map(|_| track_with(&mut worker, 3, Duration::minutes(5), true))
            .collect();

        assert_eq!(trips, [false, false, true, false, false, true]);
        assert!(worker.violations.is_empty());
    }

    #[test]
    fn sweep_drops_keys_past_retention() {
        let clock = Arc::new(ManualClock::default());
        let mut worker = worker(clock.clone());
        track(&mut worker, 10, Duration::minutes(5));

        clock.advance(Duration::minutes(61));
        let (reply, mut rx) = oneshot::channel();
        worker.handle_command(Command::Sweep { reply });

        assert_eq!(rx.try_recv().unwrap(), 1);
        assert!(worker.violations.is_empty());
    }

    #[test]
    fn record_trims_stale_timestamps() {
        let mut map = HashMap::new();
        let start = DateTime::<Utc>::UNIX_EPOCH;
        record(&mut map, "k".into(), start, Duration::minutes(1), 5);
        record(&mut map, "k".into(), start + Duration::minutes(2), Duration::minutes(1), 5);
        assert_eq!(map["k"].len(), 1);
    }
}
