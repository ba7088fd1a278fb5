//! Fixed-interval maintenance tasks.
//!
//! Each sweeper runs one job per tick until the shutdown signal flips. The
//! first tick is skipped so a fresh runtime does not sweep immediately.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::api::Result;

pub fn spawn_sweeper<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut job: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<usize>> + Send,
{
    tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => match job().await {
                    Ok(0) => {}
                    Ok(affected) => debug!(sweeper = name, affected, "Sweep finished"),
                    Err(e) => warn!(sweeper = name, "Sweep failed: {}", e),
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        debug!(sweeper = name, "Sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn runs_on_each_tick_until_shutdown() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let counter = runs.clone();
        let sweeper = spawn_sweeper("test", Duration::from_secs(60), shutdown_rx, move || {
            let counter = counter.clone();
            async move { Ok(counter.fetch_add(1, Ordering::SeqCst)) }
        });

        time::sleep(Duration::from_secs(150)).await;
        shutdown_tx.send(true).unwrap();
        sweeper.await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
