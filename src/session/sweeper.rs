//! Background expiry sweeper
//!
//! Runs one sweep immediately, then waits `interval` after each completed
//! pass before starting the next. The loop ends when the handle is stopped
//! or dropped.

use super::store::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Shortest delay allowed between sweep passes
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Handle for controlling the sweeper task
pub struct SweeperHandle {
    /// Shutdown signal sender; dropping it also stops the loop
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for the task to exit
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!("Sweeper task failed: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

fn clamp_interval(interval: Duration) -> Duration {
    if interval < MIN_SWEEP_INTERVAL {
        tracing::warn!(
            "Sweep interval {:?} too short, using {:?}",
            interval,
            MIN_SWEEP_INTERVAL
        );
    }
    interval.max(MIN_SWEEP_INTERVAL)
}

/// Spawn the sweeper on the current tokio runtime.
///
/// `interval` is raised to `MIN_SWEEP_INTERVAL` if shorter.
pub fn spawn_sweeper(store: Arc<SessionStore>, interval: Duration) -> SweeperHandle {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    let interval = clamp_interval(interval);

    tracing::info!(
        "Starting session sweeper (every {}s, lifetime {}s)",
        interval.as_secs(),
        store.max_lifetime().as_secs()
    );

    let task = tokio::spawn(async move {
        loop {
            let evicted = store.sweep();
            if evicted > 0 {
                tracing::info!(
                    "Sweeper: evicted {} expired sessions ({} live)",
                    evicted,
                    store.len()
                );
            } else {
                tracing::debug!("Sweeper: nothing to evict");
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown_rx.recv() => break,
            }
        }
        tracing::info!("Session sweeper stopped");
    });

    SweeperHandle { shutdown_tx, task }
}
