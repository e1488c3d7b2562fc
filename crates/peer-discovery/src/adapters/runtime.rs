//! Tokio driver for the peer explorer.
//!
//! One task per periodic pass plus one task draining the inbound queue. Each
//! task only calls into the explorer, whose lock serializes them.
//!
//! The tasks end on their own once the explorer is `FINISHED`, whether it was
//! disposed through [`DiscoveryRuntime::shutdown`] or directly. Dropping the
//! runtime aborts them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use crate::domain::{DiscoveryEvent, ExecState};
use crate::ports::PeerDiscoveryApi;
use crate::service::PeerExplorer;

/// Running explorer with its scheduler.
///
/// # Example
///
/// ```rust,ignore
/// let explorer = Arc::new(PeerExplorer::new(config, transport, scoring, time));
/// let runtime = DiscoveryRuntime::spawn(explorer, 1024);
/// let inbound = runtime.inbound();
/// // UDP reader: decode, verify, then
/// inbound.send(event).await?;
/// // ...
/// runtime.shutdown();
/// ```
pub struct DiscoveryRuntime {
    explorer: Arc<PeerExplorer>,
    inbound: mpsc::Sender<DiscoveryEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl DiscoveryRuntime {
    /// Start the explorer and, if it transitioned to `RUNNING`, its tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(explorer: Arc<PeerExplorer>, inbound_capacity: usize) -> Self {
        let (inbound, receiver) = mpsc::channel(inbound_capacity.max(1));
        let mut tasks = Vec::new();

        if explorer.start() {
            let config = explorer.config();
            let clean_period = Duration::from_millis(config.clean_period_ms.max(1));
            let refresh_period = Duration::from_millis(config.refresh_period_ms.max(1));
            let finished = Arc::new(Notify::new());

            tasks.push(spawn_periodic(
                Arc::clone(&explorer),
                clean_period,
                <PeerExplorer as PeerDiscoveryApi>::clean,
                Arc::clone(&finished),
            ));
            tasks.push(spawn_periodic(
                Arc::clone(&explorer),
                refresh_period,
                <PeerExplorer as PeerDiscoveryApi>::update,
                Arc::clone(&finished),
            ));
            tasks.push(spawn_inbound(Arc::clone(&explorer), receiver, finished));
            debug!(?clean_period, ?refresh_period, "discovery runtime started");
        } else {
            warn!(state = %explorer.state(), "explorer not started, no tasks spawned");
        }

        Self {
            explorer,
            inbound,
            tasks,
        }
    }

    /// Queue feeding `handle_message`, in arrival order.
    pub fn inbound(&self) -> mpsc::Sender<DiscoveryEvent> {
        self.inbound.clone()
    }

    pub fn explorer(&self) -> &Arc<PeerExplorer> {
        &self.explorer
    }

    /// Whether the scheduler tasks were spawned.
    pub fn is_active(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Tasks that have not ended yet.
    pub fn live_tasks(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_finished()).count()
    }

    /// Dispose the explorer and stop every task. In-flight requests are
    /// abandoned.
    pub fn shutdown(self) {
        self.explorer.dispose();
        debug!("discovery runtime stopped");
    }
}

impl Drop for DiscoveryRuntime {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn spawn_periodic(
    explorer: Arc<PeerExplorer>,
    period: Duration,
    pass: fn(&PeerExplorer),
    finished: Arc<Notify>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        loop {
            interval.tick().await;
            if explorer.state() == ExecState::Finished {
                break;
            }
            pass(&explorer);
        }
        // Wakes the inbound task, which may be parked on an idle queue.
        finished.notify_one();
        debug!(?period, "periodic pass stopped, explorer finished");
    })
}

fn spawn_inbound(
    explorer: Arc<PeerExplorer>,
    mut receiver: mpsc::Receiver<DiscoveryEvent>,
    finished: Arc<Notify>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = receiver.recv() => match event {
                    Some(event) => explorer.handle_message(event),
                    None => {
                        debug!("inbound queue closed");
                        break;
                    }
                },
                _ = finished.notified() => {
                    debug!("inbound queue stopped, explorer finished");
                    break;
                }
            }
            if explorer.state() == ExecState::Finished {
                break;
            }
        }
    })
}
