//! Independent tokio schedules for the monitoring sweeps.
//!
//! Each sweep gets its own task, interval and shutdown signal. Sweeps block
//! on the stores, so each run happens on the blocking pool.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::{MonitoringEngine, Sweep};
use crate::config::MonitoringConfig;

#[derive(Debug, Clone)]
pub struct MonitoringRunner {
    engine: Arc<MonitoringEngine>,
    config: MonitoringConfig,
}

/// Handle for the running sweeps (trigger + shutdown).
#[derive(Debug)]
pub struct MonitoringHandle {
    workers: HashMap<Sweep, Worker>,
}

#[derive(Debug)]
struct Worker {
    shutdown: Arc<Notify>,
    trigger: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl MonitoringRunner {
    pub fn new(engine: Arc<MonitoringEngine>, config: MonitoringConfig) -> Self {
        Self { engine, config }
    }

    /// Spawn one task per sweep. Must be called inside a tokio runtime.
    pub fn start(&self) -> MonitoringHandle {
        let workers = Sweep::ALL
            .into_iter()
            .map(|sweep| (sweep, self.spawn_sweep(sweep)))
            .collect();
        MonitoringHandle { workers }
    }

    fn spawn_sweep(&self, sweep: Sweep) -> Worker {
        let shutdown = Arc::new(Notify::new());
        // Capacity 1: triggers coalesce while a run is pending.
        let (trigger, mut trigger_rx) = mpsc::channel::<()>(1);
        let period = self.config.interval(sweep);
        let engine = self.engine.clone();
        let stop = shutdown.clone();

        let join = tokio::spawn(async move {
            info!(sweep = %sweep, period_secs = period.as_secs(), "monitoring sweep scheduled");

            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = stop.notified() => break,
                    _ = ticker.tick() => {}
                    Some(()) = trigger_rx.recv() => {
                        info!(sweep = %sweep, "sweep triggered");
                    }
                }

                let engine = engine.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || engine.run(sweep)).await {
                    error!(sweep = %sweep, error = %e, "sweep task aborted");
                }
            }

            info!(sweep = %sweep, "monitoring sweep stopped");
        });

        Worker {
            shutdown,
            trigger,
            join,
        }
    }
}

impl MonitoringHandle {
    /// Ask `sweep` to run now. Returns `false` if a run is already pending.
    pub fn trigger(&self, sweep: Sweep) -> bool {
        self.workers
            .get(&sweep)
            .is_some_and(|w| w.trigger.try_send(()).is_ok())
    }

    /// Stop every sweep and wait for in-flight runs to finish.
    pub async fn shutdown(self) {
        for worker in self.workers.values() {
            worker.shutdown.notify_one();
        }
        for (sweep, worker) in self.workers {
            if let Err(e) = worker.join.await {
                error!(sweep = %sweep, error = %e, "monitoring task failed to join");
            }
        }
    }
}
