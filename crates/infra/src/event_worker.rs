//! Background consumers of the order event bus.

use std::convert::Infallible;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use logiflow_events::{Event, EventBus, Subscription};
use logiflow_observability::MetricsSink;
use logiflow_orders::OrderEvent;

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

#[derive(Debug)]
pub struct EventWorker;

impl EventWorker {
    /// Spawn a thread that feeds every message published on `bus` to `handler`.
    ///
    /// The subscription is taken before the thread starts, so nothing
    /// published after this returns is missed.
    pub fn spawn<M, B, H, E>(name: &'static str, bus: B, mut handler: H) -> std::io::Result<WorkerHandle>
    where
        M: Send + 'static,
        B: EventBus<M> + 'static,
        H: FnMut(M) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub: Subscription<M> = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, &mut handler))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop<M, H, E>(name: &'static str, sub: Subscription<M>, shutdown_rx: mpsc::Receiver<()>, handler: &mut H)
where
    H: FnMut(M) -> Result<(), E>,
    E: core::fmt::Debug,
{
    let tick = Duration::from_millis(250);

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(msg) => {
                if let Err(err) = handler(msg) {
                    warn!(worker = name, error = ?err, "event worker handler failed");
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Handler that logs order lifecycle events and counts them by type.
pub fn order_event_logger(
    metrics: Arc<dyn MetricsSink>,
) -> impl FnMut(OrderEvent) -> Result<(), Infallible> + Send + 'static {
    move |event| {
        metrics.incr(&format!("events.{}", event.event_type()));
        match &event {
            OrderEvent::StatusChanged(e) => {
                info!(order_id = %e.order_id, from = %e.from, to = %e.to, note = e.note.as_deref().unwrap_or(""), "order status changed");
            }
            OrderEvent::OrderCancelled(e) => {
                info!(order_id = %e.order_id, from = %e.from, reason = %e.reason, "order cancelled");
            }
            other => {
                info!(order_id = %other.order_id(), event_type = other.event_type(), "order event");
            }
        }
        Ok(())
    }
}
