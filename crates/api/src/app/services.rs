use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use logiflow_core::SystemClock;
use logiflow_events::Event;
use logiflow_infra::config::{LogiflowConfig, MonitoringConfig};
use logiflow_infra::event_worker::{EventWorker, WorkerHandle, order_event_logger};
use logiflow_infra::notify::{FanoutNotifier, RecordingNotifier, TracingNotifier};
use logiflow_infra::store::{
    InMemoryOrderStore, InMemoryProductStore, InMemoryShipmentStore, OrderStats,
};
use logiflow_infra::{
    FulfillmentContext, MonitoringEngine, MonitoringRunner, Orchestrator, WarehouseOperations,
};
use logiflow_agents::StoreError;
use logiflow_observability::InMemoryMetrics;
use logiflow_orders::OrderEvent;

/// Realtime message broadcasted via SSE.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RealtimeMessage {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// Everything the handlers need, wired once at startup.
pub struct AppServices {
    ctx: FulfillmentContext,
    orders: Arc<InMemoryOrderStore>,
    orchestrator: Arc<Orchestrator>,
    warehouse: WarehouseOperations,
    engine: Arc<MonitoringEngine>,
    notifications: Arc<RecordingNotifier>,
    metrics: Arc<InMemoryMetrics>,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
    workers: Mutex<Vec<WorkerHandle>>,
}

/// In-memory wiring: stores, orchestrator, monitoring engine and the two
/// order-event consumers (log + realtime feed).
pub fn build_services(config: &LogiflowConfig) -> std::io::Result<AppServices> {
    let orders = Arc::new(InMemoryOrderStore::new());
    let notifications = Arc::new(RecordingNotifier::new());
    let metrics = Arc::new(InMemoryMetrics::new());

    let ctx = FulfillmentContext::new(
        orders.clone(),
        Arc::new(InMemoryProductStore::new()),
        Arc::new(InMemoryShipmentStore::new()),
        Arc::new(FanoutNotifier::new(TracingNotifier, notifications.clone())),
        Arc::new(SystemClock),
        metrics.clone(),
    );

    let rules = config.validation.rules();
    let orchestrator = Arc::new(Orchestrator::new(ctx.clone(), rules.clone()));
    let warehouse = WarehouseOperations::new(ctx.clone());
    let engine = Arc::new(MonitoringEngine::new(
        ctx.clone(),
        rules,
        config.monitoring.rng_seed,
    ));

    // Realtime channel (SSE): lossy broadcast, nobody listening is fine.
    let (realtime_tx, _realtime_rx) = broadcast::channel::<RealtimeMessage>(256);

    let logger = EventWorker::spawn(
        "order-event-log",
        ctx.events().clone(),
        order_event_logger(metrics.clone()),
    )?;
    let feed_tx = realtime_tx.clone();
    let feed = EventWorker::spawn("order-event-feed", ctx.events().clone(), move |event: OrderEvent| {
        let payload = serde_json::to_value(&event)?;
        let _ = feed_tx.send(RealtimeMessage {
            topic: event.event_type().to_string(),
            payload,
        });
        Ok::<(), serde_json::Error>(())
    })?;

    Ok(AppServices {
        ctx,
        orders,
        orchestrator,
        warehouse,
        engine,
        notifications,
        metrics,
        realtime_tx,
        workers: Mutex::new(vec![logger, feed]),
    })
}

impl AppServices {
    pub fn ctx(&self) -> &FulfillmentContext {
        &self.ctx
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn warehouse(&self) -> &WarehouseOperations {
        &self.warehouse
    }

    pub fn engine(&self) -> &Arc<MonitoringEngine> {
        &self.engine
    }

    pub fn notifications(&self) -> &RecordingNotifier {
        &self.notifications
    }

    pub fn metrics(&self) -> &InMemoryMetrics {
        &self.metrics
    }

    pub fn realtime_tx(&self) -> &broadcast::Sender<RealtimeMessage> {
        &self.realtime_tx
    }

    pub fn order_stats(&self) -> Result<OrderStats, StoreError> {
        self.orders.stats()
    }

    /// Scheduled sweeps over this service's engine.
    pub fn monitoring_runner(&self, config: MonitoringConfig) -> MonitoringRunner {
        MonitoringRunner::new(self.engine.clone(), config)
    }

    /// Stop the event consumers and wait for them.
    pub fn shutdown_workers(&self) {
        let workers = match self.workers.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for worker in workers {
            worker.shutdown();
        }
    }
}

impl core::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppServices")
            .field("ctx", &self.ctx)
            .field("realtime_subscribers", &self.realtime_tx.receiver_count())
            .finish_non_exhaustive()
    }
}

/// Build the SSE stream behind `/stream`.
pub fn order_event_stream(
    services: Arc<AppServices>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(m) => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
