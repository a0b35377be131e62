use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::{debug, info, warn};

use logiflow_agents::automation::{
    self, AdvanceSignals, LOW_STOCK_THRESHOLD, OverdueAction, StuckDecision,
};
use logiflow_agents::{
    AgentError, Department, ShippingAgent, StoreError, ValidationAgent, ValidationRules,
    WarehouseAgent,
};
use logiflow_core::{DomainError, Entity, ExpectedVersion};
use logiflow_orders::{ChangeStatus, Order, OrderCommand, OrderStatus};
use logiflow_shipping::Shipment;

use super::{Sweep, SweepReport};
use crate::context::FulfillmentContext;
use crate::order_dispatcher::DispatchError;

/// Failure while handling one entity inside a sweep.
#[derive(Debug, Error)]
enum ItemError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("order {0} not found")]
    MissingOrder(String),
}

enum Handled {
    Acted,
    Escalated,
    Ignored,
}

/// Runs monitoring sweeps synchronously against the shared context.
///
/// Simulated traffic, weather and demand draws come from one seeded RNG so a
/// fixed `rng_seed` makes whole sweep sequences reproducible.
pub struct MonitoringEngine {
    ctx: FulfillmentContext,
    validation: ValidationAgent,
    warehouse: WarehouseAgent,
    shipping: ShippingAgent,
    rng: Mutex<StdRng>,
}

impl MonitoringEngine {
    pub fn new(ctx: FulfillmentContext, rules: ValidationRules, rng_seed: Option<u64>) -> Self {
        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            ctx,
            validation: ValidationAgent::new(rules),
            warehouse: WarehouseAgent::new(),
            shipping: ShippingAgent::new(),
            rng: Mutex::new(rng),
        }
    }

    pub fn run(&self, sweep: Sweep) -> SweepReport {
        match sweep {
            Sweep::StuckOrders => self.run_stuck_orders(),
            Sweep::DeliveryPredictions => self.run_delivery_predictions(),
            Sweep::Reorder => self.run_reorder(),
            Sweep::AnomalyDetection => self.run_anomaly_detection(),
            Sweep::RouteOptimization => self.run_route_optimization(),
        }
    }

    /// Auto-advance or escalate orders that sat in one status too long, then
    /// deal with in-transit shipments whose ETA has already passed.
    pub fn run_stuck_orders(&self) -> SweepReport {
        let now = self.ctx.clock.now();
        let mut report = SweepReport::new(Sweep::StuckOrders, now);

        let shortest = OrderStatus::ALL
            .into_iter()
            .filter_map(automation::expected_processing_time)
            .min()
            .unwrap_or_else(Duration::zero);

        match self.ctx.orders.status_older_than(now - shortest) {
            Ok(candidates) => {
                for order in candidates.iter().filter(|o| automation::is_stuck(o, now)) {
                    report.examined += 1;
                    let result = self.resolve_stuck(order, now);
                    self.tally(&mut report, result, |e| {
                        warn!(sweep = %Sweep::StuckOrders, order_id = %order.id_typed(), error = %e, "failed to resolve stuck order");
                    });
                }
            }
            Err(e) => self.sweep_failed(&mut report, &e),
        }

        match self.ctx.shipments.in_transit() {
            Ok(shipments) => {
                for shipment in shipments.into_iter().filter(|s| s.is_overdue(now)) {
                    report.examined += 1;
                    let shipment_id = shipment.id_typed();
                    let result = self.handle_overdue(shipment, now);
                    self.tally(&mut report, result, |e| {
                        warn!(sweep = %Sweep::StuckOrders, shipment_id = %shipment_id, error = %e, "failed to handle overdue delivery");
                    });
                }
            }
            Err(e) => self.sweep_failed(&mut report, &e),
        }

        self.finish(report)
    }

    /// Re-estimate delivery for every in-transit shipment.
    pub fn run_delivery_predictions(&self) -> SweepReport {
        let now = self.ctx.clock.now();
        let mut report = SweepReport::new(Sweep::DeliveryPredictions, now);

        match self.ctx.shipments.in_transit() {
            Ok(shipments) => {
                for shipment in shipments {
                    report.examined += 1;
                    let shipment_id = shipment.id_typed();
                    let result = self.predict_delivery(shipment);
                    self.tally(&mut report, result, |e| {
                        warn!(sweep = %Sweep::DeliveryPredictions, shipment_id = %shipment_id, error = %e, "failed to update delivery estimate");
                    });
                }
            }
            Err(e) => self.sweep_failed(&mut report, &e),
        }

        self.finish(report)
    }

    /// Restock low products whose stock no longer covers predicted demand.
    pub fn run_reorder(&self) -> SweepReport {
        let now = self.ctx.clock.now();
        let mut report = SweepReport::new(Sweep::Reorder, now);

        match self.ctx.products.below_stock(LOW_STOCK_THRESHOLD) {
            Ok(products) => {
                for product in products {
                    report.examined += 1;
                    let demand =
                        self.with_rng(|rng| automation::predict_demand(product.category(), rng));
                    let Some(quantity) = automation::reorder_quantity(demand, product.stock()) else {
                        debug!(sku = %product.sku(), stock = product.stock(), demand, "stock still covers demand");
                        continue;
                    };

                    match self.ctx.products.restock(*product.id(), quantity) {
                        Ok(updated) => {
                            report.acted += 1;
                            info!(sku = %updated.sku(), quantity, stock = updated.stock(), demand, "automatic reorder");
                            self.ctx.notifier.notify_internal(
                                Department::Inventory,
                                &format!(
                                    "Automatic reorder: {} ({}) restocked by {} units to {} (predicted daily demand {})",
                                    updated.sku(),
                                    updated.name(),
                                    quantity,
                                    updated.stock(),
                                    demand
                                ),
                            );
                        }
                        Err(e) => {
                            report.errors += 1;
                            warn!(sweep = %Sweep::Reorder, sku = %product.sku(), error = %e, "reorder failed");
                        }
                    }
                }
            }
            Err(e) => self.sweep_failed(&mut report, &e),
        }

        self.finish(report)
    }

    /// Alert on orders taking far longer than expected since placement and
    /// on categories whose 24h demand spikes past their baseline.
    pub fn run_anomaly_detection(&self) -> SweepReport {
        let now = self.ctx.clock.now();
        let mut report = SweepReport::new(Sweep::AnomalyDetection, now);

        match self.ctx.orders.list() {
            Ok(orders) => {
                for order in orders.iter().filter(|o| !o.is_terminal()) {
                    report.examined += 1;
                    if !automation::is_processing_anomalous(order, now) {
                        continue;
                    }
                    let hours = (now - order.order_date()).num_hours();
                    let expected = automation::expected_processing_time(order.status())
                        .map(|d| d.num_hours())
                        .unwrap_or_default();
                    warn!(order_id = %order.id_typed(), status = %order.status(), hours, "processing anomaly");
                    self.ctx.notifier.notify_urgent(
                        Department::Operations,
                        &format!(
                            "Processing anomaly: order {} in {} has been open {}h since placement (expected {}h for this status)",
                            order.id_typed(),
                            order.status(),
                            hours,
                            expected
                        ),
                    );
                    report.escalated += 1;
                }
            }
            Err(e) => self.sweep_failed(&mut report, &e),
        }

        match self.ctx.orders.placed_since(now - Duration::hours(24)) {
            Ok(recent) => {
                report.examined += automation::category_demand(&recent).len();
                for spike in automation::demand_spikes(&recent) {
                    warn!(category = %spike.category.as_str(), demand = spike.demand, normal = spike.normal, "demand spike");
                    self.ctx.notifier.notify_urgent(
                        Department::DemandAnalysis,
                        &format!(
                            "Demand spike for {}: {} units ordered in 24h (normal {})",
                            spike.category.as_str(),
                            spike.demand,
                            spike.normal
                        ),
                    );
                    report.escalated += 1;
                }
            }
            Err(e) => self.sweep_failed(&mut report, &e),
        }

        self.finish(report)
    }

    /// Re-sequence trucks carrying several shipments and re-derive their ETAs.
    pub fn run_route_optimization(&self) -> SweepReport {
        let now = self.ctx.clock.now();
        let mut report = SweepReport::new(Sweep::RouteOptimization, now);

        let shipments = match self.ctx.shipments.in_transit() {
            Ok(shipments) => shipments,
            Err(e) => {
                self.sweep_failed(&mut report, &e);
                return self.finish(report);
            }
        };
        report.examined = shipments.len();

        let mut by_truck: BTreeMap<String, Vec<Shipment>> = BTreeMap::new();
        for shipment in shipments {
            by_truck
                .entry(shipment.truck_id().to_string())
                .or_default()
                .push(shipment);
        }

        for (truck_id, mut group) in by_truck.into_iter().filter(|(_, g)| g.len() > 1) {
            let stops: Vec<_> = group
                .iter()
                .map(|s| (s.id_typed(), s.delivery_address().to_string()))
                .collect();
            let mut updated = 0;
            for (shipment_id, eta) in automation::reoptimize_route(&stops, now) {
                let Some(shipment) = group.iter_mut().find(|s| s.id_typed() == shipment_id) else {
                    continue;
                };
                let result = shipment
                    .reschedule_delivery(eta)
                    .map_err(ItemError::from)
                    .and_then(|()| {
                        Ok(self
                            .ctx
                            .shipments
                            .save(shipment, ExpectedVersion::Exact(shipment.version()))?)
                    });
                match result {
                    Ok(_) => {
                        report.acted += 1;
                        updated += 1;
                    }
                    Err(e) => {
                        report.errors += 1;
                        warn!(sweep = %Sweep::RouteOptimization, shipment_id = %shipment_id, error = %e, "failed to apply route ETA");
                    }
                }
            }
            info!(truck_id = %truck_id, stops = stops.len(), updated, "route re-optimized");
            self.ctx.notifier.notify_internal(
                Department::Logistics,
                &format!("Route re-optimized for {truck_id}: {} stops resequenced", stops.len()),
            );
        }

        self.finish(report)
    }

    fn resolve_stuck(&self, order: &Order, now: DateTime<Utc>) -> Result<Handled, ItemError> {
        let signals = self.gather_signals(order, now)?;
        let Some(decision) = automation::decide_stuck_order(order, &signals) else {
            return Ok(Handled::Ignored);
        };
        let hours = order.time_in_status(now).num_hours();

        match decision {
            StuckDecision::Advance { to } => {
                if order.status() == OrderStatus::Fulfilled {
                    self.ensure_shipment(order, now)?;
                }
                self.ctx.dispatch(OrderCommand::ChangeStatus(ChangeStatus {
                    order_id: order.id_typed(),
                    to,
                    note: Some("auto-advanced by monitoring".to_string()),
                    occurred_at: now,
                }))?;

                info!(order_id = %order.id_typed(), from = %order.status(), to = %to, hours, "stuck order auto-advanced");
                self.ctx.notifier.notify_internal(
                    Department::AiAutomation,
                    &format!(
                        "Order {} auto-advanced from {} to {} after {}h",
                        order.id_typed(),
                        order.status(),
                        to,
                        hours
                    ),
                );
                Ok(Handled::Acted)
            }
            StuckDecision::Escalate { reason } => {
                warn!(order_id = %order.id_typed(), status = %order.status(), hours, reason = %reason, "stuck order escalated");
                self.ctx.notifier.notify_urgent(
                    Department::OrderManagement,
                    &format!(
                        "Order {} stuck in {} for {}h: {}. Manual intervention required.",
                        order.id_typed(),
                        order.status(),
                        hours,
                        reason
                    ),
                );
                Ok(Handled::Escalated)
            }
        }
    }

    fn gather_signals(&self, order: &Order, now: DateTime<Utc>) -> Result<AdvanceSignals, ItemError> {
        let mut signals = AdvanceSignals::default();
        match order.status() {
            OrderStatus::Scheduled => {
                signals.validation_passed = Some(self.validation.validate(order, now).valid);
            }
            OrderStatus::Validated => {
                for item in order.items() {
                    if let Some(product) = self.ctx.products.get(item.product.product_id)? {
                        signals.live_stock.insert(item.product.product_id, product.stock());
                    }
                }
            }
            _ => {}
        }
        Ok(signals)
    }

    fn ensure_shipment(&self, order: &Order, now: DateTime<Utc>) -> Result<(), ItemError> {
        if self.ctx.shipments.for_order(order.id_typed())?.is_some() {
            return Ok(());
        }
        let picking = self.warehouse.generate_instructions(order);
        match self
            .shipping
            .schedule_shipment(self.ctx.shipments.as_ref(), order, &picking, now)
        {
            Ok(_) | Err(AgentError::Store(StoreError::AlreadyExists(_))) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn handle_overdue(&self, mut shipment: Shipment, now: DateTime<Utc>) -> Result<Handled, ItemError> {
        let order = self
            .ctx
            .orders
            .get(shipment.order_id())?
            .ok_or_else(|| ItemError::MissingOrder(shipment.order_id().to_string()))?;

        match automation::overdue_action(shipment.estimated_delivery(), now) {
            OverdueAction::Reschedule { new_eta } => {
                shipment.reschedule_delivery(new_eta)?;
                let saved = self
                    .ctx
                    .shipments
                    .save(&shipment, ExpectedVersion::Exact(shipment.version()))?;
                info!(shipment_id = %saved.id_typed(), new_eta = %new_eta, "overdue delivery rescheduled");
                self.ctx.notifier.notify_client(
                    order.client_id(),
                    &format!(
                        "Delivery of order #{} is running late. New estimated delivery: {}",
                        order.id_typed(),
                        new_eta.format("%Y-%m-%d %H:%M UTC")
                    ),
                );
                Ok(Handled::Acted)
            }
            OverdueAction::Escalate { hours_overdue } => {
                warn!(shipment_id = %shipment.id_typed(), hours_overdue, "delivery badly overdue");
                self.ctx.notifier.notify_urgent(
                    Department::DeliveryManagement,
                    &format!(
                        "Shipment {} for order {} is {}h overdue (truck {}, driver {})",
                        shipment.id_typed(),
                        order.id_typed(),
                        hours_overdue,
                        shipment.truck_id(),
                        shipment.driver_id()
                    ),
                );
                Ok(Handled::Escalated)
            }
        }
    }

    fn predict_delivery(&self, mut shipment: Shipment) -> Result<Handled, ItemError> {
        let current = shipment.estimated_delivery();
        let prediction = self.with_rng(|rng| automation::predict_delivery(current, rng));
        if !automation::is_significant_change(current, prediction.new_eta) {
            return Ok(Handled::Ignored);
        }

        let order = self
            .ctx
            .orders
            .get(shipment.order_id())?
            .ok_or_else(|| ItemError::MissingOrder(shipment.order_id().to_string()))?;

        shipment.reschedule_delivery(prediction.new_eta)?;
        self.ctx
            .shipments
            .save(&shipment, ExpectedVersion::Exact(shipment.version()))?;

        info!(
            shipment_id = %shipment.id_typed(),
            delta_minutes = prediction.delta_minutes(),
            new_eta = %prediction.new_eta,
            "delivery estimate updated"
        );
        self.ctx.notifier.notify_client(
            order.client_id(),
            &format!(
                "Updated delivery estimate for order #{}: {} (traffic +{} min, weather +{} min, route optimization -{} min)",
                order.id_typed(),
                prediction.new_eta.format("%Y-%m-%d %H:%M UTC"),
                prediction.traffic_minutes,
                prediction.weather_minutes,
                prediction.savings_minutes
            ),
        );
        Ok(Handled::Acted)
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut rng)
    }

    fn tally(
        &self,
        report: &mut SweepReport,
        result: Result<Handled, ItemError>,
        on_error: impl FnOnce(&ItemError),
    ) {
        match result {
            Ok(Handled::Acted) => report.acted += 1,
            Ok(Handled::Escalated) => report.escalated += 1,
            Ok(Handled::Ignored) => {}
            Err(e) => {
                report.errors += 1;
                on_error(&e);
            }
        }
    }

    fn sweep_failed(&self, report: &mut SweepReport, error: &StoreError) {
        report.errors += 1;
        warn!(sweep = %report.sweep, error = %error, "sweep could not load its working set");
    }

    fn finish(&self, report: SweepReport) -> SweepReport {
        let sweep = report.sweep.as_str();
        self.ctx.metrics.incr(&format!("monitoring.{sweep}.runs"));
        if report.errors > 0 {
            self.ctx
                .metrics
                .add(&format!("monitoring.{sweep}.errors"), report.errors as u64);
        }
        info!(
            sweep,
            examined = report.examined,
            acted = report.acted,
            escalated = report.escalated,
            errors = report.errors,
            "sweep finished"
        );
        report
    }
}

impl core::fmt::Debug for MonitoringEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MonitoringEngine").finish_non_exhaustive()
    }
}
