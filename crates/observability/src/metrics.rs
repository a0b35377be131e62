use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Destination for counters and timings.
///
/// Implementations must be cheap and must never fail the caller.
pub trait MetricsSink: Send + Sync {
    fn incr(&self, name: &str) {
        self.add(name, 1);
    }

    fn add(&self, name: &str, value: u64);

    /// Record a duration sample in milliseconds.
    fn observe_ms(&self, name: &str, millis: u64);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn add(&self, _name: &str, _value: u64) {}

    fn observe_ms(&self, _name: &str, _millis: u64) {}
}

#[derive(Debug, Default)]
struct Timing {
    count: AtomicU64,
    total_ms: AtomicU64,
    max_ms: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimingSnapshot {
    pub count: u64,
    pub total_ms: u64,
    pub max_ms: u64,
}

impl TimingSnapshot {
    pub fn mean_ms(&self) -> u64 {
        if self.count == 0 { 0 } else { self.total_ms / self.count }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub counters: BTreeMap<String, u64>,
    pub timings: BTreeMap<String, TimingSnapshot>,
}

impl MetricsSnapshot {
    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }
}

/// Process-local metrics registry.
///
/// The maps are only write-locked the first time a name is seen; updates to
/// existing series are lock-free atomics under a read guard.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counters: RwLock<HashMap<String, AtomicU64>>,
    timings: RwLock<HashMap<String, Timing>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self
            .counters
            .read()
            .map(|c| {
                c.iter()
                    .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
                    .collect()
            })
            .unwrap_or_default();
        let timings = self
            .timings
            .read()
            .map(|t| {
                t.iter()
                    .map(|(k, v)| {
                        (
                            k.clone(),
                            TimingSnapshot {
                                count: v.count.load(Ordering::Relaxed),
                                total_ms: v.total_ms.load(Ordering::Relaxed),
                                max_ms: v.max_ms.load(Ordering::Relaxed),
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        MetricsSnapshot { counters, timings }
    }
}

impl MetricsSink for InMemoryMetrics {
    fn add(&self, name: &str, value: u64) {
        if let Ok(counters) = self.counters.read() {
            if let Some(c) = counters.get(name) {
                c.fetch_add(value, Ordering::Relaxed);
                return;
            }
        }
        if let Ok(mut counters) = self.counters.write() {
            counters
                .entry(name.to_string())
                .or_default()
                .fetch_add(value, Ordering::Relaxed);
        }
    }

    fn observe_ms(&self, name: &str, millis: u64) {
        let record = |t: &Timing| {
            t.count.fetch_add(1, Ordering::Relaxed);
            t.total_ms.fetch_add(millis, Ordering::Relaxed);
            t.max_ms.fetch_max(millis, Ordering::Relaxed);
        };

        if let Ok(timings) = self.timings.read() {
            if let Some(t) = timings.get(name) {
                record(t);
                return;
            }
        }
        if let Ok(mut timings) = self.timings.write() {
            record(timings.entry(name.to_string()).or_default());
        }
    }
}

impl<T: MetricsSink + ?Sized> MetricsSink for std::sync::Arc<T> {
    fn add(&self, name: &str, value: u64) {
        (**self).add(name, value)
    }

    fn observe_ms(&self, name: &str, millis: u64) {
        (**self).observe_ms(name, millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn counters_accumulate_across_threads() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = metrics.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        m.incr("orders.processed");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(metrics.snapshot().counter("orders.processed"), 8000);
        assert_eq!(metrics.snapshot().counter("never.seen"), 0);
    }

    #[test]
    fn timings_track_count_total_and_max() {
        let metrics = InMemoryMetrics::new();
        metrics.observe_ms("orders.pipeline_ms", 10);
        metrics.observe_ms("orders.pipeline_ms", 30);

        let snap = metrics.snapshot();
        let t = &snap.timings["orders.pipeline_ms"];
        assert_eq!((t.count, t.total_ms, t.max_ms), (2, 40, 30));
        assert_eq!(t.mean_ms(), 20);
    }
}
