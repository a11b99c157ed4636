//! Metrics collector — counts API requests and scheduling outcomes.
//!
//! Counters are atomics behind per-label `Arc`s; the label maps are
//! guarded by a tokio `RwLock` and only write-locked the first time a
//! label set is seen.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use greengrid_core::{WorkloadPriority, WorkloadType};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RequestKey {
    method: String,
    endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ScheduledKey {
    region: String,
    workload_type: WorkloadType,
    priority: WorkloadPriority,
}

#[derive(Default)]
struct RequestMetrics {
    count: AtomicU64,
    /// Accumulated latency in microseconds.
    duration_us: AtomicU64,
}

#[derive(Default)]
struct ScheduledMetrics {
    count: AtomicU64,
    duration_hours: Mutex<f64>,
}

/// Per-endpoint request totals.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestStat {
    pub method: String,
    pub endpoint: String,
    pub count: u64,
    pub duration_seconds_sum: f64,
}

/// Placements per region, workload type and priority.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledStat {
    pub region: String,
    pub workload_type: WorkloadType,
    pub priority: WorkloadPriority,
    pub count: u64,
    pub duration_hours_sum: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailureStat {
    pub reason: String,
    pub count: u64,
}

/// Point-in-time copy of every counter, ordered by label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub requests: Vec<RequestStat>,
    pub scheduled: Vec<ScheduledStat>,
    pub failures: Vec<FailureStat>,
}

impl MetricsSnapshot {
    pub fn total_scheduled(&self) -> u64 {
        self.scheduled.iter().map(|s| s.count).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.failures.iter().map(|f| f.count).sum()
    }
}

/// Process-lifetime counters for the API and the scheduler.
#[derive(Default)]
pub struct MetricsCollector {
    requests: RwLock<BTreeMap<RequestKey, Arc<RequestMetrics>>>,
    scheduled: RwLock<BTreeMap<ScheduledKey, Arc<ScheduledMetrics>>>,
    failures: RwLock<BTreeMap<String, Arc<AtomicU64>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one served HTTP request.
    pub async fn record_request(&self, method: &str, endpoint: &str, latency: Duration) {
        let key = RequestKey {
            method: method.to_string(),
            endpoint: endpoint.to_string(),
        };
        let m = entry(&self.requests, key).await;
        m.count.fetch_add(1, Ordering::Relaxed);
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        m.duration_us.fetch_add(micros, Ordering::Relaxed);
    }

    /// Record a successful placement.
    pub async fn record_scheduled(
        &self,
        region: &str,
        workload_type: WorkloadType,
        priority: WorkloadPriority,
        duration_hours: f64,
    ) {
        let key = ScheduledKey {
            region: region.to_string(),
            workload_type,
            priority,
        };
        let m = entry(&self.scheduled, key).await;
        m.count.fetch_add(1, Ordering::Relaxed);
        *m.duration_hours.lock().await += duration_hours;
        debug!(%region, %workload_type, %priority, "placement recorded");
    }

    /// Record a placement that did not produce a decision.
    pub async fn record_failure(&self, reason: &str) {
        let counter = entry(&self.failures, reason.to_string()).await;
        counter.fetch_add(1, Ordering::Relaxed);
        debug!(%reason, "placement failure recorded");
    }

    /// Copy every counter without resetting it.
    pub async fn snapshot(&self) -> MetricsSnapshot {
        let requests = self
            .requests
            .read()
            .await
            .iter()
            .map(|(k, m)| RequestStat {
                method: k.method.clone(),
                endpoint: k.endpoint.clone(),
                count: m.count.load(Ordering::Relaxed),
                duration_seconds_sum: m.duration_us.load(Ordering::Relaxed) as f64 / 1_000_000.0,
            })
            .collect();

        let mut scheduled = Vec::new();
        for (k, m) in self.scheduled.read().await.iter() {
            scheduled.push(ScheduledStat {
                region: k.region.clone(),
                workload_type: k.workload_type,
                priority: k.priority,
                count: m.count.load(Ordering::Relaxed),
                duration_hours_sum: *m.duration_hours.lock().await,
            });
        }

        let failures = self
            .failures
            .read()
            .await
            .iter()
            .map(|(reason, c)| FailureStat {
                reason: reason.clone(),
                count: c.load(Ordering::Relaxed),
            })
            .collect();

        MetricsSnapshot {
            requests,
            scheduled,
            failures,
        }
    }
}

/// Fetch the metrics for `key`, creating them on first use.
async fn entry<K: Ord, V: Default>(map: &RwLock<BTreeMap<K, Arc<V>>>, key: K) -> Arc<V> {
    if let Some(existing) = map.read().await.get(&key) {
        return Arc::clone(existing);
    }
    let mut map = map.write().await;
    Arc::clone(map.entry(key).or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_snapshot() {
        let collector = MetricsCollector::new();
        let snap = collector.snapshot().await;
        assert_eq!(snap, MetricsSnapshot::default());
        assert_eq!(snap.total_scheduled(), 0);
    }

    #[tokio::test]
    async fn record_and_count_requests() {
        let collector = MetricsCollector::new();
        collector
            .record_request("GET", "/health", Duration::from_millis(5))
            .await;
        collector
            .record_request("GET", "/health", Duration::from_millis(15))
            .await;
        collector
            .record_request("POST", "/api/v1/jobs/schedule", Duration::from_millis(2))
            .await;

        let snap = collector.snapshot().await;
        assert_eq!(snap.requests.len(), 2);
        let health = &snap.requests[0];
        assert_eq!(health.method, "GET");
        assert_eq!(health.endpoint, "/health");
        assert_eq!(health.count, 2);
        assert!((health.duration_seconds_sum - 0.020).abs() < 1e-9);
    }

    #[tokio::test]
    async fn scheduled_accumulates_per_label_set() {
        let collector = MetricsCollector::new();
        collector
            .record_scheduled("eu-north-1", WorkloadType::LlmTraining, WorkloadPriority::High, 2.0)
            .await;
        collector
            .record_scheduled("eu-north-1", WorkloadType::LlmTraining, WorkloadPriority::High, 3.5)
            .await;
        collector
            .record_scheduled("us-west-1", WorkloadType::FineTuning, WorkloadPriority::Low, 1.0)
            .await;

        let snap = collector.snapshot().await;
        assert_eq!(snap.scheduled.len(), 2);
        assert_eq!(snap.total_scheduled(), 3);

        let eu = &snap.scheduled[0];
        assert_eq!(eu.region, "eu-north-1");
        assert_eq!(eu.count, 2);
        assert_eq!(eu.duration_hours_sum, 5.5);
    }

    #[tokio::test]
    async fn failures_are_keyed_by_reason() {
        let collector = MetricsCollector::new();
        collector.record_failure("no_feasible_region").await;
        collector.record_failure("no_feasible_region").await;
        collector.record_failure("invalid_request").await;

        let snap = collector.snapshot().await;
        assert_eq!(snap.total_failures(), 3);
        assert_eq!(snap.failures[0].reason, "invalid_request");
        assert_eq!(snap.failures[1].count, 2);
    }

    #[tokio::test]
    async fn snapshot_does_not_reset() {
        let collector = MetricsCollector::new();
        collector.record_failure("no_active_capacity").await;
        collector.snapshot().await;
        assert_eq!(collector.snapshot().await.total_failures(), 1);
    }

    #[tokio::test]
    async fn concurrent_recording_is_counted() {
        let collector = Arc::new(MetricsCollector::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let c = Arc::clone(&collector);
            handles.push(tokio::spawn(async move {
                for _ in 0..25 {
                    c.record_request("GET", "/metrics", Duration::from_micros(10))
                        .await;
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let snap = collector.snapshot().await;
        assert_eq!(snap.requests[0].count, 200);
    }
}
