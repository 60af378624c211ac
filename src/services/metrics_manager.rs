use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Outcome counts per operation, e.g. `{"chat": {"OK": 4, "RATE_LIMITED": 1}}`.
#[derive(Debug, Default, Clone, Serialize)]
pub struct MetricsData {
    pub operations: HashMap<String, BTreeMap<String, u64>>,
}

impl MetricsData {
    pub fn count(&self, operation: &str, outcome: &str) -> u64 {
        self.operations
            .get(operation)
            .and_then(|outcomes| outcomes.get(outcome))
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct MetricsManager {
    inner: Arc<RwLock<MetricsData>>,
}

impl Default for MetricsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsData::default())),
        }
    }

    pub async fn record(&self, operation: &str, outcome: &str) {
        let mut data = self.inner.write().await;
        *data
            .operations
            .entry(operation.to_string())
            .or_default()
            .entry(outcome.to_string())
            .or_insert(0) += 1;
    }

    pub async fn get_metrics(&self) -> MetricsData {
        self.inner.read().await.clone()
    }
}
