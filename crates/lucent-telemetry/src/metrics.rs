// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Named monotonic counters.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Identifier of a counter: a namespace plus a name, e.g. `frames:acquired`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricId {
    /// Broad category, such as `frames` or `anchors`.
    pub namespace: String,
    /// Counter name within the namespace.
    pub name: String,
}

impl MetricId {
    /// Creates an identifier.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// Handle to a registered counter. Clones share the same value.
#[derive(Debug, Clone)]
pub struct CounterHandle {
    id: MetricId,
    value: Arc<AtomicU64>,
}

impl CounterHandle {
    /// Adds one.
    pub fn increment(&self) {
        self.add(1);
    }

    /// Adds `n`.
    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// The counter's identifier.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Registry of counters, shareable across threads.
///
/// Registering the same identifier twice returns a handle to the existing counter.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: Mutex<BTreeMap<MetricId, Arc<AtomicU64>>>,
}

impl MetricsRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a counter, or returns the existing one with that identifier.
    pub fn register_counter(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> CounterHandle {
        let id = MetricId::new(namespace, name);
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let value = counters.entry(id.clone()).or_default().clone();
        CounterHandle { id, value }
    }

    /// Current value of a counter, if registered.
    pub fn counter_value(&self, id: &MetricId) -> Option<u64> {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.get(id).map(|v| v.load(Ordering::Relaxed))
    }

    /// Every counter and its value, ordered by identifier.
    pub fn snapshot(&self) -> Vec<(MetricId, u64)> {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters
            .iter()
            .map(|(id, v)| (id.clone(), v.load(Ordering::Relaxed)))
            .collect()
    }

    /// Number of registered counters.
    pub fn metric_count(&self) -> usize {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
