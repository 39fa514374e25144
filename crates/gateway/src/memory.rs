use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;
use serde_json::Value;

use coachdesk_core::ResourceType;

use crate::{EntityGateway, GatewayError};

/// In-memory gateway for tests/dev.
///
/// Records how often each collection was listed so callers can assert which
/// fetches a read actually performed.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    collections: RwLock<HashMap<ResourceType, Vec<Value>>>,
    failures: RwLock<HashMap<ResourceType, GatewayError>>,
    calls: RwLock<HashMap<ResourceType, usize>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with typed rows.
    pub fn with_records<T: Serialize>(self, resource: ResourceType, records: &[T]) -> Self {
        let rows = records
            .iter()
            .filter_map(|r| serde_json::to_value(r).ok())
            .collect();
        self.with_raw(resource, rows)
    }

    pub fn with_raw(self, resource: ResourceType, rows: Vec<Value>) -> Self {
        if let Ok(mut map) = self.collections.write() {
            map.insert(resource, rows);
        }
        self
    }

    /// Make every listing of `resource` fail with `error`.
    pub fn with_failure(self, resource: ResourceType, error: GatewayError) -> Self {
        if let Ok(mut map) = self.failures.write() {
            map.insert(resource, error);
        }
        self
    }

    pub fn calls(&self, resource: ResourceType) -> usize {
        self.calls
            .read()
            .ok()
            .and_then(|m| m.get(&resource).copied())
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.read().map(|m| m.values().sum()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl EntityGateway for InMemoryGateway {
    async fn list(&self, resource: ResourceType) -> Result<Vec<Value>, GatewayError> {
        if let Ok(mut calls) = self.calls.write() {
            *calls.entry(resource).or_default() += 1;
        }

        if let Some(err) = self.failures.read().ok().and_then(|m| m.get(&resource).cloned()) {
            return Err(err);
        }

        Ok(self
            .collections
            .read()
            .ok()
            .and_then(|m| m.get(&resource).cloned())
            .unwrap_or_default())
    }
}
