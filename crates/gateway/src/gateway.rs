//! The entity gateway seam: one listing call per backend collection.

use std::sync::Arc;

use serde_json::Value;

use coachdesk_core::{Record, ResourceType};

use crate::GatewayError;

/// Read access to backend collections.
///
/// Implementations own transport, authentication and envelope handling; they
/// hand back the raw rows of one collection.
#[async_trait::async_trait]
pub trait EntityGateway: Send + Sync {
    async fn list(&self, resource: ResourceType) -> Result<Vec<Value>, GatewayError>;
}

#[async_trait::async_trait]
impl<G> EntityGateway for Arc<G>
where
    G: EntityGateway + ?Sized,
{
    async fn list(&self, resource: ResourceType) -> Result<Vec<Value>, GatewayError> {
        (**self).list(resource).await
    }
}

/// List one collection and decode it into typed rows.
pub async fn fetch<T, G>(gateway: &G) -> Result<Vec<T>, GatewayError>
where
    T: Record,
    G: EntityGateway + ?Sized,
{
    let rows = gateway.list(T::RESOURCE).await?;
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value(row)
                .map_err(|e| GatewayError::parse(T::RESOURCE, format!("row {index}: {e}")))
        })
        .collect()
}

/// Unwrap a listing body: either a bare array or `{ "data": [...] }`.
pub fn normalize_listing(resource: ResourceType, body: Value) -> Result<Vec<Value>, GatewayError> {
    match body {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(rows)) => Ok(rows),
            Some(Value::Null) => Ok(Vec::new()),
            _ => Err(GatewayError::parse(resource, "expected an array or a 'data' array")),
        },
        _ => Err(GatewayError::parse(resource, "expected an array or a 'data' array")),
    }
}
