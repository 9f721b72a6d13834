//! High-Availability resource integration: coordinator, select entity, setup.

pub mod coordinator;
pub mod select;
pub mod setup;

use crate::core::domain::error::ProxmoxResult;
use async_trait::async_trait;

/// Capability set the HA integration needs from the cluster API.
///
/// The coordinator consumes the read side, the select entity the write side.
/// Both are usually backed by the same shared
/// [`ApiClient`](crate::core::infrastructure::api_client::ApiClient) handle,
/// but the seam is a trait so the pieces can be exercised in isolation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HaResourceApi: Send + Sync {
    /// Fetches the raw `/cluster/ha/resources` payload.
    ///
    /// The payload is returned unparsed; shape tolerance lives in the
    /// coordinator's normalizer, not here.
    async fn fetch_ha_resources(&self) -> ProxmoxResult<serde_json::Value>;

    /// Sets the requested HA state of one resource.
    async fn set_ha_state(&self, sid: &str, state: &str) -> ProxmoxResult<()>;
}
