//! Polling coordinator for cluster HA resource state.
//!
//! HA management is an optional cluster feature: many installations never
//! configure it. The coordinator therefore treats a failing or missing
//! `/cluster/ha/resources` endpoint as "no HA resources" rather than as an
//! error, while still letting credential problems reach the platform's
//! re-authentication flow.

use crate::{
    core::domain::{
        error::ProxmoxError,
        model::ha_resource::{HaResource, HaSnapshot, RawHaResource},
    },
    ha::HaResourceApi,
    platform::ReauthHandler,
};
use serde_json::Value;
use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Converts a raw `/cluster/ha/resources` response into a snapshot.
///
/// Accepts either a bare list or a mapping with a `data` key holding the
/// list. Elements that are not mappings, lack a recognized `vm:`/`ct:` sid,
/// or carry a non-numeric suffix are dropped silently; malformed input is
/// never fatal and yields at worst an empty snapshot.
pub fn normalize_payload(raw: &Value) -> HaSnapshot {
    let entries = match raw.get("data") {
        Some(data) => data,
        None => raw,
    };

    let mut snapshot = HaSnapshot::new();
    let Some(list) = entries.as_array() else {
        return snapshot;
    };

    for entry in list {
        if !entry.is_object() {
            continue;
        }
        let Ok(raw_resource) = serde_json::from_value::<RawHaResource>(entry.clone()) else {
            continue;
        };
        if let Some(resource) = HaResource::from_raw(raw_resource) {
            snapshot.insert(resource.sid.clone(), resource);
        }
    }

    snapshot
}

/// Periodic poll coordinator owning the last-known HA snapshot.
///
/// `data()` and `last_update_success()` are synchronous and safe to call from
/// entity property accessors at any time between polls. Refreshes are
/// serialized; the snapshot is replaced atomically and never merged
/// incrementally.
pub struct HaCoordinator {
    api: Arc<dyn HaResourceApi>,
    reauth: Arc<dyn ReauthHandler>,
    snapshot: RwLock<Option<Arc<HaSnapshot>>>,
    last_update_success: AtomicBool,
    refresh_gate: Mutex<()>,
}

impl HaCoordinator {
    pub fn new(api: Arc<dyn HaResourceApi>, reauth: Arc<dyn ReauthHandler>) -> Self {
        Self {
            api,
            reauth,
            snapshot: RwLock::new(None),
            // Matches the platform coordinator convention: assumed healthy
            // until a poll proves otherwise.
            last_update_success: AtomicBool::new(true),
            refresh_gate: Mutex::new(()),
        }
    }

    /// The current snapshot, or `None` before the first successful poll.
    pub fn data(&self) -> Option<Arc<HaSnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Whether the most recent poll was counted as successful.
    pub fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::SeqCst)
    }

    /// Performs one poll, classifying failures.
    ///
    /// - success: the normalized snapshot replaces the previous one;
    /// - authentication failure: the update is marked unsuccessful, the
    ///   previous snapshot is retained, and the platform's re-authentication
    ///   flow is triggered once;
    /// - fetch failure (`Connection`): the HA endpoint is treated as not
    ///   configured; the snapshot becomes empty and the update still counts
    ///   as successful;
    /// - anything else: the update is marked unsuccessful and the previous
    ///   snapshot is retained.
    ///
    /// Concurrent invocations are serialized, so polls never overlap.
    pub async fn refresh(&self) {
        let _gate = self.refresh_gate.lock().await;

        match self.api.fetch_ha_resources().await {
            Ok(raw) => {
                let snapshot = normalize_payload(&raw);
                debug!(resources = snapshot.len(), "refreshed HA resource snapshot");
                self.install(snapshot);
            }
            Err(ProxmoxError::Authentication(message)) => {
                warn!(%message, "HA poll rejected, requesting re-authentication");
                self.last_update_success.store(false, Ordering::SeqCst);
                self.reauth.request_reauth();
            }
            Err(ProxmoxError::Connection(message)) => {
                // HA being unconfigured is a normal cluster state, not an
                // error worth surfacing. This also swallows transient fetch
                // failures; known tolerance-for-availability tradeoff.
                debug!(%message, "HA resources unavailable, treating as unconfigured");
                self.install(HaSnapshot::new());
            }
            Err(err) => {
                warn!(error = %err, "HA poll failed");
                self.last_update_success.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Requests an immediate refresh so reads reflect acknowledged cluster
    /// state. Debouncing, if any, is the scheduler's concern.
    pub async fn request_refresh(&self) {
        self.refresh().await;
    }

    /// Atomically replaces the snapshot and marks the update successful.
    fn install(&self, snapshot: HaSnapshot) {
        let mut guard = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::new(snapshot));
        drop(guard);
        self.last_update_success.store(true, Ordering::SeqCst);
    }
}
