//! Select entity exposing one HA resource's requested state.

use crate::{
    core::domain::{
        error::{ProxmoxError, ProxmoxResult},
        model::HaState,
    },
    ha::{HaResourceApi, coordinator::HaCoordinator},
    platform::{SelectEntity, SelectEntityDescription},
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Entity metadata shared by every HA-state select.
pub const HA_STATE_SELECT: SelectEntityDescription = SelectEntityDescription {
    key: "ha_state",
    name: "HA state",
    icon: "mdi:shield-sync",
};

/// Presents one resource's HA state as a selectable option and writes user
/// selections back to the cluster.
///
/// The entity keeps no mutable state of its own: every read goes through the
/// shared coordinator snapshot, and writes are confirmed by asking the
/// coordinator to refresh rather than by updating locally.
pub struct HaStateSelect {
    coordinator: Arc<HaCoordinator>,
    api: Arc<dyn HaResourceApi>,
    description: SelectEntityDescription,
    unique_id: String,
    sid: String,
}

impl HaStateSelect {
    pub fn new(
        coordinator: Arc<HaCoordinator>,
        api: Arc<dyn HaResourceApi>,
        unique_id: String,
        sid: String,
    ) -> Self {
        Self {
            coordinator,
            api,
            description: HA_STATE_SELECT,
            unique_id,
            sid,
        }
    }

    /// The sid of the resource this entity manages.
    pub fn sid(&self) -> &str {
        &self.sid
    }
}

#[async_trait]
impl SelectEntity for HaStateSelect {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn description(&self) -> &SelectEntityDescription {
        &self.description
    }

    fn options(&self) -> Vec<&'static str> {
        HaState::ALL.iter().map(HaState::as_str).collect()
    }

    fn current_option(&self) -> Option<String> {
        let snapshot = self.coordinator.data()?;
        snapshot.get(&self.sid).map(|r| r.state.clone())
    }

    fn available(&self) -> bool {
        self.coordinator.last_update_success()
            && self
                .coordinator
                .data()
                .is_some_and(|snapshot| snapshot.contains_key(&self.sid))
    }

    async fn select_option(&self, option: &str) -> ProxmoxResult<()> {
        if HaState::parse(option).is_none() {
            return Err(ProxmoxError::Action {
                message: format!("Invalid HA state: {option}"),
                source: None,
            });
        }

        // Run the write on its own task so a slow cluster never stalls the
        // caller's scheduling context.
        let api = Arc::clone(&self.api);
        let sid = self.sid.clone();
        let state = option.to_string();
        let written = tokio::spawn(async move { api.set_ha_state(&sid, &state).await })
            .await
            .map_err(|e| ProxmoxError::Action {
                message: format!(
                    "HA state change for {} to {option} did not complete: {e}",
                    self.sid
                ),
                source: None,
            })?;

        if let Err(error) = written {
            return Err(ProxmoxError::Action {
                message: format!("Failed to set HA state for {} to {option}", self.sid),
                source: Some(Box::new(error)),
            });
        }

        debug!(sid = %self.sid, state = option, "set HA resource state");

        // Pick up the acknowledged state; the write is never applied
        // optimistically to local data.
        self.coordinator.request_refresh().await;
        Ok(())
    }
}
