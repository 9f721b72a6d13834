//! Entry setup: turns per-entry runtime state into select entities.

use crate::{
    core::domain::model::HaResourceKind,
    ha::{HaResourceApi, coordinator::HaCoordinator, select::HaStateSelect},
};
use std::collections::HashMap;
use std::sync::Arc;

/// Coordinator-map key under which the HA resource coordinator is registered.
pub const HA_RESOURCES_COORDINATOR: &str = "resources_ha";

/// One slot in the per-entry coordinator map.
pub enum CoordinatorSlot {
    /// The cluster-wide HA resource coordinator.
    HaResources(Arc<HaCoordinator>),
    /// A per-resource status coordinator owned by another platform; only its
    /// presence matters here, as it gates entity creation.
    Device,
}

/// Shared per-entry runtime state, owned by the integration's entry
/// lifecycle. Passed into setup explicitly; there is no ambient registry.
pub struct EntryRuntime {
    /// Stable id of the config entry, used as unique-id prefix.
    pub entry_id: String,
    /// Coordinators by name: `resources_ha` plus `qemu_{vmid}` / `lxc_{vmid}`.
    pub coordinators: HashMap<String, CoordinatorSlot>,
    /// Shared API handle used by entities for write-through.
    pub api: Arc<dyn HaResourceApi>,
    /// Configured QEMU VM identifiers.
    pub qemu: Vec<u32>,
    /// Configured LXC container identifiers.
    pub lxc: Vec<u32>,
}

/// Builds one select entity per configured resource that is both present in
/// the current HA snapshot and backed by its own per-resource coordinator.
///
/// Without an HA coordinator, or before its first successful poll, no
/// entities are created.
pub fn setup_entry(runtime: &EntryRuntime) -> Vec<HaStateSelect> {
    let Some(CoordinatorSlot::HaResources(coordinator)) =
        runtime.coordinators.get(HA_RESOURCES_COORDINATOR)
    else {
        return Vec::new();
    };
    let Some(snapshot) = coordinator.data() else {
        return Vec::new();
    };

    let mut selects = Vec::new();
    for (kind, ids) in [
        (HaResourceKind::Qemu, &runtime.qemu),
        (HaResourceKind::Lxc, &runtime.lxc),
    ] {
        for &vmid in ids {
            let sid = kind.sid(vmid);
            if !snapshot.contains_key(&sid) {
                continue;
            }
            let coordinator_key = format!("{}_{}", kind.coordinator_key_prefix(), vmid);
            if !runtime.coordinators.contains_key(&coordinator_key) {
                continue;
            }

            selects.push(HaStateSelect::new(
                Arc::clone(coordinator),
                Arc::clone(&runtime.api),
                format!("{}_{}_ha_state", runtime.entry_id, vmid),
                sid,
            ));
        }
    }

    selects
}
