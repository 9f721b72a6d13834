//! Domain models for cluster HA resources.
//!
//! This module defines the structures returned by the `/cluster/ha/resources`
//! endpoint. Each entry is identified by a `sid` of the form `"<type>:<vmid>"`;
//! only `vm:` (QEMU) and `ct:` (LXC) resources are modeled here, since those
//! are the only kinds that map onto manageable entities.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The request state of an HA-managed resource.
///
/// These are the values accepted by the cluster when writing the `state`
/// field of an HA resource, and the values reported back when reading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HaState {
    /// The resource should be running; the cluster restarts it on failure.
    Started,
    /// The resource should be stopped but stays under HA management.
    Stopped,
    /// HA management is disabled; the resource stays where it is.
    Disabled,
    /// The resource is ignored by the HA stack entirely.
    Ignored,
    /// The resource is being migrated to another node.
    Migrate,
}

impl HaState {
    /// All selectable HA states, in presentation order.
    pub const ALL: [HaState; 5] = [
        HaState::Started,
        HaState::Stopped,
        HaState::Disabled,
        HaState::Ignored,
        HaState::Migrate,
    ];

    /// Returns the wire representation of this state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HaState::Started => "started",
            HaState::Stopped => "stopped",
            HaState::Disabled => "disabled",
            HaState::Ignored => "ignored",
            HaState::Migrate => "migrate",
        }
    }

    /// Parses a wire representation into an [`HaState`], if recognized.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for HaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of virtualization resource behind an HA entry.
///
/// Not a wire type: the kind is derived from the sid prefix during
/// normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaResourceKind {
    /// A QEMU virtual machine (`vm:` sid prefix).
    Qemu,
    /// An LXC container (`ct:` sid prefix).
    Lxc,
}

impl HaResourceKind {
    /// Maps a sid prefix (`"vm"` or `"ct"`) to a resource kind.
    #[must_use]
    pub fn from_sid_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "vm" => Some(HaResourceKind::Qemu),
            "ct" => Some(HaResourceKind::Lxc),
            _ => None,
        }
    }

    /// Returns the sid prefix used by the cluster for this kind.
    #[must_use]
    pub fn sid_prefix(&self) -> &'static str {
        match self {
            HaResourceKind::Qemu => "vm",
            HaResourceKind::Lxc => "ct",
        }
    }

    /// Returns the key prefix under which per-resource coordinators are
    /// registered in the entry runtime (`qemu_{vmid}` / `lxc_{vmid}`).
    #[must_use]
    pub fn coordinator_key_prefix(&self) -> &'static str {
        match self {
            HaResourceKind::Qemu => "qemu",
            HaResourceKind::Lxc => "lxc",
        }
    }

    /// Formats the sid for a resource of this kind.
    #[must_use]
    pub fn sid(&self, vmid: u32) -> String {
        format!("{}:{}", self.sid_prefix(), vmid)
    }
}

/// One HA-managed resource's state snapshot.
///
/// Built fresh on every successful poll and immutable once built; the next
/// successful poll supersedes it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct HaResource {
    /// Stable identifier, format `"<type>:<vmid>"` (e.g. `vm:101`).
    pub sid: String,
    /// Resource kind, derived from the sid prefix.
    pub kind: HaResourceKind,
    /// The VM/container identifier, parsed from the sid suffix.
    pub vmid: u32,
    /// Requested HA state, verbatim as reported by the cluster.
    pub state: String,
    /// HA group the resource is assigned to.
    pub group: Option<String>,
    /// Current manager status (e.g. `started`, `error`).
    pub status: Option<String>,
    /// Pending request state, if a transition is in flight.
    pub request_state: Option<String>,
    /// Maximum relocate attempts before the resource is marked errored.
    pub max_relocate: Option<u32>,
    /// Maximum restart attempts on the same node.
    pub max_restart: Option<u32>,
    /// Configuration digest.
    pub digest: Option<String>,
}

/// Wire shape of one `/cluster/ha/resources` list element.
///
/// Kept separate from [`HaResource`] because `kind` and `vmid` are not
/// payload fields; they are derived from the sid during normalization.
#[derive(Debug, Deserialize)]
pub(crate) struct RawHaResource {
    pub sid: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub request_state: Option<String>,
    #[serde(default)]
    pub max_relocate: Option<u32>,
    #[serde(default)]
    pub max_restart: Option<u32>,
    #[serde(default)]
    pub digest: Option<String>,
}

impl HaResource {
    /// Builds a domain resource from a raw payload entry.
    ///
    /// Returns `None` when the sid does not carry a recognized
    /// `<prefix>:<numeric-id>` shape; such entries are excluded from the
    /// snapshot rather than errored.
    pub(crate) fn from_raw(raw: RawHaResource) -> Option<Self> {
        let (prefix, id) = raw.sid.split_once(':')?;
        let kind = HaResourceKind::from_sid_prefix(prefix)?;
        let vmid: u32 = id.parse().ok()?;

        Some(Self {
            sid: raw.sid,
            kind,
            vmid,
            state: raw.state,
            group: raw.group,
            status: raw.status,
            request_state: raw.request_state,
            max_relocate: raw.max_relocate,
            max_restart: raw.max_restart,
            digest: raw.digest,
        })
    }
}

/// The coordinator's current result set: sid to resource, atomically replaced.
pub type HaSnapshot = HashMap<String, HaResource>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ha_state_round_trip() {
        for state in HaState::ALL {
            assert_eq!(HaState::parse(state.as_str()), Some(state));
        }
        assert_eq!(HaState::parse("invalid_state"), None);
    }

    #[test]
    fn test_resource_kind_prefixes() {
        assert_eq!(HaResourceKind::from_sid_prefix("vm"), Some(HaResourceKind::Qemu));
        assert_eq!(HaResourceKind::from_sid_prefix("ct"), Some(HaResourceKind::Lxc));
        assert_eq!(HaResourceKind::from_sid_prefix("node"), None);
        assert_eq!(HaResourceKind::Qemu.sid(101), "vm:101");
        assert_eq!(HaResourceKind::Lxc.sid(100), "ct:100");
    }

    #[test]
    fn test_from_raw_rejects_unknown_prefix_and_bad_vmid() {
        let entry = |sid: &str| RawHaResource {
            sid: sid.to_string(),
            state: "started".to_string(),
            group: None,
            status: None,
            request_state: None,
            max_relocate: None,
            max_restart: None,
            digest: None,
        };

        assert!(HaResource::from_raw(entry("node:pve1")).is_none());
        assert!(HaResource::from_raw(entry("vm:abc")).is_none());
        assert!(HaResource::from_raw(entry("vm101")).is_none());

        let resource = HaResource::from_raw(entry("vm:101")).unwrap();
        assert_eq!(resource.kind, HaResourceKind::Qemu);
        assert_eq!(resource.vmid, 101);
        assert_eq!(resource.state, "started");
    }
}
