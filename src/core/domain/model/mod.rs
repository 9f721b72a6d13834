pub mod ha_resource;
pub mod proxmox_auth;
pub mod proxmox_connection;

pub use ha_resource::{HaResource, HaResourceKind, HaSnapshot, HaState};
pub use proxmox_auth::ProxmoxAuth;
pub use proxmox_connection::ProxmoxConnection;
