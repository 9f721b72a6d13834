//! Boundary contracts towards the host home-automation platform.
//!
//! The platform drives entities through these traits instead of a base-class
//! hierarchy: an entity exposes its identity, option list, current value and
//! availability, and accepts selections. The platform supplies its own
//! adapter implementing whatever entity contract it needs on top.

use crate::core::domain::error::ProxmoxResult;
use async_trait::async_trait;

/// Static metadata describing a select entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectEntityDescription {
    /// Stable key of the entity class within the integration.
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Icon identifier.
    pub icon: &'static str,
}

/// A selectable-state entity as seen by the platform.
///
/// Property reads are synchronous and operate purely on in-memory snapshots;
/// only `select_option` may suspend.
#[async_trait]
pub trait SelectEntity: Send + Sync {
    /// Unique id of this entity within the platform.
    fn unique_id(&self) -> &str;

    /// Entity metadata.
    fn description(&self) -> &SelectEntityDescription;

    /// The fixed list of selectable options.
    fn options(&self) -> Vec<&'static str>;

    /// The currently reported option, if the entity has a definite state.
    fn current_option(&self) -> Option<String>;

    /// Whether the entity should be presented as available.
    fn available(&self) -> bool;

    /// Applies a user selection.
    ///
    /// # Errors
    /// Returns `ProxmoxError::Action` with a user-facing message when the
    /// option is invalid or the write fails.
    async fn select_option(&self, option: &str) -> ProxmoxResult<()>;
}

/// Hook into the platform's re-authentication flow.
///
/// Invoked by the coordinator when a poll fails with rejected credentials,
/// so the platform can prompt the user for new ones.
pub trait ReauthHandler: Send + Sync {
    fn request_reauth(&self);
}

/// A [`ReauthHandler`] that does nothing, for contexts without a reauth flow.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReauthHandler;

impl ReauthHandler for NoopReauthHandler {
    fn request_reauth(&self) {}
}
