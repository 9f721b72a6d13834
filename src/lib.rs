pub mod auth;
pub mod core;
pub mod ha;
pub mod platform;

pub use crate::core::domain::error::{ProxmoxError, ProxmoxResult, ValidationError};
pub use crate::core::domain::model::{
    HaResource, HaResourceKind, HaSnapshot, HaState, ProxmoxAuth, ProxmoxConnection,
};
pub use crate::core::infrastructure::api_client::{ApiClient, ClientConfig, RateLimitConfig};
pub use crate::ha::HaResourceApi;
pub use crate::ha::coordinator::HaCoordinator;
pub use crate::ha::select::{HA_STATE_SELECT, HaStateSelect};
pub use crate::ha::setup::{CoordinatorSlot, EntryRuntime, HA_RESOURCES_COORDINATOR, setup_entry};
pub use crate::platform::{
    NoopReauthHandler, ReauthHandler, SelectEntity, SelectEntityDescription,
};

use std::sync::Arc;

/// A client for the Proxmox VE API, scoped to HA resource management.
///
/// This client provides a safe, ergonomic interface for:
/// - Authentication and session management
/// - Reading the cluster HA resource table
/// - Writing requested HA state changes
///
/// # Examples
///
/// ```no_run
/// use proxmox_ha_select::{ProxmoxClient, ProxmoxResult};
///
/// #[tokio::main]
/// async fn main() -> ProxmoxResult<()> {
///     let client = ProxmoxClient::builder()
///         .host("proxmox.example.com")
///         .port(8006)
///         .credentials("user", "password", "pve")
///         .secure(true)
///         .build()?;
///
///     client.login().await?;
///     Ok(())
/// }
/// ```
pub struct ProxmoxClient {
    api: Arc<ApiClient>,
}

/// Builder for ProxmoxClient configuration
#[derive(Debug, Default)]
pub struct ProxmoxClientBuilder {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    realm: Option<String>,
    secure: bool,
    accept_invalid_certs: bool,
    config: Option<ClientConfig>,
}

impl ProxmoxClientBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        realm: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self.realm = Some(realm.into());
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Allows self-signed certificates (common on lab clusters).
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Validates the configuration and builds the client.
    ///
    /// # Errors
    /// Returns `ProxmoxError::Validation` when a required field is missing
    /// or malformed.
    pub fn build(self) -> ProxmoxResult<ProxmoxClient> {
        let host = self.host.ok_or_else(|| required("host"))?;
        let username = self.username.ok_or_else(|| required("username"))?;
        let password = self.password.ok_or_else(|| required("password"))?;
        let realm = self.realm.ok_or_else(|| required("realm"))?;

        let connection = ProxmoxConnection::new(
            host,
            self.port.unwrap_or(8006),
            username,
            password,
            realm,
            self.secure,
            self.accept_invalid_certs,
        )?;
        let api = ApiClient::new(connection, self.config.unwrap_or_default())?;

        Ok(ProxmoxClient { api: Arc::new(api) })
    }
}

fn required(field: &str) -> ProxmoxError {
    ProxmoxError::Validation {
        source: ValidationError::Field {
            field: field.to_string(),
            message: format!("{field} is required"),
        },
    }
}

impl ProxmoxClient {
    /// Creates a new builder for ProxmoxClient configuration
    pub fn builder() -> ProxmoxClientBuilder {
        ProxmoxClientBuilder::default()
    }

    /// Authenticates with the Proxmox server.
    ///
    /// # Errors
    ///
    /// This method will return an error if:
    /// - The credentials are invalid
    /// - The server is unreachable
    /// - The response format is invalid
    pub async fn login(&self) -> ProxmoxResult<()> {
        self.api.login().await
    }

    /// Returns true if the client holds a non-expired ticket.
    pub async fn is_authenticated(&self) -> bool {
        self.api.is_authenticated().await
    }

    /// Shared API handle, suitable as the [`HaResourceApi`] for coordinators
    /// and entities.
    pub fn api(&self) -> Arc<ApiClient> {
        Arc::clone(&self.api)
    }
}

#[cfg(test)]
mod tests;
