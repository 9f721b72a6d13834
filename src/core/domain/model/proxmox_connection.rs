//! Validated connection parameters for a Proxmox VE endpoint.

use crate::core::domain::error::{ProxmoxResult, ValidationError};
use url::Url;

/// Connection details for one Proxmox VE cluster endpoint.
///
/// Construction validates every field and derives the base URL, so a value of
/// this type is always usable for building API requests.
#[derive(Debug, Clone)]
pub struct ProxmoxConnection {
    host: String,
    port: u16,
    username: String,
    password: String,
    realm: String,
    secure: bool,
    accept_invalid_certs: bool,
    url: Url,
}

impl ProxmoxConnection {
    /// Creates a validated connection description.
    ///
    /// # Errors
    /// Returns `ProxmoxError::Validation` if a field is empty or malformed,
    /// or if no base URL can be derived from host and port.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        realm: impl Into<String>,
        secure: bool,
        accept_invalid_certs: bool,
    ) -> ProxmoxResult<Self> {
        let host = host.into();
        let username = username.into();
        let password = password.into();
        let realm = realm.into();

        validate_host(&host)?;
        validate_field("username", &username)?;
        validate_field("password", &password)?;
        validate_field("realm", &realm)?;

        let scheme = if secure { "https" } else { "http" };
        let url = Url::parse(&format!("{scheme}://{host}:{port}/"))
            .map_err(|e| ValidationError::Format(format!("Invalid endpoint URL: {e}")))?;

        Ok(Self {
            host,
            port,
            username,
            password,
            realm,
            secure,
            accept_invalid_certs,
            url,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn accepts_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    /// Base URL of the endpoint, with trailing slash.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

fn validate_host(host: &str) -> Result<(), ValidationError> {
    if host.is_empty() {
        return Err(ValidationError::Field {
            field: "host".to_string(),
            message: "Host cannot be empty".to_string(),
        });
    }
    if host.contains(char::is_whitespace) {
        return Err(ValidationError::Format(
            "Host cannot contain whitespace".to_string(),
        ));
    }
    Ok(())
}

fn validate_field(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Field {
            field: field.to_string(),
            message: format!("{field} cannot be empty"),
        });
    }
    Ok(())
}
