//! Ticket-based authentication against `access/ticket`.

use crate::core::domain::{
    error::{ProxmoxError, ProxmoxResult, ValidationError},
    model::{ProxmoxAuth, ProxmoxConnection},
};
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap},
};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct TicketRequest {
    username: String,
    password: String,
    realm: String,
}

#[derive(Deserialize)]
struct TicketResponse {
    data: TicketResponseData,
}

#[derive(Deserialize)]
struct TicketResponseData {
    ticket: String,
    #[serde(rename = "CSRFPreventionToken")]
    csrf_token: String,
}

/// Exchanges stored credentials for a ticket and CSRF prevention token.
pub struct LoginService {
    default_headers: HeaderMap,
}

impl LoginService {
    pub fn new() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        default_headers.insert(ACCEPT, "application/json".parse().unwrap());

        Self { default_headers }
    }

    /// Performs a login round-trip and returns the resulting session.
    ///
    /// # Errors
    /// Returns `ProxmoxError::Authentication` on rejected credentials and
    /// `ProxmoxError::Connection` for transport or endpoint failures.
    pub async fn execute(&self, connection: &ProxmoxConnection) -> ProxmoxResult<ProxmoxAuth> {
        let http_client = Client::builder()
            .danger_accept_invalid_certs(connection.accepts_invalid_certs())
            .build()
            .map_err(|e| ProxmoxError::Connection(e.to_string()))?;

        // The base URL always carries a trailing slash.
        let url = format!("{}api2/json/access/ticket", connection.url());
        let request = TicketRequest {
            username: connection.username().to_string(),
            password: connection.password().to_string(),
            realm: connection.realm().to_string(),
        };

        let response = http_client
            .post(&url)
            .headers(self.default_headers.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProxmoxError::Connection(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let login = response.json::<TicketResponse>().await.map_err(|e| {
                    ProxmoxError::Connection(format!("Failed to parse login response: {e}"))
                })?;
                Ok(ProxmoxAuth::new(
                    login.data.ticket,
                    Some(login.data.csrf_token),
                ))
            }
            StatusCode::UNAUTHORIZED => Err(ProxmoxError::Authentication(
                "Invalid credentials provided".to_string(),
            )),
            StatusCode::BAD_REQUEST => Err(ProxmoxError::Validation {
                source: ValidationError::Field {
                    field: "request".to_string(),
                    message: "Invalid request format".to_string(),
                },
            }),
            StatusCode::NOT_FOUND => Err(ProxmoxError::Connection(
                "Login endpoint not found".to_string(),
            )),
            StatusCode::SERVICE_UNAVAILABLE => Err(ProxmoxError::Connection(
                "Proxmox service is currently unavailable".to_string(),
            )),
            status => Err(ProxmoxError::Connection(format!(
                "Unexpected response status: {status}"
            ))),
        }
    }
}

impl Default for LoginService {
    fn default() -> Self {
        Self::new()
    }
}
