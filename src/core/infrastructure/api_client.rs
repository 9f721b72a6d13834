//! Internal HTTP client that handles authentication and automatic ticket refresh.

use crate::{
    auth::LoginService,
    core::domain::{
        error::{ProxmoxError, ProxmoxResult},
        model::{ProxmoxAuth, ProxmoxConnection},
    },
    ha::HaResourceApi,
};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Client-side request rate limiting settings.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

/// Tunables for the API client.
#[derive(Debug, Clone, Copy)]
pub struct ClientConfig {
    /// How long an issued ticket is trusted before a proactive refresh.
    pub ticket_lifetime: Duration,
    /// Optional request rate limit; `None` disables limiting.
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            // Proxmox tickets live for two hours; refresh with margin.
            ticket_lifetime: Duration::from_secs(90 * 60),
            rate_limit: None,
        }
    }
}

/// Internal HTTP client that manages authentication and provides methods to call the Proxmox API.
///
/// This client automatically adds the necessary authentication headers
/// (`PVEAuthCookie` and `CSRFPreventionToken`) to each request. If a request
/// receives a `401 Unauthorized` response, it refreshes the ticket once using
/// the stored credentials and retries the request.
pub struct ApiClient {
    http_client: Client,
    connection: Arc<ProxmoxConnection>,
    auth: Arc<RwLock<Option<ProxmoxAuth>>>,
    config: ClientConfig,
    rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

#[derive(Serialize)]
struct HaStateRequest<'a> {
    state: &'a str,
}

impl ApiClient {
    /// Creates a new `ApiClient`. The client starts unauthenticated.
    ///
    /// # Errors
    /// Returns `ProxmoxError::Connection` if the HTTP client cannot be built
    /// or the rate limit settings are out of range.
    pub fn new(connection: ProxmoxConnection, config: ClientConfig) -> ProxmoxResult<Self> {
        let http_client = Client::builder()
            .danger_accept_invalid_certs(connection.accepts_invalid_certs())
            .build()
            .map_err(|e| ProxmoxError::Connection(e.to_string()))?;

        let rate_limiter = match config.rate_limit {
            Some(rl) => {
                let per_second = NonZeroU32::new(rl.requests_per_second).ok_or_else(|| {
                    ProxmoxError::Connection("Rate limit must be non-zero".to_string())
                })?;
                let burst = NonZeroU32::new(rl.burst_size).ok_or_else(|| {
                    ProxmoxError::Connection("Burst size must be non-zero".to_string())
                })?;
                let quota = Quota::per_second(per_second).allow_burst(burst);
                Some(Arc::new(DefaultDirectRateLimiter::direct(quota)))
            }
            None => None,
        };

        Ok(Self {
            http_client,
            connection: Arc::new(connection),
            auth: Arc::new(RwLock::new(None)),
            config,
            rate_limiter,
        })
    }

    /// Returns a reference to the underlying connection details.
    pub fn connection(&self) -> &ProxmoxConnection {
        &self.connection
    }

    /// Sets the authentication state (used after a successful login).
    pub async fn set_auth(&self, auth: ProxmoxAuth) {
        let mut lock = self.auth.write().await;
        *lock = Some(auth);
    }

    /// Returns `true` if there is a valid (non-expired) ticket.
    pub async fn is_authenticated(&self) -> bool {
        let lock = self.auth.read().await;
        lock.as_ref()
            .map(|a| !a.is_expired(self.config.ticket_lifetime))
            .unwrap_or(false)
    }

    /// Performs a fresh login using the stored credentials.
    ///
    /// # Errors
    /// Returns `ProxmoxError::Authentication` when the credentials are
    /// rejected and `ProxmoxError::Connection` for transport failures.
    pub async fn login(&self) -> ProxmoxResult<()> {
        let auth = LoginService::new().execute(&self.connection).await?;
        self.set_auth(auth).await;
        Ok(())
    }

    /// Performs an authenticated GET request.
    ///
    /// # Errors
    /// Returns `ProxmoxError` if the request fails, authentication cannot be
    /// refreshed, or the response cannot be parsed.
    pub async fn get<T>(&self, path: &str) -> ProxmoxResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.execute_request(reqwest::Method::GET, path, None::<&()>)
            .await
    }

    /// Performs an authenticated PUT request with a JSON body.
    ///
    /// # Errors
    /// Returns `ProxmoxError` if the request fails, authentication cannot be
    /// refreshed, or the response cannot be parsed.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> ProxmoxResult<T>
    where
        B: serde::Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        self.execute_request(reqwest::Method::PUT, path, Some(body))
            .await
    }

    /// Core request execution. Ensures authentication, applies rate limiting,
    /// sends the request, handles 401 by refreshing once, and parses the
    /// response.
    async fn execute_request<B, T>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> ProxmoxResult<T>
    where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned,
    {
        self.ensure_authenticated().await?;

        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let response = self.send(method.clone(), path, body).await?;

        // 401 means the ticket aged out server-side; refresh once and retry.
        if response.status() == StatusCode::UNAUTHORIZED {
            self.login().await?;
            tracing::debug!(path, "retrying request after ticket refresh");
            let retry = self.send(method, path, body).await?;
            return Self::parse(retry).await;
        }

        Self::parse(response).await
    }

    async fn send<B>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> ProxmoxResult<reqwest::Response>
    where
        B: serde::Serialize,
    {
        let base = self.connection.url().as_str().trim_end_matches('/');
        let url = format!("{}/api2/json/{}", base, path.trim_start_matches('/'));

        let mut req_builder = self.http_client.request(method, &url);

        {
            let auth_guard = self.auth.read().await;
            if let Some(auth) = auth_guard.as_ref() {
                req_builder = req_builder.header("Cookie", auth.as_cookie_header());
                if let Some(csrf) = auth.csrf_token() {
                    req_builder = req_builder.header("CSRFPreventionToken", csrf);
                }
            }
        }

        if let Some(body) = body {
            req_builder = req_builder.json(body);
        }

        req_builder
            .send()
            .await
            .map_err(|e| ProxmoxError::Connection(format!("HTTP request failed: {e}")))
    }

    async fn parse<T>(response: reqwest::Response) -> ProxmoxResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ProxmoxError::Authentication(
                "Credentials rejected after ticket refresh".to_string(),
            ));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(ProxmoxError::Connection(format!(
                "API error ({status}): {error_text}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProxmoxError::Connection(format!("Failed to parse response: {e}")))
    }

    /// Ensures that we have a valid (non-expired) ticket, logging in if not.
    async fn ensure_authenticated(&self) -> ProxmoxResult<()> {
        if !self.is_authenticated().await {
            self.login().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl HaResourceApi for ApiClient {
    async fn fetch_ha_resources(&self) -> ProxmoxResult<serde_json::Value> {
        self.get("cluster/ha/resources").await
    }

    async fn set_ha_state(&self, sid: &str, state: &str) -> ProxmoxResult<()> {
        let path = format!("cluster/ha/resources/{sid}");
        let _: serde_json::Value = self.put(&path, &HaStateRequest { state }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    fn create_test_connection(server_url: &str) -> ProxmoxConnection {
        let host_port = server_url.trim_start_matches("http://");
        let (host, port) = host_port.split_once(':').unwrap();
        ProxmoxConnection::new(host, port.parse().unwrap(), "testuser", "testpass", "pam", false, true)
            .unwrap()
    }

    fn create_test_auth() -> ProxmoxAuth {
        ProxmoxAuth::new(
            "PVE:testuser@pam:4EEC61E2::sig".to_string(),
            Some("4EEC61E2:token".to_string()),
        )
    }

    async fn create_authenticated_client(mock_server: &MockServer) -> ApiClient {
        let connection = create_test_connection(&mock_server.uri());
        let client = ApiClient::new(connection, ClientConfig::default()).unwrap();
        client.set_auth(create_test_auth()).await;
        client
    }

    #[tokio::test]
    async fn test_get_success() {
        let mock_server = MockServer::start().await;
        let client = create_authenticated_client(&mock_server).await;

        Mock::given(method("GET"))
            .and(path("/api2/json/test"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": "ok"})),
            )
            .mount(&mock_server)
            .await;

        let result: serde_json::Value = client.get("test").await.unwrap();
        assert_eq!(result["data"], "ok");
    }

    #[tokio::test]
    async fn test_set_ha_state_puts_to_resource_path() {
        let mock_server = MockServer::start().await;
        let client = create_authenticated_client(&mock_server).await;

        Mock::given(method("PUT"))
            .and(path("/api2/json/cluster/ha/resources/vm:101"))
            .and(body_json(serde_json::json!({"state": "stopped"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": null})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        client.set_ha_state("vm:101", "stopped").await.unwrap();
    }

    #[tokio::test]
    async fn test_unauthorized_triggers_refresh() {
        let mock_server = MockServer::start().await;
        let client = create_authenticated_client(&mock_server).await;

        // First GET returns 401
        Mock::given(method("GET"))
            .and(path("/api2/json/test"))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        // Login endpoint returns a fresh ticket and CSRF token
        Mock::given(method("POST"))
            .and(path("/api2/json/access/ticket"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "ticket": "PVE:testuser@pam:4EEC61E2::new_sig",
                    "CSRFPreventionToken": "4EEC61E2:abc123"
                }
            })))
            .mount(&mock_server)
            .await;

        // Second GET (retry) returns 200
        Mock::given(method("GET"))
            .and(path("/api2/json/test"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": "ok"})),
            )
            .mount(&mock_server)
            .await;

        let result: serde_json::Value = client.get("test").await.unwrap();
        assert_eq!(result["data"], "ok");
    }

    #[tokio::test]
    async fn test_refresh_failure_returns_auth_error() {
        let mock_server = MockServer::start().await;
        let client = create_authenticated_client(&mock_server).await;

        Mock::given(method("GET"))
            .and(path("/api2/json/test"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api2/json/access/ticket"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let result: ProxmoxResult<serde_json::Value> = client.get("test").await;
        assert!(matches!(result, Err(ProxmoxError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_rate_limiting_delays_requests() {
        use std::time::{Duration, Instant};

        let mock_server = MockServer::start().await;
        let connection = create_test_connection(&mock_server.uri());
        let config = ClientConfig {
            rate_limit: Some(RateLimitConfig {
                requests_per_second: 2,
                burst_size: 2,
            }),
            ..Default::default()
        };
        let client = ApiClient::new(connection, config).unwrap();
        client.set_auth(create_test_auth()).await;

        Mock::given(method("GET"))
            .and(path("/api2/json/test"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": "ok"})),
            )
            .expect(3)
            .mount(&mock_server)
            .await;

        // Two requests fit the burst; the third has to wait for quota.
        let start = Instant::now();
        for _ in 0..3 {
            client.get::<serde_json::Value>("test").await.unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_api_error_maps_to_connection_error() {
        let mock_server = MockServer::start().await;
        let client = create_authenticated_client(&mock_server).await;

        Mock::given(method("PUT"))
            .and(path("/api2/json/cluster/ha/resources/vm:999"))
            .respond_with(ResponseTemplate::new(400).set_body_string("no such resource"))
            .mount(&mock_server)
            .await;

        let result = client.set_ha_state("vm:999", "started").await;
        assert!(matches!(result, Err(ProxmoxError::Connection(_))));
    }
}
