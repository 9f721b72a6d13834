//! Authentication session state: ticket and CSRF prevention token.

use std::time::{Duration, SystemTime};

/// An authenticated Proxmox session.
///
/// Holds the `PVEAuthCookie` ticket together with the CSRF prevention token
/// returned at login. Tickets age out server-side, so the creation instant is
/// recorded to let the client refresh proactively.
#[derive(Debug, Clone)]
pub struct ProxmoxAuth {
    ticket: String,
    csrf_token: Option<String>,
    created_at: SystemTime,
}

impl ProxmoxAuth {
    /// Creates a session from freshly issued tokens.
    pub fn new(ticket: String, csrf_token: Option<String>) -> Self {
        Self {
            ticket,
            csrf_token,
            created_at: SystemTime::now(),
        }
    }

    /// Returns the raw ticket value.
    #[must_use]
    pub fn ticket(&self) -> &str {
        &self.ticket
    }

    /// Returns the CSRF prevention token, required for write requests.
    #[must_use]
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// Formats the ticket as a `Cookie` header value.
    #[must_use]
    pub fn as_cookie_header(&self) -> String {
        format!("PVEAuthCookie={}", self.ticket)
    }

    /// Checks whether the ticket has outlived the given lifetime.
    #[must_use]
    pub fn is_expired(&self, lifetime: Duration) -> bool {
        self.created_at
            .elapsed()
            .map(|age| age > lifetime)
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header_format() {
        let auth = ProxmoxAuth::new("PVE:user@pam:4EEC61E2::sig".to_string(), None);
        assert_eq!(
            auth.as_cookie_header(),
            "PVEAuthCookie=PVE:user@pam:4EEC61E2::sig"
        );
    }

    #[test]
    fn test_expiry() {
        let auth = ProxmoxAuth::new("ticket".to_string(), None);
        assert!(!auth.is_expired(Duration::from_secs(3600)));
        assert!(auth.is_expired(Duration::ZERO));
    }
}
