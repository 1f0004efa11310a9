//! Session lookup seam between the request gate and the auth provider.
//!
//! ARCHITECTURE
//! ============
//! The gate only needs one bit per request: is there a valid session. The
//! provider may also need to rewrite the session cookie (e.g. after a token
//! refresh), so a lookup returns those cookie mutations alongside the status
//! instead of reaching into the outgoing response.

use axum_extra::extract::cookie::{Cookie, CookieJar};

/// Whether the request carries a valid session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Authenticated,
    Unauthenticated,
}

impl SessionStatus {
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Result of a single session lookup.
#[derive(Debug, Clone)]
pub struct SessionLookup {
    pub status: SessionStatus,
    /// Cookies to set on whatever response the gate returns.
    pub set_cookies: Vec<Cookie<'static>>,
}

impl SessionLookup {
    #[must_use]
    pub fn authenticated() -> Self {
        Self { status: SessionStatus::Authenticated, set_cookies: Vec::new() }
    }

    #[must_use]
    pub fn unauthenticated() -> Self {
        Self { status: SessionStatus::Unauthenticated, set_cookies: Vec::new() }
    }

    #[must_use]
    pub fn with_cookies(mut self, cookies: Vec<Cookie<'static>>) -> Self {
        self.set_cookies = cookies;
        self
    }
}

/// Errors produced while looking up or refreshing a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The HTTP request to the auth provider failed (connect, timeout, body read).
    #[error("auth request failed: {0}")]
    Request(String),

    /// The auth provider returned a server-side error status.
    #[error("auth response error: status {status}")]
    Response { status: u16, body: String },

    /// The auth provider response body could not be deserialized.
    #[error("auth response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// Capability to resolve a request's cookies into a session status.
#[async_trait::async_trait]
pub trait SessionProvider: Send + Sync {
    /// Look up the session for the given request cookies.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] when the provider could not be reached or
    /// answered with something unusable. Callers treat this as no session.
    async fn lookup(&self, cookies: &CookieJar) -> Result<SessionLookup, SessionError>;
}

/// Resolve a lookup, collapsing every failure into `Unauthenticated`.
pub async fn lookup_or_unauthenticated(provider: &dyn SessionProvider, cookies: &CookieJar, path: &str) -> SessionLookup {
    match provider.lookup(cookies).await {
        Ok(lookup) => {
            if !lookup.status.is_authenticated() {
                tracing::debug!(%path, "no session");
            }
            lookup
        }
        Err(e) => {
            tracing::warn!(%path, error = %e, "session lookup failed; treating as unauthenticated");
            SessionLookup::unauthenticated()
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
