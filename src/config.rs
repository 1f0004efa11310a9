//! Auth provider configuration parsed from environment variables.
//!
//! Read once at startup; the request path only ever sees the typed
//! [`GateConfig`] handed to the session provider.

pub const ENDPOINT_VAR: &str = "NEXT_PUBLIC_SUPABASE_URL";
pub const ACCESS_KEY_VARS: [&str; 2] =
    ["NEXT_PUBLIC_SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_PUBLISHABLE_DEFAULT_KEY"];
pub const DEFAULT_AUTH_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_AUTH_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing config: env var {var} not set")]
    MissingVar { var: String },
    #[error("invalid auth endpoint url: {0}")]
    InvalidEndpoint(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for AuthTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_AUTH_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_AUTH_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Base URL of the auth provider, without a trailing slash.
    pub endpoint_url: String,
    /// Public access key sent as `apikey` on provider calls.
    pub access_key: String,
    pub timeouts: AuthTimeouts,
}

impl GateConfig {
    /// Build typed gate config from environment variables.
    ///
    /// Required:
    /// - `NEXT_PUBLIC_SUPABASE_URL`
    /// - `NEXT_PUBLIC_SUPABASE_ANON_KEY`, or `NEXT_PUBLIC_SUPABASE_PUBLISHABLE_DEFAULT_KEY`
    ///   when the first is unset or empty
    ///
    /// Optional:
    /// - `AUTH_REQUEST_TIMEOUT_SECS`: default 10
    /// - `AUTH_CONNECT_TIMEOUT_SECS`: default 5
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] if the endpoint or both key variants
    /// are absent, and [`ConfigError::InvalidEndpoint`] if the endpoint is not
    /// an absolute `http(s)` URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = env_nonempty(ENDPOINT_VAR).ok_or_else(|| ConfigError::MissingVar { var: ENDPOINT_VAR.into() })?;
        let access_key = ACCESS_KEY_VARS
            .iter()
            .find_map(|var| env_nonempty(var))
            .ok_or_else(|| ConfigError::MissingVar { var: ACCESS_KEY_VARS.join(" or ") })?;
        let timeouts = AuthTimeouts {
            request_secs: env_parse_u64("AUTH_REQUEST_TIMEOUT_SECS", DEFAULT_AUTH_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("AUTH_CONNECT_TIMEOUT_SECS", DEFAULT_AUTH_CONNECT_TIMEOUT_SECS),
        };

        Self::new(&endpoint, access_key, timeouts)
    }

    /// Build config from explicit values, validating and normalizing the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpoint`] for a non-`http(s)` or hostless URL.
    pub fn new(endpoint: &str, access_key: String, timeouts: AuthTimeouts) -> Result<Self, ConfigError> {
        let endpoint_url = endpoint.trim().trim_end_matches('/').to_string();
        let parsed = url::Url::parse(&endpoint_url).map_err(|e| ConfigError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(Self { endpoint_url, access_key, timeouts })
    }

    /// First DNS label of the endpoint host, used to name the session cookie.
    #[must_use]
    pub fn project_ref(&self) -> String {
        url::Url::parse(&self.endpoint_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.split('.').next().unwrap_or(h).to_string()))
            .unwrap_or_default()
    }
}

/// Empty values count as unset, so an empty first key falls through to the second.
fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
