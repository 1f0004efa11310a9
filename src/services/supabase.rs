//! Supabase (GoTrue) session provider.
//!
//! DESIGN
//! ======
//! Mirrors the auth helper's `getSession`: the session lives client-side in
//! the `sb-<project-ref>-auth-token` cookie. A still-valid access token means
//! a session exists without any network call; an expired one is exchanged at
//! `/auth/v1/token?grant_type=refresh_token` and the fresh session is written
//! back as cookies on the response.
//!
//! TRADE-OFFS
//! ==========
//! The access token is not verified here, only its expiry is read. Pages
//! behind the gate still authorize their own data calls with the token, so
//! a forged cookie buys a redirect decision and nothing more.

use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

use super::session::{SessionError, SessionLookup, SessionProvider};
use crate::config::GateConfig;

const BASE64_PREFIX: &str = "base64-";
/// Largest cookie value written before splitting into `.0`, `.1`, ... chunks.
const MAX_CHUNK_SIZE: usize = 3180;
/// Tokens expiring within this many seconds are refreshed early.
const EXPIRY_MARGIN_SECS: i64 = 10;
const COOKIE_MAX_AGE_DAYS: i64 = 400;

// =============================================================================
// STORED SESSION
// =============================================================================

/// Session as stored in the auth cookie (object form).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
    /// Provider tokens and anything else the client stored alongside.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn decode_base64url(input: &str) -> Option<Vec<u8>> {
    let trimmed = input.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .ok()
}

/// Read the `exp` claim from a JWT payload without verifying the signature.
pub(crate) fn jwt_exp(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = decode_base64url(payload)?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}

/// Decode a raw cookie value into a session.
///
/// Accepts an optional `base64-` prefix, then either the object form or the
/// legacy `[access_token, refresh_token, ...]` array form.
pub(crate) fn decode_session(raw: &str) -> Option<StoredSession> {
    let json = match raw.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => String::from_utf8(decode_base64url(encoded)?).ok()?,
        None => raw.to_string(),
    };

    match serde_json::from_str::<serde_json::Value>(&json).ok()? {
        serde_json::Value::Array(items) => {
            let access_token = items.first()?.as_str()?.to_string();
            let refresh_token = items.get(1).and_then(|v| v.as_str()).map(str::to_string);
            let expires_at = jwt_exp(&access_token);
            Some(StoredSession {
                access_token,
                refresh_token,
                expires_at,
                expires_in: None,
                token_type: Some("bearer".into()),
                user: None,
                extra: serde_json::Map::new(),
            })
        }
        value @ serde_json::Value::Object(_) => {
            let mut session: StoredSession = serde_json::from_value(value).ok()?;
            if session.access_token.is_empty() {
                return None;
            }
            if session.expires_at.is_none() {
                session.expires_at = jwt_exp(&session.access_token);
            }
            Some(session)
        }
        _ => None,
    }
}

/// Unknown expiry is treated as expired.
pub(crate) fn needs_refresh(session: &StoredSession, now: i64) -> bool {
    session
        .expires_at
        .map_or(true, |at| at - now <= EXPIRY_MARGIN_SECS)
}

/// Parse a token endpoint response into a session, filling `expires_at`.
pub(crate) fn parse_refresh_response(body: &str, now: i64) -> Result<StoredSession, SessionError> {
    let mut session: StoredSession =
        serde_json::from_str(body).map_err(|e| SessionError::Parse(format!("{e}: {body}")))?;
    if session.access_token.is_empty() {
        return Err(SessionError::Parse("empty access_token".into()));
    }
    if session.expires_at.is_none() {
        session.expires_at = session.expires_in.map(|secs| now + secs);
    }
    Ok(session)
}

fn unix_now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

// =============================================================================
// PROVIDER
// =============================================================================

pub struct SupabaseSessions {
    http: reqwest::Client,
    endpoint_url: String,
    access_key: String,
    cookie_name: String,
}

impl SupabaseSessions {
    /// Build a provider from typed gate config.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &GateConfig) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| SessionError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            endpoint_url: config.endpoint_url.clone(),
            access_key: config.access_key.clone(),
            cookie_name: format!("sb-{}-auth-token", config.project_ref()),
        })
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn chunk_name(&self, index: usize) -> String {
        format!("{}.{index}", self.cookie_name)
    }

    /// Raw session cookie value, joining chunks when the session was split.
    pub(crate) fn read_session_cookie(&self, jar: &CookieJar) -> Option<String> {
        if let Some(cookie) = jar.get(&self.cookie_name) {
            return Some(cookie.value().to_string());
        }

        let mut joined = String::new();
        let mut index = 0;
        while let Some(chunk) = jar.get(&self.chunk_name(index)) {
            joined.push_str(chunk.value());
            index += 1;
        }
        (index > 0).then_some(joined)
    }

    fn is_chunk_of_session(&self, name: &str) -> bool {
        name.strip_prefix(&self.cookie_name)
            .and_then(|rest| rest.strip_prefix('.'))
            .is_some_and(|idx| !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()))
    }

    fn build_cookie(name: String, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .same_site(SameSite::Lax)
            .max_age(time::Duration::days(COOKIE_MAX_AGE_DAYS))
            .build()
    }

    fn expired_cookie(name: String) -> Cookie<'static> {
        Cookie::build((name, String::new()))
            .path("/")
            .same_site(SameSite::Lax)
            .max_age(time::Duration::ZERO)
            .build()
    }

    /// Cookies that store `session`, expiring whatever layout the request used before.
    pub(crate) fn session_cookies(&self, session: &StoredSession, jar: &CookieJar) -> Result<Vec<Cookie<'static>>, SessionError> {
        let json = serde_json::to_string(session).map_err(|e| SessionError::Parse(e.to_string()))?;
        let encoded = format!("{BASE64_PREFIX}{}", URL_SAFE_NO_PAD.encode(json));

        let mut cookies = Vec::new();
        if encoded.len() <= MAX_CHUNK_SIZE {
            cookies.push(Self::build_cookie(self.cookie_name.clone(), encoded));
            for stale in jar.iter().filter(|c| self.is_chunk_of_session(c.name())) {
                cookies.push(Self::expired_cookie(stale.name().to_string()));
            }
            return Ok(cookies);
        }

        // base64url output is ASCII, so byte chunks are valid strings.
        let chunks: Vec<&str> = encoded
            .as_bytes()
            .chunks(MAX_CHUNK_SIZE)
            .filter_map(|c| std::str::from_utf8(c).ok())
            .collect();
        for (index, chunk) in chunks.iter().enumerate() {
            cookies.push(Self::build_cookie(self.chunk_name(index), (*chunk).to_string()));
        }
        if jar.get(&self.cookie_name).is_some() {
            cookies.push(Self::expired_cookie(self.cookie_name.clone()));
        }
        let mut index = chunks.len();
        while jar.get(&self.chunk_name(index)).is_some() {
            cookies.push(Self::expired_cookie(self.chunk_name(index)));
            index += 1;
        }
        Ok(cookies)
    }

    /// Cookies that remove every piece of the stored session.
    pub(crate) fn clear_cookies(&self, jar: &CookieJar) -> Vec<Cookie<'static>> {
        jar.iter()
            .filter(|c| c.name() == self.cookie_name || self.is_chunk_of_session(c.name()))
            .map(|c| Self::expired_cookie(c.name().to_string()))
            .collect()
    }

    /// Exchange a refresh token for a new session.
    ///
    /// Returns `Ok(None)` when the provider rejects the token (4xx).
    async fn refresh(&self, refresh_token: &str, now: i64) -> Result<Option<StoredSession>, SessionError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/token?grant_type=refresh_token", self.endpoint_url))
            .header("apikey", &self.access_key)
            .header("Authorization", format!("Bearer {}", self.access_key))
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| SessionError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SessionError::Request(e.to_string()))?;

        if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), "refresh token rejected");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SessionError::Response { status: status.as_u16(), body: text });
        }

        parse_refresh_response(&text, now).map(Some)
    }

    pub(crate) async fn lookup_at(&self, jar: &CookieJar, now: i64) -> Result<SessionLookup, SessionError> {
        let Some(raw) = self.read_session_cookie(jar) else {
            return Ok(SessionLookup::unauthenticated());
        };
        let Some(session) = decode_session(&raw) else {
            tracing::debug!(cookie = %self.cookie_name, "undecodable session cookie");
            return Ok(SessionLookup::unauthenticated());
        };

        if !needs_refresh(&session, now) {
            return Ok(SessionLookup::authenticated());
        }

        let Some(refresh_token) = session.refresh_token.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(SessionLookup::unauthenticated().with_cookies(self.clear_cookies(jar)));
        };

        match self.refresh(refresh_token, now).await? {
            Some(fresh) => {
                tracing::debug!("session refreshed");
                Ok(SessionLookup::authenticated().with_cookies(self.session_cookies(&fresh, jar)?))
            }
            None => Ok(SessionLookup::unauthenticated().with_cookies(self.clear_cookies(jar))),
        }
    }
}

#[async_trait::async_trait]
impl SessionProvider for SupabaseSessions {
    async fn lookup(&self, cookies: &CookieJar) -> Result<SessionLookup, SessionError> {
        self.lookup_at(cookies, unix_now()).await
    }
}

#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;
