use super::*;

struct FixedProvider(fn() -> Result<SessionLookup, SessionError>);

#[async_trait::async_trait]
impl SessionProvider for FixedProvider {
    async fn lookup(&self, _cookies: &CookieJar) -> Result<SessionLookup, SessionError> {
        (self.0)()
    }
}

#[test]
fn status_is_authenticated() {
    assert!(SessionStatus::Authenticated.is_authenticated());
    assert!(!SessionStatus::Unauthenticated.is_authenticated());
}

#[test]
fn with_cookies_keeps_status() {
    let lookup = SessionLookup::authenticated().with_cookies(vec![Cookie::new("a", "1")]);
    assert_eq!(lookup.status, SessionStatus::Authenticated);
    assert_eq!(lookup.set_cookies.len(), 1);
}

#[test]
fn session_error_display() {
    let err = SessionError::Response { status: 503, body: "down".into() };
    assert!(err.to_string().contains("503"));
    let err = SessionError::Request("timeout".into());
    assert!(err.to_string().contains("timeout"));
}

#[tokio::test]
async fn lookup_error_collapses_to_unauthenticated() {
    let provider = FixedProvider(|| Err(SessionError::Request("connection refused".into())));
    let lookup = lookup_or_unauthenticated(&provider, &CookieJar::new(), "/dashboard").await;
    assert_eq!(lookup.status, SessionStatus::Unauthenticated);
    assert!(lookup.set_cookies.is_empty());
}

#[tokio::test]
async fn lookup_success_is_passed_through() {
    let provider =
        FixedProvider(|| Ok(SessionLookup::authenticated().with_cookies(vec![Cookie::new("sb-x-auth-token", "v")])));
    let lookup = lookup_or_unauthenticated(&provider, &CookieJar::new(), "/").await;
    assert_eq!(lookup.status, SessionStatus::Authenticated);
    assert_eq!(lookup.set_cookies[0].name(), "sb-x-auth-token");
}
