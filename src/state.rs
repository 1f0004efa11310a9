//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into the gate middleware via the `State` extractor.
//! It holds nothing mutable: only the session provider, whose HTTP client
//! owns any connection pooling.

use std::sync::Arc;

use crate::services::session::SessionProvider;

/// Clone is required by Axum; the provider is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionProvider>,
}

impl AppState {
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionProvider>) -> Self {
        Self { sessions }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::services::session::{SessionError, SessionLookup};
    use axum_extra::extract::cookie::{Cookie, CookieJar};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Canned provider outcome.
    #[derive(Clone)]
    pub enum Outcome {
        Authenticated,
        Unauthenticated,
        Fails,
    }

    /// Provider that returns a fixed outcome and counts calls.
    pub struct MockSessions {
        pub outcome: Outcome,
        pub set_cookies: Vec<Cookie<'static>>,
        pub calls: AtomicUsize,
    }

    impl MockSessions {
        #[must_use]
        pub fn new(outcome: Outcome) -> Self {
            Self { outcome, set_cookies: Vec::new(), calls: AtomicUsize::new(0) }
        }

        #[must_use]
        pub fn with_cookies(mut self, cookies: Vec<Cookie<'static>>) -> Self {
            self.set_cookies = cookies;
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl SessionProvider for MockSessions {
        async fn lookup(&self, _cookies: &CookieJar) -> Result<SessionLookup, SessionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let lookup = match self.outcome {
                Outcome::Authenticated => SessionLookup::authenticated(),
                Outcome::Unauthenticated => SessionLookup::unauthenticated(),
                Outcome::Fails => return Err(SessionError::Request("connection refused".into())),
            };
            Ok(lookup.with_cookies(self.set_cookies.clone()))
        }
    }

    /// Create an `AppState` around a mock provider, returning the mock for call assertions.
    #[must_use]
    pub fn test_app_state(mock: MockSessions) -> (AppState, Arc<MockSessions>) {
        let mock = Arc::new(mock);
        (AppState::new(mock.clone()), mock)
    }
}
