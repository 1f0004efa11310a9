//! Request gate: keeps signed-out visitors off app pages and signed-in
//! visitors off the login page.
//!
//! DESIGN
//! ======
//! The decision is a pure function of (path, session status) so it can be
//! tested without a provider. The middleware around it does the I/O: one
//! session lookup per gated request, then either a redirect or the inner
//! service's response, with any cookies the lookup produced attached.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use url::form_urlencoded;

use crate::services::session::{self, SessionStatus};
use crate::state::AppState;

pub const ROOT_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
/// Query parameter carrying the page to return to after login.
pub const NEXT_PARAM: &str = "next";

/// Application sections that require a session.
pub const PROTECTED_SECTIONS: [&str; 5] = ["/dashboard", "/contacts", "/deals", "/tasks", "/settings"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Protected,
    Login,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Send the browser to this location (path plus query).
    Redirect(String),
    PassThrough,
}

/// Whether the gate runs for this path at all.
///
/// Covers `/`, `/login`, and each protected section with its sub-paths.
/// Everything else skips the session lookup entirely.
#[must_use]
pub fn is_gated(path: &str) -> bool {
    path == ROOT_PATH
        || path == LOGIN_PATH
        || PROTECTED_SECTIONS.iter().any(|section| {
            path.strip_prefix(section)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
}

#[must_use]
pub fn classify(path: &str) -> PathClass {
    if path == LOGIN_PATH {
        PathClass::Login
    } else if path == ROOT_PATH || PROTECTED_SECTIONS.iter().any(|section| path.starts_with(section)) {
        PathClass::Protected
    } else {
        PathClass::Other
    }
}

/// `/login?next=<path>`, with the path form-urlencoded.
#[must_use]
pub fn login_redirect_target(path: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(NEXT_PARAM, path)
        .finish();
    format!("{LOGIN_PATH}?{query}")
}

#[must_use]
pub fn decide(status: SessionStatus, class: PathClass, path: &str) -> Decision {
    match (status, class) {
        (SessionStatus::Unauthenticated, PathClass::Protected) => Decision::Redirect(login_redirect_target(path)),
        (SessionStatus::Authenticated, PathClass::Login) => Decision::Redirect(DASHBOARD_PATH.to_string()),
        _ => Decision::PassThrough,
    }
}

/// Axum middleware applying the gate to every request it wraps.
pub async fn guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if !is_gated(&path) {
        return next.run(req).await;
    }

    let request_cookies = CookieJar::from_headers(req.headers());
    let lookup = session::lookup_or_unauthenticated(state.sessions.as_ref(), &request_cookies, &path).await;

    let mut jar = CookieJar::new();
    for cookie in lookup.set_cookies {
        jar = jar.add(cookie);
    }

    match decide(lookup.status, classify(&path), &path) {
        Decision::Redirect(location) => {
            tracing::debug!(%path, %location, "gate redirect");
            (jar, Redirect::temporary(&location)).into_response()
        }
        Decision::PassThrough => (jar, next.run(req).await).into_response(),
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
