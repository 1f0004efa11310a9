use super::*;
use crate::state::test_helpers::{MockSessions, Outcome, test_app_state};
use axum::body::Body;
use axum::http::{Request, header};
use tower::ServiceExt;

fn missing_pages() -> PathBuf {
    PathBuf::from("/nonexistent/route-gate-pages")
}

#[tokio::test]
async fn healthz_is_ungated() {
    let (state, mock) = test_app_state(MockSessions::new(Outcome::Fails));
    let response = app(state, missing_pages())
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn protected_page_redirects_before_static_lookup() {
    let (state, _) = test_app_state(MockSessions::new(Outcome::Unauthenticated));
    let response = app(state, missing_pages())
        .oneshot(Request::get("/settings/billing").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/login?next=%2Fsettings%2Fbilling")
    );
}

#[tokio::test]
async fn authenticated_page_reaches_static_files() {
    let (state, mock) = test_app_state(MockSessions::new(Outcome::Authenticated));
    let response = app(state, missing_pages())
        .oneshot(Request::get("/dashboard").body(Body::empty()).unwrap())
        .await
        .unwrap();
    // Passed through to `ServeDir`, which has nothing to serve.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn ungated_page_skips_lookup() {
    let (state, mock) = test_app_state(MockSessions::new(Outcome::Unauthenticated));
    let response = app(state, missing_pages())
        .oneshot(Request::get("/about.html").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(mock.call_count(), 0);
}

#[test]
fn static_dir_defaults_to_public() {
    if std::env::var("STATIC_DIR").is_err() {
        assert_eq!(static_dir(), PathBuf::from("public"));
    }
}
