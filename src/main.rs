mod config;
mod gate;
mod routes;
mod services;
mod state;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let config = config::GateConfig::from_env().expect("auth provider config");
    let sessions = services::supabase::SupabaseSessions::new(&config).expect("session provider init failed");
    tracing::info!(endpoint = %config.endpoint_url, cookie = sessions.cookie_name(), "session provider initialized");

    let state = state::AppState::new(Arc::new(sessions));
    let pages = routes::static_dir();
    tracing::info!(pages = %pages.display(), "serving pages");

    let app = routes::app(state, pages);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "route-gate listening");
    axum::serve(listener, app).await.expect("server failed");
}
