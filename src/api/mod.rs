//! HTTP API module for Sessionkeep
//!
//! Thin HTTP surface over the session store: the cookie middleware plus a
//! handful of routes for reading and writing the current session.

pub mod cookie;
pub mod routes;

use crate::error::Result;
use crate::session::SessionStore;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
}

/// Start the HTTP API server
pub async fn serve(addr: SocketAddr, store: Arc<SessionStore>) -> Result<()> {
    let app = create_router(AppState { store });

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| crate::error::CoreError::Api(e.to_string()))?;

    Ok(())
}

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Routes that run with a resolved session (created on demand)
    let session_routes = Router::new()
        .route("/session", get(routes::get_session))
        .route(
            "/session/values/:key",
            get(routes::get_value)
                .put(routes::set_value)
                .delete(routes::delete_value),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            cookie::session_middleware,
        ));

    // Logout must not mint a session just to destroy it
    let api_routes = session_routes.route("/logout", post(routes::logout));

    Router::new()
        .route("/health", get(routes::health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
