//! Axum host for Howl rooms: WebSocket transport gateway, room registry,
//! per-room session actors, and a small REST surface for the lobby listing,
//! replay export and operational status.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod registry;
pub mod replay;
pub mod session;
pub mod state;
pub mod view;
pub mod ws;

use std::time::Duration;

use axum::Router;
use axum::middleware;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use config::ServerConfig;
use state::AppState;

/// Build the Axum router and application state from a config.
pub fn build_app(config: ServerConfig) -> (Router<()>, AppState) {
    let state = AppState::new(config);

    // Status sits behind optional bearer auth; lobby and replay are public.
    let status_routes = Router::new()
        .route("/status", axum::routing::get(api::get_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    let api_routes = Router::new()
        .route("/rooms", axum::routing::get(api::get_rooms))
        .route(
            "/rooms/{room_id}/replay",
            axum::routing::get(api::get_replay),
        )
        .merge(status_routes)
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(10)));

    let app = Router::new()
        .route("/healthz", axum::routing::get(health::healthz))
        .route("/ws", axum::routing::get(ws::ws_handler))
        .nest("/api/v1", api_routes)
        .with_state(state.clone());

    (app, state)
}

/// Background task that prunes finished rooms and shuts down rooms that have
/// had no connected human for longer than the idle timeout. One room's death
/// never touches another: each lives in its own task.
pub fn spawn_idle_sweeper(state: AppState) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(state.config.rooms.idle_check_interval_secs);
        let idle_timeout = state.config.rooms.idle_timeout_secs;
        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut registry = state.registry.write().await;
                registry.prune_closed()
            };
            if removed > 0 {
                tracing::info!(removed, "Pruned finished rooms");
            }

            let handles = {
                let registry = state.registry.read().await;
                registry.handles()
            };
            for handle in handles {
                let Some(stats) = handle.stats().await else {
                    continue;
                };
                if stats.online_users == 0 && stats.idle_secs >= idle_timeout {
                    tracing::info!(room = %handle.room_id, idle_secs = stats.idle_secs, "Closing idle room");
                    handle.send(session::SessionCommand::Shutdown);
                    let mut registry = state.registry.write().await;
                    registry.remove(handle.room_id);
                }
            }
        }
    });
}

/// Middleware wrapper that injects the API auth config into request
/// extensions for the bearer auth middleware.
async fn bearer_auth_layer(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut request: axum::extract::Request,
    next: middleware::Next,
) -> Result<axum::response::Response, axum::http::StatusCode> {
    request.extensions_mut().insert(state.api_auth.clone());
    auth::bearer_auth_middleware(request.headers().clone(), request, next).await
}
