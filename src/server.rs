//! HTTP surface
//!
//! - `GET <channel list path>`: live followed channels page
//! - `GET <cast path>/{channel}/{address}`: dispatch a cast
//! - `GET <static path>/*`: files from the static directory

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::HelixClient;
use crate::render::{self, PageRoutes};
use crate::stream::CastDispatcher;

/// Route prefixes and the static directory
#[derive(Debug, Clone)]
pub struct Routes {
    pub channel_list_path: String,
    pub cast_path: String,
    pub static_path: String,
    pub static_dir: PathBuf,
}

#[derive(Clone)]
pub struct AppState {
    pub user_id: Arc<str>,
    pub helix: Arc<HelixClient>,
    pub dispatcher: Arc<CastDispatcher>,
    pub routes: Arc<Routes>,
}

#[derive(Debug, Serialize)]
struct CastResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn channel_list(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let streamers = state.helix.live_followed(&state.user_id).await.map_err(|e| {
        tracing::error!(error = %e, "failed to build channel list");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let routes = PageRoutes {
        cast_path: &state.routes.cast_path,
        static_path: &state.routes.static_path,
    };
    Ok(Html(render::channel_list_page(
        &streamers,
        state.dispatcher.targets(),
        &routes,
    )))
}

async fn cast(
    State(state): State<AppState>,
    Path((channel, address)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.dispatcher.dispatch(&channel, &address) {
        Ok(ticket) => {
            tracing::info!(id = %ticket.id, device = %ticket.target.name, "cast accepted");
            (
                StatusCode::OK,
                Json(CastResponse {
                    success: true,
                    error: None,
                }),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(CastResponse {
                success: false,
                error: Some(e.to_string()),
            }),
        ),
    }
}

pub fn router(state: AppState) -> Router {
    let routes = state.routes.clone();
    let cast_route = format!("{}/{{channel}}/{{address}}", routes.cast_path.trim_end_matches('/'));

    Router::new()
        .route(&routes.channel_list_path, get(channel_list))
        .route(&cast_route, get(cast))
        .nest_service(
            routes.static_path.trim_end_matches('/'),
            ServeDir::new(&routes.static_dir),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn run_server(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, channels = %state.routes.channel_list_path, "listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
