//! Single-page web UI

use std::num::NonZeroU16;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tracing::{error, info};

use crate::backend::Connector;
use crate::config::ModelConfig;
use crate::constants::{SESSION_IDLE_MINUTES, SESSION_STATE_KEY, SESSION_SWEEP_SECONDS};
use crate::error::PostsmithError;
use crate::session::SessionState;

mod actions;
mod csrf;
mod download;
mod flash;
mod middleware;
mod prelude;
mod store;
mod views;

use actions::{
    create_handler, edit_handler, images_handler, logout_handler, regenerate_handler,
    reset_handler, verify_handler,
};
use download::download_handler;
use middleware::require_credential;
use store::SessionMemory;
use views::index_handler;

#[derive(Clone)]
pub(crate) struct AppState {
    connector: Arc<dyn Connector>,
    models: Arc<ModelConfig>,
}

impl AppState {
    fn new(connector: Arc<dyn Connector>, models: ModelConfig) -> Self {
        Self {
            connector,
            models: Arc::new(models),
        }
    }
}

pub(crate) async fn load_state(session: &Session) -> Result<SessionState, PostsmithError> {
    Ok(session
        .get::<SessionState>(SESSION_STATE_KEY)
        .await?
        .unwrap_or_default())
}

pub(crate) async fn save_state(
    session: &Session,
    state: &SessionState,
) -> Result<(), PostsmithError> {
    session.insert(SESSION_STATE_KEY, state).await?;
    Ok(())
}

fn create_router() -> Router<AppState> {
    let needs_key = Router::new()
        .route("/create", post(create_handler))
        .route("/regenerate", post(regenerate_handler))
        .route("/edit", post(edit_handler))
        .route("/images", post(images_handler))
        .route("/images/regenerate", post(images_handler))
        .route("/images/{index}", get(download_handler))
        .route_layer(axum::middleware::from_fn(require_credential));

    Router::new()
        .route("/", get(index_handler))
        .route("/static/styles.css", get(styles_handler))
        .route("/verify", post(verify_handler))
        .route("/logout", post(logout_handler))
        .route("/reset", post(reset_handler))
        .merge(needs_key)
}

fn build_app(state: AppState, sessions: SessionMemory) -> Router {
    let session_layer = SessionManagerLayer::new(sessions)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            SESSION_IDLE_MINUTES,
        )));

    create_router()
        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}

async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

/// Runs the web UI until the listener fails.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    connector: Arc<dyn Connector>,
    models: ModelConfig,
) -> Result<(), anyhow::Error> {
    let sessions = SessionMemory::default();
    let sweeper = sessions.spawn_sweeper(Duration::from_secs(SESSION_SWEEP_SECONDS));
    let app = build_app(AppState::new(connector, models), sessions);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app).await {
        error!("Server error: {}", err);
    }
    sweeper.abort();
    Ok(())
}
