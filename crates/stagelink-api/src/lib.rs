//! Stagelink API /v1: chain sessions over HTTP
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod sessions;

use anyhow::Context;
use axum::{
    routing::{get, post, put},
    Router,
};
use stagelink_core::ChainConfig;
use stagelink_render::ViewRenderer;
use stagelink_stages::demo_chain;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::ApiError;
pub use sessions::{Session, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub chain_config: Arc<ChainConfig>,
    pub renderer: Arc<ViewRenderer>,
}

impl AppState {
    pub fn new(chain_config: ChainConfig, renderer: ViewRenderer) -> Self {
        Self::with_sessions(chain_config, renderer, SessionStore::new())
    }

    pub fn with_sessions(
        chain_config: ChainConfig,
        renderer: ViewRenderer,
        sessions: SessionStore,
    ) -> Self {
        Self {
            sessions: Arc::new(sessions),
            chain_config: Arc::new(chain_config),
            renderer: Arc::new(renderer),
        }
    }

    /// Load chain configuration and templates named by `config`, and check
    /// that the demo chain builds with them.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let chain_config = match &config.chain_config {
            Some(path) => ChainConfig::load(path)
                .with_context(|| format!("loading chain config from {}", path))?,
            None => ChainConfig::titled("Stagelink demo"),
        };
        let renderer = match &config.templates {
            Some(path) => ViewRenderer::load(path)
                .with_context(|| format!("loading templates from {}", path))?,
            None => ViewRenderer::builtin()?,
        };

        demo_chain(chain_config.clone()).context("demo chain rejected configuration")?;
        Ok(Self::with_sessions(
            chain_config,
            renderer,
            SessionStore::with_limit(config.max_sessions),
        ))
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handlers::health))
        .route(
            "/v1/sessions",
            post(handlers::create_session).get(handlers::list_sessions),
        )
        .route(
            "/v1/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/v1/sessions/:id/advance", post(handlers::advance))
        .route("/v1/sessions/:id/retreat", post(handlers::retreat))
        .route("/v1/sessions/:id/params/:name", put(handlers::set_param))
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    tracing::info!("Stagelink API listening on {}", config.addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
