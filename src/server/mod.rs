//! JSON HTTP front end. Handlers only translate requests; all catalog logic
//! lives in the loader and query engine.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::catalog::Book;
use crate::loader::{CatalogLoader, StatsReport};
use crate::query::{MatchMode, QueryEngine};

pub struct AppState {
    loader: Arc<CatalogLoader>,
    engine: QueryEngine,
}

impl AppState {
    pub fn new(loader: Arc<CatalogLoader>) -> Self {
        let engine = QueryEngine::new(Arc::clone(&loader));
        Self { loader, engine }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

/// Body of `POST /api/books/search`. Null keyword entries are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordRequest {
    #[serde(default)]
    pub keywords: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub match_mode: MatchMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadResponse {
    pub count: usize,
    pub last_loaded: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/books", get(search))
        .route("/api/books/search", post(search_keywords))
        .route("/api/books/reload", get(reload))
        .route("/api/books/health", get(health))
        .route("/api/books/stats", get(stats))
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Book>> {
    Json(state.engine.search(params.query.as_deref()).await)
}

async fn search_keywords(
    State(state): State<Arc<AppState>>,
    Json(request): Json<KeywordRequest>,
) -> Json<Vec<Book>> {
    let keywords: Option<Vec<String>> = request
        .keywords
        .map(|list| list.into_iter().flatten().collect());
    Json(
        state
            .engine
            .search_keywords(keywords.as_deref(), request.match_mode)
            .await,
    )
}

async fn reload(State(state): State<Arc<AppState>>) -> Json<ReloadResponse> {
    let snapshot = state.loader.reload().await;
    Json(ReloadResponse {
        count: snapshot.books.len(),
        last_loaded: snapshot.acquired_at,
    })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsReport> {
    Json(state.loader.stats().report())
}
