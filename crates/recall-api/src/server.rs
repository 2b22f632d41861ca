//! Axum server and routes.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use recall_engine::{ContextResolver, SemanticIndex};
use recall_types::{
    Envelope, EngineError, GraphContext, MemoryLink, MemoryNote, NewLink, NewNote, SearchOptions,
    SearchOutcome,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub struct AppState {
    pub index: Arc<SemanticIndex>,
    pub resolver: Arc<ContextResolver>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/memory/add", post(handle_add))
        .route("/memory/search", post(handle_search))
        .route("/memory/list", get(handle_list))
        .route("/memory/delete", post(handle_delete))
        .route("/graph/link", post(handle_link))
        .route("/graph/context/:id", get(handle_context))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn failure<T>(e: EngineError) -> Json<Envelope<T>> {
    let code = match e {
        EngineError::NotFound(_) => 404,
        EngineError::Validation(_) => 400,
        EngineError::Adapter(_) => 500,
    };
    Json(Envelope::error(code, e.to_string()))
}

async fn handle_add(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewNote>,
) -> Json<Envelope<MemoryNote>> {
    match state.index.add(req).await {
        Ok(note) => {
            tracing::info!(note_id = %note.id, "note added");
            Json(Envelope::ok(note))
        }
        Err(e) => failure(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(flatten)]
    pub options: SearchOptions,
}

async fn handle_search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<Envelope<SearchOutcome>> {
    match state.index.search(&req.query, &req.options).await {
        Ok(outcome) => Json(Envelope::ok(outcome)),
        Err(e) => failure(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub capsule_id: Option<String>,
}

async fn handle_list(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListQuery>,
) -> Json<Envelope<Vec<MemoryNote>>> {
    let Some(capsule_id) = q.capsule_id else {
        return Json(Envelope::error(400, "capsule_id is required"));
    };
    match state.index.list(&capsule_id).await {
        Ok(notes) => Json(Envelope::ok(notes)),
        Err(e) => failure(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub id: String,
}

async fn handle_delete(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteRequest>,
) -> Json<Envelope<serde_json::Value>> {
    match state.index.remove(&req.id).await {
        Ok(()) => Json(Envelope::ok(serde_json::json!({ "id": req.id, "deleted": true }))),
        Err(e) => failure(e),
    }
}

async fn handle_link(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewLink>,
) -> Json<Envelope<MemoryLink>> {
    match state.resolver.link(req).await {
        Ok(link) => Json(Envelope::ok(link)),
        Err(e) => failure(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ContextQuery {
    #[serde(default = "default_depth")]
    pub depth: usize,
}

fn default_depth() -> usize {
    2
}

async fn handle_context(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(q): Query<ContextQuery>,
) -> Json<Envelope<GraphContext>> {
    match state.resolver.get_context(&id, q.depth).await {
        Ok(ctx) => Json(Envelope::ok(ctx)),
        Err(e) => failure(e),
    }
}

async fn handle_health() -> &'static str {
    "ok"
}
