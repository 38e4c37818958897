//! API Handlers
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use stagelink_core::STAGELINK_VERSION;
use stagelink_render::Format;
use stagelink_stages::demo_chain;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::sessions::Session;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ParamUpdate {
    pub value: Value,
}

async fn session(state: &AppState, id: Uuid) -> Result<Arc<Session>, ApiError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or(ApiError::SessionNotFound(id))
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": STAGELINK_VERSION })),
    )
}

pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut chain = demo_chain(state.chain_config.as_ref().clone())?;
    let view = chain.render()?;
    let session = state.sessions.create(chain).await?;
    tracing::info!(session = %session.id, "session created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": session.id,
            "created_at": session.created_at,
            "view": view,
        })),
    ))
}

pub async fn list_sessions(State(state): State<AppState>) -> Json<Value> {
    let ids = state.sessions.ids().await;
    Json(json!({ "count": ids.len(), "sessions": ids }))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<Value>, ApiError> {
    let session = session(&state, id).await?;
    let view = session.lock().await.render()?;

    match query.format {
        None => Ok(Json(json!({
            "id": id,
            "created_at": session.created_at,
            "view": view,
        }))),
        Some(format) => {
            let format: Format = format.parse()?;
            let output = state.renderer.render(&view, format)?;
            Ok(Json(json!({
                "id": id,
                "format": format,
                "mime": format.mime(),
                "output": output,
            })))
        }
    }
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(id).await {
        tracing::info!(session = %id, "session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

pub async fn advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let session = session(&state, id).await?;
    let mut chain = session.lock().await;
    let transition = chain.advance()?;
    let view = chain.render()?;
    Ok(Json(json!({ "transition": transition, "view": view })))
}

pub async fn retreat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let session = session(&state, id).await?;
    let mut chain = session.lock().await;
    let index = chain.retreat()?;
    let view = chain.render()?;
    Ok(Json(json!({ "current_index": index, "view": view })))
}

pub async fn set_param(
    State(state): State<AppState>,
    Path((id, name)): Path<(Uuid, String)>,
    Json(update): Json<ParamUpdate>,
) -> Result<Json<Value>, ApiError> {
    let session = session(&state, id).await?;
    let mut chain = session.lock().await;
    let transition = chain.set_param(&name, update.value)?;
    let view = chain.render()?;
    Ok(Json(json!({ "transition": transition, "view": view })))
}
