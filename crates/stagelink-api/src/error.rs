//! API errors and their HTTP mapping
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use stagelink_core::ChainError;
use stagelink_render::RenderError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    #[error("session limit of {0} reached")]
    SessionLimit(usize),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::SessionLimit(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Chain(err) => match err {
                ChainError::NoNextStage { .. }
                | ChainError::NoPreviousStage
                | ChainError::StageNotReady { .. } => StatusCode::CONFLICT,
                ChainError::InvalidTransition { .. } | ChainError::Param(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ChainError::UnknownStage(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Render(RenderError::UnknownFormat(_)) => StatusCode::BAD_REQUEST,
            ApiError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
