//! `/records/{kind}` handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;

use super::auth::AuthUser;
use super::AppState;
use crate::models::{BackendId, RecordKind, RecordPayload, StoredRecord};

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "bad_request",
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: "not_found",
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("storage error: {}", e);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "storage",
            message: "storage error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
pub struct CreatedResponse {
    id: BackendId,
}

fn parse_kind(kind: &str) -> Result<RecordKind, ApiError> {
    kind.parse().map_err(ApiError::not_found)
}

pub async fn list(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<StoredRecord>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let records = state.records.fetch_all(kind).await?;
    Ok(Json(records))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(kind): Path<String>,
    Json(payload): Json<RecordPayload>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let kind = parse_kind(&kind)?;
    if payload.data.kind() != kind {
        return Err(ApiError::bad_request(format!(
            "payload is a {}, not a {}",
            payload.data.kind(),
            kind
        )));
    }
    payload
        .data
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let id = state.records.insert(&payload).await?;
    tracing::info!("{} created {} {}", user.user_id, kind, id);
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    let id = BackendId(id);

    if state.records.remove(kind, &id).await? {
        tracing::info!("{} deleted {} {}", user.user_id, kind, id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("no {} with id {}", kind, id)))
    }
}
