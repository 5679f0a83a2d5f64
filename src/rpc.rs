//! JSON procedure endpoints, one `POST /api/transcripts.<name>` per procedure.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::database::{ConversationKey, ConversationSummary, TranscriptSegment};
use crate::service::{
    ByIdInput, ByIndexInput, DeleteByIdsInput, DeleteConversationResult, RenameSpeakerByIdsInput,
    RenameSpeakerByMatchInput, ServiceError,
};
use crate::state::AppState;

/// HTTP status for a procedure failure
pub fn status_for(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ServiceError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            log::error!("Procedure failed: {}", self.0);
        } else {
            log::debug!("Procedure rejected: {}", self.0);
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Unwrap a JSON body, turning malformed input into a validation failure
fn input<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(value) = payload?;
    Ok(value)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/transcripts.getLatest", post(get_latest))
        .route("/api/transcripts.getAllConversations", post(get_all_conversations))
        .route("/api/transcripts.listConversations", post(list_conversations))
        .route("/api/transcripts.getById", post(get_by_id))
        .route("/api/transcripts.getByIndex", post(get_by_index))
        .route("/api/transcripts.update", post(update))
        .route("/api/transcripts.renameSpeakerByMatch", post(rename_speaker_by_match))
        .route("/api/transcripts.renameSpeakerByIds", post(rename_speaker_by_ids))
        .route("/api/transcripts.deleteByIds", post(delete_by_ids))
        .route("/api/transcripts.deleteConversation", post(delete_conversation))
}

fn ok<T: Serialize>(value: T) -> ApiResult<T> {
    Ok(Json(value))
}

async fn get_latest(State(state): State<AppState>) -> ApiResult<Option<Vec<TranscriptSegment>>> {
    ok(state.service().get_latest()?)
}

async fn get_all_conversations(State(state): State<AppState>) -> ApiResult<Vec<ConversationKey>> {
    ok(state.service().get_all_conversations()?)
}

async fn list_conversations(State(state): State<AppState>) -> ApiResult<Vec<ConversationSummary>> {
    ok(state.service().list_conversations()?)
}

async fn get_by_id(
    State(state): State<AppState>,
    payload: Result<Json<ByIdInput>, JsonRejection>,
) -> ApiResult<Option<TranscriptSegment>> {
    ok(state.service().get_by_id(input(payload)?)?)
}

async fn get_by_index(
    State(state): State<AppState>,
    payload: Result<Json<ByIndexInput>, JsonRejection>,
) -> ApiResult<Option<Vec<TranscriptSegment>>> {
    ok(state.service().get_by_index(input(payload)?)?)
}

async fn update(
    State(state): State<AppState>,
    payload: Result<Json<TranscriptSegment>, JsonRejection>,
) -> ApiResult<TranscriptSegment> {
    ok(state.service().update(input(payload)?)?)
}

async fn rename_speaker_by_match(
    State(state): State<AppState>,
    payload: Result<Json<RenameSpeakerByMatchInput>, JsonRejection>,
) -> ApiResult<Vec<TranscriptSegment>> {
    ok(state.service().rename_speaker_by_match(input(payload)?)?)
}

async fn rename_speaker_by_ids(
    State(state): State<AppState>,
    payload: Result<Json<RenameSpeakerByIdsInput>, JsonRejection>,
) -> ApiResult<Vec<TranscriptSegment>> {
    ok(state.service().rename_speaker_by_ids(input(payload)?)?)
}

async fn delete_by_ids(
    State(state): State<AppState>,
    payload: Result<Json<DeleteByIdsInput>, JsonRejection>,
) -> ApiResult<Vec<TranscriptSegment>> {
    ok(state.service().delete_by_ids(input(payload)?)?)
}

async fn delete_conversation(
    State(state): State<AppState>,
    payload: Result<Json<ConversationKey>, JsonRejection>,
) -> ApiResult<DeleteConversationResult> {
    ok(state.service().delete_conversation(input(payload)?)?)
}
