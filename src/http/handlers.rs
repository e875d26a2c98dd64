//! Note endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::response::HttpError;
use crate::http::server::AppState;
use crate::notes::{NoteId, NoteView, NotesError};

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadNoteRequest {
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn upload_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Result<Json<UploadNoteRequest>, JsonRejection>,
) -> Result<StatusCode, HttpError> {
    let Json(request) = request?;
    let identity = state.auth.resolve_identity(&headers).await?;
    state.notes.upload_note(identity.as_ref(), request.body).await?;
    Ok(StatusCode::CREATED)
}

pub async fn delete_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    note_id: Result<Path<NoteId>, PathRejection>,
) -> Result<StatusCode, HttpError> {
    let Path(note_id) = note_id?;
    let identity = state.auth.resolve_identity(&headers).await?;
    state.notes.delete_note(identity.as_ref(), note_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_notes(State(state): State<AppState>) -> Result<Json<Vec<NoteView>>, NotesError> {
    Ok(Json(state.notes.get_notes().await?))
}
