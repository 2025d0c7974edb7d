//! Memo revision API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{respond, ApiResult};
use crate::models::{CreateMemoRequest, DeleteMemoResponse, Memo, MemoId, TopicId};
use crate::AppState;

/// Query string of `GET /api/topics/{topic_id}/memo`.
#[derive(Debug, Deserialize)]
pub struct MemoQuery {
    #[serde(default)]
    pub id: Option<String>,
}

/// GET /api/topics/:topic_id/memo?id= - One revision, the latest when `id` is absent.
pub async fn get_memo(
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
    Query(query): Query<MemoQuery>,
) -> ApiResult<Memo> {
    let topic_id = TopicId::new(topic_id);
    let id = query.id.filter(|id| !id.is_empty()).map(MemoId::new);
    respond("get_memo", state.backend.get_memo(&topic_id, id.as_ref()).await)
}

/// GET /api/topics/:topic_id/memos - Revision history, newest first.
pub async fn list_memos(
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
) -> ApiResult<Vec<Memo>> {
    let topic_id = TopicId::new(topic_id);
    respond("list_memos", state.backend.list_memos(&topic_id).await)
}

/// POST /api/topics/:topic_id/memos - Append a new revision.
pub async fn create_memo(
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
    Json(request): Json<CreateMemoRequest>,
) -> ApiResult<Memo> {
    let topic_id = TopicId::new(topic_id);
    let result = state.backend.create_memo(&topic_id, &request.content).await;
    if let Ok(memo) = &result {
        tracing::info!(topic_id = %topic_id, memo_id = %memo.id, "Memo created");
    }
    respond("create_memo", result)
}

/// DELETE /api/topics/:topic_id/memos/:id - Delete a revision.
pub async fn delete_memo(
    State(state): State<AppState>,
    Path((topic_id, id)): Path<(String, String)>,
) -> ApiResult<DeleteMemoResponse> {
    let topic_id = TopicId::new(topic_id);
    let id = MemoId::new(id);
    let result = state
        .backend
        .delete_memo(&topic_id, &id)
        .await
        .map(|remaining| DeleteMemoResponse { remaining });
    if let Ok(body) = &result {
        tracing::info!(topic_id = %topic_id, memo_id = %id, remaining = body.remaining, "Memo deleted");
    }
    respond("delete_memo", result)
}
