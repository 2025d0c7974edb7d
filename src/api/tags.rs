//! Tag API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{respond, ApiResult};
use crate::errors::AppError;
use crate::models::{AddTagRequest, TopicId};
use crate::AppState;

/// GET /api/topics/:topic_id/tags - Tags of a topic.
pub async fn list_tags(
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
) -> ApiResult<Vec<String>> {
    let topic_id = TopicId::new(topic_id);
    respond("list_tags", state.backend.list_tags(&topic_id).await)
}

/// POST /api/topics/:topic_id/tags - Add a tag.
pub async fn add_tag(
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
    Json(request): Json<AddTagRequest>,
) -> ApiResult<()> {
    // The client validates first; this only guards the table against junk.
    if request.tag.trim().is_empty() {
        return respond(
            "add_tag",
            Err(AppError::Validation("Tag name is required".to_string())),
        );
    }

    let topic_id = TopicId::new(topic_id);
    respond("add_tag", state.backend.add_tag(&topic_id, &request.tag).await)
}

/// DELETE /api/topics/:topic_id/tags/:tag - Remove a tag.
pub async fn remove_tag(
    State(state): State<AppState>,
    Path((topic_id, tag)): Path<(String, String)>,
) -> ApiResult<()> {
    let topic_id = TopicId::new(topic_id);
    respond("remove_tag", state.backend.remove_tag(&topic_id, &tag).await)
}
