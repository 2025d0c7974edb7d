//! Topic API endpoints.

use axum::extract::{Query, State};

use super::{respond, ApiResult};
use crate::models::{Topic, TopicQuery};
use crate::AppState;

/// GET /api/topics?keyword= - List topics matching a keyword, newest first.
pub async fn list_topics(
    State(state): State<AppState>,
    Query(query): Query<TopicQuery>,
) -> ApiResult<Vec<Topic>> {
    respond("list_topics", state.backend.list_topics(&query.keyword).await)
}
