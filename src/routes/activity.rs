use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};

use crate::{
    dto::activity_dto::{
        ActivityEntryResponse, ActivityFeedQuery, ActivityFeedResponse, ClearActivityResponse,
    },
    error::Result,
    services::activity_service::{DEFAULT_FEED_SIZE, DEFAULT_FETCH_LIMIT},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/dashboard/activity",
    params(
        ("limit" = Option<i64>, Query, description = "Raw events considered, newest first"),
        ("size" = Option<usize>, Query, description = "Feed entries returned after deduplication")
    ),
    responses(
        (status = 200, description = "Recent activity feed", body = Json<ActivityFeedResponse>)
    )
)]
#[axum::debug_handler]
pub async fn get_activity_feed(
    State(state): State<AppState>,
    Query(query): Query<ActivityFeedQuery>,
) -> Result<impl IntoResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_FETCH_LIMIT).clamp(1, 500);
    let size = query.size.unwrap_or(DEFAULT_FEED_SIZE).clamp(1, 100);
    let entries = state
        .activity_service
        .build_feed(limit, size, state.directory.as_ref())
        .await?;
    let items: Vec<ActivityEntryResponse> = entries.into_iter().map(Into::into).collect();
    Ok(Json(ActivityFeedResponse { items }))
}

#[utoipa::path(
    delete,
    path = "/api/admin/activity",
    responses(
        (status = 200, description = "All audit events deleted", body = Json<ClearActivityResponse>)
    )
)]
#[axum::debug_handler]
pub async fn clear_activity(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let deleted = state.audit_service.clear_all().await?;
    Ok(Json(ClearActivityResponse { deleted }))
}
