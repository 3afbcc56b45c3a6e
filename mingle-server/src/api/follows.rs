use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use mingle_types::{ApiEnvelope, FollowRequest, Notification};

use crate::{
    api::{actor_display, require_user, ApiError, ApiResult},
    db::repositories::{FollowRepository, NotificationRepository},
    state::AppState,
};

/// POST /api/follows - Follow a user
pub async fn create_follow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<FollowRequest>,
) -> ApiResult<Json<ApiEnvelope<serde_json::Value>>> {
    let actor = require_user(&state, &headers)?;

    if payload.following_id.is_empty() {
        return Err(ApiError::BadRequest("following_id is required".to_string()));
    }
    if actor == payload.following_id {
        return Err(ApiError::BadRequest("Cannot follow yourself".to_string()));
    }

    let follow_repo = FollowRepository::new(state.db.pool.clone());
    follow_repo
        .create(&actor, &payload.following_id)?
        .ok_or_else(|| ApiError::Conflict("Already following this user".to_string()))?;

    // The edge is committed; the notification is a best-effort side effect.
    let (actor_name, actor_avatar) = actor_display(&state, &actor).await;
    let notification = Notification::follow(
        payload.following_id.as_str(),
        actor.as_str(),
        actor_name,
        actor_avatar,
    );
    let notification_repo = NotificationRepository::new(state.db.pool.clone());
    if let Err(err) = notification_repo.create(&notification) {
        tracing::warn!(
            "Failed to write follow notification for {}: {}",
            payload.following_id,
            err
        );
    }

    Ok(Json(ApiEnvelope::with_message(
        serde_json::json!({ "success": true }),
        "Successfully followed user",
    )))
}

#[derive(Debug, Deserialize)]
pub struct UnfollowQuery {
    pub following_id: Option<String>,
}

/// DELETE /api/follows?following_id= - Unfollow a user
pub async fn delete_follow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UnfollowQuery>,
) -> ApiResult<Json<ApiEnvelope<serde_json::Value>>> {
    let actor = require_user(&state, &headers)?;

    let following_id = query
        .following_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("following_id is required".to_string()))?;

    // Removing an edge that never existed still succeeds.
    let follow_repo = FollowRepository::new(state.db.pool.clone());
    follow_repo.delete(&actor, &following_id)?;

    let notification_repo = NotificationRepository::new(state.db.pool.clone());
    if let Err(err) = notification_repo.remove_follow_notifications(&following_id, &actor) {
        tracing::warn!(
            "Failed to remove follow notifications for {}: {}",
            following_id,
            err
        );
    }

    Ok(Json(ApiEnvelope::with_message(
        serde_json::json!({ "success": true }),
        "Successfully unfollowed user",
    )))
}
