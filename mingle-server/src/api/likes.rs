use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use mingle_types::{ApiEnvelope, LikeRequest, Notification};

use crate::{
    api::{actor_display, require_user, ApiError, ApiResult},
    db::repositories::{LikeRepository, NotificationRepository, ProfileRepository},
    state::AppState,
};

/// POST /api/likes - Like a profile
pub async fn create_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LikeRequest>,
) -> ApiResult<Json<ApiEnvelope<serde_json::Value>>> {
    let actor = require_user(&state, &headers)?;

    let profile_repo = ProfileRepository::new(state.db.pool.clone());
    let profile = profile_repo
        .get_by_id(&payload.profile_id)?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    if profile.user_id == actor {
        return Err(ApiError::BadRequest(
            "Cannot like your own profile".to_string(),
        ));
    }

    let like_repo = LikeRepository::new(state.db.pool.clone());
    like_repo
        .create(&actor, &payload.profile_id)?
        .ok_or_else(|| ApiError::Conflict("Already liked this profile".to_string()))?;

    // The edge is committed; the notification is a best-effort side effect.
    let (actor_name, actor_avatar) = actor_display(&state, &actor).await;
    let notification = Notification::like(
        profile.user_id.as_str(),
        actor.as_str(),
        actor_name,
        actor_avatar,
        profile.id,
        profile.name.as_str(),
    );
    let notification_repo = NotificationRepository::new(state.db.pool.clone());
    if let Err(err) = notification_repo.create(&notification) {
        tracing::warn!(
            "Failed to write like notification for {}: {}",
            profile.user_id,
            err
        );
    }

    Ok(Json(ApiEnvelope::with_message(
        serde_json::json!({ "success": true }),
        "Successfully liked profile",
    )))
}

#[derive(Debug, Deserialize)]
pub struct UnlikeQuery {
    pub profile_id: Option<Uuid>,
}

/// DELETE /api/likes?profile_id= - Unlike a profile
pub async fn delete_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UnlikeQuery>,
) -> ApiResult<Json<ApiEnvelope<serde_json::Value>>> {
    let actor = require_user(&state, &headers)?;

    let profile_id = query
        .profile_id
        .ok_or_else(|| ApiError::BadRequest("profile_id is required".to_string()))?;

    // Removing an edge that never existed still succeeds.
    let like_repo = LikeRepository::new(state.db.pool.clone());
    like_repo.delete(&actor, &profile_id)?;

    let notification_repo = NotificationRepository::new(state.db.pool.clone());
    if let Err(err) = notification_repo.remove_like_notifications(&actor, &profile_id) {
        tracing::warn!(
            "Failed to remove like notifications for profile {}: {}",
            profile_id,
            err
        );
    }

    Ok(Json(ApiEnvelope::with_message(
        serde_json::json!({ "success": true }),
        "Successfully unliked profile",
    )))
}
