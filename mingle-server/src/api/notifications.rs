use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use mingle_types::{ApiEnvelope, MarkReadRequest, Notification};

use crate::{
    api::{require_user, ApiResult},
    db::repositories::NotificationRepository,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct NotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
}

/// GET /api/notifications - Up to 50 most recent notifications for the caller
pub async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NotificationsQuery>,
) -> ApiResult<Json<ApiEnvelope<Vec<Notification>>>> {
    let user_id = require_user(&state, &headers)?;

    let repo = NotificationRepository::new(state.db.pool.clone());
    let notifications = repo.list_for(&user_id, query.unread_only)?;

    Ok(Json(ApiEnvelope::data(notifications)))
}

/// PUT /api/notifications - Mark notifications as read
pub async fn mark_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<MarkReadRequest>,
) -> ApiResult<Json<ApiEnvelope<serde_json::Value>>> {
    let user_id = require_user(&state, &headers)?;

    let repo = NotificationRepository::new(state.db.pool.clone());
    if payload.mark_all_as_read {
        repo.mark_all_read(&user_id)?;
    } else if let Some(ids) = payload.notification_ids {
        repo.mark_read(&user_id, &ids)?;
    }

    Ok(Json(ApiEnvelope::data(serde_json::json!({ "success": true }))))
}
