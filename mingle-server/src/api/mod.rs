pub mod error;
pub mod follows;
pub mod likes;
pub mod notifications;
pub mod profiles;

pub use error::{ApiError, ApiResult};

use axum::{
    http::HeaderMap,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Extract the authenticated user id from the session token header
pub(crate) fn require_user(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let token = headers
        .get("X-Session-Token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    state
        .authenticated_user_id(token)
        .ok_or_else(|| ApiError::Unauthorized("Invalid session token".to_string()))
}

/// Extract an optional user id from the session token header (for public endpoints)
pub(crate) fn optional_user(state: &AppState, headers: &HeaderMap) -> Option<String> {
    let token = headers.get("X-Session-Token")?.to_str().ok()?;
    state.authenticated_user_id(token)
}

/// Resolve an actor's display name and avatar for a notification payload
///
/// Prefers the actor's profile row; falls back to the identity provider, and
/// finally to the literal "Someone" so a notification can always be written.
pub(crate) async fn actor_display(state: &AppState, user_id: &str) -> (String, Option<String>) {
    let profile = match crate::db::repositories::ProfileRepository::new(state.db.pool.clone())
        .get_by_user_id(user_id)
    {
        Ok(profile) => profile,
        Err(err) => {
            tracing::warn!("Failed to load profile for actor {}: {}", user_id, err);
            None
        }
    };

    if let Some(profile) = profile {
        return (profile.name, profile.avatar_url);
    }

    match state.identity.get_user(user_id).await {
        Ok(user) => (user.display_name(), user.avatar_url),
        Err(err) => {
            tracing::warn!("Identity lookup failed for actor {}: {}", user_id, err);
            ("Someone".to_string(), None)
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Profile routes
        .route(
            "/api/profiles",
            get(profiles::list_profiles).post(profiles::create_profile),
        )
        .route(
            "/api/profiles/:user_id",
            get(profiles::get_profile)
                .put(profiles::update_profile)
                .delete(profiles::delete_profile),
        )
        // Relationship routes
        .route(
            "/api/follows",
            post(follows::create_follow).delete(follows::delete_follow),
        )
        .route(
            "/api/likes",
            post(likes::create_like).delete(likes::delete_like),
        )
        // Notification routes
        .route(
            "/api/notifications",
            get(notifications::list_notifications).put(notifications::mark_read),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
