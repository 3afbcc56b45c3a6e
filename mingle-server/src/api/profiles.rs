use axum::{
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use mingle_types::{
    ApiEnvelope, NewProfile, Page, Profile, ProfileChanges, ProfileWithStats,
};

use crate::{
    api::{optional_user, require_user, ApiError, ApiResult},
    db::repositories::{FollowRepository, ProfileRepository, SocialGraph},
    state::AppState,
};

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub search: Option<String>,
    pub interest: Option<String>,
    #[serde(default)]
    pub following_only: bool,
}

/// An uploaded avatar image from a multipart form
struct AvatarUpload {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// Fields accepted by the profile create/update forms
#[derive(Default)]
struct ProfileForm {
    name: Option<String>,
    bio: Option<String>,
    headline: Option<String>,
    interests_raw: Option<String>,
    avatar: Option<AvatarUpload>,
}

async fn read_profile_form(mut multipart: Multipart) -> Result<ProfileForm, ApiError> {
    let mut form = ProfileForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        let Some(name) = field.name().map(|n| n.to_string()) else {
            continue;
        };

        match name.as_str() {
            "name" => form.name = Some(read_text(field).await?),
            "bio" => form.bio = Some(read_text(field).await?),
            "headline" => form.headline = Some(read_text(field).await?),
            "interests" => form.interests_raw = Some(read_text(field).await?),
            "avatar" => {
                let filename = field.file_name().unwrap_or("avatar").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid avatar upload: {}", e)))?
                    .to_vec();
                // An empty file input still submits a zero-byte part
                if !bytes.is_empty() {
                    form.avatar = Some(AvatarUpload {
                        filename,
                        content_type,
                        bytes,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart field: {}", e)))
}

fn parse_interests(raw: Option<&str>) -> Result<Option<Vec<String>>, ApiError> {
    match raw {
        Some(raw) if !raw.is_empty() => {
            let interests: Vec<String> = serde_json::from_str(raw).map_err(|_| {
                ApiError::BadRequest("interests must be a JSON array of strings".to_string())
            })?;
            Ok(Some(interests))
        }
        _ => Ok(None),
    }
}

/// Attach social stats to each profile, relative to the viewer
fn enrich_with_stats(
    graph: &SocialGraph,
    profiles: Vec<Profile>,
    viewer: Option<&str>,
) -> ApiResult<Vec<ProfileWithStats>> {
    let mut enriched = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let stats = graph.stats_for(&profile.id, viewer)?;
        enriched.push(ProfileWithStats { profile, stats });
    }
    Ok(enriched)
}

/// GET /api/profiles - Paginated profile feed with search/interest filters
pub async fn list_profiles(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApiEnvelope<Page<ProfileWithStats>>>> {
    if query.page < 1 || query.limit < 1 {
        return Err(ApiError::BadRequest(
            "page must be at least 1 and limit must be positive".to_string(),
        ));
    }

    let viewer = optional_user(&state, &headers);
    let profile_repo = ProfileRepository::new(state.db.pool.clone());
    let graph = SocialGraph::new(state.db.pool.clone());

    let (profiles, total) = if query.following_only {
        // Following-scoped requests need a viewer; without one the result is
        // an empty page, not an error.
        let Some(viewer) = viewer.as_deref() else {
            return Ok(Json(ApiEnvelope::data(Page::empty(query.page, query.limit))));
        };

        let follow_repo = FollowRepository::new(state.db.pool.clone());
        let following = follow_repo.following_ids(viewer)?;
        if following.is_empty() {
            return Ok(Json(ApiEnvelope::data(Page::empty(query.page, query.limit))));
        }

        if let Some(search) = query.search.as_deref() {
            profile_repo.search_among(&following, search, query.page, query.limit)?
        } else if let Some(interest) = query.interest.as_deref() {
            profile_repo.by_interest_among(&following, interest, query.page, query.limit)?
        } else {
            profile_repo.list_among(&following, query.page, query.limit)?
        }
    } else if let Some(search) = query.search.as_deref() {
        profile_repo.search(search, query.page, query.limit)?
    } else if let Some(interest) = query.interest.as_deref() {
        profile_repo.by_interest(interest, query.page, query.limit)?
    } else {
        profile_repo.list(query.page, query.limit)?
    };

    let enriched = enrich_with_stats(&graph, profiles, viewer.as_deref())?;
    let page = Page::new(enriched, query.page, query.limit, total);

    Ok(Json(ApiEnvelope::data(page)))
}

/// POST /api/profiles - Create the caller's profile (multipart form)
pub async fn create_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<Json<ApiEnvelope<Profile>>> {
    let user_id = require_user(&state, &headers)?;
    let form = read_profile_form(multipart).await?;

    let (Some(name), Some(bio), Some(headline)) = (form.name, form.bio, form.headline) else {
        return Err(ApiError::BadRequest(
            "Name, bio, and headline are required".to_string(),
        ));
    };
    if name.is_empty() || bio.is_empty() || headline.is_empty() {
        return Err(ApiError::BadRequest(
            "Name, bio, and headline are required".to_string(),
        ));
    }
    let interests = parse_interests(form.interests_raw.as_deref())?.unwrap_or_default();

    let profile_repo = ProfileRepository::new(state.db.pool.clone());
    let mut profile = profile_repo
        .create(
            &user_id,
            &NewProfile {
                name,
                bio,
                headline,
                interests,
            },
        )?
        .ok_or_else(|| ApiError::Conflict("Profile already exists for this user".to_string()))?;

    let mut message = "Profile created successfully";
    if let Some(avatar) = form.avatar {
        match state
            .media
            .store_avatar(&user_id, &avatar.filename, &avatar.content_type, avatar.bytes)
            .await
        {
            Ok(url) => {
                if let Some(updated) = profile_repo.update_avatar(&user_id, Some(&url))? {
                    profile = updated;
                }
            }
            Err(err) => {
                tracing::warn!("Avatar upload failed for user {}: {}", user_id, err);
                message = "Profile created successfully, but avatar upload failed";
            }
        }
    }

    Ok(Json(ApiEnvelope::with_message(profile, message)))
}

/// GET /api/profiles/:user_id - Get a profile with stats relative to the caller
pub async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ApiEnvelope<ProfileWithStats>>> {
    let viewer = optional_user(&state, &headers);

    let profile_repo = ProfileRepository::new(state.db.pool.clone());
    let profile = profile_repo
        .get_by_user_id(&user_id)?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let graph = SocialGraph::new(state.db.pool.clone());
    let stats = graph.stats_for(&profile.id, viewer.as_deref())?;

    Ok(Json(ApiEnvelope::data(ProfileWithStats { profile, stats })))
}

/// PUT /api/profiles/:user_id - Partial update of the caller's own profile
pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<ApiEnvelope<Profile>>> {
    let caller = require_user(&state, &headers)?;
    if caller != user_id {
        return Err(ApiError::Forbidden(
            "You can only update your own profile".to_string(),
        ));
    }

    let form = read_profile_form(multipart).await?;
    let changes = ProfileChanges {
        name: form.name.filter(|s| !s.is_empty()),
        bio: form.bio.filter(|s| !s.is_empty()),
        headline: form.headline.filter(|s| !s.is_empty()),
        interests: parse_interests(form.interests_raw.as_deref())?,
    };

    let profile_repo = ProfileRepository::new(state.db.pool.clone());
    let mut profile = if changes.is_empty() {
        profile_repo.get_by_user_id(&user_id)?
    } else {
        profile_repo.update(&user_id, &changes)?
    }
    .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let mut message = "Profile updated successfully";
    if let Some(avatar) = form.avatar {
        // Replacing an avatar orphans the old asset unless it is removed now;
        // failure to remove it never fails the update.
        if let Some(old_url) = profile.avatar_url.as_deref() {
            if let Err(err) = state.media.remove_avatar(old_url).await {
                tracing::warn!("Could not delete old avatar for user {}: {}", user_id, err);
            }
        }

        match state
            .media
            .store_avatar(&user_id, &avatar.filename, &avatar.content_type, avatar.bytes)
            .await
        {
            Ok(url) => {
                if let Some(updated) = profile_repo.update_avatar(&user_id, Some(&url))? {
                    profile = updated;
                }
            }
            Err(err) => {
                tracing::warn!("Avatar upload failed for user {}: {}", user_id, err);
                message = "Profile updated successfully, but avatar upload failed";
            }
        }
    }

    Ok(Json(ApiEnvelope::with_message(profile, message)))
}

/// DELETE /api/profiles/:user_id - Remove the caller's own profile
pub async fn delete_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ApiEnvelope<()>>> {
    let caller = require_user(&state, &headers)?;
    if caller != user_id {
        return Err(ApiError::Forbidden(
            "You can only delete your own profile".to_string(),
        ));
    }

    let profile_repo = ProfileRepository::new(state.db.pool.clone());
    let profile = profile_repo
        .get_by_user_id(&user_id)?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    if let Some(avatar_url) = profile.avatar_url.as_deref() {
        if let Err(err) = state.media.remove_avatar(avatar_url).await {
            tracing::warn!("Could not delete avatar for user {}: {}", user_id, err);
        }
    }

    profile_repo.delete(&user_id)?;

    Ok(Json(ApiEnvelope::message("Profile deleted successfully")))
}
