use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::NotificationKind;

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

/// A user's profile. `user_id` is the opaque identifier issued by the
/// external identity provider; `id` is the row id owned by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub bio: String,
    pub headline: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

/// Social stats computed at read time, relative to an optional viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialStats {
    pub follower_count: i64,
    pub following_count: i64,
    pub like_count: i64,
    pub is_following: bool,
    pub is_liked: bool,
}

/// A profile enriched with its social stats, as returned by read endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileWithStats {
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(flatten)]
    pub stats: SocialStats,
}

/// A follow edge between two identity-provider user ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub id: Uuid,
    pub follower_id: String,
    pub following_id: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// A like edge from a user to a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub user_id: String,
    pub profile_id: Uuid,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    /// Recipient of the notification.
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub actor_user_id: String,
    pub actor_name: String,
    #[serde(default)]
    pub actor_avatar_url: Option<String>,
    #[serde(default)]
    pub profile_id: Option<Uuid>,
    #[serde(default)]
    pub profile_name: Option<String>,
    pub read: bool,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn follow(
        recipient: impl Into<String>,
        actor_user_id: impl Into<String>,
        actor_name: impl Into<String>,
        actor_avatar_url: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: recipient.into(),
            kind: NotificationKind::Follow,
            actor_user_id: actor_user_id.into(),
            actor_name: actor_name.into(),
            actor_avatar_url,
            profile_id: None,
            profile_name: None,
            read: false,
            created_at: Utc::now(),
        }
    }

    pub fn like(
        recipient: impl Into<String>,
        actor_user_id: impl Into<String>,
        actor_name: impl Into<String>,
        actor_avatar_url: Option<String>,
        profile_id: Uuid,
        profile_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: recipient.into(),
            kind: NotificationKind::Like,
            actor_user_id: actor_user_id.into(),
            actor_name: actor_name.into(),
            actor_avatar_url,
            profile_id: Some(profile_id),
            profile_name: Some(profile_name.into()),
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// One page of an ordered result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, page: i64, limit: i64, total: i64) -> Self {
        Self {
            data,
            page,
            limit,
            total,
            has_more: page * limit < total,
        }
    }

    pub fn empty(page: i64, limit: i64) -> Self {
        Self::new(Vec::new(), page, limit, 0)
    }
}

/// Uniform response envelope used by every API endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}

// Request types for API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
    pub name: String,
    pub bio: String,
    pub headline: String,
    #[serde(default)]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub headline: Option<String>,
    pub interests: Option<Vec<String>>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.bio.is_none()
            && self.headline.is_none()
            && self.interests.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowRequest {
    pub following_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeRequest {
    pub profile_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default, rename = "notificationIds")]
    pub notification_ids: Option<Vec<Uuid>>,
    #[serde(default, rename = "markAllAsRead")]
    pub mark_all_as_read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_has_more() {
        let page = Page::new(vec![1, 2, 3], 1, 3, 7);
        assert!(page.has_more);

        let last = Page::new(vec![7], 3, 3, 7);
        assert!(!last.has_more);

        // An exactly full final page is still final.
        let exact = Page::new(vec![4, 5, 6], 2, 3, 6);
        assert!(!exact.has_more);

        let empty: Page<i32> = Page::empty(1, 10);
        assert_eq!(empty.total, 0);
        assert!(!empty.has_more);
    }

    #[test]
    fn test_envelope_serialization_skips_absent_fields() {
        let ok = ApiEnvelope::data(5);
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json, serde_json::json!({ "data": 5 }));

        let err = ApiEnvelope::<()>::error("nope");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "nope" }));
    }

    #[test]
    fn test_notification_wire_format_uses_type_field() {
        let n = Notification::follow("user-b", "user-a", "Alice", None);
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "follow");
        assert_eq!(json["read"], false);
        assert!(json["profile_id"].is_null());
    }

    #[test]
    fn test_profile_with_stats_flattens() {
        let profile = Profile {
            id: Uuid::new_v4(),
            user_id: "user-a".to_string(),
            name: "Alice".to_string(),
            bio: "hi".to_string(),
            headline: "builder".to_string(),
            avatar_url: None,
            interests: vec!["rust".to_string()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let enriched = ProfileWithStats {
            profile,
            stats: SocialStats {
                follower_count: 2,
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&enriched).unwrap();
        assert_eq!(json["name"], "Alice");
        assert_eq!(json["follower_count"], 2);
        assert_eq!(json["is_following"], false);
    }
}
