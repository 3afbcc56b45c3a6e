use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::params_from_iter;
use rusqlite::types::ToSql;
use rusqlite::Row;
use uuid::Uuid;

use mingle_types::{Notification, NotificationKind};

use crate::db::DbPool;

/// Notification surfaces show at most this many rows per fetch.
const LIST_CAP: i64 = 50;

fn map_notification_row(row: &Row) -> rusqlite::Result<Notification> {
    let kind: String = row.get(2)?;
    let profile_id: Option<String> = row.get(6)?;
    Ok(Notification {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
        user_id: row.get(1)?,
        kind: NotificationKind::parse(&kind).unwrap(),
        actor_user_id: row.get(3)?,
        actor_name: row.get(4)?,
        actor_avatar_url: row.get(5)?,
        profile_id: profile_id.and_then(|s| Uuid::parse_str(&s).ok()),
        profile_name: row.get(7)?,
        read: row.get::<_, i32>(8)? == 1,
        created_at: row.get::<_, String>(9)?.parse::<DateTime<Utc>>().unwrap(),
    })
}

pub struct NotificationRepository {
    pool: DbPool,
}

impl NotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append a notification
    pub fn create(&self, notification: &Notification) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO notifications (id, user_id, kind, actor_user_id, actor_name, actor_avatar_url, profile_id, profile_name, read, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                notification.id.to_string(),
                &notification.user_id,
                notification.kind.as_str(),
                &notification.actor_user_id,
                &notification.actor_name,
                &notification.actor_avatar_url,
                notification.profile_id.map(|id| id.to_string()),
                &notification.profile_name,
                if notification.read { 1 } else { 0 },
                notification.created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create notification")?;
        Ok(())
    }

    /// Get a recipient's notifications, newest first, capped at 50 rows
    pub fn list_for(&self, user_id: &str, unread_only: bool) -> Result<Vec<Notification>> {
        let conn = self.pool.get()?;
        let query = if unread_only {
            "SELECT id, user_id, kind, actor_user_id, actor_name, actor_avatar_url, profile_id, profile_name, read, created_at
             FROM notifications
             WHERE user_id = ? AND read = 0
             ORDER BY created_at DESC
             LIMIT ?"
        } else {
            "SELECT id, user_id, kind, actor_user_id, actor_name, actor_avatar_url, profile_id, profile_name, read, created_at
             FROM notifications
             WHERE user_id = ?
             ORDER BY created_at DESC
             LIMIT ?"
        };

        let mut stmt = conn.prepare(query)?;
        let notifications = stmt
            .query_map((user_id, LIST_CAP), map_notification_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list notifications")?;

        Ok(notifications)
    }

    /// Mark specific notifications as read for a recipient
    pub fn mark_read(&self, user_id: &str, ids: &[Uuid]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let conn = self.pool.get()?;
        let placeholders = vec!["?"; ids.len()].join(", ");
        let query = format!(
            "UPDATE notifications SET read = 1 WHERE user_id = ? AND id IN ({placeholders})"
        );

        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(user_id.to_string())];
        params.extend(
            ids.iter()
                .map(|id| Box::new(id.to_string()) as Box<dyn ToSql>),
        );

        let rows = conn
            .execute(&query, params_from_iter(params.iter()))
            .context("Failed to mark notifications as read")?;
        Ok(rows)
    }

    /// Mark every unread notification as read for a recipient
    pub fn mark_all_read(&self, user_id: &str) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE notifications SET read = 1 WHERE user_id = ? AND read = 0",
                [user_id],
            )
            .context("Failed to mark notifications as read")?;
        Ok(rows)
    }

    /// Remove follow notifications from an actor to a recipient
    ///
    /// Matches on (recipient, actor, kind) so every stale row is swept, not
    /// just the one written by the edge being removed.
    pub fn remove_follow_notifications(&self, recipient: &str, actor_user_id: &str) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM notifications WHERE user_id = ? AND actor_user_id = ? AND kind = 'follow'",
                (recipient, actor_user_id),
            )
            .context("Failed to remove follow notifications")?;
        Ok(rows)
    }

    /// Remove like notifications from an actor about a profile
    pub fn remove_like_notifications(&self, actor_user_id: &str, profile_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM notifications WHERE actor_user_id = ? AND profile_id = ? AND kind = 'like'",
                (actor_user_id, profile_id.to_string()),
            )
            .context("Failed to remove like notifications")?;
        Ok(rows)
    }
}
