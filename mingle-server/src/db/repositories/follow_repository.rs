use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use mingle_types::Follow;

use crate::db::DbPool;

pub struct FollowRepository {
    pool: DbPool,
}

impl FollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a follow edge
    ///
    /// Returns `None` when the edge already exists; the UNIQUE constraint on
    /// (follower_id, following_id) makes this safe under concurrent requests.
    pub fn create(&self, follower_id: &str, following_id: &str) -> Result<Option<Follow>> {
        let conn = self.pool.get()?;
        let follow = Follow {
            id: Uuid::new_v4(),
            follower_id: follower_id.to_string(),
            following_id: following_id.to_string(),
            created_at: Utc::now(),
        };

        let rows = conn
            .execute(
                "INSERT OR IGNORE INTO follows (id, follower_id, following_id, created_at)
                 VALUES (?, ?, ?, ?)",
                (
                    follow.id.to_string(),
                    &follow.follower_id,
                    &follow.following_id,
                    follow.created_at.to_rfc3339(),
                ),
            )
            .context("Failed to create follow")?;

        Ok((rows > 0).then_some(follow))
    }

    /// Delete a follow edge, returning the number of rows removed
    pub fn delete(&self, follower_id: &str, following_id: &str) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM follows WHERE follower_id = ? AND following_id = ?",
                (follower_id, following_id),
            )
            .context("Failed to delete follow")?;
        Ok(rows)
    }

    /// Check if one user follows another
    pub fn is_following(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND following_id = ?",
            (follower_id, following_id),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get the set of user ids this user follows, newest edge first
    pub fn following_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT following_id FROM follows WHERE follower_id = ? ORDER BY created_at DESC",
        )?;

        let ids = stmt
            .query_map([user_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ids)
    }

    /// Number of users following this user
    pub fn follower_count(&self, user_id: &str) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE following_id = ?",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Number of users this user follows
    pub fn following_count(&self, user_id: &str) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ?",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
