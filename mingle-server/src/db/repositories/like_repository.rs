use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use mingle_types::Like;

use crate::db::DbPool;

pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a like edge
    ///
    /// Returns `None` when the user already liked this profile; duplicates
    /// are rejected by the UNIQUE constraint on (user_id, profile_id).
    pub fn create(&self, user_id: &str, profile_id: &Uuid) -> Result<Option<Like>> {
        let conn = self.pool.get()?;
        let like = Like {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            profile_id: *profile_id,
            created_at: Utc::now(),
        };

        let rows = conn
            .execute(
                "INSERT OR IGNORE INTO likes (id, user_id, profile_id, created_at)
                 VALUES (?, ?, ?, ?)",
                (
                    like.id.to_string(),
                    &like.user_id,
                    like.profile_id.to_string(),
                    like.created_at.to_rfc3339(),
                ),
            )
            .context("Failed to create like")?;

        Ok((rows > 0).then_some(like))
    }

    /// Delete a like edge, returning the number of rows removed
    pub fn delete(&self, user_id: &str, profile_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM likes WHERE user_id = ? AND profile_id = ?",
                (user_id, profile_id.to_string()),
            )
            .context("Failed to delete like")?;
        Ok(rows)
    }

    /// Check if a user liked a profile
    pub fn is_liked(&self, user_id: &str, profile_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE user_id = ? AND profile_id = ?",
            (user_id, profile_id.to_string()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Number of likes on a profile
    pub fn count_for_profile(&self, profile_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE profile_id = ?",
            [profile_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::db::repositories::ProfileRepository;
    use mingle_types::NewProfile;

    fn setup() -> (Database, LikeRepository, Uuid) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize schema");

        let profiles = ProfileRepository::new(db.pool.clone());
        let profile = profiles
            .create(
                "user-b",
                &NewProfile {
                    name: "Bea".to_string(),
                    bio: "-".to_string(),
                    headline: "-".to_string(),
                    interests: vec![],
                },
            )
            .unwrap()
            .unwrap();

        let repo = LikeRepository::new(db.pool.clone());
        (db, repo, profile.id)
    }

    #[test]
    fn test_create_and_count() {
        let (_db, repo, profile_id) = setup();

        assert_eq!(repo.count_for_profile(&profile_id).unwrap(), 0);
        let like = repo.create("user-a", &profile_id).unwrap().unwrap();
        assert_eq!(like.user_id, "user-a");
        assert_eq!(repo.count_for_profile(&profile_id).unwrap(), 1);
        assert!(repo.is_liked("user-a", &profile_id).unwrap());
        assert!(!repo.is_liked("user-c", &profile_id).unwrap());
    }

    #[test]
    fn test_duplicate_like_reports_none() {
        let (_db, repo, profile_id) = setup();

        assert!(repo.create("user-a", &profile_id).unwrap().is_some());
        assert!(repo.create("user-a", &profile_id).unwrap().is_none());
        assert_eq!(repo.count_for_profile(&profile_id).unwrap(), 1);
    }

    #[test]
    fn test_delete() {
        let (_db, repo, profile_id) = setup();

        repo.create("user-a", &profile_id).unwrap();
        assert_eq!(repo.delete("user-a", &profile_id).unwrap(), 1);
        assert_eq!(repo.count_for_profile(&profile_id).unwrap(), 0);
        assert_eq!(repo.delete("user-a", &profile_id).unwrap(), 0);
    }

    #[test]
    fn test_profile_delete_cascades_to_likes() {
        let (db, repo, profile_id) = setup();

        repo.create("user-a", &profile_id).unwrap();
        let profiles = ProfileRepository::new(db.pool.clone());
        assert_eq!(profiles.delete("user-b").unwrap(), 1);
        assert_eq!(repo.count_for_profile(&profile_id).unwrap(), 0);
    }
}
