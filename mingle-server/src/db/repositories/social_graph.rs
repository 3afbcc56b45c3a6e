use anyhow::{Context, Result};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use mingle_types::SocialStats;

use crate::db::DbPool;

/// Computes a profile's social stats: edge counts plus the flags that are
/// relative to the viewing user.
///
/// Runs once per profile per request; list endpoints pay one aggregation per
/// returned row, which is acceptable at this system's scale.
pub struct SocialGraph {
    pool: DbPool,
}

impl SocialGraph {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Aggregate stats for a profile, relative to an optional viewer
    ///
    /// A profile that cannot be resolved to an owner yields all-zero stats
    /// rather than an error.
    pub fn stats_for(&self, profile_id: &Uuid, viewer: Option<&str>) -> Result<SocialStats> {
        let conn = self.pool.get()?;

        let owner: Option<String> = conn
            .query_row(
                "SELECT user_id FROM profiles WHERE id = ?",
                [profile_id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to resolve profile owner")?;

        let Some(owner) = owner else {
            return Ok(SocialStats::default());
        };

        let follower_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE following_id = ?",
            [&owner],
            |row| row.get(0),
        )?;
        let following_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ?",
            [&owner],
            |row| row.get(0),
        )?;
        let like_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE profile_id = ?",
            [profile_id.to_string()],
            |row| row.get(0),
        )?;

        let (is_following, is_liked) = match viewer {
            Some(viewer) => {
                let following: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND following_id = ?",
                    (viewer, &owner),
                    |row| row.get(0),
                )?;
                let liked: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM likes WHERE user_id = ? AND profile_id = ?",
                    (viewer, profile_id.to_string()),
                    |row| row.get(0),
                )?;
                (following > 0, liked > 0)
            }
            None => (false, false),
        };

        Ok(SocialStats {
            follower_count,
            following_count,
            like_count,
            is_following,
            is_liked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{FollowRepository, LikeRepository, ProfileRepository};
    use crate::db::Database;
    use mingle_types::NewProfile;

    fn profile_input(name: &str) -> NewProfile {
        NewProfile {
            name: name.to_string(),
            bio: "-".to_string(),
            headline: "-".to_string(),
            interests: vec![],
        }
    }

    fn setup() -> (Database, SocialGraph) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize schema");
        let graph = SocialGraph::new(db.pool.clone());
        (db, graph)
    }

    #[test]
    fn test_unknown_profile_yields_default_stats() {
        let (_db, graph) = setup();
        let stats = graph.stats_for(&Uuid::new_v4(), Some("user-a")).unwrap();
        assert_eq!(stats, SocialStats::default());
    }

    #[test]
    fn test_counts_and_viewer_flags() {
        let (db, graph) = setup();
        let profiles = ProfileRepository::new(db.pool.clone());
        let follows = FollowRepository::new(db.pool.clone());
        let likes = LikeRepository::new(db.pool.clone());

        let bea = profiles.create("user-b", &profile_input("Bea")).unwrap().unwrap();
        follows.create("user-a", "user-b").unwrap();
        follows.create("user-c", "user-b").unwrap();
        follows.create("user-b", "user-a").unwrap();
        likes.create("user-a", &bea.id).unwrap();

        let stats = graph.stats_for(&bea.id, Some("user-a")).unwrap();
        assert_eq!(stats.follower_count, 2);
        assert_eq!(stats.following_count, 1);
        assert_eq!(stats.like_count, 1);
        assert!(stats.is_following);
        assert!(stats.is_liked);

        // A different viewer sees the same counts but different flags.
        let stats = graph.stats_for(&bea.id, Some("user-c")).unwrap();
        assert_eq!(stats.follower_count, 2);
        assert!(stats.is_following);
        assert!(!stats.is_liked);
    }

    #[test]
    fn test_no_viewer_means_no_flags() {
        let (db, graph) = setup();
        let profiles = ProfileRepository::new(db.pool.clone());
        let follows = FollowRepository::new(db.pool.clone());

        let bea = profiles.create("user-b", &profile_input("Bea")).unwrap().unwrap();
        follows.create("user-a", "user-b").unwrap();

        let stats = graph.stats_for(&bea.id, None).unwrap();
        assert_eq!(stats.follower_count, 1);
        assert!(!stats.is_following);
        assert!(!stats.is_liked);
    }

    #[test]
    fn test_counts_track_edge_lifecycle() {
        let (db, graph) = setup();
        let profiles = ProfileRepository::new(db.pool.clone());
        let follows = FollowRepository::new(db.pool.clone());

        let bea = profiles.create("user-b", &profile_input("Bea")).unwrap().unwrap();
        assert_eq!(graph.stats_for(&bea.id, None).unwrap().follower_count, 0);

        follows.create("user-a", "user-b").unwrap();
        assert_eq!(graph.stats_for(&bea.id, None).unwrap().follower_count, 1);

        follows.delete("user-a", "user-b").unwrap();
        assert_eq!(graph.stats_for(&bea.id, None).unwrap().follower_count, 0);
    }
}
