use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params_from_iter, OptionalExtension, Row};
use uuid::Uuid;

use mingle_types::{NewProfile, Profile, ProfileChanges};

use crate::db::DbPool;

const PROFILE_COLUMNS: &str =
    "id, user_id, name, bio, headline, avatar_url, interests, created_at, updated_at";

fn map_profile_row(row: &Row) -> rusqlite::Result<Profile> {
    let interests_json: String = row.get(6)?;
    Ok(Profile {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
        user_id: row.get(1)?,
        name: row.get(2)?,
        bio: row.get(3)?,
        headline: row.get(4)?,
        avatar_url: row.get(5)?,
        interests: serde_json::from_str(&interests_json).unwrap_or_default(),
        created_at: row.get::<_, String>(7)?.parse::<DateTime<Utc>>().unwrap(),
        updated_at: row.get::<_, String>(8)?.parse::<DateTime<Utc>>().unwrap(),
    })
}

pub struct ProfileRepository {
    pool: DbPool,
}

impl ProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a profile for a user
    ///
    /// Returns `None` when the user already has a profile (one per user id).
    pub fn create(&self, user_id: &str, input: &NewProfile) -> Result<Option<Profile>> {
        let conn = self.pool.get()?;
        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: input.name.clone(),
            bio: input.bio.clone(),
            headline: input.headline.clone(),
            avatar_url: None,
            interests: input.interests.clone(),
            created_at: now,
            updated_at: now,
        };

        let rows = conn
            .execute(
                "INSERT OR IGNORE INTO profiles (id, user_id, name, bio, headline, avatar_url, interests, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    profile.id.to_string(),
                    &profile.user_id,
                    &profile.name,
                    &profile.bio,
                    &profile.headline,
                    &profile.avatar_url,
                    serde_json::to_string(&profile.interests)?,
                    profile.created_at.to_rfc3339(),
                    profile.updated_at.to_rfc3339(),
                ),
            )
            .context("Failed to create profile")?;

        Ok((rows > 0).then_some(profile))
    }

    /// Get a profile by its owner's user id
    pub fn get_by_user_id(&self, user_id: &str) -> Result<Option<Profile>> {
        let conn = self.pool.get()?;
        let query = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?");
        let profile = conn
            .query_row(&query, [user_id], map_profile_row)
            .optional()?;
        Ok(profile)
    }

    /// Get a profile by its row id
    pub fn get_by_id(&self, profile_id: &Uuid) -> Result<Option<Profile>> {
        let conn = self.pool.get()?;
        let query = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?");
        let profile = conn
            .query_row(&query, [profile_id.to_string()], map_profile_row)
            .optional()?;
        Ok(profile)
    }

    /// Apply a partial update to a user's profile
    ///
    /// Returns the updated row, or `None` when the user has no profile.
    pub fn update(&self, user_id: &str, changes: &ProfileChanges) -> Result<Option<Profile>> {
        let Some(mut profile) = self.get_by_user_id(user_id)? else {
            return Ok(None);
        };

        if let Some(name) = &changes.name {
            profile.name = name.clone();
        }
        if let Some(bio) = &changes.bio {
            profile.bio = bio.clone();
        }
        if let Some(headline) = &changes.headline {
            profile.headline = headline.clone();
        }
        if let Some(interests) = &changes.interests {
            profile.interests = interests.clone();
        }
        profile.updated_at = Utc::now();

        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE profiles SET name = ?, bio = ?, headline = ?, interests = ?, updated_at = ?
             WHERE user_id = ?",
            (
                &profile.name,
                &profile.bio,
                &profile.headline,
                serde_json::to_string(&profile.interests)?,
                profile.updated_at.to_rfc3339(),
                user_id,
            ),
        )
        .context("Failed to update profile")?;

        Ok(Some(profile))
    }

    /// Set or clear a profile's avatar URL
    pub fn update_avatar(&self, user_id: &str, avatar_url: Option<&str>) -> Result<Option<Profile>> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE profiles SET avatar_url = ?, updated_at = ? WHERE user_id = ?",
            (avatar_url, Utc::now().to_rfc3339(), user_id),
        )
        .context("Failed to update profile avatar")?;
        self.get_by_user_id(user_id)
    }

    /// Delete a user's profile, returning the number of rows removed
    pub fn delete(&self, user_id: &str) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute("DELETE FROM profiles WHERE user_id = ?", [user_id])
            .context("Failed to delete profile")?;
        Ok(rows)
    }

    /// List all profiles, newest first
    pub fn list(&self, page: i64, limit: i64) -> Result<(Vec<Profile>, i64)> {
        self.page_query("", Vec::new(), page, limit)
    }

    /// Search profiles by name, bio, or headline (case-insensitive substring)
    pub fn search(&self, term: &str, page: i64, limit: i64) -> Result<(Vec<Profile>, i64)> {
        let (clause, params) = search_clause(term);
        self.page_query(&format!("WHERE {clause}"), params, page, limit)
    }

    /// List profiles whose interests contain the given tag (exact match)
    pub fn by_interest(&self, interest: &str, page: i64, limit: i64) -> Result<(Vec<Profile>, i64)> {
        let (clause, params) = interest_clause(interest);
        self.page_query(&format!("WHERE {clause}"), params, page, limit)
    }

    /// List profiles owned by any of the given user ids, newest first
    pub fn list_among(
        &self,
        user_ids: &[String],
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Profile>, i64)> {
        if user_ids.is_empty() {
            return Ok((Vec::new(), 0));
        }
        let (clause, params) = among_clause(user_ids);
        self.page_query(&format!("WHERE {clause}"), params, page, limit)
    }

    /// Search within profiles owned by the given user ids
    pub fn search_among(
        &self,
        user_ids: &[String],
        term: &str,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Profile>, i64)> {
        if user_ids.is_empty() {
            return Ok((Vec::new(), 0));
        }
        let (among, mut params) = among_clause(user_ids);
        let (search, search_params) = search_clause(term);
        params.extend(search_params);
        self.page_query(&format!("WHERE {among} AND {search}"), params, page, limit)
    }

    /// Interest filter within profiles owned by the given user ids
    pub fn by_interest_among(
        &self,
        user_ids: &[String],
        interest: &str,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Profile>, i64)> {
        if user_ids.is_empty() {
            return Ok((Vec::new(), 0));
        }
        let (among, mut params) = among_clause(user_ids);
        let (filter, filter_params) = interest_clause(interest);
        params.extend(filter_params);
        self.page_query(&format!("WHERE {among} AND {filter}"), params, page, limit)
    }

    /// Run a paginated query: total count plus one page of rows, newest first
    fn page_query(
        &self,
        where_sql: &str,
        params: Vec<Box<dyn ToSql>>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Profile>, i64)> {
        let conn = self.pool.get()?;

        let count_sql = format!("SELECT COUNT(*) FROM profiles {where_sql}");
        let total: i64 = conn
            .query_row(&count_sql, params_from_iter(params.iter()), |row| {
                row.get(0)
            })
            .context("Failed to count profiles")?;

        let rows_sql = format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles {where_sql}
             ORDER BY created_at DESC
             LIMIT ? OFFSET ?"
        );
        let mut stmt = conn.prepare(&rows_sql)?;

        let mut all_params = params;
        all_params.push(Box::new(limit));
        all_params.push(Box::new((page - 1) * limit));

        let profiles = stmt
            .query_map(params_from_iter(all_params.iter()), map_profile_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list profiles")?;

        Ok((profiles, total))
    }
}

fn search_clause(term: &str) -> (String, Vec<Box<dyn ToSql>>) {
    let pattern = format!("%{term}%");
    (
        "(name LIKE ? OR bio LIKE ? OR headline LIKE ?)".to_string(),
        vec![
            Box::new(pattern.clone()) as Box<dyn ToSql>,
            Box::new(pattern.clone()),
            Box::new(pattern),
        ],
    )
}

fn interest_clause(interest: &str) -> (String, Vec<Box<dyn ToSql>>) {
    (
        "EXISTS (SELECT 1 FROM json_each(profiles.interests) WHERE json_each.value = ?)"
            .to_string(),
        vec![Box::new(interest.to_string()) as Box<dyn ToSql>],
    )
}

fn among_clause(user_ids: &[String]) -> (String, Vec<Box<dyn ToSql>>) {
    let placeholders = vec!["?"; user_ids.len()].join(", ");
    let params = user_ids
        .iter()
        .map(|id| Box::new(id.clone()) as Box<dyn ToSql>)
        .collect();
    (format!("user_id IN ({placeholders})"), params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use proptest::prelude::*;

    fn setup() -> (Database, ProfileRepository) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize schema");
        let repo = ProfileRepository::new(db.pool.clone());
        (db, repo)
    }

    fn new_profile(name: &str) -> NewProfile {
        NewProfile {
            name: name.to_string(),
            bio: format!("{name} writes about distributed systems"),
            headline: "Engineer".to_string(),
            interests: vec!["rust".to_string(), "hiking".to_string()],
        }
    }

    #[test]
    fn test_create_and_get() {
        let (_db, repo) = setup();

        let created = repo
            .create("user-a", &new_profile("Alice"))
            .unwrap()
            .expect("profile should be created");
        assert_eq!(created.user_id, "user-a");
        assert_eq!(created.interests, vec!["rust", "hiking"]);

        let fetched = repo.get_by_user_id("user-a").unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.name, "Alice");

        let by_id = repo.get_by_id(&created.id).unwrap().unwrap();
        assert_eq!(by_id.user_id, "user-a");
    }

    #[test]
    fn test_one_profile_per_user() {
        let (_db, repo) = setup();

        assert!(repo.create("user-a", &new_profile("Alice")).unwrap().is_some());
        assert!(repo.create("user-a", &new_profile("Alice II")).unwrap().is_none());
    }

    #[test]
    fn test_partial_update() {
        let (_db, repo) = setup();
        repo.create("user-a", &new_profile("Alice")).unwrap();

        let changes = ProfileChanges {
            headline: Some("Founder".to_string()),
            ..Default::default()
        };
        let updated = repo.update("user-a", &changes).unwrap().unwrap();
        assert_eq!(updated.headline, "Founder");
        assert_eq!(updated.name, "Alice");
        assert!(updated.updated_at >= updated.created_at);

        assert!(repo.update("user-missing", &changes).unwrap().is_none());
    }

    #[test]
    fn test_update_avatar() {
        let (_db, repo) = setup();
        repo.create("user-a", &new_profile("Alice")).unwrap();

        let updated = repo
            .update_avatar("user-a", Some("https://media.example/avatars/a.png"))
            .unwrap()
            .unwrap();
        assert_eq!(
            updated.avatar_url.as_deref(),
            Some("https://media.example/avatars/a.png")
        );

        let cleared = repo.update_avatar("user-a", None).unwrap().unwrap();
        assert!(cleared.avatar_url.is_none());
    }

    #[test]
    fn test_delete() {
        let (_db, repo) = setup();
        repo.create("user-a", &new_profile("Alice")).unwrap();

        assert_eq!(repo.delete("user-a").unwrap(), 1);
        assert!(repo.get_by_user_id("user-a").unwrap().is_none());
        assert_eq!(repo.delete("user-a").unwrap(), 0);
    }

    #[test]
    fn test_list_pagination_newest_first() {
        let (_db, repo) = setup();
        for i in 0..5 {
            repo.create(&format!("user-{i}"), &new_profile(&format!("Person {i}")))
                .unwrap();
        }

        let (first, total) = repo.list(1, 2).unwrap();
        assert_eq!(total, 5);
        assert_eq!(first.len(), 2);
        // Most recently created row comes first.
        assert_eq!(first[0].user_id, "user-4");
        assert_eq!(first[1].user_id, "user-3");

        let (last, total) = repo.list(3, 2).unwrap();
        assert_eq!(total, 5);
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].user_id, "user-0");
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let (_db, repo) = setup();
        repo.create(
            "user-a",
            &NewProfile {
                name: "Alice".to_string(),
                bio: "Climber and baker".to_string(),
                headline: "Engineer".to_string(),
                interests: vec![],
            },
        )
        .unwrap();
        repo.create(
            "user-b",
            &NewProfile {
                name: "Bob".to_string(),
                bio: "Runner".to_string(),
                headline: "Amateur CLIMBER".to_string(),
                interests: vec![],
            },
        )
        .unwrap();
        repo.create(
            "user-c",
            &NewProfile {
                name: "Carol".to_string(),
                bio: "Painter".to_string(),
                headline: "Designer".to_string(),
                interests: vec![],
            },
        )
        .unwrap();

        let (rows, total) = repo.search("climb", 1, 10).unwrap();
        assert_eq!(total, 2);
        let users: Vec<_> = rows.iter().map(|p| p.user_id.as_str()).collect();
        assert!(users.contains(&"user-a"));
        assert!(users.contains(&"user-b"));
    }

    #[test]
    fn test_interest_filter_is_exact() {
        let (_db, repo) = setup();
        repo.create(
            "user-a",
            &NewProfile {
                name: "Alice".to_string(),
                bio: "-".to_string(),
                headline: "-".to_string(),
                interests: vec!["rust".to_string()],
            },
        )
        .unwrap();
        repo.create(
            "user-b",
            &NewProfile {
                name: "Bob".to_string(),
                bio: "-".to_string(),
                headline: "-".to_string(),
                interests: vec!["rustacean".to_string()],
            },
        )
        .unwrap();

        let (rows, total) = repo.by_interest("rust", 1, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].user_id, "user-a");
    }

    #[test]
    fn test_scoped_variants() {
        let (_db, repo) = setup();
        for (user, name) in [("user-a", "Alice"), ("user-b", "Bob"), ("user-c", "Carol")] {
            repo.create(user, &new_profile(name)).unwrap();
        }
        let scope = vec!["user-a".to_string(), "user-c".to_string()];

        let (rows, total) = repo.list_among(&scope, 1, 10).unwrap();
        assert_eq!(total, 2);
        assert!(rows.iter().all(|p| p.user_id != "user-b"));

        let (rows, total) = repo.search_among(&scope, "alice", 1, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].user_id, "user-a");

        let (_rows, total) = repo.by_interest_among(&scope, "rust", 1, 10).unwrap();
        assert_eq!(total, 2);

        let (rows, total) = repo.list_among(&[], 1, 10).unwrap();
        assert!(rows.is_empty());
        assert_eq!(total, 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        /// Walking every page in order yields each row exactly once, newest
        /// first, and has_more flips to false only on the final page.
        #[test]
        fn prop_page_concatenation_is_complete(total in 0i64..25, limit in 1i64..8) {
            let (_db, repo) = setup();
            for i in 0..total {
                repo.create(&format!("user-{i}"), &new_profile(&format!("P{i}")))
                    .unwrap();
            }

            let mut seen = Vec::new();
            let mut page = 1i64;
            loop {
                let (rows, reported_total) = repo.list(page, limit).unwrap();
                prop_assert_eq!(reported_total, total);
                let has_more = page * limit < reported_total;
                if has_more {
                    prop_assert_eq!(rows.len() as i64, limit);
                } else {
                    prop_assert!(rows.len() as i64 <= limit);
                }
                seen.extend(rows.into_iter().map(|p| p.user_id));
                if !has_more {
                    break;
                }
                page += 1;
            }

            // Concatenation is complete, duplicate-free, and newest first.
            let expected: Vec<String> = (0..total).rev().map(|i| format!("user-{i}")).collect();
            prop_assert_eq!(seen, expected);
        }
    }
}
