// src/db/profile_repository.rs
// DOCUMENTATION: Database access layer for user profiles
// PURPOSE: Abstract profile lookups and provisioning inserts from business logic

use crate::errors::TrailsError;
use crate::models::UserProfile;
use sqlx::PgPool;
use uuid::Uuid;

/// ProfileRepository: all database operations for profiles
pub struct ProfileRepository;

impl ProfileRepository {
    /// Fetch a profile, erroring when it does not exist
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<UserProfile, TrailsError> {
        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| TrailsError::NotFound(format!("profile {}", id)))
    }

    /// Fetch a profile if present
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<UserProfile>, TrailsError> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, username, avatar_url
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch profile {}: {}", id, e);
            TrailsError::DatabaseError(e.to_string())
        })
    }

    /// Insert a freshly provisioned profile
    /// DOCUMENTATION: Conflict on id means a concurrent first sign-in already
    /// provisioned it; that row wins
    pub async fn insert(pool: &PgPool, profile: &UserProfile) -> Result<UserProfile, TrailsError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, username, avatar_url, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(profile.id)
        .bind(&profile.username)
        .bind(&profile.avatar_url)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to insert profile {}: {}", profile.id, e);
            TrailsError::DatabaseError(e.to_string())
        })?;

        Self::get_by_id(pool, profile.id).await
    }

    /// Find a profile by exact username
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<UserProfile>, TrailsError> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, username, avatar_url
            FROM profiles
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to look up username {}: {}", username, e);
            TrailsError::DatabaseError(e.to_string())
        })
    }
}
