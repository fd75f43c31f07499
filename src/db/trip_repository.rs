// src/db/trip_repository.rs
// DOCUMENTATION: Database access layer for trips
// PURPOSE: Abstract trip row storage from business logic; the story blob is
// JSONB and always passes through the validating decode on the way out

use crate::errors::TrailsError;
use crate::models::{StoryBlob, TripAggregate, UserProfile};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Internal struct for mapping trip rows joined with their author profile
#[derive(Debug, FromRow)]
struct TripRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub avatar_url: String,
    pub story: Value,
    pub cover_image_url: String,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TripRow {
    /// Decode the stored blob and assemble the aggregate
    fn into_aggregate(self) -> Result<TripAggregate, TrailsError> {
        let mut blob = StoryBlob::decode(&self.story)?;
        // The row column is authoritative for the video reel
        if self.video_url.is_some() {
            blob.video_url = self.video_url;
        }
        let user = UserProfile {
            id: self.user_id,
            username: self.username,
            avatar_url: self.avatar_url,
        };
        Ok(TripAggregate::from_parts(
            self.id,
            user,
            blob,
            self.cover_image_url,
            self.created_at,
            self.updated_at,
        ))
    }
}

const TRIP_SELECT: &str = r#"
    SELECT t.id, t.user_id, p.username, p.avatar_url,
           t.story, t.cover_image_url, t.video_url,
           t.created_at, t.updated_at
    FROM trips t
    JOIN profiles p ON p.id = t.user_id
"#;

/// TripRepository: all database operations for trips
pub struct TripRepository;

impl TripRepository {
    /// Feed listing, newest first, with the author profile embedded
    /// DOCUMENTATION: A row whose blob fails decode is skipped with a warning
    /// rather than poisoning the whole feed
    pub async fn list_feed(pool: &PgPool) -> Result<Vec<TripAggregate>, TrailsError> {
        let rows = sqlx::query_as::<_, TripRow>(&format!(
            "{} ORDER BY t.created_at DESC",
            TRIP_SELECT
        ))
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list trips: {}", e);
            TrailsError::DatabaseError(e.to_string())
        })?;

        let mut trips = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            match row.into_aggregate() {
                Ok(trip) => trips.push(trip),
                Err(e) => log::warn!("Skipping undecodable trip {}: {}", id, e),
            }
        }
        Ok(trips)
    }

    /// Single trip by id
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<TripAggregate, TrailsError> {
        let row = sqlx::query_as::<_, TripRow>(&format!("{} WHERE t.id = $1", TRIP_SELECT))
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to fetch trip {}: {}", id, e);
                TrailsError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| TrailsError::NotFound(format!("trip {}", id)))?;

        row.into_aggregate()
    }

    /// All trips owned by one user, newest first
    pub async fn list_by_owner(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<TripAggregate>, TrailsError> {
        let rows = sqlx::query_as::<_, TripRow>(&format!(
            "{} WHERE t.user_id = $1 ORDER BY t.created_at DESC",
            TRIP_SELECT
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list trips for {}: {}", user_id, e);
            TrailsError::DatabaseError(e.to_string())
        })?;

        let mut trips = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            match row.into_aggregate() {
                Ok(trip) => trips.push(trip),
                Err(e) => log::warn!("Skipping undecodable trip {}: {}", id, e),
            }
        }
        Ok(trips)
    }

    /// Insert a freshly synthesized trip
    pub async fn insert(pool: &PgPool, trip: &TripAggregate) -> Result<(), TrailsError> {
        let story = trip.to_blob().encode()?;
        sqlx::query(
            r#"
            INSERT INTO trips (id, user_id, story, cover_image_url, video_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            "#,
        )
        .bind(trip.id)
        .bind(trip.user.id)
        .bind(story)
        .bind(&trip.cover_image_url)
        .bind(&trip.video_url)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to insert trip {}: {}", trip.id, e);
            TrailsError::DatabaseError(e.to_string())
        })?;

        log::info!("Created trip {}", trip.id);
        Ok(())
    }

    /// Replace the stored story blob and cover for a trip
    pub async fn update_story(
        pool: &PgPool,
        id: Uuid,
        blob: &StoryBlob,
        cover_image_url: &str,
    ) -> Result<(), TrailsError> {
        let story = blob.encode()?;
        let result = sqlx::query(
            r#"
            UPDATE trips
            SET story = $2, cover_image_url = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(story)
        .bind(cover_image_url)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to update trip {}: {}", id, e);
            TrailsError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(TrailsError::NotFound(format!("trip {}", id)));
        }
        Ok(())
    }

    /// Persist the generated video reel URL
    pub async fn update_video(pool: &PgPool, id: Uuid, video_url: &str) -> Result<(), TrailsError> {
        let result = sqlx::query(
            r#"
            UPDATE trips
            SET video_url = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(video_url)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to set video for trip {}: {}", id, e);
            TrailsError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(TrailsError::NotFound(format!("trip {}", id)));
        }
        Ok(())
    }

    /// Delete a trip row
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), TrailsError> {
        let result = sqlx::query("DELETE FROM trips WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to delete trip {}: {}", id, e);
                TrailsError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(TrailsError::NotFound(format!("trip {}", id)));
        }
        log::info!("Deleted trip {}", id);
        Ok(())
    }
}
