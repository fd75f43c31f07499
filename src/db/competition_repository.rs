// src/db/competition_repository.rs
// DOCUMENTATION: Database access layer for competitions and entries
// PURPOSE: Abstract competition storage from business logic; entry votes are
// a JSONB list mirroring the in-memory Like list

use crate::errors::TrailsError;
use crate::models::{Competition, CompetitionEntry, CreateCompetitionRequest, Like};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Internal struct for mapping entry rows; votes arrive as raw JSONB
#[derive(Debug, FromRow)]
struct EntryRow {
    pub id: Uuid,
    pub competition_id: Uuid,
    pub user_id: Uuid,
    pub photo_url: String,
    pub submitted_at: DateTime<Utc>,
    pub rank: Option<i16>,
    pub votes: Value,
}

impl EntryRow {
    fn into_entry(self) -> CompetitionEntry {
        // A malformed vote list degrades to empty rather than failing the read
        let votes: Vec<Like> = serde_json::from_value(self.votes).unwrap_or_default();
        CompetitionEntry {
            id: self.id,
            competition_id: self.competition_id,
            user_id: self.user_id,
            photo_url: self.photo_url,
            submitted_at: self.submitted_at,
            rank: self.rank,
            votes,
        }
    }
}

/// CompetitionRepository: all database operations for competitions
pub struct CompetitionRepository;

impl CompetitionRepository {
    /// Active and past competitions, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Competition>, TrailsError> {
        sqlx::query_as::<_, Competition>(
            r#"
            SELECT id, creator_id, title, description, ends_on,
                   max_entries_per_user, created_at
            FROM competitions
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list competitions: {}", e);
            TrailsError::DatabaseError(e.to_string())
        })
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Competition, TrailsError> {
        sqlx::query_as::<_, Competition>(
            r#"
            SELECT id, creator_id, title, description, ends_on,
                   max_entries_per_user, created_at
            FROM competitions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch competition {}: {}", id, e);
            TrailsError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| TrailsError::NotFound(format!("competition {}", id)))
    }

    /// Create a competition
    pub async fn insert(
        pool: &PgPool,
        creator_id: Uuid,
        req: &CreateCompetitionRequest,
    ) -> Result<Competition, TrailsError> {
        let inserted: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO competitions (
                creator_id, title, description, ends_on, max_entries_per_user, created_at
            )
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id
            "#,
        )
        .bind(creator_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.ends_on)
        .bind(req.max_entries_per_user)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create competition: {}", e);
            TrailsError::DatabaseError(e.to_string())
        })?;

        log::info!("Created competition {}", inserted.0);
        Self::get_by_id(pool, inserted.0).await
    }

    /// Entries for one competition, ranked first then newest
    pub async fn list_entries(
        pool: &PgPool,
        competition_id: Uuid,
    ) -> Result<Vec<CompetitionEntry>, TrailsError> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, competition_id, user_id, photo_url, submitted_at, rank, votes
            FROM competition_entries
            WHERE competition_id = $1
            ORDER BY rank ASC NULLS LAST, submitted_at DESC
            "#,
        )
        .bind(competition_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!(
                "Failed to list entries for competition {}: {}",
                competition_id,
                e
            );
            TrailsError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(EntryRow::into_entry).collect())
    }

    pub async fn get_entry(pool: &PgPool, entry_id: Uuid) -> Result<CompetitionEntry, TrailsError> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, competition_id, user_id, photo_url, submitted_at, rank, votes
            FROM competition_entries
            WHERE id = $1
            "#,
        )
        .bind(entry_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch entry {}: {}", entry_id, e);
            TrailsError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| TrailsError::NotFound(format!("entry {}", entry_id)))?;

        Ok(row.into_entry())
    }

    /// How many entries one user already has in a competition
    pub async fn count_entries_for_user(
        pool: &PgPool,
        competition_id: Uuid,
        user_id: Uuid,
    ) -> Result<i64, TrailsError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM competition_entries
            WHERE competition_id = $1 AND user_id = $2
            "#,
        )
        .bind(competition_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to count entries: {}", e);
            TrailsError::DatabaseError(e.to_string())
        })?;
        Ok(count.0)
    }

    /// Insert a new entry with its uploaded photo URL
    pub async fn insert_entry(
        pool: &PgPool,
        competition_id: Uuid,
        user_id: Uuid,
        photo_url: &str,
    ) -> Result<CompetitionEntry, TrailsError> {
        let inserted: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO competition_entries (
                competition_id, user_id, photo_url, submitted_at, votes
            )
            VALUES ($1, $2, $3, NOW(), '[]'::jsonb)
            RETURNING id
            "#,
        )
        .bind(competition_id)
        .bind(user_id)
        .bind(photo_url)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to insert entry: {}", e);
            TrailsError::DatabaseError(e.to_string())
        })?;

        log::info!(
            "User {} entered competition {} (entry {})",
            user_id,
            competition_id,
            inserted.0
        );
        Self::get_entry(pool, inserted.0).await
    }

    /// Set or clear the rank on one entry row
    pub async fn set_rank(
        pool: &PgPool,
        entry_id: Uuid,
        rank: Option<i16>,
    ) -> Result<(), TrailsError> {
        let result = sqlx::query(
            r#"
            UPDATE competition_entries
            SET rank = $2
            WHERE id = $1
            "#,
        )
        .bind(entry_id)
        .bind(rank)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to set rank on entry {}: {}", entry_id, e);
            TrailsError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(TrailsError::NotFound(format!("entry {}", entry_id)));
        }
        Ok(())
    }

    /// Replace the vote list on one entry
    pub async fn update_votes(
        pool: &PgPool,
        entry_id: Uuid,
        votes: &[Like],
    ) -> Result<(), TrailsError> {
        let encoded = serde_json::to_value(votes)
            .map_err(|e| TrailsError::DecodeError(format!("votes encode: {}", e)))?;
        let result = sqlx::query(
            r#"
            UPDATE competition_entries
            SET votes = $2
            WHERE id = $1
            "#,
        )
        .bind(entry_id)
        .bind(encoded)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to update votes on entry {}: {}", entry_id, e);
            TrailsError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(TrailsError::NotFound(format!("entry {}", entry_id)));
        }
        Ok(())
    }
}
