// src/services/competition_service.rs
// DOCUMENTATION: Competition orchestration
// PURPOSE: Submission gating, vote toggling, and the two-row rank mirror

use crate::db::CompetitionRepository;
use crate::errors::TrailsError;
use crate::models::{
    Competition, CompetitionDetailResponse, CompetitionEntry, CreateCompetitionRequest,
};
use crate::services::exif;
use crate::services::social;
use crate::services::storage_client::StorageClient;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

/// Competition orchestration service
pub struct CompetitionService {
    storage: StorageClient,
}

impl CompetitionService {
    pub fn new(storage: StorageClient) -> Self {
        Self { storage }
    }

    pub async fn create(
        &self,
        pool: &PgPool,
        creator_id: Uuid,
        req: &CreateCompetitionRequest,
    ) -> Result<Competition, TrailsError> {
        CompetitionRepository::insert(pool, creator_id, req).await
    }

    pub async fn list(&self, pool: &PgPool) -> Result<Vec<Competition>, TrailsError> {
        CompetitionRepository::list(pool).await
    }

    /// Competition detail with its entries
    pub async fn get_detail(
        &self,
        pool: &PgPool,
        competition_id: Uuid,
    ) -> Result<CompetitionDetailResponse, TrailsError> {
        let competition = CompetitionRepository::get_by_id(pool, competition_id).await?;
        let entries = CompetitionRepository::list_entries(pool, competition_id).await?;
        let active = competition.is_active(Utc::now());
        Ok(CompetitionDetailResponse {
            competition,
            active,
            entries,
        })
    }

    /// Submit an entry photo
    /// DOCUMENTATION: Quota, active-window and originality checks all run
    /// before any byte reaches object storage
    pub async fn submit_entry(
        &self,
        pool: &PgPool,
        competition_id: Uuid,
        user_id: Uuid,
        filename: &str,
        content_base64: &str,
    ) -> Result<CompetitionEntry, TrailsError> {
        let competition = CompetitionRepository::get_by_id(pool, competition_id).await?;
        let entries = CompetitionRepository::list_entries(pool, competition_id).await?;
        social::can_submit_entry(&competition, &entries, user_id, Utc::now())?;

        let bytes = BASE64.decode(content_base64).map_err(|e| {
            TrailsError::InvalidInput(format!("entry photo is not valid base64: {}", e))
        })?;

        let metadata = exif::extract_metadata(&bytes);
        if !metadata.is_original {
            return Err(TrailsError::InvalidInput(
                "entry photos must be original captures with camera metadata".to_string(),
            ));
        }

        let photo_url = self.storage.upload(user_id, filename, bytes).await?;
        CompetitionRepository::insert_entry(pool, competition_id, user_id, &photo_url).await
    }

    /// Toggle the acting user's vote on an entry
    pub async fn vote_entry(
        &self,
        pool: &PgPool,
        entry_id: Uuid,
        user_id: Uuid,
    ) -> Result<CompetitionEntry, TrailsError> {
        let mut entry = CompetitionRepository::get_entry(pool, entry_id).await?;
        social::toggle_like(&mut entry.votes, user_id);
        CompetitionRepository::update_votes(pool, entry_id, &entry.votes).await?;
        CompetitionRepository::get_entry(pool, entry_id).await
    }

    /// Assign or toggle a podium rank (competition creator only)
    /// DOCUMENTATION: The in-memory reducer decides which rows change; the
    /// clear-then-set mirror is best effort with no compensating
    /// transaction, so a partial failure is surfaced as non-retryable
    pub async fn set_rank(
        &self,
        pool: &PgPool,
        competition_id: Uuid,
        entry_id: Uuid,
        rank: i16,
        acting_user: Uuid,
    ) -> Result<Vec<CompetitionEntry>, TrailsError> {
        let competition = CompetitionRepository::get_by_id(pool, competition_id).await?;
        let mut entries = CompetitionRepository::list_entries(pool, competition_id).await?;

        let change = social::assign_rank(
            &mut entries,
            entry_id,
            rank,
            acting_user,
            competition.creator_id,
        )?;

        if let Some(cleared) = change.cleared {
            CompetitionRepository::set_rank(pool, cleared, None)
                .await
                .map_err(|e| {
                    log::error!(
                        "Rank clear failed for entry {} in competition {}: {}",
                        cleared,
                        competition_id,
                        e
                    );
                    TrailsError::InvalidInput(format!(
                        "rank reassignment left the podium partially updated: {}",
                        e
                    ))
                })?;
        }
        if let Some(set) = change.set {
            CompetitionRepository::set_rank(pool, set, Some(rank))
                .await
                .map_err(|e| {
                    log::error!(
                        "Rank set failed for entry {} in competition {}: {}",
                        set,
                        competition_id,
                        e
                    );
                    TrailsError::InvalidInput(format!(
                        "rank reassignment left the podium partially updated: {}",
                        e
                    ))
                })?;
        }

        CompetitionRepository::list_entries(pool, competition_id).await
    }
}
