// src/services/trip_service.rs
// DOCUMENTATION: Trip aggregate lifecycle
// PURPOSE: Upload orchestration, story synthesis, edit commits, and the
// two-phase apply-locally-then-persist social mutations

use crate::db::TripRepository;
use crate::errors::TrailsError;
use crate::models::{
    PhotoRecord, PhotoUpload, TripAggregate, UpdateTripRequest, UserProfile,
    PLACEHOLDER_COVER_URL,
};
use crate::services::exif;
use crate::services::itinerary::{self, StoryDraft};
use crate::services::social;
use crate::services::storage_client::StorageClient;
use crate::services::story_client::StoryClient;
use crate::services::video_client::{self, VideoClient};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use futures::future::try_join_all;
use sqlx::PgPool;
use uuid::Uuid;

/// Trip orchestration service
/// DOCUMENTATION: Owns the external clients; repositories stay static
pub struct TripService {
    story: StoryClient,
    storage: StorageClient,
    video: VideoClient,
    cluster_radius_km: f64,
}

impl TripService {
    pub fn new(
        story: StoryClient,
        storage: StorageClient,
        video: VideoClient,
        cluster_radius_km: f64,
    ) -> Self {
        Self {
            story,
            storage,
            video,
            cluster_radius_km,
        }
    }

    /// Create a trip from an upload batch
    ///
    /// Pipeline: decode + metadata per photo, locatable check (fails fast
    /// before any story call), concurrent upload fan-out keyed by input
    /// index, story draft (remote when configured, local clustering
    /// otherwise), synthesis, insert.
    pub async fn create_trip(
        &self,
        pool: &PgPool,
        owner: &UserProfile,
        uploads: &[PhotoUpload],
    ) -> Result<TripAggregate, TrailsError> {
        let decoded = Self::decode_uploads(uploads)?;

        if !decoded.iter().any(|(_, _, meta)| meta.coords.is_some()) {
            return Err(TrailsError::NoLocatableContent(
                "none of the uploaded photos carry GPS coordinates".to_string(),
            ));
        }

        let photos = self.upload_batch(owner.id, decoded).await?;
        let draft = self.draft_for(&photos, None).await?;

        let now = Utc::now();
        let story = itinerary::synthesize(&photos, &draft, now)?;

        let trip = TripAggregate {
            id: Uuid::new_v4(),
            user: owner.clone(),
            title: story.title,
            summary: story.summary,
            stops: story.stops,
            photos,
            cover_image_url: story.cover_image_url,
            likes: Vec::new(),
            comments: Vec::new(),
            ratings: Vec::new(),
            video_url: None,
            created_at: now,
            updated_at: now,
        };

        TripRepository::insert(pool, &trip).await?;
        Ok(trip)
    }

    /// Merge additional photos into an existing trip (owner only)
    pub async fn add_photos(
        &self,
        pool: &PgPool,
        trip_id: Uuid,
        acting_user: Uuid,
        uploads: &[PhotoUpload],
    ) -> Result<TripAggregate, TrailsError> {
        let existing = TripRepository::get_by_id(pool, trip_id).await?;
        if existing.user.id != acting_user {
            return Err(TrailsError::Forbidden);
        }

        let decoded = Self::decode_uploads(uploads)?;
        let new_photos = self.upload_batch(acting_user, decoded).await?;

        let mut combined = existing.photos.clone();
        combined.extend(new_photos.iter().cloned());
        let draft = self.draft_for(&combined, Some(&existing)).await?;

        let replacement =
            itinerary::merge_into_trip(&existing, new_photos, &draft, Utc::now())?;

        let mut updated = existing;
        updated.title = replacement.title;
        updated.summary = replacement.summary;
        updated.stops = replacement.stops;
        updated.photos = replacement.photos;
        updated.cover_image_url = replacement.cover_image_url;
        updated.updated_at = Utc::now();

        TripRepository::update_story(pool, trip_id, &updated.to_blob(), &updated.cover_image_url)
            .await?;
        TripRepository::get_by_id(pool, trip_id).await
    }

    /// Edit-mode commit: the provided fields replace the persisted state
    pub async fn update_trip(
        &self,
        pool: &PgPool,
        trip_id: Uuid,
        acting_user: Uuid,
        edit: &UpdateTripRequest,
    ) -> Result<TripAggregate, TrailsError> {
        let mut trip = TripRepository::get_by_id(pool, trip_id).await?;
        if trip.user.id != acting_user {
            return Err(TrailsError::Forbidden);
        }

        if let Some(title) = &edit.title {
            let title = itinerary::sanitize_text(title);
            if title.is_empty() {
                return Err(TrailsError::InvalidInput("title is empty".to_string()));
            }
            trip.title = title;
        }
        if let Some(summary) = &edit.summary {
            trip.summary = itinerary::sanitize_text(summary);
        }

        for stop_edit in &edit.stop_edits {
            let stop = trip
                .stops
                .iter_mut()
                .find(|s| s.id == stop_edit.stop_id)
                .ok_or_else(|| TrailsError::NotFound(format!("stop {}", stop_edit.stop_id)))?;
            if let Some(name) = &stop_edit.name {
                let name = itinerary::sanitize_text(name);
                if !name.is_empty() {
                    stop.name = name;
                }
            }
            if let Some(story) = &stop_edit.story {
                stop.story = itinerary::sanitize_text(story);
            }
        }

        for description in &edit.photo_descriptions {
            let photo = trip
                .photos
                .iter_mut()
                .find(|p| p.id == description.photo_id)
                .ok_or_else(|| {
                    TrailsError::NotFound(format!("photo {}", description.photo_id))
                })?;
            let text = itinerary::sanitize_text(&description.description);
            photo.description = if text.is_empty() { None } else { Some(text) };
        }

        if let Some(cover_photo_id) = edit.cover_photo_id {
            let photo = trip
                .photos
                .iter()
                .find(|p| p.id == cover_photo_id)
                .ok_or_else(|| TrailsError::NotFound(format!("photo {}", cover_photo_id)))?;
            trip.cover_image_url = photo.content_url.clone();
        }

        // Cover fallback if the designated cover's photo was removed earlier
        trip.cover_image_url = trip.effective_cover();
        trip.updated_at = Utc::now();

        TripRepository::update_story(pool, trip_id, &trip.to_blob(), &trip.cover_image_url)
            .await?;
        TripRepository::get_by_id(pool, trip_id).await
    }

    /// Preview-mode discard (owner only)
    pub async fn discard_trip(
        &self,
        pool: &PgPool,
        trip_id: Uuid,
        acting_user: Uuid,
    ) -> Result<(), TrailsError> {
        let trip = TripRepository::get_by_id(pool, trip_id).await?;
        if trip.user.id != acting_user {
            return Err(TrailsError::Forbidden);
        }
        TripRepository::delete(pool, trip_id).await
    }

    /// Toggle the acting user's like on the trip
    pub async fn like_trip(
        &self,
        pool: &PgPool,
        trip_id: Uuid,
        acting_user: Uuid,
    ) -> Result<TripAggregate, TrailsError> {
        let mut trip = TripRepository::get_by_id(pool, trip_id).await?;
        social::toggle_like(&mut trip.likes, acting_user);
        self.persist_or_refetch(pool, trip).await
    }

    /// Toggle the acting user's like on one photo in the trip
    pub async fn like_photo(
        &self,
        pool: &PgPool,
        trip_id: Uuid,
        photo_id: Uuid,
        acting_user: Uuid,
    ) -> Result<TripAggregate, TrailsError> {
        let mut trip = TripRepository::get_by_id(pool, trip_id).await?;
        let photo = trip
            .photos
            .iter_mut()
            .find(|p| p.id == photo_id)
            .ok_or_else(|| TrailsError::NotFound(format!("photo {}", photo_id)))?;
        social::toggle_like(&mut photo.likes, acting_user);
        self.persist_or_refetch(pool, trip).await
    }

    /// Rating upsert on the trip
    pub async fn rate_trip(
        &self,
        pool: &PgPool,
        trip_id: Uuid,
        acting_user: Uuid,
        value: u8,
    ) -> Result<TripAggregate, TrailsError> {
        if !(1..=5).contains(&value) {
            return Err(TrailsError::InvalidInput(format!(
                "rating must be 1-5, got {}",
                value
            )));
        }
        let mut trip = TripRepository::get_by_id(pool, trip_id).await?;
        let outcome = social::upsert_rating(&mut trip.ratings, acting_user, value);
        log::debug!("Rating {:?} on trip {}", outcome, trip_id);
        self.persist_or_refetch(pool, trip).await
    }

    /// Append a comment to the trip
    pub async fn comment_on_trip(
        &self,
        pool: &PgPool,
        trip_id: Uuid,
        author: UserProfile,
        content: &str,
    ) -> Result<TripAggregate, TrailsError> {
        let mut trip = TripRepository::get_by_id(pool, trip_id).await?;
        social::add_comment(&mut trip.comments, author, content, Utc::now())?;
        self.persist_or_refetch(pool, trip).await
    }

    /// Delete a comment from the trip (author only)
    pub async fn delete_trip_comment(
        &self,
        pool: &PgPool,
        trip_id: Uuid,
        comment_id: Uuid,
        acting_user: Uuid,
    ) -> Result<TripAggregate, TrailsError> {
        let mut trip = TripRepository::get_by_id(pool, trip_id).await?;
        social::remove_comment(&mut trip.comments, comment_id, acting_user)?;
        self.persist_or_refetch(pool, trip).await
    }

    /// Append a comment to one photo in the trip
    pub async fn comment_on_photo(
        &self,
        pool: &PgPool,
        trip_id: Uuid,
        photo_id: Uuid,
        author: UserProfile,
        content: &str,
    ) -> Result<TripAggregate, TrailsError> {
        let mut trip = TripRepository::get_by_id(pool, trip_id).await?;
        let photo = trip
            .photos
            .iter_mut()
            .find(|p| p.id == photo_id)
            .ok_or_else(|| TrailsError::NotFound(format!("photo {}", photo_id)))?;
        social::add_comment(&mut photo.comments, author, content, Utc::now())?;
        self.persist_or_refetch(pool, trip).await
    }

    /// Generate the highlight-reel video for a trip (owner only)
    /// DOCUMENTATION: Resolves the cover image bytes, runs the bounded
    /// polling flow, re-uploads the result and persists its URL
    pub async fn generate_video(
        &self,
        pool: &PgPool,
        trip_id: Uuid,
        acting_user: Uuid,
    ) -> Result<TripAggregate, TrailsError> {
        let trip = TripRepository::get_by_id(pool, trip_id).await?;
        if trip.user.id != acting_user {
            return Err(TrailsError::Forbidden);
        }

        let cover_url = trip.effective_cover();
        if cover_url == PLACEHOLDER_COVER_URL {
            return Err(TrailsError::InvalidInput(
                "trip has no photo to build a video from".to_string(),
            ));
        }

        let cover_bytes = self.storage.download(&cover_url).await?;
        let prompt = video_client::build_prompt(&trip.title, &trip.summary);
        let video_bytes = self
            .video
            .generate(&cover_bytes, "image/jpeg", &prompt)
            .await?;

        let video_url = self
            .storage
            .upload(acting_user, &format!("{}-reel.mp4", trip_id), video_bytes)
            .await?;

        TripRepository::update_video(pool, trip_id, &video_url).await?;
        TripRepository::get_by_id(pool, trip_id).await
    }

    /// Second phase of an optimistic mutation: persist the already-applied
    /// local state; on failure re-fetch so the caller never sees the
    /// unconfirmed change, then surface the original error
    async fn persist_or_refetch(
        &self,
        pool: &PgPool,
        trip: TripAggregate,
    ) -> Result<TripAggregate, TrailsError> {
        let trip_id = trip.id;
        match TripRepository::update_story(pool, trip_id, &trip.to_blob(), &trip.cover_image_url)
            .await
        {
            Ok(()) => {
                // Late-result gating: confirm against the stored row
                let confirmed = TripRepository::get_by_id(pool, trip_id).await?;
                if confirmed.id != trip_id {
                    return Err(TrailsError::DatabaseError(
                        "confirmed row does not match the mutated trip".to_string(),
                    ));
                }
                Ok(confirmed)
            }
            Err(e) => {
                log::warn!(
                    "Persist failed for trip {}, discarding optimistic change: {}",
                    trip_id,
                    e
                );
                // Best effort refresh; the original failure is what surfaces
                if let Err(refetch) = TripRepository::get_by_id(pool, trip_id).await {
                    log::error!("Re-fetch after failed persist also failed: {}", refetch);
                }
                Err(e)
            }
        }
    }

    /// Decode base64 payloads and extract metadata, preserving input order
    fn decode_uploads(
        uploads: &[PhotoUpload],
    ) -> Result<Vec<(String, Vec<u8>, exif::ExtractedMetadata)>, TrailsError> {
        uploads
            .iter()
            .map(|upload| {
                let bytes = BASE64.decode(&upload.content).map_err(|e| {
                    TrailsError::InvalidInput(format!(
                        "photo {} is not valid base64: {}",
                        upload.filename, e
                    ))
                })?;
                let metadata = exif::extract_metadata(&bytes);
                Ok((upload.filename.clone(), bytes, metadata))
            })
            .collect()
    }

    /// Upload all photos concurrently; the join preserves the input index
    /// association so records line up with draft photo indexes
    async fn upload_batch(
        &self,
        owner_id: Uuid,
        decoded: Vec<(String, Vec<u8>, exif::ExtractedMetadata)>,
    ) -> Result<Vec<PhotoRecord>, TrailsError> {
        let uploads = decoded.into_iter().map(|(filename, bytes, metadata)| {
            let storage = &self.storage;
            async move {
                let content_url = storage.upload(owner_id, &filename, bytes).await?;
                Ok::<PhotoRecord, TrailsError>(PhotoRecord {
                    id: Uuid::new_v4(),
                    content_url,
                    coords: metadata.coords,
                    description: None,
                    camera_details: metadata.camera,
                    likes: Vec::new(),
                    comments: Vec::new(),
                })
            }
        });
        try_join_all(uploads).await
    }

    /// Remote draft when the story service is configured, deterministic
    /// local clustering otherwise
    async fn draft_for(
        &self,
        photos: &[PhotoRecord],
        existing: Option<&TripAggregate>,
    ) -> Result<StoryDraft, TrailsError> {
        if self.story.is_configured() {
            let coordinates = photos.iter().map(|p| p.coords).collect();
            self.story.generate_draft(coordinates, existing).await
        } else {
            log::debug!("Story service not configured, using local clustering draft");
            Ok(itinerary::local_draft(photos, self.cluster_radius_km))
        }
    }
}
