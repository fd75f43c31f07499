// src/models/trip.rs
// DOCUMENTATION: Trip aggregate - stops, photos and social state
// PURPOSE: In-memory aggregate, the persisted JSONB story blob, and the
// validating decode that turns untrusted stored JSON back into an aggregate

use crate::errors::TrailsError;
use crate::models::{Comment, Coordinate, Like, PhotoRecord, Rating, UserProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;

/// Fallback cover when a trip somehow has no photos at all
pub const PLACEHOLDER_COVER_URL: &str = "https://picsum.photos/seed/adventure/800/600";

/// A clustered waypoint grouping one or more geotagged photos
/// DOCUMENTATION: Created wholesale by synthesis; only name and story are
/// hand-editable afterwards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationStop {
    pub id: Uuid,
    pub name: String,
    pub story: String,
    pub coords: Coordinate,
    /// Ordered, non-empty; every id references a PhotoRecord in the trip
    pub photo_ids: Vec<Uuid>,
}

/// Complete in-memory representation of one trip
#[derive(Debug, Clone, Serialize)]
pub struct TripAggregate {
    pub id: Uuid,
    pub user: UserProfile,
    pub title: String,
    pub summary: String,
    pub stops: Vec<LocationStop>,
    pub photos: Vec<PhotoRecord>,
    pub cover_image_url: String,
    pub likes: Vec<Like>,
    pub comments: Vec<Comment>,
    pub ratings: Vec<Rating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The denormalized JSONB payload stored in the trips row
/// DOCUMENTATION: File content never lands here - photos carry only their
/// public storage URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryBlob {
    pub title: String,
    pub summary: String,
    pub stops: Vec<LocationStop>,
    pub photos: Vec<PhotoRecord>,
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl StoryBlob {
    /// Validating decode from the raw stored JSON
    /// DOCUMENTATION: The wire shape is never trusted directly - this either
    /// yields an invariant-satisfying blob or a structured decode error
    pub fn decode(raw: &Value) -> Result<StoryBlob, TrailsError> {
        let blob: StoryBlob = serde_json::from_value(raw.clone())
            .map_err(|e| TrailsError::DecodeError(format!("story blob: {}", e)))?;
        blob.check_invariants()?;
        Ok(blob)
    }

    /// Structural invariants every stored trip must satisfy
    fn check_invariants(&self) -> Result<(), TrailsError> {
        if self.stops.is_empty() {
            return Err(TrailsError::DecodeError(
                "trip has an empty stop list".to_string(),
            ));
        }

        let photo_ids: HashSet<Uuid> = self.photos.iter().map(|p| p.id).collect();
        let mut assigned: HashSet<Uuid> = HashSet::new();
        for stop in &self.stops {
            if stop.photo_ids.is_empty() {
                return Err(TrailsError::DecodeError(format!(
                    "stop {} references no photos",
                    stop.id
                )));
            }
            for pid in &stop.photo_ids {
                if !photo_ids.contains(pid) {
                    return Err(TrailsError::DecodeError(format!(
                        "stop {} references unknown photo {}",
                        stop.id, pid
                    )));
                }
                if !assigned.insert(*pid) {
                    return Err(TrailsError::DecodeError(format!(
                        "photo {} assigned to more than one stop",
                        pid
                    )));
                }
            }
        }

        let mut raters: HashSet<Uuid> = HashSet::new();
        for rating in &self.ratings {
            if !(1..=5).contains(&rating.value) {
                return Err(TrailsError::DecodeError(format!(
                    "rating value {} out of range",
                    rating.value
                )));
            }
            if !raters.insert(rating.user_id) {
                return Err(TrailsError::DecodeError(format!(
                    "user {} has more than one rating",
                    rating.user_id
                )));
            }
        }

        Ok(())
    }

    pub fn encode(&self) -> Result<Value, TrailsError> {
        serde_json::to_value(self)
            .map_err(|e| TrailsError::DecodeError(format!("story blob encode: {}", e)))
    }
}

impl TripAggregate {
    /// Assemble an aggregate from a stored row and its decoded blob
    pub fn from_parts(
        id: Uuid,
        user: UserProfile,
        blob: StoryBlob,
        cover_image_url: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        TripAggregate {
            id,
            user,
            title: blob.title,
            summary: blob.summary,
            stops: blob.stops,
            photos: blob.photos,
            cover_image_url,
            likes: blob.likes,
            comments: blob.comments,
            ratings: blob.ratings,
            video_url: blob.video_url,
            created_at,
            updated_at,
        }
    }

    /// Flatten the aggregate back into its persisted blob form
    pub fn to_blob(&self) -> StoryBlob {
        StoryBlob {
            title: self.title.clone(),
            summary: self.summary.clone(),
            stops: self.stops.clone(),
            photos: self.photos.clone(),
            likes: self.likes.clone(),
            comments: self.comments.clone(),
            ratings: self.ratings.clone(),
            video_url: self.video_url.clone(),
        }
    }

    /// Resolve the effective cover image
    /// DOCUMENTATION: The designated cover must resolve to one of the trip's
    /// photos; otherwise fall back to the first photo, then the placeholder
    pub fn effective_cover(&self) -> String {
        if self
            .photos
            .iter()
            .any(|p| p.content_url == self.cover_image_url)
        {
            return self.cover_image_url.clone();
        }
        self.photos
            .first()
            .map(|p| p.content_url.clone())
            .unwrap_or_else(|| PLACEHOLDER_COVER_URL.to_string())
    }

    pub fn to_card(&self) -> TripCardResponse {
        let rating_count = self.ratings.len();
        let average_rating = if rating_count == 0 {
            None
        } else {
            Some(
                self.ratings.iter().map(|r| r.value as f32).sum::<f32>() / rating_count as f32,
            )
        };
        TripCardResponse {
            id: self.id,
            user: self.user.clone(),
            title: self.title.clone(),
            summary: self.summary.clone(),
            cover_image_url: self.cover_image_url.clone(),
            like_count: self.likes.len(),
            comment_count: self.comments.len(),
            average_rating,
            rating_count,
            created_at: self.created_at,
        }
    }
}

/// Feed card DTO
#[derive(Debug, Clone, Serialize)]
pub struct TripCardResponse {
    pub id: Uuid,
    pub user: UserProfile,
    pub title: String,
    pub summary: String,
    pub cover_image_url: String,
    pub like_count: usize,
    pub comment_count: usize,
    pub average_rating: Option<f32>,
    pub rating_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Request to create a trip from an upload batch
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTripRequest {
    #[validate(length(min = 1, max = 50))]
    pub photos: Vec<crate::models::PhotoUpload>,
}

/// Request to merge additional photos into an existing trip
#[derive(Debug, Deserialize, Validate)]
pub struct AddPhotosRequest {
    #[validate(length(min = 1, max = 50))]
    pub photos: Vec<crate::models::PhotoUpload>,
}

/// Hand-edit of a stop's display text (edit mode only)
#[derive(Debug, Clone, Deserialize)]
pub struct StopTextEdit {
    pub stop_id: Uuid,
    pub name: Option<String>,
    pub story: Option<String>,
}

/// Hand-edit of a photo description
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoDescriptionEdit {
    pub photo_id: Uuid,
    pub description: String,
}

/// Edit-mode commit: the whole working copy replaces the persisted state
/// DOCUMENTATION: Only provided fields change; no partial commits below the
/// field level
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTripRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 4000))]
    pub summary: Option<String>,
    #[serde(default)]
    pub stop_edits: Vec<StopTextEdit>,
    #[serde(default)]
    pub photo_descriptions: Vec<PhotoDescriptionEdit>,
    pub cover_photo_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_blob_value() -> Value {
        let photo_id = Uuid::new_v4();
        let stop_id = Uuid::new_v4();
        json!({
            "title": "Coast walk",
            "summary": "Three days on the coast",
            "stops": [{
                "id": stop_id,
                "name": "Cliffs",
                "story": "Wind and salt",
                "coords": {"lat": 51.0, "lng": -9.4},
                "photo_ids": [photo_id]
            }],
            "photos": [{
                "id": photo_id,
                "content_url": "https://storage.example/p/1.jpg",
                "coords": {"lat": 51.0, "lng": -9.4},
                "likes": [],
                "comments": []
            }],
            "likes": [],
            "comments": [],
            "ratings": []
        })
    }

    #[test]
    fn test_decode_valid_blob() {
        let blob = StoryBlob::decode(&sample_blob_value()).unwrap();
        assert_eq!(blob.stops.len(), 1);
        assert_eq!(blob.photos.len(), 1);
    }

    #[test]
    fn test_decode_rejects_empty_stop_list() {
        let mut value = sample_blob_value();
        value["stops"] = json!([]);
        assert!(matches!(
            StoryBlob::decode(&value),
            Err(TrailsError::DecodeError(_))
        ));
    }

    #[test]
    fn test_decode_rejects_dangling_photo_reference() {
        let mut value = sample_blob_value();
        value["stops"][0]["photo_ids"] = json!([Uuid::new_v4()]);
        assert!(matches!(
            StoryBlob::decode(&value),
            Err(TrailsError::DecodeError(_))
        ));
    }

    #[test]
    fn test_decode_rejects_duplicate_rating() {
        let mut value = sample_blob_value();
        let user = Uuid::new_v4();
        value["ratings"] = json!([
            {"user_id": user, "value": 4},
            {"user_id": user, "value": 2}
        ]);
        assert!(matches!(
            StoryBlob::decode(&value),
            Err(TrailsError::DecodeError(_))
        ));
    }

    #[test]
    fn test_effective_cover_falls_back_to_first_photo() {
        let blob = StoryBlob::decode(&sample_blob_value()).unwrap();
        let user = UserProfile {
            id: Uuid::new_v4(),
            username: "ines".to_string(),
            avatar_url: "https://picsum.photos/seed/ines/100/100".to_string(),
        };
        let mut trip = TripAggregate::from_parts(
            Uuid::new_v4(),
            user,
            blob,
            "https://storage.example/p/gone.jpg".to_string(),
            Utc::now(),
            Utc::now(),
        );
        assert_eq!(trip.effective_cover(), "https://storage.example/p/1.jpg");

        trip.photos.clear();
        assert_eq!(trip.effective_cover(), PLACEHOLDER_COVER_URL);
    }
}
