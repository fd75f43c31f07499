// src/models/photo.rs
// DOCUMENTATION: Photo records and extracted image metadata
// PURPOSE: Shapes produced by upload + metadata extraction, embedded in trips

use crate::models::{Comment, Like};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Geographic coordinate in signed decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// Camera settings read from EXIF
/// DOCUMENTATION: Present iff at least one field is present; absent fields
/// are omitted individually from the serialized form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<String>,
}

impl CameraDetails {
    pub fn is_empty(&self) -> bool {
        self.model.is_none()
            && self.exposure_time.is_none()
            && self.f_number.is_none()
            && self.iso.is_none()
    }
}

/// A single uploaded photo with its metadata and social state
/// DOCUMENTATION: Created at upload time; the raw bytes live in object
/// storage and only the public content URL is kept here
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: Uuid,
    pub content_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coords: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_details: Option<CameraDetails>,
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// One photo in an upload batch, base64-transported
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PhotoUpload {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    /// Base64-encoded image bytes
    #[validate(length(min = 1))]
    pub content: String,
}
