// src/models/social.rs
// DOCUMENTATION: Social interaction records embedded in trip aggregates
// PURPOSE: Like, comment and rating shapes shared by trips and photos

use crate::models::UserProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A like by one user; at most one per user per target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub user_id: Uuid,
}

/// A comment on a trip or a single photo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user: UserProfile,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A star rating; exactly one per user per trip, value 1-5
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: Uuid,
    pub value: u8,
}

/// Request body for posting a comment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddCommentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

/// Request body for submitting a rating
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RateRequest {
    #[validate(range(min = 1, max = 5))]
    pub value: u8,
}
