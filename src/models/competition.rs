// src/models/competition.rs
// DOCUMENTATION: Photo competition records
// PURPOSE: Competitions, entries, and their request/response DTOs

use crate::models::Like;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A photo competition
/// DOCUMENTATION: Maps directly to the competitions table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Competition {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub description: String,
    /// Submissions accepted through 23:59:59.999 UTC of this date
    pub ends_on: NaiveDate,
    pub max_entries_per_user: i32,
    pub created_at: DateTime<Utc>,
}

impl Competition {
    /// Whether the competition still accepts submissions at `now`
    /// DOCUMENTATION: The end date is inclusive through the last millisecond
    /// of that UTC day
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        let deadline = self
            .ends_on
            .and_hms_milli_opt(23, 59, 59, 999)
            .map(|naive| Utc.from_utc_datetime(&naive));
        match deadline {
            Some(deadline) => now <= deadline,
            None => false,
        }
    }
}

/// A single submission to a competition
/// DOCUMENTATION: Votes live as JSONB on the entries row; the repository
/// handles that mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionEntry {
    pub id: Uuid,
    pub competition_id: Uuid,
    pub user_id: Uuid,
    pub photo_url: String,
    pub submitted_at: DateTime<Utc>,
    /// Podium rank 1-3; at most one entry holds a given rank per competition
    pub rank: Option<i16>,
    #[serde(default)]
    pub votes: Vec<Like>,
}

/// Request to create a competition
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompetitionRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(max = 4000))]
    pub description: String,
    pub ends_on: NaiveDate,
    #[validate(range(min = 1, max = 100))]
    pub max_entries_per_user: i32,
}

/// Request to submit an entry (photo transported as base64)
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitEntryRequest {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    #[validate(length(min = 1))]
    pub content: String,
}

/// Request to assign or toggle a podium rank
#[derive(Debug, Deserialize, Validate)]
pub struct SetRankRequest {
    #[validate(range(min = 1, max = 3))]
    pub rank: i16,
}

/// Competition detail including its entries
#[derive(Debug, Serialize)]
pub struct CompetitionDetailResponse {
    #[serde(flatten)]
    pub competition: Competition,
    pub active: bool,
    pub entries: Vec<CompetitionEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn competition_ending(ends_on: NaiveDate) -> Competition {
        Competition {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            title: "Golden hour".to_string(),
            description: "Best golden hour shot".to_string(),
            ends_on,
            max_entries_per_user: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_active_through_end_of_day() {
        let comp = competition_ending(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        let last_ms = Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap();
        let next_day = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        assert!(comp.is_active(last_ms));
        assert!(!comp.is_active(next_day));
    }
}
