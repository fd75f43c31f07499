// src/services/social.rs
// DOCUMENTATION: Social interaction reducer
// PURPOSE: Pure transforms over likes, ratings, comments and competition
// ranks; applied locally first, then mirrored to the remote store

use crate::errors::TrailsError;
use crate::models::{Comment, Competition, CompetitionEntry, Like, Rating, UserProfile};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Outcome of a rating upsert, used to phrase the persistence call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingOutcome {
    Added,
    Removed,
    Updated,
}

/// Rank mutation result: which entries changed and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankChange {
    /// Entry whose rank was set (None when the rank was toggled off)
    pub set: Option<Uuid>,
    /// Entry whose rank was displaced, if any
    pub cleared: Option<Uuid>,
}

/// Toggle a like: remove when present, append when absent
/// DOCUMENTATION: At most one like per user per target; self-inverse
pub fn toggle_like(likes: &mut Vec<Like>, user_id: Uuid) {
    let existing = likes.iter().position(|l| l.user_id == user_id);
    match existing {
        Some(index) => {
            likes.remove(index);
        }
        None => likes.push(Like { user_id }),
    }
}

/// Rating upsert: append / remove-on-same-value / overwrite-on-different
pub fn upsert_rating(ratings: &mut Vec<Rating>, user_id: Uuid, value: u8) -> RatingOutcome {
    match ratings.iter_mut().find(|r| r.user_id == user_id) {
        Some(existing) if existing.value == value => {
            ratings.retain(|r| r.user_id != user_id);
            RatingOutcome::Removed
        }
        Some(existing) => {
            existing.value = value;
            RatingOutcome::Updated
        }
        None => {
            ratings.push(Rating { user_id, value });
            RatingOutcome::Added
        }
    }
}

/// Append a comment with sanitized content
pub fn add_comment(
    comments: &mut Vec<Comment>,
    user: UserProfile,
    content: &str,
    now: DateTime<Utc>,
) -> Result<Uuid, TrailsError> {
    let sanitized = content.replace('\0', "").trim().to_string();
    if sanitized.is_empty() {
        return Err(TrailsError::InvalidInput(
            "comment content is empty".to_string(),
        ));
    }
    let id = Uuid::new_v4();
    comments.push(Comment {
        id,
        user,
        content: sanitized,
        created_at: now,
    });
    Ok(id)
}

/// Remove a comment; only its author may do so
pub fn remove_comment(
    comments: &mut Vec<Comment>,
    comment_id: Uuid,
    acting_user: Uuid,
) -> Result<(), TrailsError> {
    let comment = comments
        .iter()
        .find(|c| c.id == comment_id)
        .ok_or_else(|| TrailsError::NotFound(format!("comment {}", comment_id)))?;
    if comment.user.id != acting_user {
        return Err(TrailsError::Forbidden);
    }
    comments.retain(|c| c.id != comment_id);
    Ok(())
}

/// Comments in display order: creation time ascending, regardless of how
/// they were inserted
pub fn sorted_comments(comments: &[Comment]) -> Vec<Comment> {
    let mut sorted = comments.to_vec();
    sorted.sort_by_key(|c| c.created_at);
    sorted
}

/// Assign a podium rank within one competition's entries
/// DOCUMENTATION: Creator-only. Setting the rank an entry already holds
/// toggles it off. Otherwise the entry takes the rank and any other entry
/// currently holding it is cleared, so at most one entry holds a given rank.
pub fn assign_rank(
    entries: &mut [CompetitionEntry],
    entry_id: Uuid,
    rank: i16,
    acting_user: Uuid,
    creator_id: Uuid,
) -> Result<RankChange, TrailsError> {
    if acting_user != creator_id {
        return Err(TrailsError::Forbidden);
    }
    if !(1..=3).contains(&rank) {
        return Err(TrailsError::InvalidInput(format!(
            "rank must be 1-3, got {}",
            rank
        )));
    }

    let target_index = entries
        .iter()
        .position(|e| e.id == entry_id)
        .ok_or_else(|| TrailsError::NotFound(format!("entry {}", entry_id)))?;

    if entries[target_index].rank == Some(rank) {
        entries[target_index].rank = None;
        return Ok(RankChange {
            set: None,
            cleared: Some(entry_id),
        });
    }

    let mut displaced = None;
    for entry in entries.iter_mut() {
        if entry.id != entry_id && entry.rank == Some(rank) {
            entry.rank = None;
            displaced = Some(entry.id);
        }
    }

    entries[target_index].rank = Some(rank);
    Ok(RankChange {
        set: Some(entry_id),
        cleared: displaced,
    })
}

/// Quota and window gate for competition submissions
/// DOCUMENTATION: Evaluated before any upload or insert is issued
pub fn can_submit_entry(
    competition: &Competition,
    existing_entries: &[CompetitionEntry],
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), TrailsError> {
    if !competition.is_active(now) {
        return Err(TrailsError::InvalidInput(
            "competition is no longer accepting entries".to_string(),
        ));
    }
    let submitted = existing_entries
        .iter()
        .filter(|e| e.user_id == user_id)
        .count();
    if submitted >= competition.max_entries_per_user as usize {
        return Err(TrailsError::InvalidInput(format!(
            "entry quota of {} reached",
            competition.max_entries_per_user
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn user(name: &str) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            username: name.to_string(),
            avatar_url: format!("https://picsum.photos/seed/{}/100/100", name),
        }
    }

    fn entry(competition_id: Uuid, user_id: Uuid, rank: Option<i16>) -> CompetitionEntry {
        CompetitionEntry {
            id: Uuid::new_v4(),
            competition_id,
            user_id,
            photo_url: "https://storage.example/e.jpg".to_string(),
            submitted_at: Utc::now(),
            rank,
            votes: Vec::new(),
        }
    }

    #[test]
    fn test_like_toggle_is_self_inverse() {
        let user_id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut likes = vec![Like { user_id: other }];
        let original = likes.clone();

        toggle_like(&mut likes, user_id);
        assert_eq!(likes.len(), 2);

        toggle_like(&mut likes, user_id);
        assert_eq!(likes, original);
    }

    #[test]
    fn test_like_unique_per_user() {
        let user_id = Uuid::new_v4();
        let mut likes = Vec::new();
        toggle_like(&mut likes, user_id);
        toggle_like(&mut likes, user_id);
        toggle_like(&mut likes, user_id);
        assert_eq!(likes.len(), 1);
    }

    #[test]
    fn test_rating_same_value_removes() {
        let user_id = Uuid::new_v4();
        let mut ratings = Vec::new();
        assert_eq!(upsert_rating(&mut ratings, user_id, 4), RatingOutcome::Added);
        assert_eq!(
            upsert_rating(&mut ratings, user_id, 4),
            RatingOutcome::Removed
        );
        assert!(ratings.is_empty());
    }

    #[test]
    fn test_rating_different_value_overwrites() {
        let user_id = Uuid::new_v4();
        let mut ratings = Vec::new();
        upsert_rating(&mut ratings, user_id, 5);
        assert_eq!(
            upsert_rating(&mut ratings, user_id, 2),
            RatingOutcome::Updated
        );
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].value, 2);
    }

    #[test]
    fn test_comment_sanitized_and_sorted() {
        let author = user("nia");
        let mut comments = Vec::new();
        let later = Utc::now();
        let earlier = later - Duration::minutes(5);

        add_comment(&mut comments, author.clone(), "  second\0 ", later).unwrap();
        add_comment(&mut comments, author, "first", earlier).unwrap();

        assert_eq!(comments[0].content, "second");

        let ordered = sorted_comments(&comments);
        assert_eq!(ordered[0].content, "first");
        assert_eq!(ordered[1].content, "second");
    }

    #[test]
    fn test_empty_comment_rejected() {
        let mut comments = Vec::new();
        let result = add_comment(&mut comments, user("nia"), " \0 ", Utc::now());
        assert!(matches!(result, Err(TrailsError::InvalidInput(_))));
    }

    #[test]
    fn test_comment_delete_author_only() {
        let author = user("amir");
        let stranger = Uuid::new_v4();
        let mut comments = Vec::new();
        let id = add_comment(&mut comments, author.clone(), "hello", Utc::now()).unwrap();

        assert!(matches!(
            remove_comment(&mut comments, id, stranger),
            Err(TrailsError::Forbidden)
        ));
        remove_comment(&mut comments, id, author.id).unwrap();
        assert!(comments.is_empty());
    }

    #[test]
    fn test_rank_displacement() {
        let competition_id = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let mut entries = vec![
            entry(competition_id, Uuid::new_v4(), Some(1)),
            entry(competition_id, Uuid::new_v4(), None),
            entry(competition_id, Uuid::new_v4(), Some(2)),
        ];
        let previous_holder = entries[0].id;
        let target = entries[1].id;

        let change = assign_rank(&mut entries, target, 1, creator, creator).unwrap();
        assert_eq!(change.set, Some(target));
        assert_eq!(change.cleared, Some(previous_holder));
        assert_eq!(entries[0].rank, None);
        assert_eq!(entries[1].rank, Some(1));
        // Unrelated ranks untouched
        assert_eq!(entries[2].rank, Some(2));
    }

    #[test]
    fn test_rank_toggle_off() {
        let competition_id = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let mut entries = vec![entry(competition_id, Uuid::new_v4(), Some(3))];
        let target = entries[0].id;

        let change = assign_rank(&mut entries, target, 3, creator, creator).unwrap();
        assert_eq!(change.set, None);
        assert_eq!(change.cleared, Some(target));
        assert_eq!(entries[0].rank, None);
    }

    #[test]
    fn test_rank_creator_only() {
        let competition_id = Uuid::new_v4();
        let creator = Uuid::new_v4();
        let mut entries = vec![entry(competition_id, Uuid::new_v4(), None)];
        let target = entries[0].id;

        let result = assign_rank(&mut entries, target, 1, Uuid::new_v4(), creator);
        assert!(matches!(result, Err(TrailsError::Forbidden)));
    }

    #[test]
    fn test_entry_quota_rejected_before_network() {
        let creator = Uuid::new_v4();
        let contestant = Uuid::new_v4();
        let competition = Competition {
            id: Uuid::new_v4(),
            creator_id: creator,
            title: "Skyline".to_string(),
            description: String::new(),
            ends_on: NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
            max_entries_per_user: 1,
            created_at: Utc::now(),
        };
        let entries = vec![entry(competition.id, contestant, None)];

        let result = can_submit_entry(&competition, &entries, contestant, Utc::now());
        assert!(matches!(result, Err(TrailsError::InvalidInput(_))));

        // A different user is still under quota
        assert!(can_submit_entry(&competition, &entries, Uuid::new_v4(), Utc::now()).is_ok());
    }

    #[test]
    fn test_entry_rejected_after_deadline() {
        let competition = Competition {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            title: "Closed".to_string(),
            description: String::new(),
            ends_on: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            max_entries_per_user: 5,
            created_at: Utc::now(),
        };
        let result = can_submit_entry(&competition, &[], Uuid::new_v4(), Utc::now());
        assert!(matches!(result, Err(TrailsError::InvalidInput(_))));
    }
}
