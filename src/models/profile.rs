// src/models/profile.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Public profile of an authenticated user
/// DOCUMENTATION: Maps directly to the profiles table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: String,
}

impl UserProfile {
    /// Build the default profile provisioned on first sign-in
    /// DOCUMENTATION: Username derives from the email local part, avatar
    /// from a deterministic placeholder seed, matching the product behavior
    pub fn provisioned(id: Uuid, email: &str) -> Self {
        let username = email
            .split('@')
            .next()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("user_{}", &id.to_string()[..6]));
        let avatar_url = format!("https://picsum.photos/seed/{}/100/100", username);
        UserProfile {
            id,
            username,
            avatar_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provisioned_from_email() {
        let id = Uuid::new_v4();
        let profile = UserProfile::provisioned(id, "wanda@example.com");
        assert_eq!(profile.username, "wanda");
        assert!(profile.avatar_url.contains("wanda"));
    }

    #[test]
    fn test_provisioned_fallback_username() {
        let id = Uuid::new_v4();
        let profile = UserProfile::provisioned(id, "@nodomain");
        assert!(profile.username.starts_with("user_"));
    }
}
