// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components and the acting-user extraction

use crate::db::ProfileRepository;
use crate::errors::TrailsError;
use crate::models::UserProfile;
use actix_web::HttpRequest;
use sqlx::PgPool;
use uuid::Uuid;

pub mod auth;
pub mod competitions;
pub mod health;
pub mod profiles;
pub mod trips;

pub use auth::config as auth_config;
pub use competitions::config as competitions_config;
pub use health::config as health_config;
pub use profiles::config as profiles_config;
pub use trips::config as trips_config;

/// Acting user id from the X-User-Id header
/// DOCUMENTATION: The session is established by the identity provider; the
/// gateway forwards the verified subject in this header
pub fn acting_user_id(req: &HttpRequest) -> Result<Uuid, TrailsError> {
    let raw = req
        .headers()
        .get("X-User-Id")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            log::warn!("Request without X-User-Id header");
            TrailsError::Unauthorized
        })?;

    Uuid::parse_str(raw).map_err(|_| {
        log::warn!("Request with malformed X-User-Id header");
        TrailsError::Unauthorized
    })
}

/// Acting user's profile, for operations that embed author identity
pub async fn acting_profile(
    req: &HttpRequest,
    pool: &PgPool,
) -> Result<UserProfile, TrailsError> {
    let user_id = acting_user_id(req)?;
    ProfileRepository::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| {
            log::warn!("Request from unknown user {}", user_id);
            TrailsError::Unauthorized
        })
}
