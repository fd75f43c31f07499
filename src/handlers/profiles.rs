// src/handlers/profiles.rs
// DOCUMENTATION: HTTP handlers for profile views
// PURPOSE: Public profile with the user's trips

use crate::db::{ProfileRepository, TripRepository};
use crate::errors::TrailsError;
use crate::models::{TripCardResponse, UserProfile};
use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Profile page payload: the profile plus its trip cards
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub trips: Vec<TripCardResponse>,
}

/// GET /profiles/{id}
pub async fn get_profile(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, TrailsError> {
    let user_id = path.into_inner();
    let profile = ProfileRepository::get_by_id(pool.get_ref(), user_id).await?;
    let trips = TripRepository::list_by_owner(pool.get_ref(), user_id).await?;
    let cards = trips.iter().map(|t| t.to_card()).collect();

    Ok(HttpResponse::Ok().json(ProfileResponse {
        profile,
        trips: cards,
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/profiles").route("/{id}", web::get().to(get_profile)));
}
