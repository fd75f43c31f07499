// src/handlers/trips.rs
// DOCUMENTATION: HTTP handlers for trip operations
// PURPOSE: Parse requests, call the trip service, return responses

use crate::db::TripRepository;
use crate::errors::TrailsError;
use crate::handlers::{acting_profile, acting_user_id};
use crate::models::{
    AddCommentRequest, AddPhotosRequest, CreateTripRequest, RateRequest, TripCardResponse,
    UpdateTripRequest,
};
use crate::services::{social, TripService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// GET /trips
/// Feed of trip cards, newest first
pub async fn list_trips(pool: web::Data<PgPool>) -> Result<impl Responder, TrailsError> {
    let trips = TripRepository::list_feed(pool.get_ref()).await?;
    let cards: Vec<TripCardResponse> = trips.iter().map(|t| t.to_card()).collect();
    Ok(HttpResponse::Ok().json(cards))
}

/// POST /trips
/// Create a trip from an upload batch
pub async fn create_trip(
    pool: web::Data<PgPool>,
    service: web::Data<TripService>,
    req: HttpRequest,
    body: web::Json<CreateTripRequest>,
) -> Result<impl Responder, TrailsError> {
    if let Err(e) = body.validate() {
        return Err(TrailsError::ValidationError(e.to_string()));
    }

    let owner = acting_profile(&req, pool.get_ref()).await?;
    let trip = service
        .create_trip(pool.get_ref(), &owner, &body.photos)
        .await?;
    Ok(HttpResponse::Created().json(trip))
}

/// GET /trips/{id}
/// Comments render in creation order regardless of how they were stored
pub async fn get_trip(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, TrailsError> {
    let mut trip = TripRepository::get_by_id(pool.get_ref(), path.into_inner()).await?;
    trip.comments = social::sorted_comments(&trip.comments);
    for photo in &mut trip.photos {
        photo.comments = social::sorted_comments(&photo.comments);
    }
    Ok(HttpResponse::Ok().json(trip))
}

/// PUT /trips/{id}
/// Edit-mode commit
pub async fn update_trip(
    pool: web::Data<PgPool>,
    service: web::Data<TripService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdateTripRequest>,
) -> Result<impl Responder, TrailsError> {
    if let Err(e) = body.validate() {
        return Err(TrailsError::ValidationError(e.to_string()));
    }

    let acting_user = acting_user_id(&req)?;
    let trip = service
        .update_trip(pool.get_ref(), path.into_inner(), acting_user, &body)
        .await?;
    Ok(HttpResponse::Ok().json(trip))
}

/// DELETE /trips/{id}
/// Preview-mode discard
pub async fn discard_trip(
    pool: web::Data<PgPool>,
    service: web::Data<TripService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, TrailsError> {
    let acting_user = acting_user_id(&req)?;
    service
        .discard_trip(pool.get_ref(), path.into_inner(), acting_user)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /trips/{id}/photos
/// Incremental merge of additional photos
pub async fn add_photos(
    pool: web::Data<PgPool>,
    service: web::Data<TripService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<AddPhotosRequest>,
) -> Result<impl Responder, TrailsError> {
    if let Err(e) = body.validate() {
        return Err(TrailsError::ValidationError(e.to_string()));
    }

    let acting_user = acting_user_id(&req)?;
    let trip = service
        .add_photos(pool.get_ref(), path.into_inner(), acting_user, &body.photos)
        .await?;
    Ok(HttpResponse::Ok().json(trip))
}

/// POST /trips/{id}/video
/// Generate the highlight-reel video
pub async fn generate_video(
    pool: web::Data<PgPool>,
    service: web::Data<TripService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, TrailsError> {
    let acting_user = acting_user_id(&req)?;
    let trip = service
        .generate_video(pool.get_ref(), path.into_inner(), acting_user)
        .await?;
    Ok(HttpResponse::Ok().json(trip))
}

/// POST /trips/{id}/like
pub async fn like_trip(
    pool: web::Data<PgPool>,
    service: web::Data<TripService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<impl Responder, TrailsError> {
    let acting_user = acting_user_id(&req)?;
    let trip = service
        .like_trip(pool.get_ref(), path.into_inner(), acting_user)
        .await?;
    Ok(HttpResponse::Ok().json(trip))
}

/// POST /trips/{id}/rating
pub async fn rate_trip(
    pool: web::Data<PgPool>,
    service: web::Data<TripService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<RateRequest>,
) -> Result<impl Responder, TrailsError> {
    if let Err(e) = body.validate() {
        return Err(TrailsError::ValidationError(e.to_string()));
    }

    let acting_user = acting_user_id(&req)?;
    let trip = service
        .rate_trip(pool.get_ref(), path.into_inner(), acting_user, body.value)
        .await?;
    Ok(HttpResponse::Ok().json(trip))
}

/// POST /trips/{id}/comments
pub async fn comment_on_trip(
    pool: web::Data<PgPool>,
    service: web::Data<TripService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<AddCommentRequest>,
) -> Result<impl Responder, TrailsError> {
    if let Err(e) = body.validate() {
        return Err(TrailsError::ValidationError(e.to_string()));
    }

    let author = acting_profile(&req, pool.get_ref()).await?;
    let trip = service
        .comment_on_trip(pool.get_ref(), path.into_inner(), author, &body.content)
        .await?;
    Ok(HttpResponse::Created().json(trip))
}

/// DELETE /trips/{id}/comments/{comment_id}
pub async fn delete_trip_comment(
    pool: web::Data<PgPool>,
    service: web::Data<TripService>,
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<impl Responder, TrailsError> {
    let (trip_id, comment_id) = path.into_inner();
    let acting_user = acting_user_id(&req)?;
    let trip = service
        .delete_trip_comment(pool.get_ref(), trip_id, comment_id, acting_user)
        .await?;
    Ok(HttpResponse::Ok().json(trip))
}

/// POST /trips/{id}/photos/{photo_id}/like
pub async fn like_photo(
    pool: web::Data<PgPool>,
    service: web::Data<TripService>,
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<impl Responder, TrailsError> {
    let (trip_id, photo_id) = path.into_inner();
    let acting_user = acting_user_id(&req)?;
    let trip = service
        .like_photo(pool.get_ref(), trip_id, photo_id, acting_user)
        .await?;
    Ok(HttpResponse::Ok().json(trip))
}

/// POST /trips/{id}/photos/{photo_id}/comments
pub async fn comment_on_photo(
    pool: web::Data<PgPool>,
    service: web::Data<TripService>,
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<AddCommentRequest>,
) -> Result<impl Responder, TrailsError> {
    if let Err(e) = body.validate() {
        return Err(TrailsError::ValidationError(e.to_string()));
    }

    let (trip_id, photo_id) = path.into_inner();
    let author = acting_profile(&req, pool.get_ref()).await?;
    let trip = service
        .comment_on_photo(pool.get_ref(), trip_id, photo_id, author, &body.content)
        .await?;
    Ok(HttpResponse::Created().json(trip))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/trips")
            .route("", web::get().to(list_trips))
            .route("", web::post().to(create_trip))
            .route("/{id}", web::get().to(get_trip))
            .route("/{id}", web::put().to(update_trip))
            .route("/{id}", web::delete().to(discard_trip))
            .route("/{id}/photos", web::post().to(add_photos))
            .route("/{id}/video", web::post().to(generate_video))
            .route("/{id}/like", web::post().to(like_trip))
            .route("/{id}/rating", web::post().to(rate_trip))
            .route("/{id}/comments", web::post().to(comment_on_trip))
            .route(
                "/{id}/comments/{comment_id}",
                web::delete().to(delete_trip_comment),
            )
            .route("/{id}/photos/{photo_id}/like", web::post().to(like_photo))
            .route(
                "/{id}/photos/{photo_id}/comments",
                web::post().to(comment_on_photo),
            ),
    );
}
