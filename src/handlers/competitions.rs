// src/handlers/competitions.rs
// DOCUMENTATION: HTTP handlers for competition operations
// PURPOSE: Parse requests, call the competition service, return responses

use crate::errors::TrailsError;
use crate::handlers::acting_user_id;
use crate::models::{CreateCompetitionRequest, SetRankRequest, SubmitEntryRequest};
use crate::services::CompetitionService;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// GET /competitions
pub async fn list_competitions(
    pool: web::Data<PgPool>,
    service: web::Data<CompetitionService>,
) -> Result<impl Responder, TrailsError> {
    let competitions = service.list(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(competitions))
}

/// POST /competitions
pub async fn create_competition(
    pool: web::Data<PgPool>,
    service: web::Data<CompetitionService>,
    req: HttpRequest,
    body: web::Json<CreateCompetitionRequest>,
) -> Result<impl Responder, TrailsError> {
    if let Err(e) = body.validate() {
        return Err(TrailsError::ValidationError(e.to_string()));
    }

    let creator = acting_user_id(&req)?;
    let competition = service.create(pool.get_ref(), creator, &body).await?;
    Ok(HttpResponse::Created().json(competition))
}

/// GET /competitions/{id}
/// Detail with entries, ranked first
pub async fn get_competition(
    pool: web::Data<PgPool>,
    service: web::Data<CompetitionService>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, TrailsError> {
    let detail = service.get_detail(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// POST /competitions/{id}/entries
/// Submit an entry photo (base64 transported)
pub async fn submit_entry(
    pool: web::Data<PgPool>,
    service: web::Data<CompetitionService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<SubmitEntryRequest>,
) -> Result<impl Responder, TrailsError> {
    if let Err(e) = body.validate() {
        return Err(TrailsError::ValidationError(e.to_string()));
    }

    let user_id = acting_user_id(&req)?;
    let entry = service
        .submit_entry(
            pool.get_ref(),
            path.into_inner(),
            user_id,
            &body.filename,
            &body.content,
        )
        .await?;
    Ok(HttpResponse::Created().json(entry))
}

/// POST /competitions/{id}/entries/{entry_id}/vote
pub async fn vote_entry(
    pool: web::Data<PgPool>,
    service: web::Data<CompetitionService>,
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<impl Responder, TrailsError> {
    let (_competition_id, entry_id) = path.into_inner();
    let user_id = acting_user_id(&req)?;
    let entry = service.vote_entry(pool.get_ref(), entry_id, user_id).await?;
    Ok(HttpResponse::Ok().json(entry))
}

/// PUT /competitions/{id}/entries/{entry_id}/rank
/// Creator-only podium assignment
pub async fn set_rank(
    pool: web::Data<PgPool>,
    service: web::Data<CompetitionService>,
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<SetRankRequest>,
) -> Result<impl Responder, TrailsError> {
    if let Err(e) = body.validate() {
        return Err(TrailsError::ValidationError(e.to_string()));
    }

    let (competition_id, entry_id) = path.into_inner();
    let acting_user = acting_user_id(&req)?;
    let entries = service
        .set_rank(pool.get_ref(), competition_id, entry_id, body.rank, acting_user)
        .await?;
    Ok(HttpResponse::Ok().json(entries))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/competitions")
            .route("", web::get().to(list_competitions))
            .route("", web::post().to(create_competition))
            .route("/{id}", web::get().to(get_competition))
            .route("/{id}/entries", web::post().to(submit_entry))
            .route(
                "/{id}/entries/{entry_id}/vote",
                web::post().to(vote_entry),
            )
            .route(
                "/{id}/entries/{entry_id}/rank",
                web::put().to(set_rank),
            ),
    );
}
