// src/handlers/auth.rs
// DOCUMENTATION: HTTP handlers for sign-in flows
// PURPOSE: Bridge the identity provider, profile provisioning and the
// session state machine

use crate::db::ProfileRepository;
use crate::errors::TrailsError;
use crate::models::UserProfile;
use crate::services::{AuthClient, AuthSession, SessionTracker};
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub profile: UserProfile,
}

/// POST /auth/login
pub async fn login(
    pool: web::Data<PgPool>,
    auth: web::Data<AuthClient>,
    tracker: web::Data<Arc<SessionTracker>>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, TrailsError> {
    let session = auth.sign_in(&body.email, &body.password).await?;
    let response = establish(pool.get_ref(), &tracker, session).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /auth/otp
pub async fn send_otp(
    auth: web::Data<AuthClient>,
    body: web::Json<OtpRequest>,
) -> Result<impl Responder, TrailsError> {
    auth.send_otp(&body.email).await?;
    Ok(HttpResponse::Accepted().finish())
}

/// POST /auth/verify
pub async fn verify_otp(
    pool: web::Data<PgPool>,
    auth: web::Data<AuthClient>,
    tracker: web::Data<Arc<SessionTracker>>,
    body: web::Json<VerifyRequest>,
) -> Result<impl Responder, TrailsError> {
    let session = auth.verify_otp(&body.email, &body.token).await?;
    let response = establish(pool.get_ref(), &tracker, session).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /auth/logout
pub async fn logout(
    auth: web::Data<AuthClient>,
    tracker: web::Data<Arc<SessionTracker>>,
    body: web::Json<LogoutRequest>,
) -> Result<impl Responder, TrailsError> {
    auth.sign_out(&body.access_token).await?;
    tracker.signed_out();
    Ok(HttpResponse::NoContent().finish())
}

/// Provision the profile on first verified sign-in and record the
/// session transition
async fn establish(
    pool: &PgPool,
    tracker: &SessionTracker,
    session: AuthSession,
) -> Result<SessionResponse, TrailsError> {
    let profile = match ProfileRepository::find_by_id(pool, session.user_id).await? {
        Some(existing) => existing,
        None => {
            let mut fresh = UserProfile::provisioned(session.user_id, &session.email);
            if ProfileRepository::find_by_username(pool, &fresh.username)
                .await?
                .is_some()
            {
                // Another account already claimed the email local part
                fresh.username = format!("{}-{}", fresh.username, &fresh.id.to_string()[..6]);
            }
            log::info!(
                "Provisioning profile {} for first sign-in ({})",
                fresh.username,
                fresh.id
            );
            ProfileRepository::insert(pool, &fresh).await?
        }
    };

    tracker.signed_in(profile.clone());
    Ok(SessionResponse {
        access_token: session.access_token,
        profile,
    })
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(login))
            .route("/otp", web::post().to(send_otp))
            .route("/verify", web::post().to(verify_otp))
            .route("/logout", web::post().to(logout)),
    );
}
