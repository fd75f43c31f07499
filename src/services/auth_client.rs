// src/services/auth_client.rs
// DOCUMENTATION: Identity provider client
// PURPOSE: Sign-in, one-time-code flows and sign-out against the hosted
// identity API

use crate::errors::TrailsError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A confirmed session from the identity provider
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub access_token: String,
    pub email: String,
}

/// Identity provider client
pub struct AuthClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct OtpRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct OtpVerify<'a> {
    email: &'a str,
    token: &'a str,
}

impl AuthClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Credential sign-in; 401/403 become Unauthorized, everything else
    /// an external API failure
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, TrailsError> {
        let url = format!("{}/token?grant_type=password", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(|e| {
                log::error!("Auth sign-in request failed: {}", e);
                TrailsError::ExternalApiError(format!("Request failed: {}", e))
            })?;

        Self::session_from(response).await
    }

    /// Send a one-time code to the given address
    pub async fn send_otp(&self, email: &str) -> Result<(), TrailsError> {
        let url = format!("{}/otp", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&OtpRequest { email })
            .send()
            .await
            .map_err(|e| {
                log::error!("OTP request failed: {}", e);
                TrailsError::ExternalApiError(format!("Request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("OTP send error {}: {}", status, body);
            return Err(TrailsError::ExternalApiError(format!(
                "API error {}: {}",
                status, body
            )));
        }
        Ok(())
    }

    /// Exchange a one-time code for a session
    pub async fn verify_otp(&self, email: &str, token: &str) -> Result<AuthSession, TrailsError> {
        let url = format!("{}/verify", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&OtpVerify { email, token })
            .send()
            .await
            .map_err(|e| {
                log::error!("OTP verify request failed: {}", e);
                TrailsError::ExternalApiError(format!("Request failed: {}", e))
            })?;

        Self::session_from(response).await
    }

    /// Revoke the session on the provider side
    pub async fn sign_out(&self, access_token: &str) -> Result<(), TrailsError> {
        let url = format!("{}/logout", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                log::error!("Sign-out request failed: {}", e);
                TrailsError::ExternalApiError(format!("Request failed: {}", e))
            })?;

        if !response.status().is_success() {
            log::warn!("Sign-out returned {}", response.status());
        }
        Ok(())
    }

    async fn session_from(response: reqwest::Response) -> Result<AuthSession, TrailsError> {
        match response.status().as_u16() {
            200 | 201 => response.json::<AuthSession>().await.map_err(|e| {
                log::error!("Failed to parse identity response: {}", e);
                TrailsError::ExternalApiError(format!("Parse error: {}", e))
            }),
            401 | 403 => {
                log::warn!("Identity provider rejected the credentials");
                Err(TrailsError::Unauthorized)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                log::error!("Identity provider error {}: {}", status, body);
                Err(TrailsError::ExternalApiError(format!(
                    "API error {}: {}",
                    status, body
                )))
            }
        }
    }
}
