// src/services/story_client.rs
// DOCUMENTATION: Generative story service client
// PURPOSE: Handle communication with the external narrative-generation API

use crate::errors::TrailsError;
use crate::models::{Coordinate, TripAggregate};
use crate::services::itinerary::StoryDraft;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Story service client
/// DOCUMENTATION: Handles authentication and API calls to the generative
/// service; responses are treated as untrusted drafts, validated downstream
pub struct StoryClient {
    /// HTTP client for making requests
    client: Client,
    /// Story service API key
    api_key: String,
    /// Base URL for the story service
    base_url: String,
}

/// Request payload for a synthesis call
/// DOCUMENTATION: An ordered list of coordinates (null placeholders for
/// photos without GPS) plus, for merges, the existing trip's serialized state
#[derive(Debug, Serialize)]
struct StoryRequest {
    coordinates: Vec<Option<Coordinate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    existing: Option<Value>,
}

/// Envelope returned by the story service
#[derive(Debug, Deserialize)]
struct StoryResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    draft: StoryDraft,
    #[serde(default)]
    error_message: Option<String>,
}

impl StoryClient {
    /// Create new story service client
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    /// Whether a real API key is configured
    /// DOCUMENTATION: Without one the caller falls back to local drafts
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Request a narrative draft for an ordered list of photo coordinates
    ///
    /// # Arguments
    /// * `coordinates` - one entry per photo, input order, None when unlocated
    /// * `existing` - for incremental merges, the current trip state
    ///
    /// # Returns
    /// The untrusted draft; callers must run it through `itinerary::synthesize`
    pub async fn generate_draft(
        &self,
        coordinates: Vec<Option<Coordinate>>,
        existing: Option<&TripAggregate>,
    ) -> Result<StoryDraft, TrailsError> {
        let url = format!("{}/stories:generate", self.base_url);

        let existing = match existing {
            Some(trip) => Some(serde_json::to_value(trip.to_blob()).map_err(|e| {
                TrailsError::ExternalApiError(format!("existing trip encode: {}", e))
            })?),
            None => None,
        };

        log::debug!(
            "Story service draft request: {} coordinates, merge={}",
            coordinates.len(),
            existing.is_some()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&StoryRequest {
                coordinates,
                existing,
            })
            .send()
            .await
            .map_err(|e| {
                log::error!("Story service request failed: {}", e);
                TrailsError::ExternalApiError(format!("Request failed: {}", e))
            })?;

        if response.status().as_u16() == 429 {
            log::error!("Story service quota exceeded");
            return Err(TrailsError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Story service error {}: {}", status, body);
            return Err(TrailsError::ExternalApiError(format!(
                "API error {}: {}",
                status, body
            )));
        }

        let api_response: StoryResponse = response.json().await.map_err(|e| {
            log::error!("Failed to parse story service response: {}", e);
            TrailsError::ExternalApiError(format!("Parse error: {}", e))
        })?;

        match api_response.status.as_str() {
            "OK" | "" => {
                log::info!(
                    "Story service returned a draft with {} stops",
                    api_response.draft.stops.len()
                );
                Ok(api_response.draft)
            }
            other => {
                let msg = api_response
                    .error_message
                    .unwrap_or_else(|| format!("Unknown status: {}", other));
                log::error!("Story service unexpected status: {}", msg);
                Err(TrailsError::ExternalApiError(msg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_without_key() {
        let client = StoryClient::new(String::new(), "http://localhost:9100/v1".to_string());
        assert!(!client.is_configured());

        let client = StoryClient::new("key".to_string(), "http://localhost:9100/v1".to_string());
        assert!(client.is_configured());
    }

    #[test]
    fn test_partial_response_still_deserializes() {
        // The wire shape is untrusted; missing fields default
        let raw = r#"{"status": "OK", "draft": {"stops": [{"photo_indexes": [0]}]}}"#;
        let parsed: StoryResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.draft.stops.len(), 1);
        assert!(parsed.draft.title.is_empty());
        assert!(parsed.draft.stops[0].name.is_empty());
    }
}
