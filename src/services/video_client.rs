// src/services/video_client.rs
// DOCUMENTATION: Video generation service client
// PURPOSE: Start a highlight-reel generation, poll it to completion with an
// explicit attempt cap, and download the finished video

use crate::errors::TrailsError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// One observation of a pending video operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    Pending,
    Done { download_url: String },
}

/// Video generation client
pub struct VideoClient {
    client: Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
    max_attempts: u32,
}

#[derive(Debug, Serialize)]
struct StartRequest<'a> {
    prompt: &'a str,
    image_base64: String,
    mime_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    operation_id: String,
}

#[derive(Debug, Deserialize)]
struct OperationResponse {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Build the cinematic prompt for a trip's highlight reel
pub fn build_prompt(title: &str, summary: &str) -> String {
    format!(
        "A cinematic travel video about \"{}\". A short, exciting highlight reel of this trip: {}. Make it feel epic and inspiring.",
        title, summary
    )
}

/// Drive a polling closure until completion or the attempt cap
/// DOCUMENTATION: The loop is bounded by design - an operation that never
/// completes surfaces as a retryable VideoGeneration error instead of
/// polling forever
pub async fn poll_until_done<F, Fut>(
    mut poll: F,
    max_attempts: u32,
    interval: Duration,
) -> Result<String, TrailsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus, TrailsError>>,
{
    for attempt in 1..=max_attempts {
        match poll().await? {
            PollStatus::Done { download_url } => return Ok(download_url),
            PollStatus::Pending => {
                log::debug!("Video operation pending (attempt {}/{})", attempt, max_attempts);
                if attempt < max_attempts {
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
    Err(TrailsError::VideoGeneration(format!(
        "operation still pending after {} polls",
        max_attempts
    )))
}

impl VideoClient {
    pub fn new(
        api_key: String,
        base_url: String,
        poll_interval: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            poll_interval,
            max_attempts,
        }
    }

    /// Generate a video from a cover image and prompt, returning the bytes
    pub async fn generate(
        &self,
        image_bytes: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<Vec<u8>, TrailsError> {
        let operation_id = self.start_operation(image_bytes, mime_type, prompt).await?;
        log::info!("Video operation {} started", operation_id);

        let download_url = poll_until_done(
            || self.poll_operation(&operation_id),
            self.max_attempts,
            self.poll_interval,
        )
        .await?;

        self.download(&download_url).await
    }

    async fn start_operation(
        &self,
        image_bytes: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<String, TrailsError> {
        let url = format!("{}/videos:generate", self.base_url);
        let request = StartRequest {
            prompt,
            image_base64: BASE64.encode(image_bytes),
            mime_type,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TrailsError::VideoGeneration(format!("start failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TrailsError::VideoGeneration(format!(
                "start error {}: {}",
                status, body
            )));
        }

        let started: StartResponse = response
            .json()
            .await
            .map_err(|e| TrailsError::VideoGeneration(format!("start parse: {}", e)))?;
        Ok(started.operation_id)
    }

    async fn poll_operation(&self, operation_id: &str) -> Result<PollStatus, TrailsError> {
        let url = format!("{}/operations/{}", self.base_url, operation_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| TrailsError::VideoGeneration(format!("poll failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TrailsError::VideoGeneration(format!(
                "poll error {}",
                response.status()
            )));
        }

        let operation: OperationResponse = response
            .json()
            .await
            .map_err(|e| TrailsError::VideoGeneration(format!("poll parse: {}", e)))?;

        if let Some(message) = operation.error_message {
            return Err(TrailsError::VideoGeneration(message));
        }

        if operation.done {
            match operation.download_url {
                Some(download_url) => Ok(PollStatus::Done { download_url }),
                None => Err(TrailsError::VideoGeneration(
                    "operation finished without a download link".to_string(),
                )),
            }
        } else {
            Ok(PollStatus::Pending)
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, TrailsError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| TrailsError::VideoGeneration(format!("download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TrailsError::VideoGeneration(format!(
                "download error {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TrailsError::VideoGeneration(format!("download body: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_build_prompt_mentions_title_and_summary() {
        let prompt = build_prompt("Alpine Days", "Four huts in four days");
        assert!(prompt.contains("\"Alpine Days\""));
        assert!(prompt.contains("Four huts in four days"));
    }

    #[test]
    fn test_poll_loop_stops_at_attempt_cap() {
        let attempts = Cell::new(0u32);
        let result = tokio_test::block_on(poll_until_done(
            || {
                attempts.set(attempts.get() + 1);
                async { Ok(PollStatus::Pending) }
            },
            3,
            Duration::from_millis(0),
        ));
        assert_eq!(attempts.get(), 3);
        assert!(matches!(result, Err(TrailsError::VideoGeneration(_))));
    }

    #[test]
    fn test_poll_loop_returns_download_url() {
        let attempts = Cell::new(0u32);
        let result = tokio_test::block_on(poll_until_done(
            || {
                attempts.set(attempts.get() + 1);
                let done = attempts.get() >= 2;
                async move {
                    if done {
                        Ok(PollStatus::Done {
                            download_url: "https://video.example/out.mp4".to_string(),
                        })
                    } else {
                        Ok(PollStatus::Pending)
                    }
                }
            },
            5,
            Duration::from_millis(0),
        ));
        assert_eq!(result.unwrap(), "https://video.example/out.mp4");
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_poll_loop_propagates_poll_errors() {
        let result = tokio_test::block_on(poll_until_done(
            || async { Err(TrailsError::VideoGeneration("backend exploded".to_string())) },
            5,
            Duration::from_millis(0),
        ));
        assert!(matches!(result, Err(TrailsError::VideoGeneration(_))));
    }
}
