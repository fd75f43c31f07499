// src/services/storage_client.rs
// DOCUMENTATION: Object storage client
// PURPOSE: Upload photo content and resolve public URLs

use crate::errors::TrailsError;
use reqwest::Client;
use uuid::Uuid;

/// Object storage client
/// DOCUMENTATION: Uploads under a path namespaced by owner id with a fresh
/// unique name, preserving the original filename as a suffix for traceability
pub struct StorageClient {
    client: Client,
    base_url: String,
    bucket: String,
}

impl StorageClient {
    pub fn new(base_url: String, bucket: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            bucket,
        }
    }

    /// Build the storage path for an upload
    /// Format: `{owner_id}/{uuid}-{original_filename}`
    pub fn object_path(owner_id: Uuid, filename: &str) -> String {
        // Strip any path components a client might smuggle in
        let safe_name = filename
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or(filename)
            .replace('\0', "");
        format!("{}/{}-{}", owner_id, Uuid::new_v4(), safe_name)
    }

    /// Publicly resolvable URL for a stored object
    pub fn public_url(&self, path: &str) -> String {
        format!("{}/object/public/{}/{}", self.base_url, self.bucket, path)
    }

    /// Upload photo bytes, returning the public content URL
    pub async fn upload(
        &self,
        owner_id: Uuid,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, TrailsError> {
        let path = Self::object_path(owner_id, filename);
        let url = format!("{}/object/{}/{}", self.base_url, self.bucket, path);

        log::debug!("Uploading {} bytes to {}", bytes.len(), path);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                log::error!("Storage upload failed: {}", e);
                TrailsError::StorageError(format!("Upload failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Storage upload error {}: {}", status, body);
            return Err(TrailsError::StorageError(format!(
                "Upload error {}: {}",
                status, body
            )));
        }

        Ok(self.public_url(&path))
    }

    /// Download stored bytes by public URL (used for video cover frames)
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, TrailsError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            log::error!("Storage download failed: {}", e);
            TrailsError::StorageError(format!("Download failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(TrailsError::StorageError(format!(
                "Download error {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TrailsError::StorageError(format!("Download body: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path_namespaced_and_traceable() {
        let owner = Uuid::new_v4();
        let path = StorageClient::object_path(owner, "beach sunset.jpg");
        assert!(path.starts_with(&format!("{}/", owner)));
        assert!(path.ends_with("-beach sunset.jpg"));
    }

    #[test]
    fn test_object_path_strips_directories() {
        let owner = Uuid::new_v4();
        let path = StorageClient::object_path(owner, "../../etc/passwd");
        assert!(!path.contains(".."));
        assert!(path.ends_with("-passwd"));
    }

    #[test]
    fn test_object_path_unique_per_upload() {
        let owner = Uuid::new_v4();
        let a = StorageClient::object_path(owner, "a.jpg");
        let b = StorageClient::object_path(owner, "a.jpg");
        assert_ne!(a, b);
    }

    #[test]
    fn test_public_url_shape() {
        let client = StorageClient::new(
            "http://localhost:9000/storage/v1".to_string(),
            "trip-photos".to_string(),
        );
        let url = client.public_url("owner/name.jpg");
        assert_eq!(
            url,
            "http://localhost:9000/storage/v1/object/public/trip-photos/owner/name.jpg"
        );
    }
}
