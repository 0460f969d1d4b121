use crate::config::AppConfig;
use crate::errors::ServiceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{instrument, warn};

/// Marker asset id for images that were submitted as plain URLs and never
/// uploaded through the media host.
pub const EXISTING_ASSET_ID: &str = "existing";

/// A stored image: its public URL and the opaque id needed to delete it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaAsset {
    pub url: String,
    pub asset_id: String,
}

impl MediaAsset {
    /// True when the asset was uploaded through the media host and can be
    /// deleted by id.
    pub fn is_managed(&self) -> bool {
        self.asset_id != EXISTING_ASSET_ID && !self.asset_id.is_empty()
    }
}

#[derive(Debug, Serialize)]
struct UploadRequest<'a> {
    file: &'a str,
    folder: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

/// Client for the external media host. Inline (`data:image/...`) payloads
/// are uploaded; plain URLs pass through untouched.
#[derive(Clone)]
pub struct MediaClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    folder: String,
}

impl MediaClient {
    pub fn new(base_url: String, api_key: Option<String>, folder: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            folder,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.media_base_url.clone(),
            config.media_api_key.clone(),
            config.media_folder.clone(),
        )
    }

    /// Whether a submitted image needs uploading (inline data) or is
    /// already a hosted URL.
    pub fn is_inline_image(image: &str) -> bool {
        image.starts_with("data:image")
    }

    /// Stores one image. URLs pass through with the `existing` marker id;
    /// inline payloads are uploaded under `folder/subfolder`.
    #[instrument(skip(self, image))]
    pub async fn store_image(
        &self,
        image: &str,
        subfolder: &str,
        public_id_hint: Option<&str>,
    ) -> Result<MediaAsset, ServiceError> {
        if !Self::is_inline_image(image) {
            return Ok(MediaAsset {
                url: image.to_string(),
                asset_id: EXISTING_ASSET_ID.to_string(),
            });
        }

        let folder = format!("{}/{}", self.folder, subfolder);
        let url = format!("{}/v1/upload", self.base_url);
        let request = UploadRequest {
            file: image,
            folder: &folder,
            public_id: public_id_hint,
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!("media host unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "media host returned {} on upload",
                response.status()
            )));
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("media host returned malformed body: {}", e))
        })?;

        Ok(MediaAsset {
            url: body.secure_url,
            asset_id: body.public_id,
        })
    }

    /// Deletes an uploaded asset by id. Pass-through URLs are skipped.
    #[instrument(skip(self))]
    pub async fn delete_asset(&self, asset_id: &str) -> Result<(), ServiceError> {
        if asset_id == EXISTING_ASSET_ID || asset_id.is_empty() {
            return Ok(());
        }

        let url = format!("{}/v1/assets/{}", self.base_url, asset_id);
        let response = self.http.delete(&url).send().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("media host unreachable: {}", e))
        })?;

        if response.status().is_success() || response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(ServiceError::ExternalServiceError(format!(
                "media host returned {} on delete",
                response.status()
            )))
        }
    }

    /// Best-effort deletion used when the primary record mutation already
    /// succeeded; failures are logged, never surfaced.
    pub async fn delete_asset_or_log(&self, asset_id: &str) {
        if let Err(e) = self.delete_asset(asset_id).await {
            warn!("Media asset {} could not be deleted: {}", asset_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_image_detection() {
        assert!(MediaClient::is_inline_image("data:image/png;base64,iVBOR"));
        assert!(MediaClient::is_inline_image("data:image/jpeg;base64,/9j/"));
        assert!(!MediaClient::is_inline_image(
            "https://media.example.com/storefront/products/p1.png"
        ));
    }

    #[tokio::test]
    async fn url_images_pass_through_without_upload() {
        // Unroutable base URL proves no network call happens for URLs.
        let client = MediaClient::new("http://127.0.0.1:1".into(), None, "storefront".into());
        let asset = client
            .store_image("https://cdn.example.com/pic.jpg", "products", None)
            .await
            .unwrap();
        assert_eq!(asset.url, "https://cdn.example.com/pic.jpg");
        assert_eq!(asset.asset_id, EXISTING_ASSET_ID);
        assert!(!asset.is_managed());
    }

    #[tokio::test]
    async fn deleting_passthrough_asset_is_a_noop() {
        let client = MediaClient::new("http://127.0.0.1:1".into(), None, "storefront".into());
        assert!(client.delete_asset(EXISTING_ASSET_ID).await.is_ok());
        assert!(client.delete_asset("").await.is_ok());
    }
}
