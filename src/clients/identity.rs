use crate::config::AppConfig;
use crate::errors::ServiceError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{instrument, warn};

/// Identity attributes returned by the external provider for a valid token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// Stable subject id assigned by the provider
    pub subject: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    audience: Option<&'a str>,
}

/// Client for the external identity provider. The provider is the sole
/// source of truth for credential validity; nothing is cached locally.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    project_id: Option<String>,
}

impl IdentityClient {
    pub fn new(base_url: String, project_id: Option<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.identity_base_url.clone(),
            config.identity_project_id.clone(),
        )
    }

    /// Verifies a bearer token, returning the identity it proves.
    /// A rejected token is `Unauthorized`; provider outages are
    /// `ExternalServiceError`.
    #[instrument(skip(self, token))]
    pub async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, ServiceError> {
        let url = format!("{}/v1/tokens:verify", self.base_url);
        let request = VerifyRequest {
            token,
            audience: self.project_id.as_deref(),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!("identity provider unreachable: {}", e))
            })?;

        match response.status() {
            StatusCode::OK => response.json::<VerifiedIdentity>().await.map_err(|e| {
                ServiceError::ExternalServiceError(format!(
                    "identity provider returned malformed body: {}",
                    e
                ))
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::BAD_REQUEST => {
                Err(ServiceError::Unauthorized("Invalid or expired token".into()))
            }
            status => Err(ServiceError::ExternalServiceError(format!(
                "identity provider returned {}",
                status
            ))),
        }
    }

    /// Deletes the identity record at the provider. A missing subject is
    /// treated as already deleted.
    #[instrument(skip(self))]
    pub async fn delete_subject(&self, subject: &str) -> Result<(), ServiceError> {
        let url = format!("{}/v1/subjects/{}", self.base_url, subject);

        let response = self.http.delete(&url).send().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("identity provider unreachable: {}", e))
        })?;

        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(ServiceError::ExternalServiceError(format!(
                "identity provider returned {} deleting subject",
                response.status()
            )))
        }
    }

    /// Best-effort deletion: logs and continues when the provider fails.
    pub async fn delete_subject_or_log(&self, subject: &str) {
        if let Err(e) = self.delete_subject(subject).await {
            warn!("Identity deletion for subject {} failed: {}", subject, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped_from_base_url() {
        let client = IdentityClient::new("https://identity.example.com/".into(), None);
        assert_eq!(client.base_url, "https://identity.example.com");
    }

    #[test]
    fn verified_identity_tolerates_missing_optional_fields() {
        let identity: VerifiedIdentity =
            serde_json::from_str(r#"{"subject":"abc123","email":"a@b.com"}"#).unwrap();
        assert_eq!(identity.subject, "abc123");
        assert!(identity.name.is_none());
        assert!(!identity.email_verified);
    }
}
