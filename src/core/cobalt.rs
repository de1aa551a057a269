//! Client for an optional self-hosted cobalt instance.
//!
//! When `COBALT_INSTANCE_URL` is configured the bot asks the instance which
//! services it supports and, for matching links, resolves a direct media URL
//! via `POST /`. Resolution currently informs logging only; delivery still
//! goes through yt-dlp.

use std::time::Duration;

use lazy_regex::regex_is_match;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::core::error::{AppError, AppResult};

/// `GET /` payload of a cobalt instance
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceInfo {
    pub cobalt: InstanceMeta,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceMeta {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub services: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ResolveRequest<'a> {
    url: &'a str,
}

/// `POST /` result. `status` is one of `tunnel`, `redirect`, `picker`,
/// `error`; only the fields for the reported status are populated.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveResponse {
    pub status: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub picker: Vec<PickerItem>,
    #[serde(default)]
    pub error: Option<ResolveError>,
}

/// One entry of a `picker` response (photo slide posts resolve to several)
#[derive(Debug, Clone, Deserialize)]
pub struct PickerItem {
    #[serde(default, rename = "type")]
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveError {
    pub code: String,
}

/// Maps a URL's host to the cobalt service name covering it
fn service_for_url(url: &str) -> Option<&'static str> {
    let host = url::Url::parse(url).ok()?.host_str()?.to_lowercase();
    let h = host.as_str();
    if regex_is_match!(r"(^|\.)tiktok\.com$", h) {
        Some("tiktok")
    } else if regex_is_match!(r"(^|\.)(youtube\.com|youtu\.be)$", h) {
        Some("youtube")
    } else if regex_is_match!(r"(^|\.)instagram\.com$", h) {
        Some("instagram")
    } else if regex_is_match!(r"(^|\.)(twitter\.com|x\.com)$", h) {
        Some("twitter")
    } else if regex_is_match!(r"(^|\.)(soundcloud\.com)$", h) {
        Some("soundcloud")
    } else if regex_is_match!(r"(^|\.)vimeo\.com$", h) {
        Some("vimeo")
    } else {
        None
    }
}

/// HTTP client for one cobalt instance. All methods are no-ops returning
/// negative results when no instance is configured.
pub struct CobaltClient {
    base: Option<String>,
    http: reqwest::Client,
    info: RwLock<Option<InstanceInfo>>,
}

impl CobaltClient {
    pub fn new(base: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            base: base.map(|b| b.trim_end_matches('/').to_string()),
            http,
            info: RwLock::new(None),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base.is_some()
    }

    /// Fetches and caches instance metadata. Returns false when unreachable.
    pub async fn check_instance(&self) -> bool {
        let Some(base) = &self.base else { return false };
        let result = self
            .http
            .get(base)
            .header("Accept", "application/json")
            .send()
            .await
            .and_then(|r| r.error_for_status());

        match result {
            Ok(response) => match response.json::<InstanceInfo>().await {
                Ok(info) => {
                    log::info!(
                        "cobalt instance {} (v{}, {} services)",
                        base,
                        info.cobalt.version,
                        info.cobalt.services.len()
                    );
                    *self.info.write().await = Some(info);
                    true
                }
                Err(e) => {
                    log::warn!("cobalt instance {} returned unexpected payload: {}", base, e);
                    false
                }
            },
            Err(e) => {
                log::warn!("cobalt instance {} unreachable: {}", base, e);
                false
            }
        }
    }

    /// True when the configured instance declares support for this URL's service
    pub async fn matches_url(&self, url: &str) -> bool {
        let Some(service) = service_for_url(url) else {
            return false;
        };
        let info = self.info.read().await;
        info.as_ref()
            .map(|i| i.cobalt.services.iter().any(|s| s == service))
            .unwrap_or(false)
    }

    /// Resolves a URL into direct media links via the instance
    pub async fn resolve(&self, url: &str) -> AppResult<ResolveResponse> {
        let base = self
            .base
            .as_deref()
            .ok_or_else(|| AppError::Validation("no cobalt instance configured".to_string()))?;

        let response = self
            .http
            .post(base)
            .header("Accept", "application/json")
            .json(&ResolveRequest { url })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() && status.as_u16() != 400 {
            // cobalt reports per-request failures as 400 with a JSON body
            return Err(AppError::HttpStatus(status));
        }
        Ok(response.json::<ResolveResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_service_for_url() {
        assert_eq!(service_for_url("https://www.tiktok.com/@a/video/1"), Some("tiktok"));
        assert_eq!(service_for_url("https://youtu.be/abc"), Some("youtube"));
        assert_eq!(service_for_url("https://x.com/u/status/1"), Some("twitter"));
        assert_eq!(service_for_url("https://example.com/v"), None);
        assert_eq!(service_for_url("not a url"), None);
    }

    #[tokio::test]
    async fn test_unconfigured_client_is_inert() {
        let client = CobaltClient::new(None);
        assert!(!client.is_configured());
        assert!(!client.check_instance().await);
        assert!(!client.matches_url("https://www.tiktok.com/@a/video/1").await);
        assert!(client.resolve("https://www.tiktok.com/@a/video/1").await.is_err());
    }

    #[tokio::test]
    async fn test_check_instance_and_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cobalt": { "version": "10.4", "services": ["tiktok", "twitter"] }
            })))
            .mount(&server)
            .await;

        let client = CobaltClient::new(Some(server.uri()));
        assert!(client.check_instance().await);
        assert!(client.matches_url("https://www.tiktok.com/@a/video/1").await);
        assert!(!client.matches_url("https://youtu.be/abc").await);
    }

    #[tokio::test]
    async fn test_resolve_picker_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("Accept", "application/json"))
            .and(body_json(serde_json::json!({ "url": "https://www.tiktok.com/@a/photo/1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "picker",
                "picker": [
                    { "type": "photo", "url": "https://cdn.example/1.jpg" },
                    { "type": "photo", "url": "https://cdn.example/2.jpg" }
                ]
            })))
            .mount(&server)
            .await;

        let client = CobaltClient::new(Some(server.uri()));
        let resolved = client.resolve("https://www.tiktok.com/@a/photo/1").await.unwrap();
        assert_eq!(resolved.status, "picker");
        assert_eq!(resolved.picker.len(), 2);
        assert_eq!(resolved.picker[0].url, "https://cdn.example/1.jpg");
    }

    #[tokio::test]
    async fn test_resolve_error_body_on_400() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "status": "error",
                "error": { "code": "error.api.link.invalid" }
            })))
            .mount(&server)
            .await;

        let client = CobaltClient::new(Some(server.uri()));
        let resolved = client.resolve("nonsense").await.unwrap();
        assert_eq!(resolved.status, "error");
        assert_eq!(resolved.error.unwrap().code, "error.api.link.invalid");
    }
}
