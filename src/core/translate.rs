//! On-demand machine translation of canned bot messages.
//!
//! The bot speaks English; when a user's Telegram client reports another
//! language, canned replies go through the OpenAI chat-completions API once
//! and the result is cached on disk, keyed by language then source text.
//! Without an API key (or on any failure) the English original is used.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{AppError, AppResult};
use crate::storage::jsonstore::JsonStore;

const MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 256;

type TranslationCache = HashMap<String, HashMap<String, String>>;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

pub struct Translator {
    api_key: Option<String>,
    api_base: String,
    http: reqwest::Client,
    cache: JsonStore<TranslationCache>,
}

impl Translator {
    pub fn new(api_key: Option<String>, cache_path: impl Into<std::path::PathBuf>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();
        Ok(Self {
            api_key,
            api_base: "https://api.openai.com".to_string(),
            http,
            cache: JsonStore::load(cache_path)?,
        })
    }

    #[cfg(test)]
    fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Translates `text` into `lang` (an IETF code from Telegram, e.g. "de").
    /// Falls back to the original text when translation is unavailable.
    pub async fn translate(&self, text: &str, lang: &str) -> String {
        if lang.is_empty() || lang.starts_with("en") {
            return text.to_string();
        }
        let Some(api_key) = &self.api_key else {
            return text.to_string();
        };

        let cached = self
            .cache
            .read(|c| c.get(lang).and_then(|m| m.get(text)).cloned())
            .await;
        if let Some(hit) = cached {
            return hit;
        }

        match self.request_translation(api_key, text, lang).await {
            Ok(translated) => {
                let store_result = self
                    .cache
                    .update(|c| {
                        c.entry(lang.to_string())
                            .or_default()
                            .insert(text.to_string(), translated.clone());
                    })
                    .await;
                if let Err(e) = store_result {
                    log::warn!("failed to persist translation cache: {}", e);
                }
                translated
            }
            Err(e) => {
                log::warn!("translation to '{}' failed: {}", lang, e);
                text.to_string()
            }
        }
    }

    async fn request_translation(&self, api_key: &str, text: &str, lang: &str) -> AppResult<String> {
        let request = ChatRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: format!(
                        "Translate the user's message into the language with IETF tag '{}'. \
                         Keep any HTML tags and emoji intact. Reply with the translation only.",
                        lang
                    ),
                },
                ChatMessage {
                    role: "user",
                    content: text.to_string(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.api_base))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus(status));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::Validation("empty completion".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_english_and_keyless_passthrough() {
        let dir = tempdir().unwrap();
        let translator = Translator::new(None, dir.path().join("cache.json")).unwrap();
        assert_eq!(translator.translate("hello", "en").await, "hello");
        assert_eq!(translator.translate("hello", "en-GB").await, "hello");
        assert_eq!(translator.translate("hello", "de").await, "hello");
        assert_eq!(translator.translate("hello", "").await, "hello");
    }

    #[tokio::test]
    async fn test_translation_hits_api_once_then_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [ { "message": { "content": "hallo" } } ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let translator = Translator::new(Some("test-key".to_string()), dir.path().join("cache.json"))
            .unwrap()
            .with_api_base(server.uri());

        assert_eq!(translator.translate("hello", "de").await, "hallo");
        // Second call must be served from the cache; the mock expects one hit.
        assert_eq!(translator.translate("hello", "de").await, "hallo");
    }

    #[tokio::test]
    async fn test_api_failure_falls_back_to_original() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let translator = Translator::new(Some("test-key".to_string()), dir.path().join("cache.json"))
            .unwrap()
            .with_api_base(server.uri());

        assert_eq!(translator.translate("hello", "fr").await, "hello");
    }

    #[tokio::test]
    async fn test_cache_survives_reload() {
        let dir = tempdir().unwrap();
        let cache_path = dir.path().join("cache.json");

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [ { "message": { "content": "bonjour" } } ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        {
            let translator = Translator::new(Some("k".to_string()), &cache_path)
                .unwrap()
                .with_api_base(server.uri());
            assert_eq!(translator.translate("hello", "fr").await, "bonjour");
        }

        // New instance, no API base override: a cache miss would hit the real
        // endpoint and fail, so equality proves the disk cache was used.
        let translator = Translator::new(Some("k".to_string()), &cache_path).unwrap();
        assert_eq!(translator.translate("hello", "fr").await, "bonjour");
    }
}
