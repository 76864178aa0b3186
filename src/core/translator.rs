/// Machine translation providers used when no native synonym exists.
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::core::config::TranslationConfig;

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("translation provider returned {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed translation response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Translates a literal phrase between two language codes.
///
/// `Ok(None)` means the provider had nothing to offer; callers treat it the
/// same as an error.
pub trait Translator: Send + Sync {
    fn translate(&self, phrase: &str, from: &str, to: &str) -> Result<Option<String>, TranslationError>;
}

/// Never translates.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTranslator;

impl Translator for DisabledTranslator {
    fn translate(&self, _phrase: &str, _from: &str, _to: &str) -> Result<Option<String>, TranslationError> {
        Ok(None)
    }
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
}

/// Pull the first non-blank translation out of a v3 `/translate` response body.
pub fn parse_translate_response(body: &str) -> Result<Option<String>, TranslationError> {
    let responses: Vec<TranslateResponse> = serde_json::from_str(body)?;
    Ok(responses
        .into_iter()
        .flat_map(|r| r.translations)
        .map(|t| t.text.trim().to_string())
        .find(|t| !t.is_empty()))
}

/// Client for a Microsoft Translator v3 compatible REST endpoint.
pub struct HttpTranslator {
    client: reqwest::blocking::Client,
    endpoint: String,
    key: String,
    region: Option<String>,
}

impl HttpTranslator {
    pub fn new(config: &TranslationConfig) -> Result<Self, TranslationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            key: config.key.clone(),
            region: config.region.clone(),
        })
    }
}

impl Translator for HttpTranslator {
    fn translate(&self, phrase: &str, from: &str, to: &str) -> Result<Option<String>, TranslationError> {
        let url = format!("{}/translate", self.endpoint);
        let mut request = self
            .client
            .post(&url)
            .query(&[("api-version", "3.0"), ("from", from), ("to", to)])
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .json(&[TranslateRequest { text: phrase }]);
        if let Some(region) = &self.region {
            request = request.header("Ocp-Apim-Subscription-Region", region);
        }

        let response = request.send()?;
        if !response.status().is_success() {
            return Err(TranslationError::Status(response.status()));
        }
        let body = response.text()?;
        let translated = parse_translate_response(&body)?;
        debug!("translated {:?} ({} -> {}): {:?}", phrase, from, to, translated);
        Ok(translated)
    }
}
