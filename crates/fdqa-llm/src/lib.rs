//! Hosted answer generation over the Gemini `generateContent` REST endpoint.
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use fdqa_core::config::GeneratorSettings;
use fdqa_core::traits::AnswerGenerator;
use fdqa_core::{Error, Result};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Concatenated text parts of the first candidate.
pub fn extract_text(response: &GenerateResponse) -> Result<String> {
    let Some(first) = response.candidates.first() else {
        let reason = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(Error::Generation(reason));
    };
    let text: String = first
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect();
    if text.is_empty() {
        let reason = first.finish_reason.as_deref().unwrap_or("empty response");
        return Err(Error::Generation(format!("candidate has no text ({reason})")));
    }
    Ok(text)
}

pub struct GeminiGenerator {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiGenerator {
    /// Fails with `InvalidConfig` when no credential is configured.
    pub fn from_settings(settings: &GeneratorSettings) -> Result<Self> {
        let api_key = settings.require_api_key()?.to_string();
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model_name.clone(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl AnswerGenerator for GeminiGenerator {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let started = Instant::now();
        let body = GenerateRequest { contents: vec![Content { parts: vec![Part { text: prompt }] }] };
        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|e| Error::Generation(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            warn!(status = status.as_u16(), model = %self.model, "generation request rejected");
            return Err(Error::Generation(format!("API request failed ({status}): {detail}")));
        }
        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| Error::Generation(format!("invalid response body: {}", e.without_url())))?;
        let text = extract_text(&parsed)?;
        debug!(model = %self.model, elapsed_ms = started.elapsed().as_millis() as u64, chars = text.chars().count(), "generated answer");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_has_no_trailing_slash_duplication() {
        let settings = GeneratorSettings {
            api_key: "k".to_string(),
            endpoint: "https://example.test/v1beta/".to_string(),
            ..GeneratorSettings::default()
        };
        let g = GeminiGenerator::from_settings(&settings).unwrap();
        assert_eq!(g.url(), "https://example.test/v1beta/models/gemini-2.0-flash:generateContent");
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let err = GeminiGenerator::from_settings(&GeneratorSettings::default()).err().unwrap();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn request_body_shape() {
        let body = GenerateRequest { contents: vec![Content { parts: vec![Part { text: "hi" }] }] };
        assert_eq!(serde_json::to_value(&body).unwrap(), serde_json::json!({"contents": [{"parts": [{"text": "hi"}]}]}));
    }
}
