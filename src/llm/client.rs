use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, SalesAnalyticsError};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-05-20";

/// Pass-through bridge to the Gemini `generateContent` endpoint.
///
/// The bridge performs no aggregation of its own and keeps the two failure
/// causes distinct: a transport problem surfaces as
/// [`SalesAnalyticsError::Network`], an unexpected body as
/// [`SalesAnalyticsError::MalformedResponse`].
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sends one question and awaits the answer text. No automatic retry;
    /// the user re-submits manually after a failure.
    pub async fn ask(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "tools": [{ "google_search": {} }],
        });

        debug!("Sending analysis query to model {}", self.model);

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        extract_answer(&body)
    }
}

/// Pulls `candidates[0].content.parts[0].text` out of a response body; any
/// other shape is a formatting error.
fn extract_answer(body: &str) -> Result<String> {
    let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        SalesAnalyticsError::MalformedResponse(format!("response was not valid JSON: {e}"))
    })?;

    parsed
        .candidates
        .filter(|candidates| !candidates.is_empty())
        .map(|mut candidates| candidates.remove(0))
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .filter(|parts| !parts.is_empty())
        .map(|mut parts| parts.remove(0))
        .and_then(|part| part.text)
        .ok_or_else(|| {
            SalesAnalyticsError::MalformedResponse(
                "expected candidates[0].content.parts[0].text".to_string(),
            )
        })
}
