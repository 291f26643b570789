use crate::config::Config;
use crate::models::GeneratedPrompts;
use crate::services::schema::{RESPONSE_SCHEMA, user_prompt};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

pub const EMPTY_RESPONSE_MESSAGE: &str = "A API retornou uma resposta vazia.";
pub const COMMUNICATION_MESSAGE: &str =
    "Não foi possível comunicar com a API Gemini. Verifique o console para mais detalhes.";

/// Anything that can turn a theme into a full set of prompts.
#[async_trait]
pub trait PromptGenerator: Send + Sync {
    async fn generate(&self, theme: &str) -> Result<GeneratedPrompts, GenerateError>;
}

/// Failure of a generation call. `Display` is the message shown to the user;
/// the underlying cause is only reachable through `source()`.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("{}", EMPTY_RESPONSE_MESSAGE)]
    EmptyResponse,

    #[error("{}", COMMUNICATION_MESSAGE)]
    Communication(#[from] ProviderFault),
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderFault {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(GeminiClient {
            client: reqwest::Client::builder().build()?,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }

    async fn request_text(&self, theme: &str) -> Result<String, ProviderFault> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{
                    "role": "user",
                    "parts": [{ "text": user_prompt(theme) }]
                }],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": &*RESPONSE_SCHEMA
                }
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ProviderFault::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let payload: GenerateContentResponse = serde_json::from_str(&body)?;
        Ok(payload.text())
    }
}

#[async_trait]
impl PromptGenerator for GeminiClient {
    async fn generate(&self, theme: &str) -> Result<GeneratedPrompts, GenerateError> {
        tracing::info!(model = %self.model, "requesting prompts from Gemini");

        let text = self.request_text(theme).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerateError::EmptyResponse);
        }

        let prompts: GeneratedPrompts =
            serde_json::from_str(text).map_err(ProviderFault::Malformed)?;
        tracing::info!(
            title = %prompts.prompt_json.title,
            scenes = prompts.prompt_json.scenes.len(),
            "received prompts"
        );
        Ok(prompts)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|err| err.get("message"))
                .and_then(|msg| msg.as_str())
                .map(|msg| msg.to_string())
        })
        .unwrap_or_else(|| body.to_string())
}
