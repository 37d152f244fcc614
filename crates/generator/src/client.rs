//! OpenAI-compatible problem generator.
//!
//! Blocking reqwest client (no Tokio runtime required). Works against OpenAI
//! itself and against local servers exposing the same API (Ollama).

use std::time::Duration;

use pathgrid_config::ai::{AIConfigStatus, ResolvedAIConfig};
use pathgrid_engine::problem::{ProblemData, ProblemSource};
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::parse::parse_problem;
use crate::prompt;

// ============================================================================
// OpenAI API types
// ============================================================================

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIError {
    error: OpenAIErrorDetail,
}

#[derive(Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}

// ============================================================================
// Generator
// ============================================================================

/// Problem source backed by a chat-completions endpoint.
#[derive(Clone)]
pub struct OpenAiGenerator {
    http: reqwest::blocking::Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl OpenAiGenerator {
    /// Build a generator from the resolved AI configuration.
    pub fn from_config(config: &ResolvedAIConfig) -> Result<Self, GenerationError> {
        match config.status {
            AIConfigStatus::Ready => {}
            AIConfigStatus::Disabled => {
                return Err(GenerationError::NotConfigured("provider is set to none".to_string()));
            }
            AIConfigStatus::MissingKey | AIConfigStatus::Error => {
                return Err(GenerationError::MissingKey(
                    config.blocking_reason.clone().unwrap_or_else(|| "no API key".to_string()),
                ));
            }
        }

        Self::with_base_url(
            config.endpoint.clone(),
            config.api_key.clone(),
            config.model.clone(),
            config.temperature,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Create a generator against an explicit API base URL.
    pub fn with_base_url(
        api_base: String,
        api_key: Option<String>,
        model: String,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("pathgrid/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            model,
            temperature,
        })
    }

    fn request_body(&self) -> OpenAIRequest {
        OpenAIRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: prompt::system_prompt().to_string(),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: prompt::user_prompt(),
                },
            ],
            temperature: self.temperature,
        }
    }

    /// Ask the model for one problem and return the raw message content.
    fn fetch_content(&self) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.api_base);
        log::debug!("POST {} (model {})", url, self.model);

        let mut request = self.http.post(&url).json(&self.request_body());
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().map_err(|e| GenerationError::Network(e.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            let message = match serde_json::from_str::<OpenAIError>(&error_text) {
                Ok(error) => error.error.message,
                Err(_) => error_text,
            };
            return Err(GenerationError::Api { status: status.as_u16(), message });
        }

        let body: OpenAIResponse = response
            .json()
            .map_err(|e| GenerationError::Parse(format!("unexpected response body: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(GenerationError::EmptyContent)
    }
}

impl ProblemSource for OpenAiGenerator {
    type Error = GenerationError;

    fn get_problem(&self) -> Result<ProblemData, GenerationError> {
        let content = self.fetch_content()?;
        let problem = parse_problem(&content)?;
        log::info!(
            "generated {}x{} problem with {} test cases",
            problem.grid.rows(),
            problem.grid.cols(),
            problem.test_cases.len()
        );
        Ok(problem)
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.api_base, self.model)
    }
}
