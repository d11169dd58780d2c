// Generation module
// Client for the hosted text-generation service and prompt construction


use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::{Config, api_token};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation service returned HTTP {0}")]
    Status(u16),
    #[error("generation service unreachable: {0}")]
    Transport(String),
    #[error("unexpected generation response: {0}")]
    UnexpectedResponse(String),
}

/// The opaque answer function: prompt in, text out, may fail.
pub trait AnswerGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// Client for the hosted text-generation endpoint.
///
/// A single blocking attempt with a timeout: interactive answers are not
/// worth a backoff loop, and the caller already degrades failures to a
/// friendly message.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    endpoint: Url,
    token: Option<String>,
    agent: ureq::Agent,
}

impl GenerationClient {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .service
            .api_base_url()
            .context("Failed to parse inference API base URL from config")?;
        let endpoint = base_url
            .join(&format!("/models/{}", config.service.generation_model))
            .context("Failed to build generation URL")?;

        let token = api_token();
        if token.is_none() {
            warn!("No inference API token in the environment; requests may be rejected");
        }

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.service.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            endpoint,
            token,
            agent,
        })
    }
}

impl AnswerGenerator for GenerationClient {
    #[inline]
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!("Requesting generation ({} prompt chars)", prompt.len());

        let request = GenerateRequest { inputs: prompt };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| GenerationError::UnexpectedResponse(e.to_string()))?;

        let mut builder = self
            .agent
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json");
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", &format!("Bearer {}", token));
        }

        let response_text = builder
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|error| match error {
                ureq::Error::StatusCode(status) => GenerationError::Status(status),
                other => GenerationError::Transport(other.to_string()),
            })?;

        let outputs: Vec<GeneratedText> = serde_json::from_str(&response_text)
            .map_err(|e| GenerationError::UnexpectedResponse(e.to_string()))?;
        let generated = outputs
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::UnexpectedResponse("empty output array".to_string()))?
            .generated_text;

        Ok(strip_prompt_echo(&generated, prompt))
    }
}

/// Build the answer prompt from retrieved context and the user's question.
#[inline]
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a friendly and helpful assistant. \
         Use the following context to answer the question.\n\n\
         Context: {context}\n\n\
         Question: {question}\n\n\
         Answer:"
    )
}

/// Some generation models echo the prompt ahead of the completion; keep only
/// the completion.
fn strip_prompt_echo(generated: &str, prompt: &str) -> String {
    generated
        .strip_prefix(prompt)
        .unwrap_or(generated)
        .trim()
        .to_string()
}
