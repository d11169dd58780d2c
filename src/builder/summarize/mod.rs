
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::{Config, api_token};
use crate::generation::GenerationError;

/// Inputs beyond this many words are truncated before summarization.
const SUMMARY_INPUT_WORD_LIMIT: usize = 1024;

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    inputs: &'a str,
    parameters: SummarizeParameters,
}

#[derive(Debug, Serialize)]
struct SummarizeParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

#[derive(Debug, Deserialize)]
struct SummarizeOutput {
    #[serde(default)]
    summary_text: Option<String>,
    #[serde(default)]
    generated_text: Option<String>,
}

/// Client for the hosted summarization endpoint, used only by the offline
/// builder. Failures never propagate: the original chunk text is the
/// fallback.
#[derive(Debug, Clone)]
pub struct Summarizer {
    endpoint: Url,
    token: Option<String>,
    agent: ureq::Agent,
    max_length: u32,
    min_length: u32,
}

impl Summarizer {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .service
            .api_base_url()
            .context("Failed to parse inference API base URL from config")?;
        let endpoint = base_url
            .join(&format!("/models/{}", config.service.summarization_model))
            .context("Failed to build summarization URL")?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.service.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            endpoint,
            token: api_token(),
            agent,
            max_length: config.index.summary_max_length,
            min_length: config.index.summary_min_length,
        })
    }

    /// Summarize a chunk, or keep it as-is when the service fails or returns
    /// nothing usable.
    #[inline]
    pub fn summarize_or_original(&self, text: &str) -> String {
        match self.summarize(text) {
            Ok(summary) if !summary.trim().is_empty() => summary,
            Ok(_) => {
                debug!("Summarization returned empty text; keeping original chunk");
                text.to_string()
            }
            Err(e) => {
                warn!("Summarization failed, keeping original chunk: {}", e);
                text.to_string()
            }
        }
    }

    fn summarize(&self, text: &str) -> Result<String, GenerationError> {
        let truncated = truncate_words(text, SUMMARY_INPUT_WORD_LIMIT);
        let request = SummarizeRequest {
            inputs: &truncated,
            parameters: SummarizeParameters {
                max_length: self.max_length,
                min_length: self.min_length,
                do_sample: false,
            },
        };
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

        let outputs: Vec<SummarizeOutput> = serde_json::from_str(&response_text)
            .map_err(|e| GenerationError::UnexpectedResponse(e.to_string()))?;
        let output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::UnexpectedResponse("empty output array".to_string()))?;

        output
            .summary_text
            .or(output.generated_text)
            .ok_or_else(|| {
                GenerationError::UnexpectedResponse(
                    "neither summary_text nor generated_text present".to_string(),
                )
            })
    }
}

fn truncate_words(text: &str, limit: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit {
        text.to_string()
    } else {
        words[..limit].join(" ")
    }
}
