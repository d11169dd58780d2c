#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{EmbeddingError, TextEmbedder};
use crate::config::{Config, api_token};

const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Embedding client for the hosted inference API's feature-extraction
/// pipeline.
#[derive(Debug, Clone)]
pub struct HfEmbeddingClient {
    endpoint: Url,
    dimension: usize,
    batch_size: usize,
    token: Option<String>,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
}

impl HfEmbeddingClient {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .service
            .api_base_url()
            .context("Failed to parse inference API base URL from config")?;
        let endpoint = base_url
            .join(&format!(
                "/pipeline/feature-extraction/{}",
                config.service.embedding_model
            ))
            .context("Failed to build feature-extraction URL")?;

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
            dimension: config.service.embedding_dimension as usize,
            batch_size: config.service.batch_size as usize,
            token,
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = EmbedRequest { inputs: texts };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| EmbeddingError::UnexpectedResponse(e.to_string()))?;

        let response_text = self.make_request_with_retry(|| {
            let mut builder = self
                .agent
                .post(self.endpoint.as_str())
                .header("Content-Type", "application/json");
            if let Some(token) = &self.token {
                builder = builder.header("Authorization", &format!("Bearer {}", token));
            }
            builder
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        let vectors: Vec<Vec<f32>> = serde_json::from_str(&response_text)
            .map_err(|e| EmbeddingError::UnexpectedResponse(e.to_string()))?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                sent: texts.len(),
                received: vectors.len(),
            });
        }
        for vector in &vectors {
            if vector.len() != self.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }

        Ok(vectors)
    }

    fn make_request_with_retry<F>(&self, mut request_fn: F) -> Result<String, EmbeddingError>
    where
        F: FnMut() -> Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("Embedding request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => {
                    debug!("Embedding request succeeded on attempt {}", attempt);
                    return Ok(response_text);
                }
                Err(error) => {
                    // Retry server errors and transport failures; everything
                    // else surfaces immediately.
                    match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Embedding server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                            } else {
                                return Err(EmbeddingError::Status(*status));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Embedding transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                        }
                        _ => return Err(EmbeddingError::Transport(error.to_string())),
                    }

                    last_error = Some(match error {
                        ureq::Error::StatusCode(status) => EmbeddingError::Status(status),
                        other => EmbeddingError::Transport(other.to_string()),
                    });

                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        debug!("Waiting {}ms before embedding retry", delay_ms);
                        std::thread::sleep(Duration::from_millis(delay_ms));
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| EmbeddingError::Transport("request failed after retries".into())))
    }
}

impl TextEmbedder for HfEmbeddingClient {
    #[inline]
    fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size.max(1)) {
            results.extend(self.embed_batch(batch)?);
        }

        debug!("Generated {} embeddings total", results.len());
        Ok(results)
    }
}
