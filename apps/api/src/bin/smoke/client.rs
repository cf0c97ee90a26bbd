//! Thin HTTP client for the smoke run. Retries only when the server cannot be
//! reached, so a slow-starting API does not fail the first step.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum SmokeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server unreachable after {retries} attempts")]
    Unreachable { retries: u32 },
}

/// Status and decoded body of one request. Non-JSON bodies are kept as strings.
#[derive(Debug)]
pub struct Outcome {
    pub status: StatusCode,
    pub body: Value,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status.as_u16(), 200 | 201 | 204)
    }

    pub fn id(&self) -> Option<i64> {
        self.body.get("id").and_then(Value::as_i64)
    }
}

pub struct SmokeClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl SmokeClient {
    pub fn new(base_url: &str) -> Result<Self, SmokeError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request produced by `build`, rebuilding it for each attempt
    /// because multipart bodies cannot be cloned.
    pub async fn send<F>(&self, build: F) -> Result<Outcome, SmokeError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut last_error: Option<SmokeError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Request attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = build(&self.client);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(SmokeError::Http(e));
                    continue;
                }
                Err(e) => return Err(SmokeError::Http(e)),
            };

            let status = response.status();
            let text = response.text().await?;
            let body = if text.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&text).unwrap_or(Value::String(text))
            };
            return Ok(Outcome { status, body });
        }

        Err(last_error.unwrap_or(SmokeError::Unreachable {
            retries: MAX_RETRIES,
        }))
    }
}
