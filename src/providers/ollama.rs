use async_trait::async_trait;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::{GenerationOptions, GenerationRequest, Provider};

/// Port Ollama listens on unless told otherwise
pub const DEFAULT_PORT: u16 = 11434;

/// Pulling a model can take a long time on first use
const PULL_TIMEOUT_SECS: u64 = 3600;

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
    /// Models confirmed to be installed
    verified_models: Mutex<HashSet<String>>,
}

/// Generate request body for the Ollama API
#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerationOptions,
}

/// Generation response from the Ollama API
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    /// Generated text
    response: String,
    /// Whether the generation is complete
    #[serde(default)]
    done: bool,
    /// Number of generated tokens
    #[serde(default)]
    eval_count: Option<u64>,
    /// Total duration of the request in nanoseconds
    #[serde(default)]
    total_duration: Option<u64>,
}

/// Body of the show and pull endpoints
#[derive(Debug, Serialize)]
struct ModelBody<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<String>,
}

/// Turn a configured endpoint into a base URL with scheme and port.
///
/// `localhost` becomes `http://localhost:11434`; an explicit scheme or port is
/// kept as given.
pub fn normalize_endpoint(endpoint: &str) -> Result<String, ProviderError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(ProviderError::ConnectionError("Ollama endpoint is empty".to_string()));
    }

    let with_scheme = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };

    let mut url = Url::parse(&with_scheme)
        .map_err(|e| ProviderError::ConnectionError(format!("Invalid Ollama endpoint '{}': {}", endpoint, e)))?;

    let has_explicit_port = with_scheme
        .split("://")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .is_some_and(|authority| authority.contains(':'));
    if !has_explicit_port && url.scheme() == "http" {
        url.set_port(Some(DEFAULT_PORT))
            .map_err(|_| ProviderError::ConnectionError(format!("Cannot set port on '{}'", endpoint)))?;
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Extract the generated text from a response body.
///
/// Handles both a single JSON object and a JSONL stream of partial objects.
fn parse_generate_body(body: &str) -> Result<String, ProviderError> {
    match serde_json::from_str::<GenerateResponse>(body) {
        Ok(parsed) => {
            if let (Some(tokens), Some(nanos)) = (parsed.eval_count, parsed.total_duration) {
                debug!("Ollama generated {} tokens in {}ms", tokens, nanos / 1_000_000);
            }
            Ok(parsed.response)
        }
        Err(e) => {
            let mut text = String::new();
            let mut saw_done = false;
            for line in body.lines().filter(|l| !l.trim().is_empty()) {
                let chunk: GenerateResponse = serde_json::from_str(line).map_err(|_| {
                    ProviderError::ParseError(format!(
                        "Failed to parse Ollama API response: {}. Raw response (first 500 chars): {}",
                        e,
                        body.chars().take(500).collect::<String>()
                    ))
                })?;
                text.push_str(&chunk.response);
                saw_done |= chunk.done;
            }
            if !saw_done {
                warn!("Ollama stream ended without a final chunk");
            }
            Ok(text)
        }
    }
}

impl Ollama {
    /// Create a client with default retry settings
    pub fn new(endpoint: &str) -> Result<Self, ProviderError> {
        Self::new_with_config(endpoint, 120, 3, 1000)
    }

    /// Create a client with explicit timeout and retry settings
    ///
    /// Ollama speaks HTTP/1.1; connections are kept alive for the parallel
    /// section workers.
    pub fn new_with_config(
        endpoint: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .http1_only()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(20)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: normalize_endpoint(endpoint)?,
            client,
            max_retries,
            backoff_base_ms,
            verified_models: Mutex::new(HashSet::new()),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the Ollama API version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response: serde_json::Value = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to connect to Ollama: {}", e)))?
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Ollama version response: {}", e)))?;

        response["version"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }

    /// Whether the model is already installed
    async fn show(&self, model: &str) -> Result<bool, ProviderError> {
        let url = format!("{}/api/show", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ModelBody { model, stream: None })
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send request to Ollama API: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        Err(ProviderError::ApiError {
            status_code: status.as_u16(),
            message,
        })
    }

    /// Download a model, blocking until the pull completes
    async fn pull(&self, model: &str) -> Result<(), ProviderError> {
        let url = format!("{}/api/pull", self.base_url);
        info!("Pulling model '{}', this may take a while", model);

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(PULL_TIMEOUT_SECS))
            .json(&ModelBody {
                model,
                stream: Some(false),
            })
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send pull request to Ollama API: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to read pull response: {}", e)))?;

        if !status.is_success() {
            return Err(ProviderError::ModelUnavailable {
                model: model.to_string(),
                reason: format!("pull failed ({}): {}", status, body),
            });
        }

        let last_line = body.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or_default();
        let parsed: PullResponse = serde_json::from_str(last_line)
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse pull response: {}", e)))?;

        match parsed.error {
            Some(reason) => Err(ProviderError::ModelUnavailable {
                model: model.to_string(),
                reason,
            }),
            None if parsed.status == "success" => Ok(()),
            None => Err(ProviderError::ModelUnavailable {
                model: model.to_string(),
                reason: format!("unexpected pull status '{}'", parsed.status),
            }),
        }
    }
}

#[async_trait]
impl Provider for Ollama {
    /// Generate text with retry logic
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateBody {
            model: &request.model,
            system: &request.system,
            prompt: &request.prompt,
            stream: false,
            options: &request.options,
        };

        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.max_retries {
            match self.client.post(&url).json(&body).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let text = response.text().await.map_err(|e| {
                            ProviderError::ParseError(format!("Failed to get response text from Ollama API: {}", e))
                        })?;
                        return parse_generate_body(&text);
                    }

                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());

                    if !status.is_server_error() {
                        // Client errors will not improve on retry
                        error!("Ollama API error ({}): {}", status, message);
                        return Err(ProviderError::ApiError {
                            status_code: status.as_u16(),
                            message,
                        });
                    }

                    error!(
                        "Ollama API error ({}): {} - attempt {}/{}",
                        status,
                        message,
                        attempt + 1,
                        self.max_retries + 1
                    );
                    last_error = Some(ProviderError::ApiError {
                        status_code: status.as_u16(),
                        message,
                    });
                }
                Err(e) => {
                    error!(
                        "Ollama API network error: {} - attempt {}/{}",
                        e,
                        attempt + 1,
                        self.max_retries + 1
                    );
                    last_error = Some(ProviderError::RequestFailed(format!(
                        "Failed to send request to Ollama API: {}",
                        e
                    )));
                }
            }

            attempt += 1;

            if attempt <= self.max_retries {
                let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!(
                "Ollama API request failed after {} attempts",
                self.max_retries + 1
            ))
        }))
    }

    async fn ensure_model(&self, model: &str) -> Result<(), ProviderError> {
        if self.verified_models.lock().contains(model) {
            return Ok(());
        }

        if !self.show(model).await? {
            self.pull(model).await?;
            info!("Model '{}' pulled", model);
        }

        debug!("Model '{}' is available", model);
        self.verified_models.lock().insert(model.to_string());
        Ok(())
    }
}
