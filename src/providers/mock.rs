/*!
 * Mock provider for testing.
 *
 * The mock answers every request through a responder closure and records
 * each request it receives, so tests can assert exactly which prompts were
 * sent and how often:
 * - `MockProvider::uppercase()` - Workers uppercase their input, critics approve
 * - `MockProvider::rejecting()` - Workers echo their input, critics always object
 * - `MockProvider::failing()` - Every generation call errors
 * - `MockProvider::new(f)` - Custom responder
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{GenerationRequest, Provider};

/// Function producing the mock's reply to a request
pub type Responder = Arc<dyn Fn(&GenerationRequest) -> Result<String, ProviderError> + Send + Sync>;

/// Task name of the frontmatter worker prompt
const FRONTMATTER_TASK: &str = "frontmatter_worker";

/// Task name of the summary worker prompt
const SUMMARY_TASK: &str = "summary_worker";

/// Scripted provider for tests
#[derive(Clone)]
pub struct MockProvider {
    /// Produces replies
    responder: Responder,
    /// Every generation request received, in arrival order
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    /// Every model passed to `ensure_model`
    ensured: Arc<Mutex<Vec<String>>>,
    /// Models that `ensure_model` reports as unavailable
    unavailable: Arc<Mutex<HashSet<String>>>,
    /// Simulated latency per generation call
    delay: Option<Duration>,
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("requests", &self.requests.lock().len())
            .field("delay", &self.delay)
            .finish()
    }
}

/// Uppercase the string values of a JSON object, keeping its keys
fn uppercase_json_values(input: &str) -> String {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(input) else {
        return input.to_uppercase();
    };
    let upper: Map<String, Value> = map
        .into_iter()
        .map(|(k, v)| match v {
            Value::String(s) => (k, Value::String(s.to_uppercase())),
            other => (k, other),
        })
        .collect();
    Value::Object(upper).to_string()
}

impl MockProvider {
    /// Create a mock with a custom responder
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&GenerationRequest) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            requests: Arc::new(Mutex::new(Vec::new())),
            ensured: Arc::new(Mutex::new(Vec::new())),
            unavailable: Arc::new(Mutex::new(HashSet::new())),
            delay: None,
        }
    }

    /// Translator that uppercases everything and a critic that approves
    pub fn uppercase() -> Self {
        Self::new(|request| {
            if request.is_critic() {
                Ok("Yes, the translation is faithful.".to_string())
            } else if request.task == FRONTMATTER_TASK {
                Ok(uppercase_json_values(&request.input))
            } else if request.task == SUMMARY_TASK {
                Ok("A SHORT SUMMARY.".to_string())
            } else {
                Ok(request.input.to_uppercase())
            }
        })
    }

    /// Translator that echoes its input and a critic that always rejects
    pub fn rejecting() -> Self {
        Self::new(|request| {
            if request.is_critic() {
                Ok("No, the translation is still in the source language.".to_string())
            } else {
                Ok(request.input.clone())
            }
        })
    }

    /// Provider whose every generation call fails
    pub fn failing() -> Self {
        Self::new(|_| {
            Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            })
        })
    }

    /// Add a simulated latency to every generation call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make `ensure_model` fail for the given model
    pub fn with_unavailable_model(self, model: &str) -> Self {
        self.unavailable.lock().insert(model.to_string());
        self
    }

    /// All generation requests received so far
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    /// Number of generation requests received
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of requests for a given task name
    pub fn task_count(&self, task: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.task == task).count()
    }

    /// Number of worker requests whose input equals `input`
    pub fn calls_with_input(&self, input: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| !r.is_critic() && r.input == input)
            .count()
    }

    /// Models passed to `ensure_model`, in call order
    pub fn ensured_models(&self) -> Vec<String> {
        self.ensured.lock().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        self.requests.lock().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        (self.responder)(request)
    }

    async fn ensure_model(&self, model: &str) -> Result<(), ProviderError> {
        self.ensured.lock().push(model.to_string());
        if self.unavailable.lock().contains(model) {
            return Err(ProviderError::ModelUnavailable {
                model: model.to_string(),
                reason: "Simulated missing model".to_string(),
            });
        }
        Ok(())
    }
}
