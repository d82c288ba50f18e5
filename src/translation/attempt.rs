/*!
 * Bounded attempt loop shared by the summary, frontmatter and section steps.
 *
 * A step is retried until it succeeds or its attempt budget runs out. The
 * feedback of a failed attempt (a reviewer's critique, or a description of
 * what was wrong with the reply) is handed to the next attempt. Cancellation
 * is checked before every attempt and raced against every model call.
 */

use log::{debug, warn};
use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::providers::{GenerationRequest, Provider};

/// Why a single attempt did not produce an accepted result.
///
/// Everything except `Cancelled` is recoverable and only consumes budget.
#[derive(Error, Debug)]
pub(crate) enum AttemptFailure {
    /// The provider call itself failed
    #[error("generation failed: {0}")]
    Provider(#[from] ProviderError),

    /// The reviewer rejected the candidate
    #[error("rejected by reviewer: {0}")]
    Rejected(String),

    /// The reply could not be used as-is
    #[error("unusable response: {0}")]
    Malformed(String),

    /// The frontmatter reply introduced keys that were never sent
    #[error("unexpected frontmatter keys: {}", .0.join(", "))]
    UnknownKeys(Vec<String>),

    /// The run was cancelled while the attempt was in flight
    #[error("cancelled")]
    Cancelled,
}

impl AttemptFailure {
    /// Feedback for the next attempt, if this failure produced any
    pub(crate) fn feedback(&self) -> Option<String> {
        match self {
            Self::Rejected(critique) => Some(critique.clone()),
            Self::Malformed(reason) => Some(format!("Your reply could not be used: {}", reason)),
            Self::UnknownKeys(keys) => Some(format!(
                "Your reply contained keys that were not in the original object: {}. Only translate the values of the keys you were given.",
                keys.join(", ")
            )),
            Self::Provider(_) | Self::Cancelled => None,
        }
    }
}

/// Terminal outcome of an attempt loop that did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopFailure {
    /// Every attempt failed
    Exhausted { attempts: usize },
    /// The run was cancelled
    Cancelled,
}

/// Successful outcome of an attempt loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Accepted<T> {
    /// Accepted value
    pub value: T,
    /// Attempts used, including the successful one
    pub attempts: usize,
}

/// Call the provider, giving up as soon as the run is cancelled
pub(crate) async fn generate(
    provider: &dyn Provider,
    request: &GenerationRequest,
    cancel: &CancellationToken,
) -> Result<String, AttemptFailure> {
    debug!("Sending {} request ({} prompt chars)", request.task, request.prompt.len());
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AttemptFailure::Cancelled),
        result = provider.generate(request) => Ok(result?),
    }
}

/// Run `attempt` until it succeeds, at most `max_attempts` times.
///
/// `attempt` receives the 1-based attempt number and the feedback left by
/// the previous failure. `label` is only used for logging.
pub(crate) async fn run_attempts<T, F, Fut>(
    label: &str,
    max_attempts: usize,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Result<Accepted<T>, LoopFailure>
where
    F: FnMut(usize, Option<String>) -> Fut,
    Fut: Future<Output = Result<T, AttemptFailure>>,
{
    let mut feedback: Option<String> = None;

    for number in 1..=max_attempts {
        if cancel.is_cancelled() {
            return Err(LoopFailure::Cancelled);
        }

        match attempt(number, feedback.clone()).await {
            Ok(value) => {
                return Ok(Accepted {
                    value,
                    attempts: number,
                });
            }
            Err(AttemptFailure::Cancelled) => return Err(LoopFailure::Cancelled),
            Err(failure) => {
                warn!("{} (Attempt {}/{}): {}", label, number, max_attempts, failure);
                if let Some(next) = failure.feedback() {
                    feedback = Some(next);
                }
            }
        }
    }

    Err(LoopFailure::Exhausted {
        attempts: max_attempts,
    })
}
