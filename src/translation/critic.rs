/*!
 * Reviewer verdicts.
 *
 * A reviewer reply approves when it starts with "yes", or when it never says
 * "no" as a word. Anything else is a rejection, and the whole reply becomes
 * the critique fed to the next attempt. The summary reviewer is stricter and
 * must lead with "yes".
 */

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::document::TranslatableKind;
use crate::providers::Provider;

use super::attempt::{self, AttemptFailure};
use super::request::DocumentContext;

/// Outcome of a review
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The candidate is acceptable
    Approved,
    /// The candidate was rejected, with the reviewer's explanation
    Rejected(String),
}

impl Verdict {
    /// Whether the verdict approves
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Interpret a reviewer's reply
pub fn parse_verdict(response: &str) -> Verdict {
    let trimmed = response.trim();
    let lowered = trimmed.to_lowercase();

    if lowered.starts_with("yes") {
        return Verdict::Approved;
    }

    let says_no = lowered
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| token == "no");

    if says_no {
        Verdict::Rejected(trimmed.to_string())
    } else {
        Verdict::Approved
    }
}

/// Interpret the summary reviewer's reply; only a leading "yes" approves
pub fn parse_summary_verdict(response: &str) -> Verdict {
    let trimmed = response.trim();
    if trimmed.to_lowercase().starts_with("yes") {
        Verdict::Approved
    } else {
        Verdict::Rejected(trimmed.to_string())
    }
}

/// Ask the section critic about a candidate translation.
///
/// A rejection comes back as [`AttemptFailure::Rejected`].
pub(crate) async fn review_section(
    provider: &dyn Provider,
    context: &DocumentContext,
    kind: TranslatableKind,
    original: &str,
    candidate: &str,
    cancel: &CancellationToken,
) -> Result<(), AttemptFailure> {
    let request = context.section_critic(kind, original, candidate);
    let reply = attempt::generate(provider, &request, cancel).await?;
    match parse_verdict(&reply) {
        Verdict::Approved => {
            debug!("{} approved", request.task);
            Ok(())
        }
        Verdict::Rejected(critique) => {
            warn!("{} rejected the translation: {}", request.task, critique);
            Err(AttemptFailure::Rejected(critique))
        }
    }
}
