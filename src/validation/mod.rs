/*!
 * Post-hoc validation of stored translations.
 *
 * The validator re-runs the section critics against `(original, translated)`
 * pairs taken from a previously written output, without translating
 * anything. Sections that fail can have their checksum stripped from the
 * output so the next incremental run translates them again.
 */

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::document::SectionKind;
use crate::errors::{DocumentError, ProviderError};
use crate::providers::Provider;
use crate::translation::critic::{Verdict, parse_verdict};
use crate::translation::incremental::{TranslationPair, extract_translation_pairs, strip_checksums};
use crate::translation::request::DocumentContext;

/// A pair the critic rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedSection {
    /// Source checksum
    pub checksum: String,
    /// Section kind
    pub kind: SectionKind,
    /// Critic explanation
    pub critique: String,
}

/// Outcome of auditing one output file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Checksums the critic approved
    pub passed: Vec<String>,
    /// Pairs the critic rejected
    pub failed: Vec<FailedSection>,
    /// Checksums that could not be checked because the provider failed
    pub unchecked: Vec<String>,
    /// Checksum attributes removed from the output
    pub stripped: usize,
}

impl AuditReport {
    /// Number of pairs looked at
    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len() + self.unchecked.len()
    }

    /// Whether every pair was checked and approved
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.unchecked.is_empty()
    }

    /// Checksums of the rejected pairs
    pub fn failed_checksums(&self) -> HashSet<String> {
        self.failed.iter().map(|f| f.checksum.clone()).collect()
    }
}

fn short(checksum: &str) -> &str {
    checksum.get(..12).unwrap_or(checksum)
}

/// Runs section critics outside of a translation run
pub struct Validator {
    provider: Arc<dyn Provider>,
    context: DocumentContext,
    concurrency: usize,
}

impl Validator {
    /// Create a validator using `context` for model, languages and sampling
    pub fn new(provider: Arc<dyn Provider>, context: DocumentContext) -> Self {
        Self {
            provider,
            context,
            concurrency: 1,
        }
    }

    /// Check up to `concurrency` pairs at the same time
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Ask the critic for `kind` whether `translated` is a faithful rendering
    /// of `original`.
    ///
    /// No-translate sections were never generated and pass without a call.
    pub async fn validate(&self, original: &str, translated: &str, kind: SectionKind) -> Result<Verdict, ProviderError> {
        let Some(kind) = kind.translatable() else {
            return Ok(Verdict::Approved);
        };

        let request = self.context.section_critic(kind, original, translated);
        let reply = self.provider.generate(&request).await?;
        let verdict = parse_verdict(&reply);
        debug!("{} verdict: {:?}", request.task, verdict);
        Ok(verdict)
    }

    /// Validate every stored translation of `source` found in `output_path`.
    ///
    /// With `strip_failed` the checksums of rejected sections are removed from
    /// the output file.
    pub async fn audit(
        &self,
        source: &str,
        output_path: &Path,
        prepend: Option<&str>,
        strip_failed: bool,
    ) -> Result<AuditReport, DocumentError> {
        let pairs = extract_translation_pairs(source, output_path, prepend)?;
        info!("Validating {} sections of {}", pairs.len(), output_path.display());

        let outcomes: Vec<(TranslationPair, Result<Verdict, ProviderError>)> = stream::iter(pairs)
            .map(|pair| async move {
                let verdict = self.validate(&pair.original, &pair.translated, pair.kind).await;
                (pair, verdict)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = AuditReport::default();
        for (pair, outcome) in outcomes {
            match outcome {
                Ok(Verdict::Approved) => report.passed.push(pair.checksum),
                Ok(Verdict::Rejected(critique)) => {
                    warn!("Section {} ({}) failed validation: {}", short(&pair.checksum), pair.kind, critique);
                    report.failed.push(FailedSection {
                        checksum: pair.checksum,
                        kind: pair.kind,
                        critique,
                    });
                }
                Err(e) => {
                    warn!("Could not validate section {}: {}", short(&pair.checksum), e);
                    report.unchecked.push(pair.checksum);
                }
            }
        }

        if strip_failed && !report.failed.is_empty() {
            report.stripped = strip_checksums(output_path, &report.failed_checksums())?;
        }

        info!(
            "Validation finished: {} passed, {} failed, {} unchecked",
            report.passed.len(),
            report.failed.len(),
            report.unchecked.len()
        );
        Ok(report)
    }
}
