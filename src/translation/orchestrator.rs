/*!
 * Document translation orchestrator.
 *
 * Drives one document through the pipeline:
 * 1. Segment the raw text into frontmatter and typed sections
 * 2. Make sure the model is available
 * 3. Summarize the document (optional, cached)
 * 4. Translate the allow-listed frontmatter values
 * 5. Translate every section on a bounded pool of concurrent tasks, reusing
 *    stored translations for unchanged sections
 * 6. Reassemble the sections in document order
 *
 * Any budget exhaustion aborts the whole document; nothing partial is
 * returned.
 */

use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, error, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::document::{DEFAULT_TRANSLATABLE_KEYS, Frontmatter, Section, Segmenter, reconstruct};
use crate::errors::TranslationError;
use crate::providers::Provider;

use super::attempt::{self, AttemptFailure, LoopFailure, run_attempts};
use super::critic::review_section;
use super::frontmatter::translate_frontmatter;
use super::incremental::{ExistingTranslations, reusable};
use super::prompts::SamplingOverrides;
use super::request::{DocumentContext, SectionStep};
use super::summary::{SummaryCache, summarize};

/// Called with (completed, total) after each section finishes
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Options for translating one document
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateOptions {
    /// Model name
    pub model: String,
    /// Source language as written in prompts
    pub source_language: String,
    /// Target language as written in prompts
    pub target_language: String,
    /// Context window passed to the model
    pub context_window: u32,
    /// Attempt budget for each step
    pub max_attempts: usize,
    /// Run the critic after every worker reply
    pub review: bool,
    /// Generate a document summary for the section prompts
    pub summarize: bool,
    /// Reuse stored translations of unchanged sections
    pub incremental: bool,
    /// Sections translated at the same time
    pub concurrent_sections: usize,
    /// Frontmatter keys whose values are translated
    pub frontmatter_keys: Vec<String>,
    /// Banner inserted ahead of the document
    pub prepend: Option<String>,
    /// Per-category sampling overrides
    pub sampling: SamplingOverrides,
    /// Wrap sections in containers in the output
    pub wrap: bool,
    /// Give up on the document after this long
    pub deadline: Option<Duration>,
}

impl TranslateOptions {
    /// Options with defaults for everything but the model and languages
    pub fn new(
        model: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            context_window: 8192,
            max_attempts: 5,
            review: true,
            summarize: true,
            incremental: true,
            concurrent_sections: 4,
            frontmatter_keys: DEFAULT_TRANSLATABLE_KEYS.iter().map(|k| k.to_string()).collect(),
            prepend: None,
            sampling: SamplingOverrides::new(),
            wrap: true,
            deadline: None,
        }
    }

    /// Prepend banner, if one is configured and not blank
    pub fn prepend(&self) -> Option<&str> {
        self.prepend.as_deref().filter(|p| !p.trim().is_empty())
    }

    fn document_context(&self) -> DocumentContext {
        DocumentContext::new(
            &self.model,
            &self.source_language,
            &self.target_language,
            self.context_window,
        )
        .with_sampling(self.sampling.clone())
    }
}

/// Counters for one translated document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationStats {
    /// Sections in the document, prepend banner included
    pub sections: usize,
    /// Sections taken from the previous output
    pub reused: usize,
    /// Sections produced by the model
    pub generated: usize,
    /// Sections copied verbatim
    pub passthrough: usize,
    /// Worker attempts across all generated sections
    pub attempts: usize,
    /// Wall-clock time
    pub duration: Duration,
}

/// Result of a successful document translation
#[derive(Debug, Clone)]
pub struct TranslatedDocument {
    /// Translated frontmatter
    pub frontmatter: Frontmatter,
    /// Translated sections in document order, carrying their source checksums
    pub sections: Vec<Section>,
    /// Rendered output document
    pub output: String,
    /// Run counters
    pub stats: TranslationStats,
}

/// How a section got its final content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionOutcome {
    Passthrough,
    Reused,
    Generated { attempts: usize },
}

/// Translates whole documents through a [`Provider`]
pub struct TranslationOrchestrator {
    provider: Arc<dyn Provider>,
    summaries: Arc<SummaryCache>,
    segmenter: Segmenter,
    progress: Option<ProgressCallback>,
}

impl TranslationOrchestrator {
    /// Create an orchestrator with its own summary cache
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            summaries: Arc::new(SummaryCache::new()),
            segmenter: Segmenter::memoized(),
            progress: None,
        }
    }

    /// Share a summary cache with other orchestrators
    pub fn with_summary_cache(mut self, cache: Arc<SummaryCache>) -> Self {
        self.summaries = cache;
        self
    }

    /// Report section progress through `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Summary cache in use
    pub fn summary_cache(&self) -> &Arc<SummaryCache> {
        &self.summaries
    }

    /// Translate a raw markdown document.
    ///
    /// `existing` holds translations from a previous run and is only consulted
    /// when `options.incremental` is set. Cancelling `cancel` or running past
    /// `options.deadline` drops every in-flight model call.
    pub async fn translate_document(
        &self,
        raw: &str,
        options: &TranslateOptions,
        existing: &ExistingTranslations,
        cancel: &CancellationToken,
    ) -> Result<TranslatedDocument, TranslationError> {
        let Some(deadline) = options.deadline else {
            return self.run(raw, options, existing, cancel).await;
        };

        match tokio::time::timeout(deadline, self.run(raw, options, existing, cancel)).await {
            Ok(result) => result,
            Err(_) => {
                error!("Translation exceeded its deadline of {:?}", deadline);
                Err(TranslationError::DeadlineExceeded {
                    seconds: deadline.as_secs(),
                })
            }
        }
    }

    async fn run(
        &self,
        raw: &str,
        options: &TranslateOptions,
        existing: &ExistingTranslations,
        cancel: &CancellationToken,
    ) -> Result<TranslatedDocument, TranslationError> {
        let start_time = Instant::now();
        if cancel.is_cancelled() {
            return Err(TranslationError::Cancelled);
        }

        let parsed = self.segmenter.segment(raw, options.prepend())?;
        let total = parsed.len();

        let no_existing = ExistingTranslations::new();
        let existing = if options.incremental { existing } else { &no_existing };

        let translatable = parsed.sections.iter().filter(|s| s.kind.translatable().is_some()).count();
        let reused = reusable(&parsed.sections, existing)
            .filter(|s| s.kind.translatable().is_some())
            .count();
        let pending = translatable - reused;
        let frontmatter_pending = !parsed.frontmatter.translatable(&options.frontmatter_keys).is_empty();

        info!(
            "Translating document: {} sections, {} to generate, {} reusable",
            total,
            pending,
            reused
        );

        if pending > 0 || frontmatter_pending {
            self.ensure_model(&options.model, cancel).await?;
        }

        let mut context = options.document_context();
        if options.summarize && pending > 0 {
            let summary = summarize(
                self.provider.as_ref(),
                &context,
                raw,
                options.review,
                options.max_attempts,
                &self.summaries,
                cancel,
            )
            .await?;
            context = context.with_summary(summary);
        }

        let frontmatter = translate_frontmatter(
            self.provider.as_ref(),
            &context,
            &parsed.frontmatter,
            &options.frontmatter_keys,
            options.max_attempts,
            cancel,
        )
        .await?;

        let context = &context;
        let completed = &AtomicUsize::new(0);
        let mut results: Vec<(usize, Section, SectionOutcome)> = stream::iter(parsed.sections.iter().enumerate())
            .map(|(i, section)| async move {
                let (translated, outcome) = self
                    .translate_section(context, i + 1, total, section, existing, options, cancel)
                    .await?;
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(progress) = &self.progress {
                    progress(done, total);
                }
                Ok::<_, TranslationError>((i, translated, outcome))
            })
            .buffer_unordered(options.concurrent_sections.max(1))
            .try_collect()
            .await?;

        results.sort_by_key(|(i, _, _)| *i);

        let mut stats = TranslationStats {
            sections: total,
            ..TranslationStats::default()
        };
        let mut sections = Vec::with_capacity(total);
        for (_, section, outcome) in results {
            match outcome {
                SectionOutcome::Passthrough => stats.passthrough += 1,
                SectionOutcome::Reused => stats.reused += 1,
                SectionOutcome::Generated { attempts } => {
                    stats.generated += 1;
                    stats.attempts += attempts;
                }
            }
            sections.push(section);
        }

        let output = reconstruct(&frontmatter, &sections, options.wrap)?;
        stats.duration = start_time.elapsed();

        info!(
            "Document translated in {:?}: {} generated, {} reused, {} passed through",
            stats.duration, stats.generated, stats.reused, stats.passthrough
        );

        Ok(TranslatedDocument {
            frontmatter,
            sections,
            output,
            stats,
        })
    }

    async fn ensure_model(&self, model: &str, cancel: &CancellationToken) -> Result<(), TranslationError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TranslationError::Cancelled),
            result = self.provider.ensure_model(model) => {
                result.map_err(|e| {
                    error!("Model {} is not available: {}", model, e);
                    TranslationError::ModelUnavailable(e)
                })
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn translate_section(
        &self,
        context: &DocumentContext,
        index: usize,
        total: usize,
        section: &Section,
        existing: &ExistingTranslations,
        options: &TranslateOptions,
        cancel: &CancellationToken,
    ) -> Result<(Section, SectionOutcome), TranslationError> {
        let Some(kind) = section.kind.translatable() else {
            debug!("(Section {}/{}) (Type: {}) copied verbatim", index, total, section.kind);
            return Ok((section.clone(), SectionOutcome::Passthrough));
        };

        if let Some(entry) = existing.get(&section.checksum) {
            info!(
                "(Section {}/{}) (Type: {}) unchanged, reusing existing translation",
                index, total, section.kind
            );
            return Ok((section.with_content(entry.content.clone()), SectionOutcome::Reused));
        }

        let provider = self.provider.as_ref();
        let max_attempts = options.max_attempts;
        let label = format!("Section {}/{}", index, total);

        let accepted = run_attempts(&label, max_attempts, cancel, |number, critique| async move {
            info!(
                "(Section {}/{}) (Attempt {}/{}) (Type: {})",
                index, total, number, max_attempts, section.kind
            );
            let step = SectionStep {
                index,
                total,
                section,
                kind,
                attempt: number,
                critique: critique.as_deref(),
            };

            let request = context.section_worker(&step);
            let reply = attempt::generate(provider, &request, cancel).await?;
            let candidate = reply.trim_end().trim_start_matches(['\n', '\r']).to_string();
            if candidate.is_empty() {
                return Err(AttemptFailure::Malformed("the translation was empty".to_string()));
            }

            if options.review {
                review_section(provider, context, kind, &section.content, &candidate, cancel).await?;
            }

            Ok(candidate)
        })
        .await
        .map_err(|failure| match failure {
            LoopFailure::Exhausted { attempts } => {
                error!(
                    "(Section {}/{}) (Type: {}) gave up after {} attempts",
                    index, total, section.kind, attempts
                );
                TranslationError::SectionExhausted {
                    index,
                    kind: section.kind,
                    attempts,
                }
            }
            LoopFailure::Cancelled => TranslationError::Cancelled,
        })?;

        Ok((
            section.with_content(accepted.value),
            SectionOutcome::Generated {
                attempts: accepted.attempts,
            },
        ))
    }
}
