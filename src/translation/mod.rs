/*!
 * Translation pipeline for markdown documents.
 *
 * This module turns a segmented document into a translated one using a
 * text generation provider. It is split into several submodules:
 *
 * - `orchestrator`: Drives a whole document through the pipeline
 * - `incremental`: Reuses, validates and repairs previous outputs
 * - `prompts`: Prompt templates and sampling presets per prompt category
 * - `request`: Immutable request records built for every model call
 * - `attempt`: The bounded retry loop shared by every step
 * - `critic`: Reviewer verdicts
 * - `summary`: Document summaries and their cache
 * - `frontmatter`: Frontmatter translation
 */

// Re-export main types for easier usage
pub use self::critic::{Verdict, parse_verdict};
pub use self::incremental::{
    ExistingEntry, ExistingTranslations, TranslationPair, extract_translation_pairs, load_existing,
    retrofit_checksums, strip_checksums,
};
pub use self::orchestrator::{
    ProgressCallback, TranslateOptions, TranslatedDocument, TranslationOrchestrator, TranslationStats,
};
pub use self::prompts::{PromptKind, SamplingOptions, SamplingOverrides};
pub use self::request::DocumentContext;
pub use self::summary::SummaryCache;

// Submodules
pub mod critic;
pub mod incremental;
pub mod orchestrator;
pub mod prompts;
pub mod request;
pub mod summary;

mod attempt;
mod frontmatter;
