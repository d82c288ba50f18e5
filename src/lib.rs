/*!
 * # mdlingo - incremental markdown translation with a local LLM
 *
 * A Rust library for translating markdown documents section by section
 * through a language model, keeping markdown syntax intact and only
 * re-translating sections whose source changed.
 *
 * ## Features
 *
 * - Segment documents into frontmatter and typed sections (articles,
 *   blockquotes, code fences, free text, untranslatable separators)
 * - Translate each section through an Ollama model, with an optional critic
 *   reviewing every reply within a bounded attempt budget
 * - Translate allow-listed frontmatter values through a strict JSON contract
 * - Summarize the document once and share the summary with every section
 * - Persist sections in checksum-tagged containers so the next run reuses
 *   unchanged translations
 * - Validate stored translations after the fact, and invalidate failures
 *
 * ## Architecture
 *
 * - `document`: segmentation, checksums, frontmatter and reconstruction
 * - `translation`: prompts, retry and critique loops, orchestration and the
 *   incremental index
 * - `validation`: post-hoc critic runs over stored translations
 * - `providers`: the `Provider` trait, the Ollama client and a mock for tests
 * - `app_config`: JSON configuration
 * - `app_controller`: file and folder workflows
 * - `file_utils`, `language_utils`: filesystem and ISO 639 helpers
 * - `errors`: error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod translation;
pub mod validation;

pub use app_config::Config;
pub use app_controller::{Controller, FileOutcome, FolderSummary};
pub use document::{Frontmatter, ParsedDocument, Section, SectionKind, Segmenter, checksum, reconstruct, segment};
pub use errors::{AppError, DocumentError, ProviderError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use providers::{MockProvider, Ollama, Provider};
pub use translation::{TranslateOptions, TranslatedDocument, TranslationOrchestrator, TranslationStats};
pub use validation::{AuditReport, Validator};
