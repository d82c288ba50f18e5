/*!
 * Error types for the mdlingo application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Only budget exhaustion, cancellation and document-level problems escape the
 * translation pipeline; everything retryable stays inside the retry loops.
 */

use thiserror::Error;

use crate::document::SectionKind;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The requested model is not installed and could not be fetched
    #[error("Model '{model}' is unavailable: {reason}")]
    ModelUnavailable {
        /// Model name
        model: String,
        /// Why the model could not be made available
        reason: String,
    },
}

/// Errors raised while parsing or rendering markdown documents
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The frontmatter block is not valid YAML
    #[error("Malformed frontmatter: {0}")]
    MalformedFrontmatter(String),

    /// The frontmatter block parsed, but is not a key/value mapping
    #[error("Frontmatter must be a mapping, found {0}")]
    FrontmatterNotMapping(String),

    /// Frontmatter could not be serialized back to YAML
    #[error("Failed to serialize frontmatter: {0}")]
    Serialize(String),

    /// Reading or writing a document failed
    #[error("I/O error on {path}: {message}")]
    Io {
        /// Path of the document
        path: String,
        /// Underlying error message
        message: String,
    },
}

/// Fatal translation failures.
///
/// Each variant names the stage that gave up so callers can decide whether a
/// failed document aborts a batch or is recorded and skipped.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The document summary could not be approved within the attempt budget
    #[error("Could not generate summary after {attempts} attempts")]
    SummaryExhausted {
        /// Attempts made
        attempts: usize,
    },

    /// The frontmatter could not be translated within the attempt budget
    #[error("Could not translate frontmatter after {attempts} attempts")]
    FrontmatterExhausted {
        /// Attempts made
        attempts: usize,
    },

    /// A section could not be translated within the attempt budget
    #[error("Could not translate section {index} ({kind}) after {attempts} attempts")]
    SectionExhausted {
        /// 1-based section index
        index: usize,
        /// Section kind
        kind: SectionKind,
        /// Attempts made
        attempts: usize,
    },

    /// The model could not be made available before translating
    #[error("Model unavailable: {0}")]
    ModelUnavailable(#[source] ProviderError),

    /// The caller cancelled the run
    #[error("Translation cancelled")]
    Cancelled,

    /// The caller-supplied deadline elapsed
    #[error("Translation deadline of {seconds}s exceeded")]
    DeadlineExceeded {
        /// Deadline in seconds
        seconds: u64,
    },

    /// The document itself could not be parsed or rendered
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from document handling
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl TranslationError {
    /// Whether the failure came from running out of attempts
    pub fn is_exhaustion(&self) -> bool {
        matches!(
            self,
            Self::SummaryExhausted { .. } | Self::FrontmatterExhausted { .. } | Self::SectionExhausted { .. }
        )
    }
}
