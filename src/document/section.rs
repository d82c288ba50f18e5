/*!
 * Typed markdown sections and their classification.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::checksum::checksum;

/// Heading marker at the very start of a section
static HEADING_PREFIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#{1,6}\s").expect("Invalid heading prefix regex")
});

/// Content type of a section, used to pick a translation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Heading plus the prose that follows it
    Article,
    /// Blockquote or callout run
    Blockquote,
    /// Fenced code block
    Codefence,
    /// Anything else that has translatable text
    Wildcard,
    /// Punctuation/markup only, passed through verbatim
    NoTranslate,
    /// Synthetic banner injected ahead of the document
    Prepend,
}

/// The subset of section kinds that are sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranslatableKind {
    Article,
    Blockquote,
    Codefence,
    Wildcard,
    Prepend,
}

impl SectionKind {
    /// All kinds, in classification order
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Article,
        SectionKind::Blockquote,
        SectionKind::Codefence,
        SectionKind::Wildcard,
        SectionKind::NoTranslate,
        SectionKind::Prepend,
    ];

    /// Identifier used in the persisted section container
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Blockquote => "blockquote",
            Self::Codefence => "codefence",
            Self::Wildcard => "wildcard",
            Self::NoTranslate => "no_translate",
            Self::Prepend => "prepend",
        }
    }

    /// Translation strategy for this kind, `None` when it bypasses the model
    pub fn translatable(&self) -> Option<TranslatableKind> {
        match self {
            Self::Article => Some(TranslatableKind::Article),
            Self::Blockquote => Some(TranslatableKind::Blockquote),
            Self::Codefence => Some(TranslatableKind::Codefence),
            Self::Wildcard => Some(TranslatableKind::Wildcard),
            Self::Prepend => Some(TranslatableKind::Prepend),
            Self::NoTranslate => None,
        }
    }

    /// Whether pairs of this kind take part in post-hoc validation
    pub fn is_validated(&self) -> bool {
        !matches!(self, Self::Prepend | Self::NoTranslate)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown section type: {}", s))
    }
}

impl fmt::Display for TranslatableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind: SectionKind = (*self).into();
        f.write_str(kind.as_str())
    }
}

impl From<TranslatableKind> for SectionKind {
    fn from(kind: TranslatableKind) -> Self {
        match kind {
            TranslatableKind::Article => Self::Article,
            TranslatableKind::Blockquote => Self::Blockquote,
            TranslatableKind::Codefence => Self::Codefence,
            TranslatableKind::Wildcard => Self::Wildcard,
            TranslatableKind::Prepend => Self::Prepend,
        }
    }
}

/// Whether text opens with an ATX heading marker (`#` to `######` plus whitespace)
pub fn starts_with_heading(text: &str) -> bool {
    HEADING_PREFIX_REGEX.is_match(text)
}

/// Classify a fragment of markdown. First matching rule wins.
pub fn classify(content: &str) -> SectionKind {
    if starts_with_heading(content) {
        return SectionKind::Article;
    }

    let unindented = content.trim_start_matches([' ', '\t']);
    if unindented.starts_with('>') {
        return SectionKind::Blockquote;
    }

    if content.starts_with("```") {
        return SectionKind::Codefence;
    }

    if !content.chars().any(char::is_alphanumeric) {
        return SectionKind::NoTranslate;
    }

    SectionKind::Wildcard
}

/// A contiguous, typed unit of a document.
///
/// `checksum` always identifies the *source* content: a translated section
/// keeps the checksum of the original it was produced from, which is what the
/// incremental loader joins on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Content type
    pub kind: SectionKind,
    /// Markdown content
    pub content: String,
    /// Checksum of the original content
    pub checksum: String,
}

impl Section {
    /// Create a section from original content, computing its checksum
    pub fn new(kind: SectionKind, content: impl Into<String>) -> Self {
        let content = content.into();
        let checksum = checksum(&content);
        Self { kind, content, checksum }
    }

    /// Create a section by classifying the content
    pub fn classified(content: impl Into<String>) -> Self {
        let content = content.into();
        let kind = classify(&content);
        Self::new(kind, content)
    }

    /// Same section identity with different (translated) content
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            kind: self.kind,
            content: content.into(),
            checksum: self.checksum.clone(),
        }
    }
}
