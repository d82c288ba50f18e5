/*!
 * Prompt catalogue for document translation.
 *
 * Every model call belongs to a [`PromptKind`]. Each kind maps statically to
 * a system template, a user template and default sampling options, so adding
 * a section kind without prompts is a compile error rather than a lookup
 * failure at runtime.
 */

pub mod sampling;
pub mod templates;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::document::TranslatableKind;

pub use sampling::{SamplingOptions, SamplingOverrides};

/// Placeholder syntax used by the templates
static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([a-z_]+)\}").expect("Invalid placeholder regex")
});

/// Category of a model call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    /// Document summary
    SummaryWorker,
    /// Summary review
    SummaryCritic,
    /// Frontmatter value translation
    FrontmatterWorker,
    /// Section translation
    Worker(TranslatableKind),
    /// Section translation review
    Critic(TranslatableKind),
}

/// The static triple attached to each prompt kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptTemplate {
    /// System prompt template
    pub system: &'static str,
    /// User prompt template
    pub user: &'static str,
    /// Default sampling options
    pub sampling: SamplingOptions,
}

impl PromptKind {
    /// Every prompt kind
    pub const ALL: [PromptKind; 13] = [
        PromptKind::SummaryWorker,
        PromptKind::SummaryCritic,
        PromptKind::FrontmatterWorker,
        PromptKind::Worker(TranslatableKind::Article),
        PromptKind::Critic(TranslatableKind::Article),
        PromptKind::Worker(TranslatableKind::Blockquote),
        PromptKind::Critic(TranslatableKind::Blockquote),
        PromptKind::Worker(TranslatableKind::Codefence),
        PromptKind::Critic(TranslatableKind::Codefence),
        PromptKind::Worker(TranslatableKind::Wildcard),
        PromptKind::Critic(TranslatableKind::Wildcard),
        PromptKind::Worker(TranslatableKind::Prepend),
        PromptKind::Critic(TranslatableKind::Prepend),
    ];

    /// Category name, used in logs and as the sampling override key
    pub fn name(&self) -> &'static str {
        use TranslatableKind::*;
        match self {
            Self::SummaryWorker => "summary_worker",
            Self::SummaryCritic => "summary_critic",
            Self::FrontmatterWorker => "frontmatter_worker",
            Self::Worker(Article) => "article_worker",
            Self::Critic(Article) => "article_critic",
            Self::Worker(Blockquote) => "blockquote_worker",
            Self::Critic(Blockquote) => "blockquote_critic",
            Self::Worker(Codefence) => "codefence_worker",
            Self::Critic(Codefence) => "codefence_critic",
            Self::Worker(Wildcard) => "wildcard_worker",
            Self::Critic(Wildcard) => "wildcard_critic",
            Self::Worker(Prepend) => "prepend_worker",
            Self::Critic(Prepend) => "prepend_critic",
        }
    }

    /// Look a kind up by its category name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Whether the call asks for a verdict rather than content
    pub fn is_critic(&self) -> bool {
        matches!(self, Self::SummaryCritic | Self::Critic(_))
    }

    /// Templates and default sampling for this kind
    pub fn template(&self) -> PromptTemplate {
        use templates::*;
        use TranslatableKind::*;

        let (system, user, sampling) = match self {
            Self::SummaryWorker => (SUMMARY_WORKER_SYSTEM, SUMMARY_WORKER_PROMPT, SamplingOptions::STRICT),
            Self::SummaryCritic => (SUMMARY_CRITIC_SYSTEM, SUMMARY_CRITIC_PROMPT, SamplingOptions::CREATIVE),
            Self::FrontmatterWorker => (
                FRONTMATTER_WORKER_SYSTEM,
                FRONTMATTER_WORKER_PROMPT,
                SamplingOptions::STRICT,
            ),
            Self::Worker(Article) => (ARTICLE_WORKER_SYSTEM, ARTICLE_WORKER_PROMPT, SamplingOptions::STRICT),
            Self::Critic(Article) => (ARTICLE_CRITIC_SYSTEM, ARTICLE_CRITIC_PROMPT, SamplingOptions::LENIENT),
            Self::Worker(Blockquote) => (
                BLOCKQUOTE_WORKER_SYSTEM,
                BLOCKQUOTE_WORKER_PROMPT,
                SamplingOptions::STRICT,
            ),
            Self::Critic(Blockquote) => (
                BLOCKQUOTE_CRITIC_SYSTEM,
                BLOCKQUOTE_CRITIC_PROMPT,
                SamplingOptions::LENIENT,
            ),
            Self::Worker(Codefence) => (
                CODEFENCE_WORKER_SYSTEM,
                CODEFENCE_WORKER_PROMPT,
                SamplingOptions::STRICT,
            ),
            Self::Critic(Codefence) => (
                CODEFENCE_CRITIC_SYSTEM,
                CODEFENCE_CRITIC_PROMPT,
                SamplingOptions::LENIENT,
            ),
            Self::Worker(Wildcard) => (WILDCARD_WORKER_SYSTEM, WILDCARD_WORKER_PROMPT, SamplingOptions::STRICT),
            Self::Critic(Wildcard) => (WILDCARD_CRITIC_SYSTEM, WILDCARD_CRITIC_PROMPT, SamplingOptions::LENIENT),
            Self::Worker(Prepend) => (PREPEND_WORKER_SYSTEM, PREPEND_WORKER_PROMPT, SamplingOptions::STRICT),
            Self::Critic(Prepend) => (PREPEND_CRITIC_SYSTEM, PREPEND_CRITIC_PROMPT, SamplingOptions::CREATIVE),
        };

        PromptTemplate { system, user, sampling }
    }

    /// Sampling options for this kind, honouring overrides
    pub fn sampling(&self, overrides: &SamplingOverrides) -> SamplingOptions {
        overrides
            .get(self.name())
            .copied()
            .unwrap_or_else(|| self.template().sampling)
    }
}

/// Fill `{name}` placeholders in a single pass.
///
/// Substituted values are never scanned again, so content containing braces
/// is inserted verbatim. Unknown placeholders are left as they are.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    PLACEHOLDER_REGEX
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
        })
        .into_owned()
}
