/*!
 * Immutable request records for each pipeline step.
 *
 * A [`DocumentContext`] holds everything shared by one document run (model,
 * languages, summary, sampling). Every model call is built from it plus the
 * data of the current step, so no call depends on state left behind by a
 * previous one.
 */

use crate::document::{Section, TranslatableKind};
use crate::providers::GenerationRequest;

use super::prompts::{PromptKind, SamplingOverrides, render, templates};

/// Read-only context shared by all steps of one document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContext {
    /// Model name
    pub model: String,
    /// Source language, as written in prompts
    pub source_language: String,
    /// Target language, as written in prompts
    pub target_language: String,
    /// Context window passed to the model
    pub context_window: u32,
    /// Document summary, empty until generated
    pub summary: String,
    /// Per-category sampling overrides
    pub sampling: SamplingOverrides,
}

/// One attempt at translating one section
#[derive(Debug, Clone, Copy)]
pub struct SectionStep<'a> {
    /// 1-based position in the document
    pub index: usize,
    /// Number of sections in the document
    pub total: usize,
    /// Section being translated
    pub section: &'a Section,
    /// Translation strategy
    pub kind: TranslatableKind,
    /// 1-based attempt number
    pub attempt: usize,
    /// Reviewer feedback on the previous attempt
    pub critique: Option<&'a str>,
}

impl DocumentContext {
    /// Create a context without summary or overrides
    pub fn new(
        model: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        context_window: u32,
    ) -> Self {
        Self {
            model: model.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            context_window,
            summary: String::new(),
            sampling: SamplingOverrides::new(),
        }
    }

    /// Same context with a summary attached
    pub fn with_summary(&self, summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..self.clone()
        }
    }

    /// Same context with sampling overrides
    pub fn with_sampling(mut self, sampling: SamplingOverrides) -> Self {
        self.sampling = sampling;
        self
    }

    fn build(&self, kind: PromptKind, vars: &[(&str, &str)], input: &str, feedback: Option<&str>) -> GenerationRequest {
        let template = kind.template();
        let mut vars: Vec<(&str, &str)> = vars.to_vec();
        vars.push(("source_language", self.source_language.as_str()));
        vars.push(("target_language", self.target_language.as_str()));

        let system = render(template.system, &vars);
        let mut prompt = render(template.user, &vars);
        if let Some(critique) = feedback.filter(|c| !c.trim().is_empty()) {
            prompt.push_str(&render(templates::FEEDBACK_BLOCK, &[("critique", critique)]));
        }

        GenerationRequest::new(&self.model, system, prompt)
            .with_options(kind.sampling(&self.sampling).with_context_window(self.context_window))
            .with_task(kind.name(), input)
    }

    /// Worker request for a section attempt
    pub fn section_worker(&self, step: &SectionStep<'_>) -> GenerationRequest {
        let mut request = self.build(
            PromptKind::Worker(step.kind),
            &[("summary", self.summary.as_str()), ("section", step.section.content.as_str())],
            &step.section.content,
            step.critique,
        );
        if step.kind != TranslatableKind::Prepend {
            request.system.push_str("\n\n");
            request.system.push_str(templates::SECTION_SCOPE);
        }
        request
    }

    /// Critic request comparing a section with a candidate translation
    pub fn section_critic(&self, kind: TranslatableKind, original: &str, candidate: &str) -> GenerationRequest {
        self.build(
            PromptKind::Critic(kind),
            &[
                ("summary", self.summary.as_str()),
                ("section", original),
                ("translated_section", candidate),
            ],
            candidate,
            None,
        )
    }

    /// Summary worker request
    pub fn summary_worker(&self, document: &str, critique: Option<&str>) -> GenerationRequest {
        self.build(
            PromptKind::SummaryWorker,
            &[("document", document), ("critique", critique.unwrap_or_default())],
            document,
            None,
        )
    }

    /// Summary critic request
    pub fn summary_critic(&self, document: &str, summary: &str) -> GenerationRequest {
        self.build(
            PromptKind::SummaryCritic,
            &[("document", document), ("summary", summary)],
            summary,
            None,
        )
    }

    /// Frontmatter worker request; `frontmatter` is the JSON object sent
    pub fn frontmatter_worker(&self, frontmatter: &str, critique: Option<&str>) -> GenerationRequest {
        self.build(
            PromptKind::FrontmatterWorker,
            &[("frontmatter", frontmatter)],
            frontmatter,
            critique,
        )
    }
}
