/*!
 * Tests for critic verdicts, prompt categories and request building
 */

use mdlingo::document::{Section, SectionKind, TranslatableKind};
use mdlingo::translation::request::SectionStep;
use mdlingo::translation::{DocumentContext, PromptKind, SamplingOptions, SamplingOverrides, Verdict, parse_verdict};

#[test]
fn test_parseVerdict_yesPrefix_shouldApproveEvenWithNo() {
    assert_eq!(parse_verdict("  Yes. No changes needed."), Verdict::Approved);
}

#[test]
fn test_parseVerdict_noWithPunctuation_shouldReject() {
    let verdict = parse_verdict("No, the heading was dropped.\n");
    assert_eq!(verdict, Verdict::Rejected("No, the heading was dropped.".to_string()));
}

#[test]
fn test_parseVerdict_noAsPartOfWord_shouldApprove() {
    assert!(parse_verdict("Nothing to add, nobody would notice.").is_approved());
}

#[test]
fn test_promptKind_names_shouldRoundTrip() {
    for kind in PromptKind::ALL {
        assert_eq!(PromptKind::from_name(kind.name()), Some(kind));
        assert_eq!(kind.is_critic(), kind.name().ends_with("_critic"));
    }
    assert_eq!(PromptKind::from_name("poem_worker"), None);
}

#[test]
fn test_promptKind_sampling_shouldFollowPresetsAndOverrides() {
    let none = SamplingOverrides::new();
    assert_eq!(
        PromptKind::Worker(TranslatableKind::Article).sampling(&none),
        SamplingOptions::STRICT
    );
    assert_eq!(
        PromptKind::Critic(TranslatableKind::Blockquote).sampling(&none),
        SamplingOptions::LENIENT
    );
    assert_eq!(PromptKind::SummaryCritic.sampling(&none), SamplingOptions::CREATIVE);

    let overrides = SamplingOverrides::new().with("article_worker", SamplingOptions::DEFAULT);
    assert_eq!(
        PromptKind::Worker(TranslatableKind::Article).sampling(&overrides),
        SamplingOptions::DEFAULT
    );
}

#[test]
fn test_sectionWorker_shouldCarryContentSummaryAndCritique() {
    let context = DocumentContext::new("test-model", "English", "German", 4096).with_summary("About cats.");
    let section = Section::new(SectionKind::Article, "# Cats\nThey {purr}.");
    let step = SectionStep {
        index: 2,
        total: 5,
        section: &section,
        kind: TranslatableKind::Article,
        attempt: 2,
        critique: Some("Keep the heading."),
    };

    let request = context.section_worker(&step);

    assert_eq!(request.task, "article_worker");
    assert_eq!(request.input, section.content);
    assert_eq!(request.model, "test-model");
    assert_eq!(request.options.num_ctx, 4096);
    assert!(request.prompt.contains("They {purr}."));
    assert!(request.system.contains("About cats."));
    assert!(format!("{}{}", request.system, request.prompt).contains("Keep the heading."));
}
