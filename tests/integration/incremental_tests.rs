/*!
 * Incremental re-translation, checksum maintenance and post-hoc validation
 */

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use mdlingo::document::{Section, checksum, parse_containers};
use mdlingo::providers::MockProvider;
use mdlingo::translation::{
    DocumentContext, ExistingTranslations, TranslateOptions, TranslatedDocument, TranslationOrchestrator, load_existing,
    retrofit_checksums, strip_checksums,
};
use mdlingo::validation::Validator;

use crate::common::{MIXED_DOC, create_temp_dir, quiet_options};

const DOC_V1: &str = "# One\nFirst paragraph.\n\n# Two\nSecond paragraph.\n\n# Three\nThird paragraph.";
const DOC_V2: &str = "# One\nFirst paragraph.\n\n# Two\nSecond paragraph, now longer.\n\n# Three\nThird paragraph.";

async fn translate(provider: &MockProvider, source: &str, options: &TranslateOptions, output: &Path) -> TranslatedDocument {
    let existing = load_existing(output).unwrap();
    let translated = TranslationOrchestrator::new(Arc::new(provider.clone()))
        .translate_document(source, options, &existing, &CancellationToken::new())
        .await
        .unwrap();
    fs::write(output, &translated.output).unwrap();
    translated
}

#[tokio::test]
async fn test_incremental_changedSection_shouldBeTheOnlyOneRegenerated() {
    let dir = create_temp_dir().unwrap();
    let output = dir.path().join("doc.de.md");
    let provider = MockProvider::uppercase();

    let first = translate(&provider, DOC_V1, &quiet_options(), &output).await;
    assert_eq!(first.stats.generated, 3);

    let second = translate(&provider, DOC_V2, &quiet_options(), &output).await;
    assert_eq!(second.stats.generated, 1);
    assert_eq!(second.stats.reused, 2);
    assert_eq!(provider.calls_with_input("# Two\nSecond paragraph, now longer."), 1);
    assert_eq!(provider.calls_with_input("# One\nFirst paragraph."), 1);
    assert_eq!(second.sections[1].content, "# TWO\nSECOND PARAGRAPH, NOW LONGER.");
    assert_eq!(second.sections[1].checksum, checksum("# Two\nSecond paragraph, now longer."));
}

#[tokio::test]
async fn test_incremental_unchangedSource_shouldBeIdempotent() {
    let dir = create_temp_dir().unwrap();
    let output = dir.path().join("guide.de.md");
    let provider = MockProvider::uppercase();

    let first = translate(&provider, MIXED_DOC, &quiet_options(), &output).await;
    let workers_after_first = provider.request_count();

    let second = translate(&provider, MIXED_DOC, &quiet_options(), &output).await;

    assert_eq!(second.output, first.output);
    assert_eq!(second.stats.generated, 0);
    assert_eq!(second.stats.reused, 5);
    // Only the frontmatter goes back to the model
    assert_eq!(provider.request_count(), workers_after_first + 1);
    assert_eq!(provider.task_count("frontmatter_worker"), 2);
}

#[tokio::test]
async fn test_incremental_disabled_shouldRegenerateEverything() {
    let dir = create_temp_dir().unwrap();
    let output = dir.path().join("doc.de.md");
    let provider = MockProvider::uppercase();
    let options = TranslateOptions {
        incremental: false,
        ..quiet_options()
    };

    translate(&provider, DOC_V1, &options, &output).await;
    let second = translate(&provider, DOC_V1, &options, &output).await;

    assert_eq!(second.stats.generated, 3);
    assert_eq!(second.stats.reused, 0);
    assert_eq!(provider.calls_with_input("# Three\nThird paragraph."), 2);
}

#[tokio::test]
async fn test_stripChecksums_shouldForceRegeneration() {
    let dir = create_temp_dir().unwrap();
    let output = dir.path().join("doc.de.md");
    let provider = MockProvider::uppercase();
    translate(&provider, DOC_V1, &quiet_options(), &output).await;

    let target = checksum("# Three\nThird paragraph.");
    let removed = strip_checksums(&output, &HashSet::from([target.clone()])).unwrap();
    assert_eq!(removed, 1);
    assert!(!load_existing(&output).unwrap().contains(&target));

    let second = translate(&provider, DOC_V1, &quiet_options(), &output).await;
    assert_eq!(second.stats.generated, 1);
    assert_eq!(provider.calls_with_input("# Three\nThird paragraph."), 2);
}

#[tokio::test]
async fn test_retrofitChecksums_olderOutput_shouldBecomeReusable() {
    let dir = create_temp_dir().unwrap();
    let output = dir.path().join("doc.de.md");
    let provider = MockProvider::uppercase();
    translate(&provider, DOC_V1, &quiet_options(), &output).await;

    let all: HashSet<String> = parse_containers(&fs::read_to_string(&output).unwrap())
        .into_iter()
        .filter_map(|c| c.checksum)
        .collect();
    assert_eq!(strip_checksums(&output, &all).unwrap(), 3);
    assert!(load_existing(&output).unwrap().is_empty());

    assert_eq!(retrofit_checksums(DOC_V1, &output, None).unwrap(), 3);
    assert_eq!(retrofit_checksums(DOC_V1, &output, None).unwrap(), 0);

    let second = translate(&provider, DOC_V1, &quiet_options(), &output).await;
    assert_eq!(second.stats.reused, 3);
}

#[tokio::test]
async fn test_retrofitChecksums_kindMismatch_shouldSkipContainer() {
    let dir = create_temp_dir().unwrap();
    let output = dir.path().join("doc.de.md");
    fs::write(
        &output,
        "---\n---\n\n<span class=\"mdlingo-section\" data-mdlingo-type=\"blockquote\" data-mdlingo-index=\"1\">\n\n> EINS\n\n</span>",
    )
    .unwrap();

    assert_eq!(retrofit_checksums(DOC_V1, &output, None).unwrap(), 0);
}

#[tokio::test]
async fn test_validatorAudit_rejectedSection_shouldBeStripped() {
    let dir = create_temp_dir().unwrap();
    let output = dir.path().join("guide.de.md");
    translate(&MockProvider::uppercase(), MIXED_DOC, &quiet_options(), &output).await;

    let critic = MockProvider::new(|request| {
        if request.task == "blockquote_critic" {
            Ok("No, the callout marker was translated.".to_string())
        } else {
            Ok("Yes".to_string())
        }
    });
    let validator = Validator::new(
        Arc::new(critic.clone()),
        DocumentContext::new("test-model", "English", "German", 2048),
    )
    .with_concurrency(3);

    let report = validator.audit(MIXED_DOC, &output, None, true).await.unwrap();

    let quote = Section::classified("> [!NOTE]\n> Read this first.");
    assert_eq!(report.total(), 5);
    assert_eq!(report.passed.len(), 4);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].checksum, quote.checksum);
    assert_eq!(report.failed[0].critique, "No, the callout marker was translated.");
    assert_eq!(report.stripped, 1);
    assert_eq!(critic.request_count(), 5);

    let existing: ExistingTranslations = load_existing(&output).unwrap();
    assert!(!existing.contains(&quote.checksum));
    assert_eq!(existing.len(), 5);
}
