/*!
 * Controller workflows: single files, folders, validation and retrofit
 */

use std::fs;
use std::sync::Arc;

use mdlingo::app_config::Config;
use mdlingo::app_controller::{Controller, FileOutcome};
use mdlingo::document::parse_containers;
use mdlingo::errors::TranslationError;
use mdlingo::providers::MockProvider;

use crate::common::{MIXED_DOC, SIMPLE_DOC, create_temp_dir, create_test_file, init_logging, test_config};

fn controller(config: Config, provider: &MockProvider) -> Controller {
    Controller::with_provider(config, Arc::new(provider.clone()))
}

#[tokio::test]
async fn test_run_shouldWriteOutputNextToInput() {
    init_logging();
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "hello.md", SIMPLE_DOC).unwrap();
    let provider = MockProvider::uppercase();

    let outcome = controller(test_config(), &provider).run(&input, None, false).await.unwrap();

    let expected_path = dir.path().join("hello.de.md");
    match outcome {
        FileOutcome::Translated { output, stats } => {
            assert_eq!(output, expected_path);
            assert_eq!(stats.generated, 1);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    let written = fs::read_to_string(&expected_path).unwrap();
    assert!(written.starts_with("---\ntitle: HELLO\n---\n\n"));
    assert_eq!(parse_containers(&written).len(), 1);
}

#[tokio::test]
async fn test_run_secondTime_shouldReuseExistingOutput() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "guide.md", MIXED_DOC).unwrap();
    let provider = MockProvider::uppercase();
    let controller = controller(test_config(), &provider);

    controller.run(&input, None, false).await.unwrap();
    let outcome = controller.run(&input, None, false).await.unwrap();

    match outcome {
        FileOutcome::Translated { stats, .. } => {
            assert_eq!(stats.generated, 0);
            assert_eq!(stats.reused, 5);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_run_handWrittenOutput_shouldSkipUnlessForced() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "hello.md", SIMPLE_DOC).unwrap();
    let output = create_test_file(dir.path(), "hello.de.md", "# Hallo\nVon Hand geschrieben.").unwrap();
    let provider = MockProvider::uppercase();
    let controller = controller(test_config(), &provider);

    let outcome = controller.run(&input, None, false).await.unwrap();
    assert_eq!(outcome, FileOutcome::Skipped { output: output.clone() });
    assert_eq!(fs::read_to_string(&output).unwrap(), "# Hallo\nVon Hand geschrieben.");
    assert_eq!(provider.request_count(), 0);

    let forced = controller.run(&input, None, true).await.unwrap();
    assert!(matches!(forced, FileOutcome::Translated { .. }));
    assert!(fs::read_to_string(&output).unwrap().contains("# HI\nBODY TEXT."));
}

#[tokio::test]
async fn test_run_failedTranslation_shouldLeaveOutputUntouched() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "hello.md", "# Hi\nBody text.").unwrap();
    let output = dir.path().join("custom.md");
    let mut config = test_config();
    config.translation.max_attempts = 2;
    let provider = MockProvider::failing();

    let error = controller(config, &provider)
        .run(&input, Some(output.clone()), false)
        .await
        .unwrap_err();

    assert!(matches!(
        error.downcast_ref::<TranslationError>(),
        Some(TranslationError::SectionExhausted { .. })
    ));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_runFolder_shouldTranslateSourcesAndRecordFailures() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "a.md", "# A\nAlpha.").unwrap();
    create_test_file(dir.path(), "nested/b.md", "# B\nBravo.").unwrap();
    create_test_file(dir.path(), "broken.md", "---\ntitle: [unclosed\n---\n\nText.").unwrap();
    create_test_file(dir.path(), "notes.txt", "not markdown").unwrap();
    let provider = MockProvider::uppercase();

    let summary = controller(test_config(), &provider)
        .run_folder(dir.path(), false)
        .await
        .unwrap();

    assert_eq!(summary.translated, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].0.ends_with("broken.md"));
    assert!(!summary.cancelled);
    assert!(dir.path().join("a.de.md").exists());
    assert!(dir.path().join("nested").join("b.de.md").exists());

    // Outputs of the first run are not picked up as sources
    let again = controller(test_config(), &provider)
        .run_folder(dir.path(), false)
        .await
        .unwrap();
    assert_eq!(again.translated, 2);
    assert!(!dir.path().join("a.de.de.md").exists());
}

#[test]
fn test_runFolder_cancelled_shouldStopBatch() {
    let dir = create_temp_dir().unwrap();
    create_test_file(dir.path(), "a.md", "# A\nAlpha.").unwrap();
    create_test_file(dir.path(), "b.md", "# B\nBravo.").unwrap();
    let provider = MockProvider::uppercase();
    let controller = controller(test_config(), &provider);
    controller.cancellation_token().cancel();

    let summary = tokio_test::block_on(controller.run_folder(dir.path(), false)).unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.translated, 0);
    assert!(summary.failed.is_empty());
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_validate_shouldAuditStoredOutput() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "guide.md", MIXED_DOC).unwrap();
    controller(test_config(), &MockProvider::uppercase())
        .run(&input, None, false)
        .await
        .unwrap();

    let critic = MockProvider::uppercase();
    let report = controller(test_config(), &critic)
        .validate(&input, &dir.path().join("guide.de.md"), false)
        .await
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.passed.len(), 5);
    assert_eq!(critic.ensured_models(), vec!["test-model"]);
}

#[test]
fn test_retrofit_shouldRestoreChecksums() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_file(dir.path(), "doc.md", "# One\nFirst.\n\n# Two\nSecond.").unwrap();
    let output = create_test_file(
        dir.path(),
        "doc.de.md",
        "---\n---\n\n<span class=\"mdlingo-section\" data-mdlingo-type=\"article\" data-mdlingo-index=\"1\">\n\n# Eins\nErster.\n\n</span>\n\n<span class=\"mdlingo-section\" data-mdlingo-type=\"article\" data-mdlingo-index=\"2\">\n\n# Zwei\nZweiter.\n\n</span>",
    )
    .unwrap();

    let added = controller(test_config(), &MockProvider::uppercase())
        .retrofit(&input, &output)
        .unwrap();

    assert_eq!(added, 2);
    let containers = parse_containers(&fs::read_to_string(&output).unwrap());
    assert!(containers.iter().all(|c| c.checksum.is_some()));
}
