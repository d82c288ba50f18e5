/*!
 * Whole-document translation tests against the mock provider
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use mdlingo::document::{SectionKind, checksum};
use mdlingo::errors::TranslationError;
use mdlingo::providers::MockProvider;
use mdlingo::translation::{ExistingTranslations, TranslateOptions, TranslationOrchestrator};

use crate::common::{MIXED_DOC, SIMPLE_DOC, init_logging, quiet_options};

fn orchestrator(provider: &MockProvider) -> TranslationOrchestrator {
    TranslationOrchestrator::new(Arc::new(provider.clone()))
}

#[tokio::test]
async fn test_translateDocument_uppercaseStub_shouldProduceWrappedDocument() {
    init_logging();
    let provider = MockProvider::uppercase();
    let options = TranslateOptions {
        frontmatter_keys: vec!["title".to_string()],
        ..quiet_options()
    };

    let translated = orchestrator(&provider)
        .translate_document(SIMPLE_DOC, &options, &ExistingTranslations::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(translated.frontmatter.get_str("title"), Some("HELLO"));
    assert_eq!(translated.sections.len(), 1);
    assert_eq!(translated.sections[0].kind, SectionKind::Article);
    assert_eq!(translated.sections[0].content, "# HI\nBODY TEXT.");
    assert_eq!(translated.sections[0].checksum, checksum("# Hi\nBody text."));

    let expected = format!(
        "---\ntitle: HELLO\n---\n\n<span class=\"mdlingo-section\" data-mdlingo-type=\"article\" data-mdlingo-index=\"1\" data-mdlingo-checksum=\"{}\">\n\n# HI\nBODY TEXT.\n\n</span>",
        checksum("# Hi\nBody text.")
    );
    assert_eq!(translated.output, expected);
    assert_eq!(provider.task_count("article_critic"), 0);
}

#[tokio::test]
async fn test_translateDocument_mixedDocument_shouldTranslateOnlyProse() {
    let provider = MockProvider::uppercase();

    let translated = orchestrator(&provider)
        .translate_document(MIXED_DOC, &quiet_options(), &ExistingTranslations::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(translated.frontmatter.get_str("title"), Some("GUIDE"));
    assert_eq!(translated.frontmatter.get_str("description"), Some("HOW TO START"));
    assert_eq!(translated.frontmatter.get_str("layout"), Some("post"));
    assert_eq!(translated.frontmatter.keys(), vec!["title", "description", "layout"]);

    let frontmatter_requests: Vec<_> = provider
        .requests()
        .into_iter()
        .filter(|r| r.task == "frontmatter_worker")
        .collect();
    assert_eq!(frontmatter_requests.len(), 1);
    assert!(!frontmatter_requests[0].input.contains("layout"));

    assert_eq!(translated.stats.sections, 6);
    assert_eq!(translated.stats.generated, 5);
    assert_eq!(translated.stats.passthrough, 1);
    assert_eq!(translated.sections[2].content, "---");
    assert_eq!(provider.task_count("codefence_worker"), 1);
    assert_eq!(provider.task_count("blockquote_worker"), 1);
    assert_eq!(provider.task_count("wildcard_worker"), 1);
}

#[tokio::test]
async fn test_translateDocument_alwaysRejected_shouldExhaustAfterBudget() {
    let provider = MockProvider::rejecting();
    let options = TranslateOptions {
        review: true,
        max_attempts: 3,
        ..quiet_options()
    };

    let result = orchestrator(&provider)
        .translate_document("# Hi\nBody text.", &options, &ExistingTranslations::new(), &CancellationToken::new())
        .await;

    match result {
        Err(TranslationError::SectionExhausted { index, kind, attempts }) => {
            assert_eq!(index, 1);
            assert_eq!(kind, SectionKind::Article);
            assert_eq!(attempts, 3);
        }
        other => panic!("expected SectionExhausted, got {:?}", other.map(|d| d.output)),
    }
    assert_eq!(provider.task_count("article_worker"), 3);
    assert_eq!(provider.task_count("article_critic"), 3);
}

#[tokio::test]
async fn test_translateDocument_critique_shouldReachNextAttempt() {
    let critic_calls = Arc::new(AtomicUsize::new(0));
    let calls = Arc::clone(&critic_calls);
    let provider = MockProvider::new(move |request| {
        if request.is_critic() {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok("No, the heading marker is missing.".to_string())
            } else {
                Ok("Yes".to_string())
            }
        } else {
            Ok(request.input.to_uppercase())
        }
    });
    let options = TranslateOptions {
        review: true,
        ..quiet_options()
    };

    let translated = orchestrator(&provider)
        .translate_document("# Hi\nBody text.", &options, &ExistingTranslations::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(translated.stats.attempts, 2);
    let workers: Vec<_> = provider
        .requests()
        .into_iter()
        .filter(|r| r.task == "article_worker")
        .collect();
    assert_eq!(workers.len(), 2);
    assert!(!workers[0].prompt.contains("heading marker is missing"));
    assert!(workers[1].prompt.contains("heading marker is missing"));
}

#[tokio::test]
async fn test_translateDocument_providerFailing_shouldExhaust() {
    let provider = MockProvider::failing();
    let options = TranslateOptions {
        max_attempts: 2,
        ..quiet_options()
    };

    let result = orchestrator(&provider)
        .translate_document("Just prose.", &options, &ExistingTranslations::new(), &CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(TranslationError::SectionExhausted { attempts: 2, .. })
    ));
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn test_translateDocument_modelUnavailable_shouldFailBeforeGenerating() {
    let provider = MockProvider::uppercase().with_unavailable_model("test-model");

    let result = orchestrator(&provider)
        .translate_document(SIMPLE_DOC, &quiet_options(), &ExistingTranslations::new(), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(TranslationError::ModelUnavailable(_))));
    assert_eq!(provider.request_count(), 0);
    assert_eq!(provider.ensured_models(), vec!["test-model"]);
}

#[tokio::test]
async fn test_translateDocument_summary_shouldBeSharedBySections() {
    let provider = MockProvider::uppercase();
    let orchestrator = orchestrator(&provider);
    let options = TranslateOptions {
        summarize: true,
        review: true,
        ..quiet_options()
    };

    for _ in 0..2 {
        orchestrator
            .translate_document(MIXED_DOC, &options, &ExistingTranslations::new(), &CancellationToken::new())
            .await
            .unwrap();
    }

    assert_eq!(provider.task_count("summary_worker"), 1);
    assert_eq!(provider.task_count("summary_critic"), 1);
    assert_eq!(orchestrator.summary_cache().len(), 1);
    assert!(
        provider
            .requests()
            .iter()
            .filter(|r| r.task == "article_worker")
            .all(|r| r.system.contains("A SHORT SUMMARY."))
    );
}

#[tokio::test]
async fn test_translateDocument_prepend_shouldBecomeFirstSection() {
    let provider = MockProvider::uppercase();
    let options = TranslateOptions {
        prepend: Some("*This page was translated by a machine.*".to_string()),
        ..quiet_options()
    };

    let translated = orchestrator(&provider)
        .translate_document("# Hi\nBody text.", &options, &ExistingTranslations::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(translated.sections.len(), 2);
    assert_eq!(translated.sections[0].kind, SectionKind::Prepend);
    assert_eq!(translated.sections[0].content, "*THIS PAGE WAS TRANSLATED BY A MACHINE.*");
    assert_eq!(provider.task_count("prepend_worker"), 1);
    assert!(translated.output.contains("data-mdlingo-type=\"prepend\" data-mdlingo-index=\"1\""));
    assert!(translated.output.contains("data-mdlingo-type=\"article\" data-mdlingo-index=\"2\""));
}

#[tokio::test]
async fn test_translateDocument_alreadyCancelled_shouldNotCallModel() {
    let provider = MockProvider::uppercase();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = orchestrator(&provider)
        .translate_document(SIMPLE_DOC, &quiet_options(), &ExistingTranslations::new(), &cancel)
        .await;

    assert!(matches!(result, Err(TranslationError::Cancelled)));
    assert_eq!(provider.request_count(), 0);
    assert!(provider.ensured_models().is_empty());
}

#[tokio::test]
async fn test_translateDocument_cancelledInFlight_shouldStopPromptly() {
    let provider = MockProvider::uppercase().with_delay(Duration::from_secs(30));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator(&provider).translate_document(
            "# Hi\nBody text.",
            &quiet_options(),
            &ExistingTranslations::new(),
            &cancel,
        ),
    )
    .await
    .expect("cancellation should end the run");

    assert!(matches!(result, Err(TranslationError::Cancelled)));
}

#[tokio::test]
async fn test_translateDocument_deadline_shouldAbortSlowRun() {
    let provider = MockProvider::uppercase().with_delay(Duration::from_secs(30));
    let options = TranslateOptions {
        deadline: Some(Duration::from_millis(100)),
        ..quiet_options()
    };

    let result = orchestrator(&provider)
        .translate_document("# Hi\nBody text.", &options, &ExistingTranslations::new(), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(TranslationError::DeadlineExceeded { .. })));
}

#[tokio::test]
async fn test_translateDocument_unwrapped_shouldOmitContainers() {
    let provider = MockProvider::uppercase();
    let options = TranslateOptions {
        wrap: false,
        ..quiet_options()
    };

    let translated = orchestrator(&provider)
        .translate_document("# Hi\nBody text.", &options, &ExistingTranslations::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(translated.output, "---\n---\n\n# HI\nBODY TEXT.");
}
