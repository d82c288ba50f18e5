/*!
 * Tests for document segmentation and reconstruction
 */

use mdlingo::document::{Frontmatter, SectionKind, Segmenter, checksum, classify, parse_containers, reconstruct, segment};
use mdlingo::errors::DocumentError;

use crate::common::MIXED_DOC;

#[test]
fn test_segment_mixedDocument_shouldTypeEverySection() {
    let parsed = segment(MIXED_DOC, None).unwrap();

    let kinds: Vec<SectionKind> = parsed.sections.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SectionKind::Article,
            SectionKind::Blockquote,
            SectionKind::NoTranslate,
            SectionKind::Article,
            SectionKind::Codefence,
            SectionKind::Wildcard,
        ]
    );
    assert_eq!(parsed.sections[1].content, "> [!NOTE]\n> Read this first.");
    assert_eq!(parsed.sections[4].content, "```bash\ncargo install mdlingo\n```");
    assert_eq!(parsed.frontmatter.get_str("layout"), Some("post"));
}

#[test]
fn test_segment_everyChecksum_shouldMatchContent() {
    let parsed = segment(MIXED_DOC, Some("*Machine translated.*")).unwrap();

    assert_eq!(parsed.sections[0].kind, SectionKind::Prepend);
    assert_eq!(parsed.source_sections().count(), parsed.len() - 1);
    for section in &parsed.sections {
        assert_eq!(section.checksum, checksum(&section.content));
    }
}

#[test]
fn test_segment_fenceWithHeadingsInside_shouldStayOneSection() {
    let doc = "Intro text.\n\n```markdown\n# Not a heading\n> not a quote\n```\n\nAfter.";
    let parsed = segment(doc, None).unwrap();

    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed.sections[1].kind, SectionKind::Codefence);
    assert_eq!(parsed.sections[1].content, "```markdown\n# Not a heading\n> not a quote\n```");
}

#[test]
fn test_segment_crlfInput_shouldMatchLfInput() {
    let lf = segment("# Title\nLine one.\n\nLine two.", None).unwrap();
    let crlf = segment("# Title\r\nLine one.\r\n\r\nLine two.", None).unwrap();
    assert_eq!(lf, crlf);
}

#[test]
fn test_segment_unclosedFrontmatter_shouldBeBody() {
    let parsed = segment("---\ntitle: Draft\n\nNo closing sentinel.", None).unwrap();
    assert!(parsed.frontmatter.is_empty());
    assert!(parsed.sections.iter().any(|s| s.content.contains("title: Draft")));
}

#[test]
fn test_segment_listFrontmatter_shouldFail() {
    let result = segment("---\n- a\n- b\n---\n\nText", None);
    assert!(matches!(result, Err(DocumentError::FrontmatterNotMapping(_))));
}

#[test]
fn test_segmenter_memoized_shouldReuseResults() {
    let segmenter = Segmenter::memoized();
    let first = segmenter.segment(MIXED_DOC, None).unwrap();
    let second = segmenter.segment(MIXED_DOC, None).unwrap();
    segmenter.segment(MIXED_DOC, Some("Banner")).unwrap();

    assert_eq!(first, second);
    assert_eq!(segmenter.memo_len(), 2);
}

#[test]
fn test_classify_shouldBeDeterministic() {
    assert_eq!(classify("# Heading"), SectionKind::Article);
    assert_eq!(classify("> quoted"), SectionKind::Blockquote);
    assert_eq!(classify("```\ncode\n```"), SectionKind::Codefence);
    assert_eq!(classify("---"), SectionKind::NoTranslate);
    assert_eq!(classify("Plain words."), SectionKind::Wildcard);
}

#[test]
fn test_reconstruct_unwrapped_shouldRoundTripBody() {
    let parsed = segment(MIXED_DOC, None).unwrap();
    let rendered = reconstruct(&parsed.frontmatter, &parsed.sections, false).unwrap();
    let reparsed = segment(&rendered, None).unwrap();

    assert_eq!(reparsed, parsed);
}

#[test]
fn test_reconstruct_wrapped_shouldBeParseableContainers() {
    let parsed = segment(MIXED_DOC, None).unwrap();
    let rendered = reconstruct(&Frontmatter::new(), &parsed.sections, true).unwrap();
    let containers = parse_containers(&rendered);

    assert_eq!(containers.len(), parsed.len());
    for (i, (container, section)) in containers.iter().zip(&parsed.sections).enumerate() {
        assert_eq!(container.index, Some(i + 1));
        assert_eq!(container.kind, Some(section.kind));
        assert_eq!(container.checksum.as_deref(), Some(section.checksum.as_str()));
        assert_eq!(container.body, section.content);
    }
}
