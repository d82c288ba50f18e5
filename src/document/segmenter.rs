/*!
 * Markdown segmentation.
 *
 * Splits a raw document into its frontmatter and an ordered list of typed
 * sections. The splitter works line by line:
 *
 * - a heading line starts a new section that runs until the next delimiter
 * - a fenced code block is always a section of its own
 * - a blockquote or callout run is always a section of its own
 *
 * Fenced code is collapsed onto a single line before splitting so that
 * nothing inside a fence can ever be mistaken for a delimiter.
 */

use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::checksum::checksum;
use super::frontmatter::{FRONTMATTER_SENTINEL, Frontmatter};
use super::section::{Section, SectionKind, starts_with_heading};
use crate::errors::DocumentError;

/// Stands in for newlines inside fenced code while the body is split
const FENCE_NEWLINE: char = '\u{E000}';

const FENCE_MARKER: &str = "```";

/// Frontmatter plus the ordered sections of one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocument {
    /// Parsed frontmatter, empty when the document has none
    pub frontmatter: Frontmatter,
    /// Sections in document order
    pub sections: Vec<Section>,
}

impl ParsedDocument {
    /// Number of sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the document has no sections
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sections that came from the source document, skipping the prepend banner
    pub fn source_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.kind != SectionKind::Prepend)
    }
}

/// Segment a raw markdown document.
///
/// When `prepend` is given it becomes the first section with kind
/// [`SectionKind::Prepend`].
pub fn segment(raw: &str, prepend: Option<&str>) -> Result<ParsedDocument, DocumentError> {
    let normalized = raw.replace("\r\n", "\n");
    let (frontmatter, body) = split_frontmatter(&normalized)?;

    let mut sections = Vec::new();
    if let Some(banner) = prepend.map(str::trim).filter(|p| !p.is_empty()) {
        sections.push(Section::new(SectionKind::Prepend, banner));
    }

    let protected = protect_fences(body);
    let fragments = merge_heading_only(split_fragments(&protected));
    sections.extend(
        fragments
            .into_iter()
            .map(|fragment| Section::classified(fragment.replace(FENCE_NEWLINE, "\n"))),
    );

    debug!(
        "Segmented document into {} sections ({} frontmatter keys)",
        sections.len(),
        frontmatter.len()
    );

    Ok(ParsedDocument { frontmatter, sections })
}

/// Separate the frontmatter block from the body.
///
/// The block must open on the first line and close with a line holding only
/// the sentinel; otherwise the whole text is body.
pub fn split_frontmatter(text: &str) -> Result<(Frontmatter, &str), DocumentError> {
    let opener = format!("{}\n", FRONTMATTER_SENTINEL);
    let Some(rest) = text.strip_prefix(opener.as_str()) else {
        return Ok((Frontmatter::new(), text));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches('\n') == FRONTMATTER_SENTINEL {
            let frontmatter = Frontmatter::parse(&rest[..offset])?;
            return Ok((frontmatter, &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    Ok((Frontmatter::new(), text))
}

/// Collapse every fenced code block onto one line.
fn protect_fences(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut in_fence = false;

    for line in body.split_inclusive('\n') {
        let opens_or_closes = line.starts_with(FENCE_MARKER);
        if opens_or_closes && !in_fence {
            in_fence = !is_inline_fence(line);
        } else if in_fence && opens_or_closes {
            in_fence = false;
        }

        match line.strip_suffix('\n') {
            Some(text) if in_fence => {
                out.push_str(text);
                out.push(FENCE_NEWLINE);
            }
            _ => out.push_str(line),
        }
    }

    // An unterminated fence runs to the end of the body
    if in_fence && out.ends_with(FENCE_NEWLINE) {
        out.pop();
        out.push('\n');
    }

    out
}

/// An opener line that also closes its fence, e.g. "```npm install``` runs it."
fn is_inline_fence(line: &str) -> bool {
    line[FENCE_MARKER.len()..].contains(FENCE_MARKER)
}

fn is_quote_start(line: &str) -> bool {
    line.trim_start_matches([' ', '\t']).starts_with('>')
}

fn is_quote_continuation(line: &str) -> bool {
    line.starts_with([' ', '\t', '>'])
}

/// Split the protected body into raw fragments at line-start delimiters.
fn split_fragments(body: &str) -> Vec<String> {
    let lines: Vec<&str> = body.split('\n').collect();
    let mut fragments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if line.starts_with(FENCE_MARKER) {
            flush(&mut current, &mut fragments);
            current.push(line);
            flush(&mut current, &mut fragments);
            i += 1;
        } else if starts_with_heading(line) {
            flush(&mut current, &mut fragments);
            current.push(line);
            i += 1;
        } else if is_quote_start(line) {
            flush(&mut current, &mut fragments);
            let end = quote_run_end(&lines, i);
            current.extend_from_slice(&lines[i..end]);
            flush(&mut current, &mut fragments);
            i = end;
        } else {
            current.push(line);
            i += 1;
        }
    }
    flush(&mut current, &mut fragments);

    fragments
}

fn flush(current: &mut Vec<&str>, fragments: &mut Vec<String>) {
    if let Some(fragment) = tidy(&current.join("\n")) {
        fragments.push(fragment);
    }
    current.clear();
}

/// Index one past the last line of the blockquote run starting at `start`.
fn quote_run_end(lines: &[&str], start: usize) -> usize {
    let mut end = start + 1;
    while end < lines.len() {
        let line = lines[end];
        if line.is_empty() {
            // Blank lines belong to the run only when it carries on after them
            let next = lines[end..].iter().position(|l| !l.is_empty()).map(|p| end + p);
            match next {
                Some(n) if is_quote_continuation(lines[n]) => end = n + 1,
                _ => break,
            }
        } else if is_quote_continuation(line) {
            end += 1;
        } else {
            break;
        }
    }
    end
}

/// Trim surrounding blank lines and trailing whitespace; `None` if nothing is left.
fn tidy(fragment: &str) -> Option<String> {
    let trimmed = fragment.trim_end();
    let first_content = trimmed.find(|c: char| !c.is_whitespace())?;
    let start = trimmed[..first_content].rfind('\n').map_or(0, |p| p + 1);
    Some(trimmed[start..].to_string())
}

/// Attach heading-only fragments to the fragment that follows them.
fn merge_heading_only(fragments: Vec<String>) -> Vec<String> {
    let mut merged = Vec::with_capacity(fragments.len());
    let mut pending: Option<String> = None;

    for fragment in fragments {
        let heading_only = !fragment.contains('\n') && starts_with_heading(&fragment);
        let combined = match pending.take() {
            Some(headings) => format!("{}\n{}", headings, fragment),
            None => fragment,
        };
        if heading_only {
            pending = Some(combined);
        } else {
            merged.push(combined);
        }
    }

    if let Some(headings) = pending {
        merged.push(headings);
    }

    merged
}

/// Segmenter with an optional memo of previous results.
///
/// Segmentation is pure, so repeated calls with the same text and prepend
/// banner can return the memoized result.
#[derive(Debug, Default)]
pub struct Segmenter {
    memo: Option<Mutex<HashMap<String, ParsedDocument>>>,
}

impl Segmenter {
    /// Segmenter without memoization
    pub fn new() -> Self {
        Self { memo: None }
    }

    /// Segmenter that remembers every document it parsed
    pub fn memoized() -> Self {
        Self {
            memo: Some(Mutex::new(HashMap::new())),
        }
    }

    /// Segment a document, consulting the memo when enabled
    pub fn segment(&self, raw: &str, prepend: Option<&str>) -> Result<ParsedDocument, DocumentError> {
        let Some(memo) = &self.memo else {
            return segment(raw, prepend);
        };

        let key = checksum(&format!("{}\u{0}{}", raw, prepend.unwrap_or_default()));
        if let Some(parsed) = memo.lock().get(&key) {
            return Ok(parsed.clone());
        }

        let parsed = segment(raw, prepend)?;
        memo.lock().insert(key, parsed.clone());
        Ok(parsed)
    }

    /// Number of memoized documents
    pub fn memo_len(&self) -> usize {
        self.memo.as_ref().map_or(0, |memo| memo.lock().len())
    }
}
