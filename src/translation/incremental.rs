/*!
 * Incremental translation support.
 *
 * A previously written output document is the record of what has already
 * been translated: every section container carries the checksum of the source
 * content it was produced from. This module reads those records back, joins
 * them against the current source, and repairs stored outputs in place.
 */

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::document::{Section, SectionKind, parse_containers, segment};
use crate::errors::DocumentError;
use crate::file_utils::write_atomic;

/// Matches the checksum attribute inside an opening tag, with its leading space
static CHECKSUM_ATTRIBUTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s+data-mdlingo-checksum="[^"]*""#).expect("Invalid checksum attribute regex")
});

/// A translation found in a previous output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingEntry {
    /// Kind declared by the container, if recognised
    pub kind: Option<SectionKind>,
    /// Translated content
    pub content: String,
}

/// Checksum-keyed index of translations from a previous run.
///
/// Built once per document and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingTranslations {
    entries: HashMap<String, ExistingEntry>,
}

impl ExistingTranslations {
    /// Empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from the text of a rendered document.
    ///
    /// Containers without a checksum are ignored. When a checksum appears more
    /// than once the first occurrence wins.
    pub fn from_output(text: &str) -> Self {
        let mut entries = HashMap::new();
        for container in parse_containers(text) {
            let Some(checksum) = container.checksum else {
                continue;
            };
            entries.entry(checksum).or_insert(ExistingEntry {
                kind: container.kind,
                content: container.body,
            });
        }
        Self { entries }
    }

    /// Translation stored for `checksum`
    pub fn get(&self, checksum: &str) -> Option<&ExistingEntry> {
        self.entries.get(checksum)
    }

    /// Whether a translation exists for `checksum`
    pub fn contains(&self, checksum: &str) -> bool {
        self.entries.contains_key(checksum)
    }

    /// Number of stored translations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An original section and its stored translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationPair {
    /// Source checksum joining both sides
    pub checksum: String,
    /// Section kind
    pub kind: SectionKind,
    /// Source content
    pub original: String,
    /// Stored translation
    pub translated: String,
}

fn io_error(path: &Path, error: std::io::Error) -> DocumentError {
    DocumentError::Io {
        path: path.display().to_string(),
        message: error.to_string(),
    }
}

/// Read a stored output, `None` when it does not exist
fn read_output(path: &Path) -> Result<Option<String>, DocumentError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path, e)),
    }
}

/// Load the translations stored in a previous output.
///
/// A missing file means nothing has been translated yet and yields an empty
/// index.
pub fn load_existing(output_path: &Path) -> Result<ExistingTranslations, DocumentError> {
    let Some(text) = read_output(output_path)? else {
        debug!("No previous output at {}", output_path.display());
        return Ok(ExistingTranslations::new());
    };

    let existing = ExistingTranslations::from_output(&text);
    info!(
        "Loaded {} existing translations from {}",
        existing.len(),
        output_path.display()
    );
    Ok(existing)
}

/// Join the current source against a stored output.
///
/// Returns one pair per source checksum that has a stored translation, in
/// source order. Prepend and no-translate sections are left out since they
/// have nothing meaningful to compare.
pub fn extract_translation_pairs(
    source: &str,
    output_path: &Path,
    prepend: Option<&str>,
) -> Result<Vec<TranslationPair>, DocumentError> {
    let parsed = segment(source, prepend)?;
    let existing = load_existing(output_path)?;

    let mut seen = HashSet::new();
    let pairs: Vec<TranslationPair> = parsed
        .sections
        .iter()
        .filter(|section| section.kind.is_validated())
        .filter(|section| seen.insert(section.checksum.clone()))
        .filter_map(|section| {
            existing.get(&section.checksum).map(|entry| TranslationPair {
                checksum: section.checksum.clone(),
                kind: section.kind,
                original: section.content.clone(),
                translated: entry.content.clone(),
            })
        })
        .collect();

    debug!("Extracted {} translation pairs", pairs.len());
    Ok(pairs)
}

/// Remove the checksum attribute from every container whose checksum is in
/// `checksums`, rewriting the file atomically.
///
/// The next incremental run then treats those sections as new. Returns the
/// number of attributes removed.
pub fn strip_checksums(output_path: &Path, checksums: &HashSet<String>) -> Result<usize, DocumentError> {
    let text = fs::read_to_string(output_path).map_err(|e| io_error(output_path, e))?;

    let targets: Vec<_> = parse_containers(&text)
        .into_iter()
        .filter(|c| c.checksum.as_ref().is_some_and(|sum| checksums.contains(sum)))
        .collect();

    if targets.is_empty() {
        return Ok(0);
    }

    let mut rewritten = text.clone();
    for container in targets.iter().rev() {
        let tag = &text[container.tag_range.clone()];
        let stripped = CHECKSUM_ATTRIBUTE_REGEX.replace(tag, "");
        rewritten.replace_range(container.tag_range.clone(), &stripped);
    }

    write_atomic(output_path, &rewritten).map_err(|e| io_error(output_path, e))?;
    info!(
        "Removed {} checksum(s) from {}",
        targets.len(),
        output_path.display()
    );
    Ok(targets.len())
}

/// Add missing checksum attributes to an older output.
///
/// Containers are matched to source sections by their 1-based index (the
/// prepend banner counts when `prepend` is given). A container whose declared
/// kind does not match the source section at that index is left alone.
/// Returns the number of checksums added.
pub fn retrofit_checksums(source: &str, output_path: &Path, prepend: Option<&str>) -> Result<usize, DocumentError> {
    let parsed = segment(source, prepend)?;
    let text = fs::read_to_string(output_path).map_err(|e| io_error(output_path, e))?;

    let mut replacements = Vec::new();
    for container in parse_containers(&text) {
        if container.checksum.is_some() {
            continue;
        }

        let (Some(kind), Some(index)) = (container.kind, container.index) else {
            warn!("Skipping container without a usable type or index");
            continue;
        };

        let Some(section) = index.checked_sub(1).and_then(|i| parsed.sections.get(i)) else {
            warn!("Container {} has no matching source section", index);
            continue;
        };

        if section.kind != kind {
            warn!(
                "Container {} is {} but the source section is {}, skipping",
                index, kind, section.kind
            );
            continue;
        }

        if let Some(tag) = container.retagged(Some(&section.checksum)) {
            replacements.push((container.tag_range, tag));
        }
    }

    if replacements.is_empty() {
        return Ok(0);
    }

    let mut rewritten = text;
    for (range, tag) in replacements.iter().rev() {
        rewritten.replace_range(range.clone(), tag);
    }

    write_atomic(output_path, &rewritten).map_err(|e| io_error(output_path, e))?;
    info!(
        "Added {} checksum(s) to {}",
        replacements.len(),
        output_path.display()
    );
    Ok(replacements.len())
}

/// Sections of `parsed` that would be reused from `existing`
pub fn reusable<'a>(sections: &'a [Section], existing: &'a ExistingTranslations) -> impl Iterator<Item = &'a Section> {
    sections.iter().filter(move |s| existing.contains(&s.checksum))
}
