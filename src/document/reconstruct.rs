/*!
 * Rendering documents back to markdown.
 *
 * Each section may be wrapped in an inline HTML container carrying its kind,
 * its 1-based position and the checksum of the source content it came from:
 *
 * ```text
 * <span class="mdlingo-section" data-mdlingo-type="article" data-mdlingo-index="1" data-mdlingo-checksum="...">
 *
 * # Hi
 * Body text.
 *
 * </span>
 * ```
 *
 * The same module parses those containers back out of a stored output file.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

use super::checksum::is_checksum;
use super::frontmatter::Frontmatter;
use super::section::{Section, SectionKind};
use crate::errors::DocumentError;

/// Class attribute identifying section containers
pub const CONTAINER_CLASS: &str = "mdlingo-section";

/// Closing tag of a section container
pub const CONTAINER_CLOSE: &str = "</span>";

/// Separator placed between sections
pub const SECTION_SEPARATOR: &str = "\n\n";

/// Matches the opening tag of a container and captures its attributes
static OPEN_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<span class="mdlingo-section"([^>]*)>"#).expect("Invalid section container regex")
});

/// Matches one `data-mdlingo-*` attribute
static ATTRIBUTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"data-mdlingo-(type|index|checksum)="([^"]*)""#).expect("Invalid container attribute regex")
});

/// Render the opening tag of a section container
pub fn open_tag(kind: SectionKind, index: usize, checksum: Option<&str>) -> String {
    let mut tag = format!(
        r#"<span class="{}" data-mdlingo-type="{}" data-mdlingo-index="{}""#,
        CONTAINER_CLASS, kind, index
    );
    if let Some(checksum) = checksum {
        tag.push_str(&format!(r#" data-mdlingo-checksum="{}""#, checksum));
    }
    tag.push('>');
    tag
}

/// Wrap a section in its container, `index` being 1-based
pub fn wrap_section(section: &Section, index: usize) -> String {
    format!(
        "{}\n\n{}\n\n{}",
        open_tag(section.kind, index, Some(&section.checksum)),
        section.content,
        CONTAINER_CLOSE
    )
}

/// Render frontmatter and sections into one document.
///
/// With `wrap` every section is enclosed in a container; the checksum written
/// is the section's own, which for translated sections is the checksum of the
/// source they were produced from.
pub fn reconstruct(frontmatter: &Frontmatter, sections: &[Section], wrap: bool) -> Result<String, DocumentError> {
    let body = sections
        .iter()
        .enumerate()
        .map(|(i, section)| {
            if wrap {
                wrap_section(section, i + 1)
            } else {
                section.content.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR);

    Ok(format!("{}{}{}", frontmatter.to_block()?, SECTION_SEPARATOR, body))
}

/// A section container found in a rendered document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// Declared kind, `None` if the attribute is missing or unknown
    pub kind: Option<SectionKind>,
    /// Declared 1-based index
    pub index: Option<usize>,
    /// Declared source checksum, `None` if missing or malformed
    pub checksum: Option<String>,
    /// Inner content
    pub body: String,
    /// Byte range of the opening tag in the scanned text
    pub tag_range: Range<usize>,
}

impl Container {
    /// Opening tag with the given checksum (or none)
    pub fn retagged(&self, checksum: Option<&str>) -> Option<String> {
        Some(open_tag(self.kind?, self.index?, checksum))
    }
}

/// Find every section container in `text`, in document order.
///
/// A body runs to the last `\n\n</span>` before the next opening tag (or the
/// end of the text), so sections holding their own `</span>` survive intact.
pub fn parse_containers(text: &str) -> Vec<Container> {
    let tags: Vec<_> = OPEN_TAG_REGEX.captures_iter(text).collect();
    let closing = format!("{}{}", SECTION_SEPARATOR, CONTAINER_CLOSE);

    tags.iter()
        .enumerate()
        .filter_map(|(i, captures)| {
            let tag = captures.get(0)?;
            let attributes = captures.get(1)?.as_str();
            let region_end = tags.get(i + 1).and_then(|next| next.get(0)).map_or(text.len(), |next| next.start());
            let region = text[tag.end()..region_end].strip_prefix(SECTION_SEPARATOR)?;
            let body = &region[..region.rfind(&closing)?];

            let mut container = Container {
                kind: None,
                index: None,
                checksum: None,
                body: body.to_string(),
                tag_range: tag.range(),
            };

            for attribute in ATTRIBUTE_REGEX.captures_iter(attributes) {
                let value = &attribute[2];
                match &attribute[1] {
                    "type" => container.kind = value.parse().ok(),
                    "index" => container.index = value.parse().ok(),
                    "checksum" if is_checksum(value) => container.checksum = Some(value.to_string()),
                    _ => {}
                }
            }

            Some(container)
        })
        .collect()
}
