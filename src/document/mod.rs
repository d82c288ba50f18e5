/*!
 * Markdown document model.
 *
 * - `section`: section kinds and classification
 * - `frontmatter`: YAML frontmatter mapping and allow-list helpers
 * - `segmenter`: raw text to frontmatter plus ordered sections
 * - `reconstruct`: sections back to text, with optional section containers
 * - `checksum`: content digests used to match sections across runs
 */

pub mod checksum;
pub mod frontmatter;
pub mod reconstruct;
pub mod section;
pub mod segmenter;

pub use checksum::checksum;
pub use frontmatter::{DEFAULT_TRANSLATABLE_KEYS, Frontmatter};
pub use reconstruct::{Container, parse_containers, reconstruct};
pub use section::{Section, SectionKind, TranslatableKind, classify};
pub use segmenter::{ParsedDocument, Segmenter, segment};
