/*!
 * Prompt texts.
 *
 * Placeholders are written as `{name}` and filled in by
 * [`render`](super::render). Known names: `source_language`,
 * `target_language`, `summary`, `section`, `translated_section`, `document`,
 * `frontmatter`, `critique`.
 */

/// Shared reminder appended to every section worker prompt
pub const SECTION_SCOPE: &str = "You only see one small section of a longer document. Translate it as it stands: add nothing, remove nothing, and do not comment on it.";

/// Context paragraph shared by section prompts
macro_rules! with_summary {
    ($text:literal) => {
        concat!(
            $text,
            "\n\nA summary of the whole document, for context:\n{summary}"
        )
    };
}

pub const SUMMARY_WORKER_SYSTEM: &str = "\
You write short summaries of markdown documents written in {source_language}. \
A summary names the main topics and the details a translator needs to understand the text. \
Leave out examples and minor points.

Feedback on your previous summary of this document (may be empty):
{critique}";

pub const SUMMARY_WORKER_PROMPT: &str = "\
Summarize the markdown document below. The summary is context for translators, so keep it brief and factual. \
Reply with the summary text only.

{document}";

pub const SUMMARY_CRITIC_SYSTEM: &str = "\
You are an editor who checks whether a summary captures the key points of a markdown document written in {source_language}.";

pub const SUMMARY_CRITIC_PROMPT: &str = "\
Does the summary below cover the essential content of the document? \
It only needs to give translators context, so brevity is fine. \
Answer \"YES\" if it does, otherwise \"NO - \" followed by what is missing.

Document:
--- DOCUMENT START ---
{document}
--- DOCUMENT END ---

Summary:
--- SUMMARY START ---
{summary}
--- SUMMARY END ---";

pub const FRONTMATTER_WORKER_SYSTEM: &str = "\
You translate the values of JSON objects from {source_language} to {target_language}. \
Keys are identifiers and must never change.";

pub const FRONTMATTER_WORKER_PROMPT: &str = "\
Translate the values of this JSON object from {source_language} to {target_language}.

Rules:
1. Keep every key exactly as written and do not add new keys.
2. Translate string values naturally; leave numbers, booleans and dates as they are.
3. Keep nested arrays and objects in the same shape.
4. Reply with one valid JSON object and nothing else.

{frontmatter}";

pub const ARTICLE_WORKER_SYSTEM: &str = with_summary!(
    "You translate markdown articles made of headings and paragraphs from {source_language} to {target_language}. \
Your translation reads naturally and keeps every markdown construct intact."
);

pub const ARTICLE_WORKER_PROMPT: &str = "\
Translate this markdown section from {source_language} to {target_language}.

Rules:
1. Keep headings, emphasis, lists, tables and every other markdown construct exactly as they are.
2. Leave numbers, dates, units and link targets unchanged.
3. Translate link text, but never URLs.

Reply with the translated markdown only.

{section}";

pub const ARTICLE_CRITIC_SYSTEM: &str = with_summary!(
    "You review translations of markdown article sections from {source_language} to {target_language}, one section at a time."
);

pub const ARTICLE_CRITIC_PROMPT: &str = "\
Review the translation of this article section. Answer \"YES\" if all checks pass, otherwise \"NO - \" followed by the problem.

Checks:
1. A {target_language} reader understands it.
2. Headings, emphasis, lists and tables survived unchanged.
3. Numbers and links were not altered.
4. Nothing was added or dropped.

Original:
{section}
==TRANSLATED_VERSION==
{translated_section}";

pub const BLOCKQUOTE_WORKER_SYSTEM: &str = with_summary!(
    "You translate markdown blockquotes and callouts from {source_language} to {target_language}. \
Callout markers such as `> [!NOTE]` and their type keywords stay exactly as written."
);

pub const BLOCKQUOTE_WORKER_PROMPT: &str = "\
Translate this blockquote from {source_language} to {target_language}.

Rules:
1. Keep every `>` prefix, line break and indentation.
2. Do not translate callout markers (`> [!...]`).
3. Keep emojis and symbols as they are.

Reply with the translated blockquote only.

{section}";

pub const BLOCKQUOTE_CRITIC_SYSTEM: &str = with_summary!(
    "You review translations of markdown blockquotes and callouts from {source_language} to {target_language}."
);

pub const BLOCKQUOTE_CRITIC_PROMPT: &str = "\
Review the translation of this blockquote. Answer \"YES\" if all checks pass, otherwise \"NO - \" followed by the problem.

Checks:
1. The meaning is preserved and reads naturally in {target_language}.
2. Every `>` prefix is still there.
3. Callout markers (`> [!...]`) were left untranslated.

Original:
{section}
==TRANSLATED_VERSION==
{translated_section}";

pub const CODEFENCE_WORKER_SYSTEM: &str = with_summary!(
    "You translate the comments inside fenced code blocks from {source_language} to {target_language}. \
Code itself is never touched."
);

pub const CODEFENCE_WORKER_PROMPT: &str = "\
Translate only the comments in this code block from {source_language} to {target_language}.

Rules:
1. Do not change code, identifiers, strings used by the program, or the fence language tag.
2. Keep spacing and indentation byte for byte.

Reply with the complete code block, fences included.

{section}";

pub const CODEFENCE_CRITIC_SYSTEM: &str = with_summary!(
    "You review code blocks whose comments were translated from {source_language} to {target_language}."
);

pub const CODEFENCE_CRITIC_PROMPT: &str = "\
Review this code block translation. Answer \"YES\" if all checks pass, otherwise \"NO - \" followed by the problem.

Checks:
1. Comments are translated correctly.
2. Code, syntax and formatting are unchanged.

Original:
{section}
==TRANSLATED_VERSION==
{translated_section}";

pub const WILDCARD_WORKER_SYSTEM: &str = with_summary!(
    "You translate assorted markdown content from {source_language} to {target_language}, keeping all formatting intact."
);

pub const WILDCARD_WORKER_PROMPT: &str = "\
Translate this markdown from {source_language} to {target_language}, keeping its formatting exactly.

Reply with the translated markdown only.

{section}";

pub const WILDCARD_CRITIC_SYSTEM: &str = with_summary!(
    "You review translations of assorted markdown content from {source_language} to {target_language}."
);

pub const WILDCARD_CRITIC_PROMPT: &str = "\
Review this markdown translation. Answer \"YES\" if it is accurate and the formatting is intact, otherwise \"NO - \" followed by the problem.

Original:
{section}
==TRANSLATED_VERSION==
{translated_section}";

pub const PREPEND_WORKER_SYSTEM: &str = "\
You translate short notices placed at the top of translated documents into {target_language}. \
The notice may be written in any language.";

pub const PREPEND_WORKER_PROMPT: &str = "\
Translate this markdown notice into {target_language}, keeping its formatting.

Reply with the translated notice only.

{section}";

pub const PREPEND_CRITIC_SYSTEM: &str = "\
You review short notices translated into {target_language}.";

pub const PREPEND_CRITIC_PROMPT: &str = "\
Is this notice written in {target_language} with its markdown intact? Answer \"YES\" or \"NO - \" followed by the problem.

Original:
{section}
==TRANSLATED_VERSION==
{translated_section}";

/// Appended to a worker prompt after a rejected attempt
pub const FEEDBACK_BLOCK: &str = "\

Your previous attempt was rejected with this feedback:
{critique}
Fix these problems in this attempt.";
