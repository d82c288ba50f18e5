use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Languages can be configured either as ISO 639-1 / 639-2 codes ("de",
/// "deu", "ger") or as English names ("German"). Prompts want the English
/// name, output file names want the shortest code.

/// ISO 639-2/B codes that differ from their 639-2/T counterpart
const BIBLIOGRAPHIC_CODES: [(&str, &str); 18] = [
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

fn from_bibliographic(code: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Look a language up by code (639-1, 639-2/T or 639-2/B) or English name
pub fn resolve_language(input: &str) -> Result<Language> {
    let trimmed = input.trim();
    let code = trimmed.to_lowercase();

    let by_code = match code.len() {
        2 => Language::from_639_1(&code),
        3 => Language::from_639_3(from_bibliographic(&code).unwrap_or(&code)),
        _ => None,
    };
    if let Some(language) = by_code {
        return Ok(language);
    }

    let mut chars = code.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };

    Language::from_name(trimmed)
        .or_else(|| Language::from_name(&capitalized))
        .ok_or_else(|| anyhow!("Unknown language: {}", input))
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    Ok(resolve_language(code)?.to_639_3().to_string())
}

/// Shortest code for a language: ISO 639-1 when it has one, else 639-2/T
pub fn short_code(input: &str) -> Result<String> {
    let language = resolve_language(input)?;
    Ok(language
        .to_639_1()
        .unwrap_or_else(|| language.to_639_3())
        .to_string())
}

/// Check if two language codes or names represent the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (resolve_language(code1), resolve_language(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// English name of a language given as code or name
pub fn get_language_name(code: &str) -> Result<String> {
    Ok(resolve_language(code)?.to_name().to_string())
}
