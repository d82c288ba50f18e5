/*!
 * Frontmatter translation.
 *
 * The allow-listed frontmatter entries are sent to the model as one JSON
 * object. The reply must contain a JSON object whose keys are a subset of the
 * keys sent; anything else is retried. There is no attempt to repair broken
 * JSON.
 */

use log::{debug, info};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tokio_util::sync::CancellationToken;

use crate::document::Frontmatter;
use crate::errors::TranslationError;
use crate::providers::Provider;

use super::attempt::{self, AttemptFailure, LoopFailure, run_attempts};
use super::request::DocumentContext;

/// Pull the JSON object out of a model reply.
///
/// The reply may wrap the object in a code fence or in prose; the span from
/// the first `{` to the last `}` is parsed.
pub(crate) fn parse_response(
    reply: &str,
    sent: &JsonMap<String, JsonValue>,
) -> Result<JsonMap<String, JsonValue>, AttemptFailure> {
    let start = reply
        .find('{')
        .ok_or_else(|| AttemptFailure::Malformed("no JSON object found in the reply".to_string()))?;
    let end = reply
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| AttemptFailure::Malformed("the JSON object is not closed".to_string()))?;

    let value: JsonValue = serde_json::from_str(&reply[start..=end])
        .map_err(|e| AttemptFailure::Malformed(format!("invalid JSON: {}", e)))?;

    let JsonValue::Object(map) = value else {
        return Err(AttemptFailure::Malformed("the reply is not a JSON object".to_string()));
    };

    let unknown: Vec<String> = map.keys().filter(|key| !sent.contains_key(*key)).cloned().collect();
    if !unknown.is_empty() {
        return Err(AttemptFailure::UnknownKeys(unknown));
    }

    Ok(map)
}

/// Translate the allow-listed values of `frontmatter`.
///
/// Returns the frontmatter unchanged, without calling the model, when no
/// allow-listed key is present.
pub(crate) async fn translate_frontmatter(
    provider: &dyn Provider,
    context: &DocumentContext,
    frontmatter: &Frontmatter,
    allow_list: &[String],
    max_attempts: usize,
    cancel: &CancellationToken,
) -> Result<Frontmatter, TranslationError> {
    let sent = frontmatter.translatable(allow_list);
    if sent.is_empty() {
        debug!("No translatable frontmatter keys");
        return Ok(frontmatter.clone());
    }

    info!("Translating frontmatter ({} keys)", sent.len());
    let payload = JsonValue::Object(sent.clone()).to_string();

    let accepted = run_attempts("Frontmatter", max_attempts, cancel, |_, critique| {
        let payload = payload.as_str();
        let sent = &sent;
        async move {
            let request = context.frontmatter_worker(payload, critique.as_deref());
            let reply = attempt::generate(provider, &request, cancel).await?;
            parse_response(&reply, sent)
        }
    })
    .await
    .map_err(|failure| match failure {
        LoopFailure::Exhausted { attempts } => TranslationError::FrontmatterExhausted { attempts },
        LoopFailure::Cancelled => TranslationError::Cancelled,
    })?;

    Ok(frontmatter.with_translations(&accepted.value, allow_list)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;

    fn sent() -> JsonMap<String, JsonValue> {
        let mut map = JsonMap::new();
        map.insert("title".to_string(), JsonValue::String("Hello".to_string()));
        map.insert("description".to_string(), JsonValue::String("A page".to_string()));
        map
    }

    fn allow(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_parseResponse_fencedJson_shouldParse() {
        let reply = "Here you go:\n```json\n{\"title\": \"Hallo\"}\n```";
        let map = parse_response(reply, &sent()).unwrap();
        assert_eq!(map["title"], "Hallo");
        assert!(!map.contains_key("description"));
    }

    #[test]
    fn test_parseResponse_unknownKey_shouldFail() {
        let reply = r#"{"title": "Hallo", "author": "Someone"}"#;
        match parse_response(reply, &sent()) {
            Err(AttemptFailure::UnknownKeys(keys)) => assert_eq!(keys, vec!["author"]),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parseResponse_brokenJson_shouldFail() {
        assert!(matches!(
            parse_response(r#"{"title": "Hallo",}"#, &sent()),
            Err(AttemptFailure::Malformed(_))
        ));
        assert!(matches!(parse_response("no json here", &sent()), Err(AttemptFailure::Malformed(_))));
    }

    #[tokio::test]
    async fn test_translateFrontmatter_shouldOnlyTouchAllowListedKeys() {
        let provider = MockProvider::uppercase();
        let context = DocumentContext::new("m", "English", "German", 2048);
        let frontmatter = Frontmatter::parse("title: Hello\nsecret: keep me\n").unwrap();

        let translated = translate_frontmatter(
            &provider,
            &context,
            &frontmatter,
            &allow(&["title"]),
            3,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(translated.get_str("title"), Some("HELLO"));
        assert_eq!(translated.get_str("secret"), Some("keep me"));
        assert_eq!(provider.requests()[0].input, r#"{"title":"Hello"}"#);
    }

    #[tokio::test]
    async fn test_translateFrontmatter_noAllowListedKeys_shouldSkipModel() {
        let provider = MockProvider::uppercase();
        let context = DocumentContext::new("m", "English", "German", 2048);
        let frontmatter = Frontmatter::parse("layout: post\n").unwrap();

        let translated = translate_frontmatter(
            &provider,
            &context,
            &frontmatter,
            &allow(&["title"]),
            3,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(translated, frontmatter);
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_translateFrontmatter_hallucinatedKeys_shouldExhaust() {
        let provider = MockProvider::new(|_| Ok(r#"{"title": "X", "extra": "Y"}"#.to_string()));
        let context = DocumentContext::new("m", "English", "German", 2048);
        let frontmatter = Frontmatter::parse("title: A\n").unwrap();

        let result = translate_frontmatter(
            &provider,
            &context,
            &frontmatter,
            &allow(&["title"]),
            4,
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(TranslationError::FrontmatterExhausted { attempts: 4 })));
        assert_eq!(provider.request_count(), 4);
        assert!(provider.requests()[1].prompt.contains("extra"));
    }
}
