use crate::config::RetryPolicy;
use crate::error::ExternalError;
use crate::models::{Article, Claim, ClaimType};
use crate::pipeline::parse::{locate_json_object, str_field, string_list};
use crate::pipeline::prompts::extraction_prompt;
use crate::pipeline::retry::with_retry;
use crate::pipeline::traits::{ClaimExtractor, Extraction, TextGenerator};
use async_trait::async_trait;
use serde_json::Value;
use std::borrow::Cow;

pub struct LlmExtractor<G> {
    generator: G,
    retry: RetryPolicy,
}

impl<G: TextGenerator> LlmExtractor<G> {
    pub fn new(generator: G, retry: RetryPolicy) -> Self {
        Self { generator, retry }
    }
}

/// First `max_chars` characters of `text`; borrowed unchanged when already short enough.
pub fn truncate_chars(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => Cow::Borrowed(&text[..byte_idx]),
        None => Cow::Borrowed(text),
    }
}

/// Parses the extraction reply. Anything unusable becomes an empty extraction.
pub fn parse_extraction(raw: &str) -> Extraction {
    let Some(value) = locate_json_object(raw) else {
        tracing::warn!(reply_len = raw.len(), "extraction reply is not JSON, no claims");
        return Extraction::default();
    };

    let summary = str_field(&value, "summary").map(str::to_string);
    let items = value
        .get("claims")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let claims = items
        .iter()
        .filter_map(claim_parts)
        .enumerate()
        .map(|(index, (text, claim_type, terms))| {
            Claim::new(index, text)
                .with_type(claim_type)
                .with_search_terms(terms)
        })
        .collect();

    Extraction { summary, claims }
}

fn claim_parts(item: &Value) -> Option<(String, ClaimType, Vec<String>)> {
    match item {
        Value::String(text) if !text.trim().is_empty() => {
            Some((text.trim().to_string(), ClaimType::Other, Vec::new()))
        }
        Value::Object(_) => {
            let text = str_field(item, "claim")?;
            let claim_type = str_field(item, "claim_type")
                .map(ClaimType::parse)
                .unwrap_or_default();
            Some((text.to_string(), claim_type, string_list(item, "search_terms")))
        }
        _ => None,
    }
}

#[async_trait]
impl<G: TextGenerator> ClaimExtractor for LlmExtractor<G> {
    async fn extract(
        &self,
        article: &Article,
        max_chars: usize,
    ) -> Result<Extraction, ExternalError> {
        let content = truncate_chars(&article.text, max_chars);
        let prompt = extraction_prompt(&article.title, &content);
        let raw = with_retry(&self.retry, "extract", || self.generator.generate(&prompt)).await?;
        let extraction = parse_extraction(&raw);
        tracing::info!(claims = extraction.claims.len(), "claims extracted");
        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::mock::ScriptedGenerator;
    use crate::pipeline::prompts::ARTICLE_MARKER;
    use url::Url;

    fn article(text: &str) -> Article {
        Article::new(
            Url::parse("https://example.com/a").expect("static url"),
            "Title",
            text,
        )
    }

    fn submitted_content(generator: &ScriptedGenerator) -> String {
        let prompts = generator.prompts();
        let user = &prompts.last().expect("one prompt").user;
        user.split_once(ARTICLE_MARKER)
            .map(|(_, content)| content.to_string())
            .expect("marker present")
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_chars("añb", 2), "añ");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[tokio::test]
    async fn short_article_is_submitted_unmodified() {
        let generator = ScriptedGenerator::always(r#"{"claims": []}"#);
        let extractor = LlmExtractor::new(generator.clone(), RetryPolicy::none());
        let text = "Short  article\nwith odd   spacing.";
        extractor.extract(&article(text), 100).await.expect("extract");
        assert_eq!(submitted_content(&generator), text);
    }

    #[tokio::test]
    async fn long_article_is_truncated_to_exactly_max_chars() {
        let generator = ScriptedGenerator::always(r#"{"claims": []}"#);
        let extractor = LlmExtractor::new(generator.clone(), RetryPolicy::none());
        let text = "x".repeat(50) + &"y".repeat(50);
        extractor.extract(&article(&text), 60).await.expect("extract");
        let sent = submitted_content(&generator);
        assert_eq!(sent.chars().count(), 60);
        assert_eq!(sent, "x".repeat(50) + &"y".repeat(10));
    }

    #[test]
    fn claims_keep_extraction_order_and_metadata() {
        let raw = r#"{
            "summary": "A summary.",
            "claims": [
                {"claim": "GDP grew 2%", "claim_type": "statistical", "search_terms": ["GDP growth"]},
                {"claim": "   "},
                "The mayor resigned",
                42
            ]
        }"#;
        let extraction = parse_extraction(raw);
        assert_eq!(extraction.summary.as_deref(), Some("A summary."));
        assert_eq!(extraction.claims.len(), 2);
        assert_eq!(extraction.claims[0].index(), 0);
        assert_eq!(extraction.claims[0].claim_type(), ClaimType::Statistical);
        assert_eq!(extraction.claims[0].search_terms(), ["GDP growth"]);
        assert_eq!(extraction.claims[1].index(), 1);
        assert_eq!(extraction.claims[1].text(), "The mayor resigned");
    }

    #[test]
    fn malformed_output_yields_no_claims() {
        assert!(parse_extraction("I cannot help with that").claims.is_empty());
        assert!(parse_extraction(r#"{"claims": "none"}"#).claims.is_empty());
        assert!(parse_extraction("").claims.is_empty());
    }

    #[tokio::test]
    async fn unreachable_capability_is_an_error() {
        let generator = ScriptedGenerator::failing(ExternalError::Transient("down".into()));
        let extractor = LlmExtractor::new(generator, RetryPolicy::none());
        assert!(extractor.extract(&article("text"), 100).await.is_err());
    }
}
