use serde::{Deserialize, Serialize};
use url::Url;

const SUMMARY_MAX_SENTENCES: usize = 3;
const SUMMARY_MAX_CHARS: usize = 400;

/// A retrieved news article. `text` is bounded at construction time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Article {
    pub url: Url,
    pub title: String,
    pub text: String,
    /// Derived lead of the article; the extractor's summary takes precedence when present.
    pub summary: String,
}

impl Article {
    pub fn new(url: Url, title: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let summary = derive_summary(&text);
        Self {
            url,
            title: title.into(),
            text,
            summary,
        }
    }

    /// Caps the stored text at `max_chars` characters.
    pub fn bounded(mut self, max_chars: usize) -> Self {
        if self.text.chars().count() > max_chars {
            self.text = self.text.chars().take(max_chars).collect();
            self.summary = derive_summary(&self.text);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// What the caller hands to `analyze`: either a URL to retrieve or an already retrieved article.
#[derive(Clone, Debug)]
pub enum ArticleInput {
    Url { url: Url, title: Option<String> },
    Fetched(Article),
}

impl ArticleInput {
    pub fn url(&self) -> &Url {
        match self {
            ArticleInput::Url { url, .. } => url,
            ArticleInput::Fetched(article) => &article.url,
        }
    }
}

fn derive_summary(text: &str) -> String {
    let mut out = String::new();
    let mut sentences = 0;
    for ch in text.chars() {
        if out.chars().count() >= SUMMARY_MAX_CHARS {
            break;
        }
        out.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            sentences += 1;
            if sentences >= SUMMARY_MAX_SENTENCES {
                break;
            }
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://example.com/story").expect("static url")
    }

    #[test]
    fn summary_takes_leading_sentences() {
        let article = Article::new(url(), "t", "One. Two! Three? Four.");
        assert_eq!(article.summary, "One. Two! Three?");
    }

    #[test]
    fn bounded_truncates_by_characters() {
        let article = Article::new(url(), "t", "héllo wörld").bounded(5);
        assert_eq!(article.text, "héllo");
    }

    #[test]
    fn bounded_leaves_short_text_alone() {
        let article = Article::new(url(), "t", "short").bounded(100);
        assert_eq!(article.text, "short");
    }

    #[test]
    fn whitespace_only_article_is_empty() {
        assert!(Article::new(url(), "t", "  \n ").is_empty());
    }
}
