use crate::config::PipelineConfig;
use crate::error::ExternalError;
use crate::models::Article;
use crate::pipeline::traits::{ArticleSource, TextLoader};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

/// Plain HTTP retrieval of articles and evidence pages.
pub struct WebFetcher {
    client: Client,
    max_article_chars: usize,
}

impl WebFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("factcheck/0.1")
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            client,
            max_article_chars: PipelineConfig::default().max_article_chars,
        })
    }

    /// Caps stored article text; the extractor applies its own tighter cap.
    pub fn with_max_article_chars(mut self, max: usize) -> Self {
        self.max_article_chars = max;
        self
    }

    async fn get_html(&self, url: &Url) -> Result<String, ExternalError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ExternalError::Quota(format!("{status} from {url}")));
        }
        if status.is_server_error() {
            return Err(ExternalError::Transient(format!("{status} from {url}")));
        }
        if !status.is_success() {
            return Err(ExternalError::Permanent(format!("{status} from {url}")));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ArticleSource for WebFetcher {
    async fn fetch(&self, url: &Url, title: Option<&str>) -> Result<Article, ExternalError> {
        let html = self.get_html(url).await?;
        let title = match title {
            Some(given) => given.to_string(),
            None => html_title(&html).unwrap_or_else(|| url.to_string()),
        };
        Ok(Article::new(url.clone(), title, html_to_text(&html)).bounded(self.max_article_chars))
    }
}

#[async_trait]
impl TextLoader for WebFetcher {
    async fn load(&self, url: &Url) -> Result<String, ExternalError> {
        let html = self.get_html(url).await?;
        Ok(html_to_text(&html))
    }
}

struct Markup {
    blocks: Regex,
    tags: Regex,
    title: Regex,
}

fn markup() -> Option<&'static Markup> {
    static MARKUP: OnceLock<Option<Markup>> = OnceLock::new();
    MARKUP
        .get_or_init(|| {
            Some(Markup {
                blocks: Regex::new(
                    r"(?is)<script\b.*?</script>|<style\b.*?</style>|<noscript\b.*?</noscript>|<head\b.*?</head>",
                )
                .ok()?,
                tags: Regex::new(r"(?s)<[^>]*>").ok()?,
                title: Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok()?,
            })
        })
        .as_ref()
}

fn html_title(html: &str) -> Option<String> {
    markup()?
        .title
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|t| !t.is_empty())
}

/// Visible text of an HTML document, whitespace collapsed. Plain text passes through.
pub fn html_to_text(html: &str) -> String {
    let text = match markup() {
        Some(m) => {
            let without_blocks = m.blocks.replace_all(html, " ");
            decode_entities(&m.tags.replace_all(&without_blocks, " "))
        }
        None => decode_entities(html),
    };
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
