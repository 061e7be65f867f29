use crate::error::ExternalError;
use crate::models::{Article, Claim, ClaimResult, EvidenceItem, SearchHit};
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

/// A system/user prompt pair for the language-generation capability.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Hits in search-engine order.
    async fn query(&self, text: &str) -> Result<Vec<SearchHit>, ExternalError>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<String, ExternalError>;
}

#[async_trait]
pub trait TextLoader: Send + Sync {
    async fn load(&self, url: &Url) -> Result<String, ExternalError>;
}

#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch(&self, url: &Url, title: Option<&str>) -> Result<Article, ExternalError>;
}

/// Output of the extraction stage.
#[derive(Clone, Debug, Default)]
pub struct Extraction {
    pub summary: Option<String>,
    pub claims: Vec<Claim>,
}

#[async_trait]
pub trait ClaimExtractor: Send + Sync {
    /// Malformed or empty model output is `Ok` with no claims; `Err` means the capability
    /// could not be reached at all.
    async fn extract(&self, article: &Article, max_chars: usize)
        -> Result<Extraction, ExternalError>;
}

#[async_trait]
pub trait EvidenceFetcher: Send + Sync {
    /// Ranked evidence for one claim. Never fails: an unreachable search yields an empty list.
    async fn search(&self, claim: &Claim, max_results: usize) -> Vec<EvidenceItem>;
}

#[async_trait]
pub trait ClaimVerifier: Send + Sync {
    /// `Err` only when the generation capability is exhausted; data-quality problems are
    /// folded into the returned result.
    async fn verify(
        &self,
        claim: &Claim,
        evidence: Vec<EvidenceItem>,
    ) -> Result<ClaimResult, ExternalError>;
}

// Shared collaborators: one generator serves both extraction and verification,
// one web client serves both article and evidence retrieval.

#[async_trait]
impl<T: SearchBackend + ?Sized> SearchBackend for Arc<T> {
    async fn query(&self, text: &str) -> Result<Vec<SearchHit>, ExternalError> {
        (**self).query(text).await
    }
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    async fn generate(&self, prompt: &Prompt) -> Result<String, ExternalError> {
        (**self).generate(prompt).await
    }
}

#[async_trait]
impl<T: TextLoader + ?Sized> TextLoader for Arc<T> {
    async fn load(&self, url: &Url) -> Result<String, ExternalError> {
        (**self).load(url).await
    }
}

#[async_trait]
impl<T: ArticleSource + ?Sized> ArticleSource for Arc<T> {
    async fn fetch(&self, url: &Url, title: Option<&str>) -> Result<Article, ExternalError> {
        (**self).fetch(url, title).await
    }
}
