//! Deterministic in-memory collaborators for tests and offline runs.

use crate::error::ExternalError;
use crate::models::{
    Article, Claim, ClaimResult, EvidenceItem, EvidenceQuality, IsoDateTime, SearchHit, Tier,
    Verdict,
};
use crate::pipeline::traits::{
    ArticleSource, ClaimVerifier, EvidenceFetcher, Prompt, SearchBackend, TextGenerator,
    TextLoader,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Returns the same hits for every query, or fails for queries containing a needle.
#[derive(Clone)]
pub struct StaticSearch {
    hits: Vec<SearchHit>,
    fail_when: Option<(String, ExternalError)>,
    calls: Arc<AtomicUsize>,
}

impl StaticSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            fail_when: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(error: ExternalError) -> Self {
        Self::new(Vec::new()).failing_when("", error)
    }

    pub fn failing_when(mut self, needle: &str, error: ExternalError) -> Self {
        self.fail_when = Some((needle.to_string(), error));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchBackend for StaticSearch {
    async fn query(&self, text: &str) -> Result<Vec<SearchHit>, ExternalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_when {
            Some((needle, error)) if text.contains(needle.as_str()) => Err(error.clone()),
            _ => Ok(self.hits.clone()),
        }
    }
}

#[derive(Clone)]
pub struct StaticLoader {
    text: Option<String>,
}

impl StaticLoader {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { text: None }
    }
}

#[async_trait]
impl TextLoader for StaticLoader {
    async fn load(&self, url: &Url) -> Result<String, ExternalError> {
        self.text
            .clone()
            .ok_or_else(|| ExternalError::Transient(format!("no body for {url}")))
    }
}

#[derive(Clone)]
enum Script {
    Always(String),
    Failing(ExternalError),
    Routed {
        routes: Vec<(String, String)>,
        fallback: String,
    },
}

/// Language-model stand-in that records every prompt it receives.
#[derive(Clone)]
pub struct ScriptedGenerator {
    script: Script,
    prompts: Arc<Mutex<Vec<Prompt>>>,
}

impl ScriptedGenerator {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn always(reply: &str) -> Self {
        Self::with_script(Script::Always(reply.to_string()))
    }

    pub fn failing(error: ExternalError) -> Self {
        Self::with_script(Script::Failing(error))
    }

    /// Replies with the first route whose needle occurs in the user prompt.
    pub fn routed(routes: Vec<(&str, &str)>, fallback: &str) -> Self {
        Self::with_script(Script::Routed {
            routes: routes
                .into_iter()
                .map(|(needle, reply)| (needle.to_string(), reply.to_string()))
                .collect(),
            fallback: fallback.to_string(),
        })
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts().len()
    }

    /// Number of recorded prompts whose user text contains `needle`.
    pub fn calls_containing(&self, needle: &str) -> usize {
        self.prompts()
            .iter()
            .filter(|p| p.user.contains(needle))
            .count()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<String, ExternalError> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(prompt.clone());
        match &self.script {
            Script::Always(reply) => Ok(reply.clone()),
            Script::Failing(error) => Err(error.clone()),
            Script::Routed { routes, fallback } => Ok(routes
                .iter()
                .find(|(needle, _)| prompt.user.contains(needle.as_str()))
                .map(|(_, reply)| reply.clone())
                .unwrap_or_else(|| fallback.clone())),
        }
    }
}

/// Evidence fetcher with per-claim delays that tracks how many searches run at once.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    delays: HashMap<usize, Duration>,
    default_delay: Duration,
    empty_for: HashSet<usize>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, claim_index: usize, delay: Duration) -> Self {
        self.delays.insert(claim_index, delay);
        self
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn empty_for(mut self, claim_index: usize) -> Self {
        self.empty_for.insert(claim_index);
        self
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub fn sample_evidence(rank: usize) -> EvidenceItem {
    let url = format!("https://www.reuters.com/fact/{rank}");
    EvidenceItem {
        url: Url::parse(&url).expect("static url parses"),
        domain: "reuters.com".to_string(),
        tier: Tier::Tier1,
        title: format!("Report {rank}"),
        snippet: format!("Snippet {rank}"),
        body: None,
        body_sha256: None,
        search_rank: rank,
        retrieved_at: IsoDateTime::now(),
    }
}

#[async_trait]
impl EvidenceFetcher for ScriptedFetcher {
    async fn search(&self, claim: &Claim, max_results: usize) -> Vec<EvidenceItem> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays
            .get(&claim.index())
            .copied()
            .unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.empty_for.contains(&claim.index()) {
            Vec::new()
        } else {
            (0..max_results.min(2)).map(sample_evidence).collect()
        }
    }
}

/// Verifier that marks every evidenced claim True, with opt-in failures and panics.
#[derive(Clone, Default)]
pub struct StubVerifier {
    failing: HashSet<usize>,
    panicking: HashSet<usize>,
}

impl StubVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, claim_index: usize) -> Self {
        self.failing.insert(claim_index);
        self
    }

    pub fn panicking_on(mut self, claim_index: usize) -> Self {
        self.panicking.insert(claim_index);
        self
    }
}

#[async_trait]
impl ClaimVerifier for StubVerifier {
    async fn verify(
        &self,
        claim: &Claim,
        evidence: Vec<EvidenceItem>,
    ) -> Result<ClaimResult, ExternalError> {
        if self.panicking.contains(&claim.index()) {
            panic!("stub verifier panic for claim {}", claim.index());
        }
        if self.failing.contains(&claim.index()) {
            return Err(ExternalError::Transient("stub verifier failure".to_string()));
        }
        if evidence.is_empty() {
            return Ok(ClaimResult::degraded(claim.clone(), "No external evidence found."));
        }
        Ok(ClaimResult::new(
            claim.clone(),
            Verdict::True,
            0.8,
            EvidenceQuality::Strong,
            "stub verifier",
            evidence,
        ))
    }
}

/// Serves a fixed article text, or fails every fetch.
#[derive(Clone)]
pub struct StaticArticleSource {
    text: Option<String>,
}

impl StaticArticleSource {
    pub fn new(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { text: None }
    }
}

#[async_trait]
impl ArticleSource for StaticArticleSource {
    async fn fetch(&self, url: &Url, title: Option<&str>) -> Result<Article, ExternalError> {
        let text = self
            .text
            .clone()
            .ok_or_else(|| ExternalError::Permanent(format!("404 for {url}")))?;
        Ok(Article::new(url.clone(), title.unwrap_or("Untitled"), text))
    }
}
