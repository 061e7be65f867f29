use crate::config::{PipelineConfig, RetryPolicy};
use crate::models::{Claim, EvidenceItem, IsoDateTime, SearchHit, Tier};
use crate::pipeline::credibility::{domain_of, tier_of};
use crate::pipeline::retry::with_retry;
use crate::pipeline::traits::{EvidenceFetcher, SearchBackend, TextLoader};
use async_trait::async_trait;
use futures_util::future::join_all;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use url::Url;

const FACT_CHECK_SITES: &[&str] = &["factcheck.org", "snopes.com", "politifact.com"];
const WIRE_SITES: &[&str] = &["reuters.com", "apnews.com", "bbc.com"];

/// Queries issued for a claim, most specific first: the claim itself, fact-checkers,
/// wire services, then research-oriented queries built from the search terms.
pub fn plan_queries(claim: &Claim) -> Vec<String> {
    let term = claim.primary_term();
    let mut queries = vec![claim.text().to_string()];
    queries.extend(FACT_CHECK_SITES.iter().map(|site| format!("site:{site} {term}")));
    queries.extend(WIRE_SITES.iter().map(|site| format!("site:{site} {term}")));
    queries.push(format!("\"{term}\" fact check"));
    for extra in claim.search_terms().iter().take(2) {
        queries.push(format!("{extra} study OR research"));
        queries.push(format!("{extra} report OR data"));
    }

    let mut seen = HashSet::new();
    queries.retain(|q| !q.trim().is_empty() && seen.insert(q.clone()));
    queries
}

pub struct EvidenceSearcher<S, L> {
    backend: S,
    loader: L,
    retry: RetryPolicy,
    full_text_top_n: usize,
    full_text_max_chars: usize,
    drop_unranked: bool,
    hits_per_query: usize,
}

impl<S, L> EvidenceSearcher<S, L>
where
    S: SearchBackend,
    L: TextLoader,
{
    pub fn new(backend: S, loader: L, config: &PipelineConfig) -> Self {
        Self {
            backend,
            loader,
            retry: config.retry,
            full_text_top_n: config.full_text_top_n,
            full_text_max_chars: config.full_text_max_chars,
            drop_unranked: config.drop_unranked,
            hits_per_query: config.hits_per_query.max(1),
        }
    }

    fn to_evidence(&self, hit: SearchHit, rank: usize) -> Option<EvidenceItem> {
        let url = match Url::parse(hit.url.trim()) {
            Ok(url) => url,
            Err(err) => {
                tracing::debug!(url = %hit.url, error = %err, "skipping unparseable hit");
                return None;
            }
        };
        let domain = domain_of(&url);
        let tier = tier_of(&domain);
        if self.drop_unranked && tier == Tier::Unranked {
            return None;
        }
        Some(EvidenceItem {
            url,
            domain,
            tier,
            title: hit.title,
            snippet: hit.snippet,
            body: None,
            body_sha256: None,
            search_rank: rank,
            retrieved_at: IsoDateTime::now(),
        })
    }

    async fn attach_body(&self, mut item: EvidenceItem) -> EvidenceItem {
        match self.loader.load(&item.url).await {
            Ok(text) => {
                let body: String = text.chars().take(self.full_text_max_chars).collect();
                if !body.trim().is_empty() {
                    item.body_sha256 = Some(format!("{:x}", Sha256::digest(body.as_bytes())));
                    item.body = Some(body);
                }
            }
            Err(err) => {
                tracing::debug!(url = %item.url, error = %err, "full text unavailable, keeping snippet");
            }
        }
        item
    }
}

#[async_trait]
impl<S, L> EvidenceFetcher for EvidenceSearcher<S, L>
where
    S: SearchBackend,
    L: TextLoader,
{
    async fn search(&self, claim: &Claim, max_results: usize) -> Vec<EvidenceItem> {
        if max_results == 0 {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        let mut next_rank = 0;
        for query in plan_queries(claim) {
            if candidates.len() >= max_results {
                break;
            }
            let mut hits = match with_retry(&self.retry, "search", || self.backend.query(&query))
                .await
            {
                Ok(hits) => hits,
                Err(err) if err.is_retryable() => {
                    tracing::warn!(claim_index = claim.index(), query = %query, error = %err, "search backend unavailable, stopping");
                    break;
                }
                Err(err) => {
                    tracing::warn!(claim_index = claim.index(), query = %query, error = %err, "search query rejected, skipping");
                    continue;
                }
            };
            hits.sort_by_key(|h| h.rank);
            for hit in hits.into_iter().take(self.hits_per_query) {
                let rank = next_rank;
                next_rank += 1;
                if let Some(item) = self.to_evidence(hit, rank) {
                    if seen.insert(item.url.clone()) {
                        candidates.push(item);
                    }
                }
            }
        }

        candidates.sort_by_key(EvidenceItem::rank_key);
        candidates.truncate(max_results);

        let split = self.full_text_top_n.min(candidates.len());
        let rest = candidates.split_off(split);
        let mut ranked = join_all(candidates.into_iter().map(|item| self.attach_body(item))).await;
        ranked.extend(rest);

        tracing::debug!(
            claim_index = claim.index(),
            evidence = ranked.len(),
            "evidence ranked"
        );
        ranked
    }
}
