use crate::models::{AnalysisResult, Article, Claim, ClaimResult, FallacyMatch, Id, IsoDateTime};
use crate::pipeline::fallacy::narrative;
use std::collections::HashMap;

/// Assembles the final result. Pure: no I/O, deterministic for identical inputs
/// apart from `completed_at`.
///
/// Results are re-keyed by claim index so every claim gets exactly one entry in claim
/// order; a claim with no matching result is reported as degraded.
pub fn aggregate(
    run_id: Id,
    article: &Article,
    summary: Option<String>,
    claims: &[Claim],
    claim_results: Vec<ClaimResult>,
    fallacy_matches: Vec<FallacyMatch>,
) -> AnalysisResult {
    let mut by_index: HashMap<usize, ClaimResult> = HashMap::with_capacity(claim_results.len());
    for result in claim_results {
        let index = result.claim.index();
        if by_index.insert(index, result).is_some() {
            tracing::warn!(claim_index = index, "duplicate claim result, keeping the last one");
        }
    }

    let ordered: Vec<ClaimResult> = claims
        .iter()
        .map(|claim| {
            by_index.remove(&claim.index()).unwrap_or_else(|| {
                tracing::warn!(claim_index = claim.index(), "claim missing a result");
                ClaimResult::degraded(claim.clone(), "No verification result was produced.")
            })
        })
        .collect();

    if !by_index.is_empty() {
        tracing::warn!(extra = by_index.len(), "dropping results for unknown claims");
    }

    let summary = summary
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| article.summary.clone());

    AnalysisResult {
        run_id,
        title: article.title.clone(),
        url: article.url.clone(),
        summary,
        claim_results: ordered,
        analysis: narrative(&fallacy_matches),
        fallacies: fallacy_matches,
        completed_at: IsoDateTime::now(),
    }
}
