use crate::models::{
    Claim, EvidenceItem, EvidenceQuality, Id, IsoDateTime, SourceConsensus, Verdict,
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Terminal outcome for one claim. Construct through [`ClaimResult::new`] or
/// [`ClaimResult::degraded`] so the confidence range and quality/verdict pairing always hold.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClaimResult {
    pub claim: Claim,
    pub verdict: Verdict,
    pub confidence: f32,
    pub evidence_quality: EvidenceQuality,
    pub reasoning: String,
    pub evidence: Vec<EvidenceItem>,
    pub source_consensus: Option<SourceConsensus>,
    pub fallacies: Vec<String>,
}

impl ClaimResult {
    pub fn new(
        claim: Claim,
        verdict: Verdict,
        confidence: f32,
        evidence_quality: EvidenceQuality,
        reasoning: impl Into<String>,
        evidence: Vec<EvidenceItem>,
    ) -> Self {
        // Insufficient evidence cannot back a definitive verdict.
        let verdict = if evidence_quality == EvidenceQuality::Insufficient && verdict.is_definitive()
        {
            Verdict::NeedsContext
        } else {
            verdict
        };
        Self {
            claim,
            verdict,
            confidence: clamp_unit(confidence),
            evidence_quality,
            reasoning: reasoning.into(),
            evidence,
            source_consensus: None,
            fallacies: Vec::new(),
        }
    }

    /// Unverifiable / Insufficient / 0.0.
    pub fn degraded(claim: Claim, reasoning: impl Into<String>) -> Self {
        Self::new(
            claim,
            Verdict::Unverifiable,
            0.0,
            EvidenceQuality::Insufficient,
            reasoning,
            Vec::new(),
        )
    }

    pub fn with_consensus(mut self, consensus: Option<SourceConsensus>) -> Self {
        self.source_consensus = consensus;
        self
    }

    pub fn with_fallacies(mut self, fallacies: Vec<String>) -> Self {
        self.fallacies = fallacies;
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.verdict == Verdict::Unverifiable
            && self.evidence_quality == EvidenceQuality::Insufficient
    }
}

/// NaN maps to 0.0.
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FallacyMatch {
    pub name: String,
    pub definition: String,
    pub counterpoint: String,
    pub hits: usize,
    pub excerpt: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub run_id: Id,
    pub title: String,
    pub url: Url,
    pub summary: String,
    pub claim_results: Vec<ClaimResult>,
    pub fallacies: Vec<FallacyMatch>,
    pub analysis: String,
    pub completed_at: IsoDateTime,
}

impl AnalysisResult {
    /// Mean confidence weighted by each claim's evidence quality; 0.0 with no claims.
    pub fn overall_confidence(&self) -> f32 {
        if self.claim_results.is_empty() {
            return 0.0;
        }
        let total: f32 = self
            .claim_results
            .iter()
            .map(|r| r.confidence * r.evidence_quality.multiplier())
            .sum();
        clamp_unit(total / self.claim_results.len() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_quality_never_carries_true_or_false() {
        for verdict in [Verdict::True, Verdict::False, Verdict::Misleading] {
            let result = ClaimResult::new(
                Claim::new(0, "c"),
                verdict,
                0.9,
                EvidenceQuality::Insufficient,
                "",
                Vec::new(),
            );
            assert_eq!(result.verdict, Verdict::NeedsContext);
        }
    }

    #[test]
    fn confidence_is_clamped() {
        let make = |c| {
            ClaimResult::new(Claim::new(0, "c"), Verdict::True, c, EvidenceQuality::Strong, "", vec![])
                .confidence
        };
        assert_eq!(make(1.7), 1.0);
        assert_eq!(make(-0.2), 0.0);
        assert_eq!(make(f32::NAN), 0.0);
        assert_eq!(make(f32::INFINITY), 1.0);
    }

    #[test]
    fn degraded_shape() {
        let result = ClaimResult::degraded(Claim::new(3, "c"), "search failed");
        assert!(result.is_degraded());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.claim.index(), 3);
    }
}
