use crate::config::RetryPolicy;
use crate::error::ExternalError;
use crate::models::{
    clamp_unit, Claim, ClaimResult, EvidenceItem, EvidenceQuality, SourceConsensus, Verdict,
};
use crate::pipeline::parse::{f32_field, locate_json_object, str_field, string_list};
use crate::pipeline::prompts::verification_prompt;
use crate::pipeline::retry::with_retry;
use crate::pipeline::traits::{ClaimVerifier, TextGenerator};
use async_trait::async_trait;

const REASONING_MAX_CHARS: usize = 400;

pub struct LlmVerifier<G> {
    generator: G,
    retry: RetryPolicy,
}

impl<G: TextGenerator> LlmVerifier<G> {
    pub fn new(generator: G, retry: RetryPolicy) -> Self {
        Self { generator, retry }
    }
}

/// Scales model confidence by how much credible evidence backs it.
pub fn credibility_factor(evidence: &[EvidenceItem]) -> f32 {
    let weight: f32 = evidence.iter().map(|e| e.tier.weight()).sum();
    (weight / 3.0).clamp(0.4, 1.0)
}

fn summarize_reasoning(raw: &str) -> String {
    let flat = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= REASONING_MAX_CHARS {
        return flat;
    }
    let mut out: String = flat.chars().take(REASONING_MAX_CHARS).collect();
    out.push_str("...");
    out
}

/// Strictly maps a verification reply onto the enumerated types. Anything outside the
/// expected shape is clamped or defaulted and forces `Insufficient` quality.
pub fn interpret_verification(claim: Claim, raw: &str, evidence: Vec<EvidenceItem>) -> ClaimResult {
    let Some(value) = locate_json_object(raw) else {
        tracing::warn!(claim_index = claim.index(), "verification reply is not JSON");
        return ClaimResult::new(
            claim,
            Verdict::Unverifiable,
            0.0,
            EvidenceQuality::Insufficient,
            "Model output could not be parsed.",
            evidence,
        );
    };

    let mut malformed = Vec::new();

    let verdict = match str_field(&value, "verdict").and_then(Verdict::parse) {
        Some(v) => v,
        None => {
            malformed.push("verdict");
            Verdict::Unverifiable
        }
    };

    let confidence = match f32_field(&value, "confidence") {
        Some(c) if (0.0..=1.0).contains(&c) => c,
        Some(c) => {
            malformed.push("confidence");
            clamp_unit(c)
        }
        None => {
            malformed.push("confidence");
            0.0
        }
    };

    let quality = match str_field(&value, "evidence_quality").and_then(EvidenceQuality::parse) {
        Some(q) if malformed.is_empty() => q,
        Some(_) => EvidenceQuality::Insufficient,
        None => {
            malformed.push("evidence_quality");
            EvidenceQuality::Insufficient
        }
    };

    if !malformed.is_empty() {
        tracing::warn!(
            claim_index = claim.index(),
            fields = ?malformed,
            "verification reply had out-of-range fields, downgrading evidence quality"
        );
    }

    let reasoning = str_field(&value, "reasoning")
        .map(summarize_reasoning)
        .unwrap_or_else(|| "No reasoning provided.".to_string());
    let consensus = str_field(&value, "source_consensus").and_then(SourceConsensus::parse);
    let fallacies = string_list(&value, "fallacies")
        .into_iter()
        .filter(|f| !f.eq_ignore_ascii_case("none found"))
        .collect();

    let confidence = confidence * credibility_factor(&evidence);
    ClaimResult::new(claim, verdict, confidence, quality, reasoning, evidence)
        .with_consensus(consensus)
        .with_fallacies(fallacies)
}

#[async_trait]
impl<G: TextGenerator> ClaimVerifier for LlmVerifier<G> {
    async fn verify(
        &self,
        claim: &Claim,
        evidence: Vec<EvidenceItem>,
    ) -> Result<ClaimResult, ExternalError> {
        if evidence.is_empty() {
            return Ok(ClaimResult::degraded(
                claim.clone(),
                "No external evidence found.",
            ));
        }

        let prompt = verification_prompt(claim, &evidence);
        let raw = with_retry(&self.retry, "verify", || self.generator.generate(&prompt)).await?;
        Ok(interpret_verification(claim.clone(), &raw, evidence))
    }
}
