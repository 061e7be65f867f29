//! Serialized output record. Field names and enumerated values are an external contract.

use crate::models::{AnalysisResult, ClaimResult, EvidenceQuality, Verdict};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct VerifiedClaimRecord {
    pub claim: String,
    pub verdict: Verdict,
    pub confidence: f32,
    pub evidence_quality: EvidenceQuality,
    pub reasoning: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    pub title: String,
    pub url: String,
    pub summary: String,
    pub verified_claims: Vec<VerifiedClaimRecord>,
    pub analysis: String,
}

impl From<&ClaimResult> for VerifiedClaimRecord {
    fn from(result: &ClaimResult) -> Self {
        Self {
            claim: result.claim.text().to_string(),
            verdict: result.verdict,
            confidence: result.confidence,
            evidence_quality: result.evidence_quality,
            reasoning: result.reasoning.clone(),
        }
    }
}

impl From<&AnalysisResult> for AnalysisReport {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            title: result.title.clone(),
            url: result.url.to_string(),
            summary: result.summary.clone(),
            verified_claims: result.claim_results.iter().map(Into::into).collect(),
            analysis: result.analysis.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Claim, Id, IsoDateTime};
    use url::Url;

    #[test]
    fn report_uses_contract_field_names() {
        let result = AnalysisResult {
            run_id: Id::new(),
            title: "Title".to_string(),
            url: Url::parse("https://example.com/a").expect("static url"),
            summary: "Sum".to_string(),
            claim_results: vec![ClaimResult::degraded(Claim::new(0, "c0"), "no evidence")],
            fallacies: Vec::new(),
            analysis: "None found".to_string(),
            completed_at: IsoDateTime::now(),
        };
        let value = serde_json::to_value(AnalysisReport::from(&result)).expect("serialize");

        let mut keys: Vec<_> = value.as_object().expect("object").keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["analysis", "summary", "title", "url", "verified_claims"]);

        let claim = &value["verified_claims"][0];
        assert_eq!(claim["claim"], "c0");
        assert_eq!(claim["verdict"], "Unverifiable");
        assert_eq!(claim["evidence_quality"], "Insufficient");
        assert_eq!(claim["confidence"], 0.0);
        assert_eq!(claim.as_object().expect("object").len(), 5);
    }

    #[test]
    fn schema_lists_verdict_values() {
        let schema = serde_json::to_string(&schemars::schema_for!(AnalysisReport)).expect("schema");
        for value in ["True", "False", "Misleading", "NeedsContext", "Unverifiable"] {
            assert!(schema.contains(value), "missing {value}");
        }
    }
}
