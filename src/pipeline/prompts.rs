use crate::models::{Claim, EvidenceItem};
use crate::pipeline::traits::Prompt;

/// Marker preceding the article text in the extraction prompt; the text runs to the end.
pub const ARTICLE_MARKER: &str = "ARTICLE:\n";

const EXTRACTION_SYSTEM: &str = "You are a neutral fact-checking analyst. \
Summarize the article in five neutral sentences and extract 5-10 specific, verifiable factual claims. \
Respond ONLY with JSON of the form \
{\"summary\": string, \"claims\": [{\"claim\": string, \"claim_type\": \"statistical|event|quote|policy|prediction\", \
\"search_terms\": [string]}]}.";

const VERIFICATION_SYSTEM: &str = "You are a strict verification engine. Compare CLAIM to EVIDENCE only. \
Pick exactly one verdict: True (credible evidence supports it), False (credible evidence contradicts it), \
Misleading (partially true but missing important context), NeedsContext (evidence conflicts or is mixed), \
Unverifiable (no relevant evidence). \
Rate evidence_quality as Strong (multiple credible sources agree), Moderate (some credible support or one \
high-quality source), Weak (limited or low-credibility sources) or Insufficient (nothing relevant). \
Respond ONLY with JSON: {\"verdict\": string, \"confidence\": number between 0 and 1, \"reasoning\": string, \
\"evidence_quality\": string, \"source_consensus\": \"High|Medium|Low|Conflicting\", \"fallacies\": [string]}.";

pub fn extraction_prompt(title: &str, content: &str) -> Prompt {
    Prompt {
        system: EXTRACTION_SYSTEM.to_string(),
        user: format!("TITLE: {title}\n\n{ARTICLE_MARKER}{content}"),
    }
}

pub fn verification_prompt(claim: &Claim, evidence: &[EvidenceItem]) -> Prompt {
    Prompt {
        system: VERIFICATION_SYSTEM.to_string(),
        user: format!(
            "CLAIM:\n{}\n\nEVIDENCE:\n{}",
            claim.text(),
            format_evidence(evidence)
        ),
    }
}

pub fn format_evidence(evidence: &[EvidenceItem]) -> String {
    evidence
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "Source {} [{}] {}\nTitle: {}\nContent: {}\nURL: {}",
                i + 1,
                item.tier,
                item.domain,
                item.title,
                item.content(),
                item.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
