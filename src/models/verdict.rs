use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Verdict {
    True,
    False,
    Misleading,
    NeedsContext,
    Unverifiable,
}

impl Verdict {
    /// Strict mapping from model text. `None` means the value was outside the enumerated set.
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "true" => Some(Verdict::True),
            "false" => Some(Verdict::False),
            "misleading" => Some(Verdict::Misleading),
            "needscontext" => Some(Verdict::NeedsContext),
            "unverifiable" => Some(Verdict::Unverifiable),
            _ => None,
        }
    }

    /// Verdicts that assert something about the claim's truth.
    pub fn is_definitive(self) -> bool {
        matches!(self, Verdict::True | Verdict::False | Verdict::Misleading)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum EvidenceQuality {
    Strong,
    Moderate,
    Weak,
    Insufficient,
}

impl EvidenceQuality {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "strong" => Some(EvidenceQuality::Strong),
            "moderate" => Some(EvidenceQuality::Moderate),
            "weak" => Some(EvidenceQuality::Weak),
            "insufficient" => Some(EvidenceQuality::Insufficient),
            _ => None,
        }
    }

    pub fn multiplier(self) -> f32 {
        match self {
            EvidenceQuality::Strong => 1.0,
            EvidenceQuality::Moderate => 0.8,
            EvidenceQuality::Weak => 0.6,
            EvidenceQuality::Insufficient => 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SourceConsensus {
    High,
    Medium,
    Low,
    Conflicting,
}

impl SourceConsensus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "high" => Some(SourceConsensus::High),
            "medium" => Some(SourceConsensus::Medium),
            "low" => Some(SourceConsensus::Low),
            "conflicting" => Some(SourceConsensus::Conflicting),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_accepts_spacing_and_case_variants() {
        assert_eq!(Verdict::parse("Needs context"), Some(Verdict::NeedsContext));
        assert_eq!(Verdict::parse("needs_context"), Some(Verdict::NeedsContext));
        assert_eq!(Verdict::parse(" TRUE "), Some(Verdict::True));
    }

    #[test]
    fn verdict_rejects_values_outside_the_set() {
        assert_eq!(Verdict::parse("Mostly true"), None);
        assert_eq!(Verdict::parse(""), None);
    }

    #[test]
    fn quality_parse_is_strict() {
        assert_eq!(EvidenceQuality::parse("Moderate"), Some(EvidenceQuality::Moderate));
        assert_eq!(EvidenceQuality::parse("excellent"), None);
    }

    #[test]
    fn serialized_names_are_stable() {
        let json = serde_json::to_string(&(Verdict::NeedsContext, EvidenceQuality::Insufficient))
            .expect("serialize");
        assert_eq!(json, r#"["NeedsContext","Insufficient"]"#);
    }
}
