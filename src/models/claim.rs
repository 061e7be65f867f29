use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Statistical,
    Event,
    Quote,
    Policy,
    Prediction,
    #[default]
    Other,
}

impl ClaimType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "statistical" => ClaimType::Statistical,
            "event" => ClaimType::Event,
            "quote" => ClaimType::Quote,
            "policy" => ClaimType::Policy,
            "prediction" => ClaimType::Prediction,
            _ => ClaimType::Other,
        }
    }
}

/// A discrete factual claim. `index` is the extraction position and never changes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    index: usize,
    text: String,
    search_terms: Vec<String>,
    claim_type: ClaimType,
}

impl Claim {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            search_terms: Vec::new(),
            claim_type: ClaimType::Other,
        }
    }

    pub fn with_search_terms(mut self, terms: Vec<String>) -> Self {
        self.search_terms = terms
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    pub fn with_type(mut self, claim_type: ClaimType) -> Self {
        self.claim_type = claim_type;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn search_terms(&self) -> &[String] {
        &self.search_terms
    }

    pub fn claim_type(&self) -> ClaimType {
        self.claim_type
    }

    /// Search terms, falling back to the claim text itself.
    pub fn primary_term(&self) -> &str {
        self.search_terms
            .first()
            .map(String::as_str)
            .unwrap_or(&self.text)
    }
}
