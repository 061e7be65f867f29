use crate::models::IsoDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Source reliability tier. Ordering is best-first, so sorting ascending ranks `Tier1` on top.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize, JsonSchema,
)]
pub enum Tier {
    #[serde(rename = "TIER_1")]
    Tier1 = 1,
    #[serde(rename = "TIER_2")]
    Tier2 = 2,
    #[serde(rename = "TIER_3")]
    Tier3 = 3,
    #[serde(rename = "UNRANKED")]
    Unranked = 4,
}

impl Tier {
    /// Contribution of one item at this tier to the confidence factor.
    pub fn weight(self) -> f32 {
        match self {
            Tier::Tier1 => 1.0,
            Tier::Tier2 => 0.8,
            Tier::Tier3 => 0.6,
            Tier::Unranked => 0.3,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tier::Tier1 => "TIER_1",
            Tier::Tier2 => "TIER_2",
            Tier::Tier3 => "TIER_3",
            Tier::Unranked => "UNRANKED",
        };
        f.write_str(label)
    }
}

/// One raw hit from the search capability. `rank` is zero-based discovery order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub rank: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub url: Url,
    pub domain: String,
    pub tier: Tier,
    pub title: String,
    pub snippet: String,
    pub body: Option<String>,
    /// sha256 of `body`, present only when the full text was loaded.
    pub body_sha256: Option<String>,
    pub search_rank: usize,
    pub retrieved_at: IsoDateTime,
}

impl EvidenceItem {
    /// Best available text: full body when loaded, snippet otherwise.
    pub fn content(&self) -> &str {
        self.body.as_deref().unwrap_or(&self.snippet)
    }

    pub fn rank_key(&self) -> (Tier, usize) {
        (self.tier, self.search_rank)
    }
}
