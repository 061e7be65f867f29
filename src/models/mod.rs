pub mod article;
pub mod claim;
pub mod common;
pub mod evidence;
pub mod report;
pub mod result;
pub mod verdict;

pub use article::{Article, ArticleInput};
pub use claim::{Claim, ClaimType};
pub use common::{Id, IsoDateTime};
pub use evidence::{EvidenceItem, SearchHit, Tier};
pub use report::{AnalysisReport, VerifiedClaimRecord};
pub use result::{clamp_unit, AnalysisResult, ClaimResult, FallacyMatch};
pub use verdict::{EvidenceQuality, SourceConsensus, Verdict};
