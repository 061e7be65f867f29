pub mod aggregator;
pub mod analyze;
pub mod credibility;
pub mod extractor;
pub mod fallacy;
pub mod fetch;
pub mod mock;
pub mod openai;
pub mod orchestrator;
pub mod parse;
pub mod prompts;
pub mod retry;
pub mod search;
pub mod serper;
pub mod traits;
pub mod verifier;

pub use aggregator::aggregate;
pub use analyze::FactCheckPipeline;
pub use credibility::{domain_of, tier_of};
pub use extractor::LlmExtractor;
pub use fallacy::{FallacyEntry, FallacyKnowledgeBase};
pub use fetch::WebFetcher;
pub use mock::{
    ScriptedFetcher, ScriptedGenerator, StaticArticleSource, StaticLoader, StaticSearch,
    StubVerifier,
};
pub use openai::OpenAiGenerator;
pub use orchestrator::{Orchestrator, TaskOutcome, TaskState};
pub use retry::with_retry;
pub use search::EvidenceSearcher;
pub use serper::SerperSearch;
pub use traits::{
    ArticleSource, ClaimExtractor, ClaimVerifier, EvidenceFetcher, Extraction, Prompt,
    SearchBackend, TextGenerator, TextLoader,
};
pub use verifier::LlmVerifier;
