use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{AnalysisResult, Article, ArticleInput, Id};
use crate::pipeline::aggregator::aggregate;
use crate::pipeline::fallacy::FallacyKnowledgeBase;
use crate::pipeline::orchestrator::Orchestrator;
use crate::pipeline::retry::with_retry;
use crate::pipeline::traits::{ArticleSource, ClaimExtractor, ClaimVerifier, EvidenceFetcher};
use std::sync::Arc;
use tracing::Instrument;

/// The analysis entry point: article -> claims -> (evidence -> verdict)* -> result.
pub struct FactCheckPipeline<A, X, F: ?Sized, V: ?Sized> {
    pub source: A,
    pub extractor: X,
    pub orchestrator: Orchestrator<F, V>,
    pub fallacies: Arc<FallacyKnowledgeBase>,
    pub config: PipelineConfig,
}

impl<A, X, F, V> FactCheckPipeline<A, X, F, V>
where
    A: ArticleSource,
    X: ClaimExtractor,
    F: EvidenceFetcher + ?Sized + 'static,
    V: ClaimVerifier + ?Sized + 'static,
{
    pub fn new(
        source: A,
        extractor: X,
        fetcher: Arc<F>,
        verifier: Arc<V>,
        fallacies: FallacyKnowledgeBase,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            extractor,
            orchestrator: Orchestrator::new(fetcher, verifier, &config),
            fallacies: Arc::new(fallacies),
            config,
        }
    }

    /// Runs one analysis. Errors only on whole-run failures: the article cannot be
    /// retrieved or is empty, or the extraction capability is unreachable.
    pub async fn analyze(
        &self,
        input: ArticleInput,
        max_chars: usize,
        sources_per_claim: usize,
    ) -> PipelineResult<AnalysisResult> {
        let run_id = Id::new();
        let span = tracing::info_span!("analyze", run_id = %run_id, url = %input.url());
        self.analyze_inner(run_id, input, max_chars, sources_per_claim)
            .instrument(span)
            .await
    }

    async fn analyze_inner(
        &self,
        run_id: Id,
        input: ArticleInput,
        max_chars: usize,
        sources_per_claim: usize,
    ) -> PipelineResult<AnalysisResult> {
        let article = self.resolve(input).await?;
        if article.is_empty() {
            return Err(PipelineError::EmptyArticle(article.url.to_string()));
        }
        tracing::info!(title = %article.title, chars = article.text.chars().count(), "article loaded");

        let kb = Arc::clone(&self.fallacies);
        let text = article.text.clone();
        let scan = tokio::task::spawn_blocking(move || kb.scan(&text));

        let verification = async {
            let extraction = self
                .extractor
                .extract(&article, max_chars)
                .await
                .map_err(PipelineError::ExtractionUnavailable)?;
            let results = self
                .orchestrator
                .run_with_sources(
                    &extraction.claims,
                    self.config.concurrency_limit,
                    sources_per_claim,
                )
                .await;
            Ok::<_, PipelineError>((extraction, results))
        };

        let (scanned, verified) = tokio::join!(scan, verification);
        let (extraction, results) = verified?;
        let fallacy_matches = scanned.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "fallacy scan failed, reporting none");
            Vec::new()
        });

        let result = aggregate(
            run_id,
            &article,
            extraction.summary,
            &extraction.claims,
            results,
            fallacy_matches,
        );
        tracing::info!(
            claims = result.claim_results.len(),
            degraded = result.claim_results.iter().filter(|r| r.is_degraded()).count(),
            overall_confidence = result.overall_confidence(),
            "analysis complete"
        );
        Ok(result)
    }

    async fn resolve(&self, input: ArticleInput) -> PipelineResult<Article> {
        match input {
            ArticleInput::Fetched(article) => Ok(article),
            ArticleInput::Url { url, title } => {
                with_retry(&self.config.retry, "article", || {
                    self.source.fetch(&url, title.as_deref())
                })
                .await
                .map_err(|source| PipelineError::ArticleRetrieval {
                    url: url.to_string(),
                    source,
                })
            }
        }
    }
}
