use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use factcheck::models::{AnalysisReport, Article, ArticleInput};
use factcheck::pipeline::{
    EvidenceSearcher, FactCheckPipeline, FallacyKnowledgeBase, LlmExtractor, LlmVerifier,
    OpenAiGenerator, SerperSearch, WebFetcher,
};
use factcheck::telemetry::init_tracing;
use factcheck::{AppConfig, TimeRange, VerificationDepth};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Extract the factual claims of a news article and verify each against web evidence.
#[derive(Parser, Debug)]
#[command(name = "factcheck", version, about)]
struct Args {
    /// Article URL.
    #[arg(required_unless_present = "print_schema")]
    url: Option<Url>,

    /// Article title, when the page title is not wanted.
    #[arg(long)]
    title: Option<String>,

    /// Read the article text from a file instead of fetching the URL.
    #[arg(long)]
    text_file: Option<PathBuf>,

    /// Characters of article text handed to claim extraction.
    #[arg(long)]
    max_chars: Option<usize>,

    /// Evidence items gathered per claim. Overrides --depth.
    #[arg(long)]
    sources_per_claim: Option<usize>,

    #[arg(long, value_enum)]
    depth: Option<VerificationDepth>,

    /// Claims verified in parallel.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Wall-clock budget for verifying all claims.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Recency window for evidence search. Overrides SERPER_TIME_RANGE.
    #[arg(long, value_enum)]
    time_range: Option<TimeRange>,

    /// Characters of retrieved article text kept before extraction.
    #[arg(long)]
    max_article_chars: Option<usize>,

    /// Fallacy knowledge base file (`name|definition|counterpoint|pattern;pattern`).
    #[arg(long)]
    fallacy_kb: Option<PathBuf>,

    /// Print the JSON schema of the report and exit.
    #[arg(long)]
    print_schema: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    if args.print_schema {
        let schema = schemars::schema_for!(AnalysisReport);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    init_tracing("info");
    let url = args.url.clone().context("article URL is required")?;

    let mut app = AppConfig::from_env()?;
    if let Some(limit) = args.concurrency {
        app.pipeline.concurrency_limit = limit;
    }
    if let Some(secs) = args.timeout_secs {
        app.pipeline.run_timeout = Duration::from_secs(secs);
    }
    if let Some(max_chars) = args.max_chars {
        app.pipeline.max_chars = max_chars;
    }
    if let Some(max_article_chars) = args.max_article_chars {
        app.pipeline.max_article_chars = max_article_chars;
    }
    app.pipeline.validate()?;

    let sources_per_claim = args
        .sources_per_claim
        .or(args.depth.map(VerificationDepth::sources_per_claim))
        .unwrap_or(app.pipeline.sources_per_claim);

    let fallacies = match &args.fallacy_kb {
        Some(path) => FallacyKnowledgeBase::from_path(path)
            .with_context(|| format!("reading fallacy knowledge base {}", path.display()))?,
        None => FallacyKnowledgeBase::builtin(),
    };

    let web = Arc::new(WebFetcher::new()?.with_max_article_chars(app.pipeline.max_article_chars));
    let generator = Arc::new(OpenAiGenerator::new(
        &app.openai_api_key,
        &app.openai_model,
        app.openai_api_base.as_deref(),
        app.llm_timeout,
    ));
    let search = SerperSearch::new(&app.serper_api_key, &app.serper_base_url)?
        .with_time_range(args.time_range.unwrap_or(app.serper_time_range));
    let retry = app.pipeline.retry;

    let pipeline = FactCheckPipeline::new(
        Arc::clone(&web),
        LlmExtractor::new(Arc::clone(&generator), retry),
        Arc::new(EvidenceSearcher::new(search, Arc::clone(&web), &app.pipeline)),
        Arc::new(LlmVerifier::new(generator, retry)),
        fallacies,
        app.pipeline.clone(),
    );

    let input = match &args.text_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading article text {}", path.display()))?;
            let title = args.title.clone().unwrap_or_else(|| url.to_string());
            ArticleInput::Fetched(Article::new(url, title, text))
        }
        None => ArticleInput::Url {
            url,
            title: args.title.clone(),
        },
    };

    let result = pipeline
        .analyze(input, app.pipeline.max_chars, sources_per_claim)
        .await?;
    tracing::info!(
        run_id = %result.run_id,
        overall_confidence = result.overall_confidence(),
        "report ready"
    );

    let report = AnalysisReport::from(&result);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
