use crate::error::{PipelineError, PipelineResult};
use clap::ValueEnum;
use std::env;
use std::time::Duration;

/// Bounded retry with exponential backoff and full jitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Upper bound of the sleep before attempt `attempt` (1-based retry counter).
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum VerificationDepth {
    Quick,
    Thorough,
}

impl VerificationDepth {
    pub fn sources_per_claim(self) -> usize {
        match self {
            VerificationDepth::Quick => 5,
            VerificationDepth::Thorough => 8,
        }
    }
}

/// Recency window for news search, as Serper `tbs` values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TimeRange {
    Hour,
    Day,
    Week,
    Month,
    #[default]
    Year,
}

impl TimeRange {
    pub fn tbs(self) -> &'static str {
        match self {
            TimeRange::Hour => "qdr:h",
            TimeRange::Day => "qdr:d",
            TimeRange::Week => "qdr:w",
            TimeRange::Month => "qdr:m",
            TimeRange::Year => "qdr:y",
        }
    }

    /// Accepts the single-letter codes (`h`, `d`, `w`, `m`, `y`) or the full names.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "h" | "hour" => Some(TimeRange::Hour),
            "d" | "day" => Some(TimeRange::Day),
            "w" | "week" => Some(TimeRange::Week),
            "m" | "month" => Some(TimeRange::Month),
            "y" | "year" => Some(TimeRange::Year),
            _ => None,
        }
    }
}

/// Knobs of one analysis run. Passed explicitly into the pipeline; nothing is read globally.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub max_chars: usize,
    pub sources_per_claim: usize,
    pub concurrency_limit: usize,
    pub retry: RetryPolicy,
    pub run_timeout: Duration,
    pub full_text_top_n: usize,
    pub full_text_max_chars: usize,
    pub drop_unranked: bool,
    /// Hits taken from each planned query, so later queries get a chance to contribute.
    pub hits_per_query: usize,
    /// Bound on retrieved article text, applied before extraction truncation.
    pub max_article_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chars: 3000,
            sources_per_claim: VerificationDepth::Quick.sources_per_claim(),
            concurrency_limit: 3,
            retry: RetryPolicy::default(),
            run_timeout: Duration::from_secs(120),
            full_text_top_n: 2,
            full_text_max_chars: 1000,
            drop_unranked: false,
            hits_per_query: 2,
            max_article_chars: 100_000,
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by any `FACTCHECK_*` variables that are set.
    pub fn from_env() -> PipelineResult<Self> {
        let defaults = Self::default();
        let retry = RetryPolicy {
            max_attempts: parse_var("FACTCHECK_RETRY_ATTEMPTS")?
                .unwrap_or(defaults.retry.max_attempts),
            base_delay: parse_var("FACTCHECK_RETRY_BASE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.base_delay),
            max_delay: parse_var("FACTCHECK_RETRY_MAX_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.max_delay),
        };
        let config = Self {
            max_chars: parse_var("FACTCHECK_MAX_CHARS")?.unwrap_or(defaults.max_chars),
            sources_per_claim: parse_var("FACTCHECK_SOURCES_PER_CLAIM")?
                .unwrap_or(defaults.sources_per_claim),
            concurrency_limit: parse_var("FACTCHECK_CONCURRENCY")?
                .unwrap_or(defaults.concurrency_limit),
            retry,
            run_timeout: parse_var("FACTCHECK_RUN_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.run_timeout),
            full_text_top_n: parse_var("FACTCHECK_FULL_TEXT_TOP_N")?
                .unwrap_or(defaults.full_text_top_n),
            full_text_max_chars: parse_var("FACTCHECK_FULL_TEXT_MAX_CHARS")?
                .unwrap_or(defaults.full_text_max_chars),
            drop_unranked: parse_var("FACTCHECK_DROP_UNRANKED")?.unwrap_or(defaults.drop_unranked),
            hits_per_query: parse_var("FACTCHECK_HITS_PER_QUERY")?
                .unwrap_or(defaults.hits_per_query),
            max_article_chars: parse_var("FACTCHECK_MAX_ARTICLE_CHARS")?
                .unwrap_or(defaults.max_article_chars),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.max_chars == 0 {
            return Err(PipelineError::Config("max_chars must be positive".to_string()));
        }
        if self.concurrency_limit == 0 {
            return Err(PipelineError::Config(
                "concurrency_limit must be positive".to_string(),
            ));
        }
        if self.hits_per_query == 0 {
            return Err(PipelineError::Config(
                "hits_per_query must be positive".to_string(),
            ));
        }
        if self.max_article_chars == 0 {
            return Err(PipelineError::Config(
                "max_article_chars must be positive".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(PipelineError::Config(
                "retry max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Credentials and endpoints for the concrete collaborators.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub serper_api_key: String,
    pub serper_base_url: String,
    pub serper_time_range: TimeRange,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_base: Option<String>,
    pub llm_timeout: Duration,
    pub log_level: String,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Loads `.env` if present, then reads credentials and pipeline overrides.
    pub fn from_env() -> PipelineResult<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            serper_api_key: api_key("SERPER_API_KEY")?,
            serper_base_url: var_or("SERPER_BASE_URL", "https://google.serper.dev"),
            serper_time_range: time_range_var("SERPER_TIME_RANGE")?,
            openai_api_key: api_key("OPENAI_API_KEY")?,
            openai_model: var_or("OPENAI_MODEL", "gpt-4o"),
            openai_api_base: env::var("OPENAI_API_BASE").ok(),
            llm_timeout: Duration::from_secs(
                parse_var("FACTCHECK_LLM_TIMEOUT_SECS")?.unwrap_or(60),
            ),
            log_level: var_or("LOG_LEVEL", "info"),
            pipeline: PipelineConfig::from_env()?,
        })
    }
}

pub fn valid_api_key(key: &str) -> bool {
    let trimmed = key.trim();
    !trimmed.is_empty() && !trimmed.contains("...")
}

fn api_key(name: &str) -> PipelineResult<String> {
    match env::var(name) {
        Ok(key) if valid_api_key(&key) => Ok(key.trim().to_string()),
        Ok(_) => Err(PipelineError::Config(format!("{name} is set but not a usable key"))),
        Err(_) => Err(PipelineError::Config(format!("{name} is required but not set"))),
    }
}

fn time_range_var(name: &str) -> PipelineResult<TimeRange> {
    match env::var(name) {
        Ok(raw) => TimeRange::parse(&raw)
            .ok_or_else(|| PipelineError::Config(format!("invalid {name}: {raw}"))),
        Err(_) => Ok(TimeRange::default()),
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn parse_var<T: std::str::FromStr>(name: &str) -> PipelineResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| PipelineError::Config(format!("invalid {name}: {e}"))),
        Err(_) => Ok(None),
    }
}
