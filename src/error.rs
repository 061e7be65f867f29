use thiserror::Error;

/// Failure of an external collaborator (search, language model, loader, article source).
#[derive(Debug, Clone, Error)]
pub enum ExternalError {
    #[error("transient failure: {0}")]
    Transient(String),

    #[error("rate limited or quota exhausted: {0}")]
    Quota(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request rejected: {0}")]
    Permanent(String),
}

impl ExternalError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExternalError::Transient(_) | ExternalError::Quota(_))
    }
}

impl From<reqwest::Error> for ExternalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            ExternalError::Transient(err.to_string())
        } else if err.is_decode() || err.is_body() {
            ExternalError::Malformed(err.to_string())
        } else {
            ExternalError::Permanent(err.to_string())
        }
    }
}

/// Conditions fatal to a whole analysis run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("article retrieval failed for {url}: {source}")]
    ArticleRetrieval {
        url: String,
        #[source]
        source: ExternalError,
    },

    #[error("article at {0} has no text to analyze")]
    EmptyArticle(String),

    #[error("claim extraction unavailable: {0}")]
    ExtractionUnavailable(#[source] ExternalError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_and_quota_retry() {
        assert!(ExternalError::Transient("t".into()).is_retryable());
        assert!(ExternalError::Quota("q".into()).is_retryable());
        assert!(!ExternalError::Malformed("m".into()).is_retryable());
        assert!(!ExternalError::Permanent("p".into()).is_retryable());
    }
}
