use crate::config::TimeRange;
use crate::error::ExternalError;
use crate::models::SearchHit;
use crate::pipeline::traits::SearchBackend;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const RESULTS_PER_QUERY: usize = 10;

/// News search through the Serper API.
pub struct SerperSearch {
    client: Client,
    api_key: String,
    base_url: String,
    time_range: String,
}

#[derive(Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    tbs: &'a str,
    num: usize,
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    news: Vec<SerperNews>,
}

#[derive(Deserialize)]
struct SerperNews {
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

impl SerperSearch {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("factcheck/0.1")
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            time_range: TimeRange::default().tbs().to_string(),
        })
    }

    pub fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = range.tbs().to_string();
        self
    }
}

#[async_trait]
impl SearchBackend for SerperSearch {
    async fn query(&self, text: &str) -> Result<Vec<SearchHit>, ExternalError> {
        let response = self
            .client
            .post(format!("{}/news", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .json(&SerperRequest {
                q: text,
                tbs: &self.time_range,
                num: RESULTS_PER_QUERY,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ExternalError::Quota(format!("{status}: {body}")));
        }
        if status.is_server_error() {
            return Err(ExternalError::Transient(format!("{status}: {body}")));
        }
        if !status.is_success() {
            return Err(ExternalError::Permanent(format!("{status}: {body}")));
        }

        let parsed: SerperResponse = serde_json::from_str(&body)
            .map_err(|e| ExternalError::Malformed(format!("serper body: {e}")))?;
        Ok(parsed
            .news
            .into_iter()
            .enumerate()
            .map(|(rank, news)| SearchHit {
                url: news.link,
                title: news.title,
                snippet: news.snippet,
                rank,
            })
            .collect())
    }
}
