use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::core::EngineError;

/// Errors that can occur when interacting with the search index
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),
}

impl From<SearchError> for EngineError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::RequestError(e) if e.is_timeout() => {
                EngineError::UpstreamTimeout("search index did not respond in time".to_string())
            }
            _ => EngineError::Upstream("search index request failed".to_string()),
        }
    }
}

/// Raw access to the recipe search index
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Send a rendered request body and return the backend's response untouched
    async fn search(&self, body: &Value) -> Result<Value, SearchError>;
}

/// Credentials accepted by the search cluster
#[derive(Debug, Clone)]
pub enum SearchAuth {
    None,
    Basic { username: String, password: String },
    ApiKey(String),
}

/// Elasticsearch client posting to `{endpoint}/{index}/_search`
pub struct ElasticClient {
    base_url: String,
    index: String,
    auth: SearchAuth,
    client: Client,
}

impl ElasticClient {
    /// Create a new search client; `timeout` bounds every request
    pub fn new(
        base_url: String,
        index: String,
        auth: SearchAuth,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            index,
            auth,
            client,
        })
    }

    fn search_url(&self) -> String {
        format!(
            "{}/{}/_search",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.index)
        )
    }
}

#[async_trait]
impl SearchBackend for ElasticClient {
    async fn search(&self, body: &Value) -> Result<Value, SearchError> {
        let url = self.search_url();
        tracing::debug!("Searching index {} via {}", self.index, url);

        let mut request = self.client.post(&url).json(body);
        request = match &self.auth {
            SearchAuth::None => request,
            SearchAuth::Basic { username, password } => request.basic_auth(username, Some(password)),
            SearchAuth::ApiKey(key) => request.header("Authorization", format!("ApiKey {}", key)),
        };

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Search index returned {}: {}", status, body);
            return Err(SearchError::ApiError(format!("Search failed: {}", status)));
        }

        Ok(response.json().await?)
    }
}
