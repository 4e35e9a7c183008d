//! Web search for evidence documents.
//!
//! Uses reqwest against the Tavily search API.

use crate::config::Credential;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Upper bound on evidence documents per run
pub const MAX_RESULTS: usize = 5;

/// User-Agent string sent with every request
pub(crate) const USER_AGENT: &str = concat!("newsdigest/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("missing search API key (set TAVILY_API_KEY)")]
    MissingApiKey,
    #[error("search request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("search service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// A single retrieved evidence item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// One hit as returned by a search service. Only `content` feeds the prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: Option<f64>,
}

/// A service that answers a text query with a ranked list of hits.
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;
}

/// Query the search service for a topic and keep at most [`MAX_RESULTS`]
/// documents, in the order the service returned them.
pub async fn retrieve_evidence<S>(service: &S, topic: &str) -> Result<Vec<Document>, SearchError>
where
    S: SearchService + ?Sized,
{
    let hits = service.search(topic, MAX_RESULTS).await?;
    let documents: Vec<Document> = hits
        .into_iter()
        .take(MAX_RESULTS)
        .map(|hit| Document::new(hit.content))
        .collect();

    info!(count = documents.len(), "Evidence retrieved");
    Ok(documents)
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Tavily web search client.
pub struct TavilyClient {
    client: Client,
    base_url: String,
    api_key: Option<Credential>,
}

impl TavilyClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<Credential>) -> Result<Self, SearchError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl SearchService for TavilyClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let api_key = self.api_key.as_ref().ok_or(SearchError::MissingApiKey)?;
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        debug!(%url, max_results, "Tavily search");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose())
            .json(&TavilyRequest {
                query,
                max_results,
                search_depth: "advanced",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status { status, body });
        }

        let data: TavilyResponse = response.json().await?;
        Ok(data.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedSearch(Vec<SearchHit>);

    #[async_trait]
    impl SearchService for FixedSearch {
        async fn search(&self, _query: &str, _max: usize) -> Result<Vec<SearchHit>, SearchError> {
            Ok(self.0.clone())
        }
    }

    fn hit(content: &str) -> SearchHit {
        SearchHit {
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn caps_evidence_at_five_in_service_order() {
        let hits = ["6", "5", "4", "3", "2", "1"].iter().map(|c| hit(c)).collect();
        let documents = retrieve_evidence(&FixedSearch(hits), "topic").await.unwrap();

        let contents: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["6", "5", "4", "3", "2"]);
    }

    #[tokio::test]
    async fn tavily_sends_query_and_parses_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("authorization", "Bearer tvly-test"))
            .and(body_partial_json(json!({
                "query": "AI News",
                "max_results": 5,
                "search_depth": "advanced"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": "AI News",
                "results": [
                    {"title": "One", "url": "https://a.example", "content": "first", "score": 0.9},
                    {"title": "Two", "url": "https://b.example", "content": "second"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = TavilyClient::new(server.uri(), Some(Credential::new("tvly-test"))).unwrap();
        let hits = client.search("AI News", MAX_RESULTS).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "first");
        assert_eq!(hits[0].score, Some(0.9));
        assert_eq!(hits[1].url, "https://b.example");
        assert_eq!(hits[1].score, None);
    }

    #[tokio::test]
    async fn tavily_without_key_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = TavilyClient::new(server.uri(), None).unwrap();
        let err = client.search("AI News", MAX_RESULTS).await.unwrap_err();
        assert!(matches!(err, SearchError::MissingApiKey));
    }

    #[tokio::test]
    async fn tavily_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let client = TavilyClient::new(server.uri(), Some(Credential::new("bad"))).unwrap();
        match client.search("AI News", MAX_RESULTS).await.unwrap_err() {
            SearchError::Status { status, body } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(body, "invalid key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
