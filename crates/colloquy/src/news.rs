//! Client for the Alpha Vantage `NEWS_SENTIMENT` feed
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{AttemptError, FetchError, TransientError};
use crate::retry::{retry_with_backoff, RetryConfig, Sleeper, TokioSleeper};

pub const NEWS_HOST: &str = "https://www.alphavantage.co";
pub const NEWS_FUNCTION: &str = "NEWS_SENTIMENT";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Keys the service uses for advisory bodies returned in place of a feed
const ADVISORY_KEYS: [&str; 3] = ["Information", "Note", "Error Message"];

#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub host: String,
    pub api_key: String,
    pub retry: RetryConfig,
    pub timeout: Duration,
}

impl NewsConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            host: NEWS_HOST.to_string(),
            api_key: api_key.into(),
            retry: RetryConfig::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Optional filters for a news query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsQuery {
    pub tickers: Vec<String>,
    pub topics: Vec<String>,
}

impl NewsQuery {
    /// Build a query from comma-separated ticker and topic lists
    pub fn from_csv(tickers: Option<&str>, topics: Option<&str>) -> Self {
        Self {
            tickers: split_csv(tickers),
            topics: split_csv(topics),
        }
    }

    fn params(&self, api_key: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("function", NEWS_FUNCTION.to_string()),
            ("apikey", api_key.to_string()),
        ];
        if !self.tickers.is_empty() {
            params.push(("tickers", self.tickers.join(",")));
        }
        if !self.topics.is_empty() {
            params.push(("topics", self.topics.join(",")));
        }
        params
    }
}

fn split_csv(list: Option<&str>) -> Vec<String> {
    list.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

pub struct NewsClient {
    client: Client,
    config: NewsConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl NewsClient {
    pub fn new(config: NewsConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Invalid(e.to_string()))?;

        Ok(Self {
            client,
            config,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replace how the client waits between retries
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Fetch the raw sentiment document, retrying transient failures with backoff
    pub async fn fetch_news_sentiment(&self, query: &NewsQuery) -> Result<Value, FetchError> {
        let url = format!("{}/query", self.config.host.trim_end_matches('/'));
        let params = query.params(&self.config.api_key);

        retry_with_backoff(&self.config.retry, self.sleeper.as_ref(), |attempt| {
            let request = self.client.get(&url).query(&params);
            fetch_once(request, attempt)
        })
        .await
    }
}

async fn fetch_once(request: RequestBuilder, attempt: u32) -> Result<Value, AttemptError> {
    tracing::debug!(attempt, "requesting news sentiment");
    let response = request.send().await.map_err(TransientError::from)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransientError::Status {
            status: status.as_u16(),
            body,
        }
        .into());
    }

    let body = response.text().await.map_err(TransientError::from)?;
    serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()).into())
}

/// The article list under the top-level `feed` key, or nothing
pub fn extract_articles(response: &Value) -> Vec<Value> {
    if let Some(feed) = response.get("feed").and_then(Value::as_array) {
        return feed.clone();
    }
    for key in ADVISORY_KEYS {
        if let Some(advisory) = response.get(key) {
            tracing::warn!(%advisory, "news service returned no feed");
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::tests::RecordingSleeper;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, sleeper: &RecordingSleeper) -> NewsClient {
        let mut config = NewsConfig::new("demo-key");
        config.host = server.uri();
        config.retry = RetryConfig::new(3, Duration::from_millis(10));
        NewsClient::new(config)
            .unwrap()
            .with_sleeper(Arc::new(sleeper.clone()))
    }

    #[test]
    fn test_query_from_csv() {
        let query = NewsQuery::from_csv(Some("AAPL, MSFT,,"), None);
        assert_eq!(query.tickers, vec!["AAPL", "MSFT"]);
        assert!(query.topics.is_empty());

        let params = query.params("k");
        assert_eq!(
            params,
            vec![
                ("function", "NEWS_SENTIMENT".to_string()),
                ("apikey", "k".to_string()),
                ("tickers", "AAPL,MSFT".to_string()),
            ]
        );
    }

    #[test]
    fn test_extract_articles() {
        let response = json!({"items": "2", "feed": [{"title": "a"}, {"title": "b"}]});
        assert_eq!(extract_articles(&response).len(), 2);

        let advisory = json!({"Information": "rate limit reached"});
        assert!(extract_articles(&advisory).is_empty());
        assert!(extract_articles(&json!({})).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_sends_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", "NEWS_SENTIMENT"))
            .and(query_param("apikey", "demo-key"))
            .and(query_param("tickers", "AAPL"))
            .and(query_param("topics", "technology,earnings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"feed": [{"title": "x"}]})))
            .expect(1)
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::default();
        let client = client_for(&server, &sleeper);
        let query = NewsQuery::from_csv(Some("AAPL"), Some("technology,earnings"));

        let data = client.fetch_news_sentiment(&query).await.unwrap();
        assert_eq!(extract_articles(&data), vec![json!({"title": "x"})]);
        assert!(sleeper.slept().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_omits_empty_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param_is_missing("tickers"))
            .and(query_param_is_missing("topics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"feed": []})))
            .expect(1)
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::default();
        let client = client_for(&server, &sleeper);

        let data = client
            .fetch_news_sentiment(&NewsQuery::default())
            .await
            .unwrap();
        assert!(extract_articles(&data).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"feed": [1, 2, 3]})))
            .expect(1)
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::default();
        let client = client_for(&server, &sleeper);

        let data = client
            .fetch_news_sentiment(&NewsQuery::default())
            .await
            .unwrap();
        assert_eq!(extract_articles(&data).len(), 3);
        assert_eq!(sleeper.slept(), vec![Duration::from_millis(10)]);
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .expect(3)
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::default();
        let client = client_for(&server, &sleeper);

        let err = client
            .fetch_news_sentiment(&NewsQuery::default())
            .await
            .unwrap_err();
        match err {
            FetchError::Transient { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(last, TransientError::Status { status: 500, .. }));
            }
            other => panic!("Expected transient error, got {:?}", other),
        }
        assert_eq!(
            sleeper.slept(),
            vec![Duration::from_millis(10), Duration::from_millis(20)]
        );
    }

    #[tokio::test]
    async fn test_invalid_json_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .expect(1)
            .mount(&server)
            .await;

        let sleeper = RecordingSleeper::default();
        let client = client_for(&server, &sleeper);

        let err = client
            .fetch_news_sentiment(&NewsQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
        assert!(sleeper.slept().is_empty());
    }
}
