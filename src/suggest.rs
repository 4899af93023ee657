//! Suggestion service client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::Result;

/// A suggestion list as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions {
    /// Input echoed back by the service, if any.
    pub echo: Option<String>,
    /// Suggestions in service order.
    pub options: Vec<String>,
}

impl Suggestions {
    pub fn new(echo: Option<String>, options: Vec<String>) -> Self {
        Self { echo, options }
    }
}

/// Source of autocomplete suggestions.
///
/// An `Err` means the fetch itself failed; the caller keeps its previous
/// suggestions. A reachable service that answers with garbage should return
/// `Ok(Suggestions::default())`.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggest(&self, query: &str) -> Result<Suggestions>;
}

/// Parses a `[echo, [suggestion, ...], ...]` body. Trailing elements are
/// ignored; non-string suggestions are skipped.
pub fn parse_suggestions(body: &Value) -> Option<Suggestions> {
    let items = body.as_array()?;
    let echo = items.first()?.as_str().map(str::to_string);
    let options = items
        .get(1)?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    Some(Suggestions { echo, options })
}

/// Default endpoint; the query is appended percent-encoded.
pub const DEFAULT_ENDPOINT: &str = "http://google.com/complete/search?client=chrome&q=";

/// Fetches suggestions from a GET endpoint.
pub struct HttpSuggestionSource {
    client: Client,
    endpoint: String,
}

impl HttpSuggestionSource {
    /// Creates a source for `endpoint` with the given request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; a3s-search-session/0.1)")
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Creates a source with a custom reqwest client.
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_url(&self, query: &str) -> String {
        format!("{}{}", self.endpoint, urlencoding::encode(query))
    }
}

#[async_trait]
impl SuggestionSource for HttpSuggestionSource {
    async fn suggest(&self, query: &str) -> Result<Suggestions> {
        let response = self.client.get(self.request_url(query)).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Suggestion service returned {} for '{}'", status, query);
            return Ok(Suggestions::default());
        }

        let text = response.text().await?;
        let parsed = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| parse_suggestions(&body));
        match parsed {
            Some(suggestions) => Ok(suggestions),
            None => {
                warn!("Malformed suggestion response for '{}'", query);
                Ok(Suggestions::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response and returns the endpoint to query.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });
        format!("http://{}/complete?q=", addr)
    }

    async fn suggest_from(status: &'static str, body: &'static str) -> Result<Suggestions> {
        let endpoint = serve_once(status, body).await;
        let source = HttpSuggestionSource::new(endpoint, Duration::from_secs(5)).unwrap();
        source.suggest("rust").await
    }

    #[test]
    fn test_parse_two_element_response() {
        let body = json!(["rust", ["rust lang", "rust book"]]);
        let parsed = parse_suggestions(&body).unwrap();
        assert_eq!(parsed.echo.as_deref(), Some("rust"));
        assert_eq!(parsed.options, vec!["rust lang", "rust book"]);
    }

    #[test]
    fn test_parse_chrome_client_response() {
        let body = json!(["ru", ["rust", "ruby"], ["", ""], [], {"google:suggesttype": []}]);
        let parsed = parse_suggestions(&body).unwrap();
        assert_eq!(parsed.options, vec!["rust", "ruby"]);
    }

    #[test]
    fn test_parse_absent_echo() {
        let body = json!([null, ["a"]]);
        let parsed = parse_suggestions(&body).unwrap();
        assert!(parsed.echo.is_none());
        assert_eq!(parsed.options, vec!["a"]);
    }

    #[test]
    fn test_parse_skips_non_strings() {
        let body = json!(["q", ["a", 1, null, "b"]]);
        assert_eq!(parse_suggestions(&body).unwrap().options, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_suggestions(&json!({"q": "x"})).is_none());
        assert!(parse_suggestions(&json!(["only"])).is_none());
        assert!(parse_suggestions(&json!(["q", "not-a-list"])).is_none());
        assert!(parse_suggestions(&json!([])).is_none());
    }

    #[test]
    fn test_request_url_encodes_query() {
        let source = HttpSuggestionSource::with_client(Client::new(), "https://s.example/?q=");
        assert_eq!(source.request_url("a b&c"), "https://s.example/?q=a%20b%26c");
        assert_eq!(source.endpoint(), "https://s.example/?q=");
    }

    #[tokio::test]
    async fn test_http_source_parses_response() {
        let suggestions = suggest_from("200 OK", r#"["rust",["rust lang","rust book"]]"#)
            .await
            .unwrap();
        assert_eq!(suggestions.echo.as_deref(), Some("rust"));
        assert_eq!(suggestions.options, vec!["rust lang", "rust book"]);
    }

    #[tokio::test]
    async fn test_http_source_error_status_is_empty() {
        let suggestions = suggest_from("500 Internal Server Error", "oops").await.unwrap();
        assert_eq!(suggestions, Suggestions::default());
    }

    #[tokio::test]
    async fn test_http_source_invalid_json_is_empty() {
        let suggestions = suggest_from("200 OK", "not json").await.unwrap();
        assert_eq!(suggestions, Suggestions::default());
    }

    #[tokio::test]
    async fn test_http_source_unexpected_shape_is_empty() {
        let suggestions = suggest_from("200 OK", r#"{"q":1}"#).await.unwrap();
        assert_eq!(suggestions, Suggestions::default());
    }

    #[tokio::test]
    async fn test_http_source_unreachable_is_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let source = HttpSuggestionSource::new(format!("http://{}/?q=", addr), Duration::from_secs(5)).unwrap();
        assert!(source.suggest("rust").await.is_err());
    }

    #[tokio::test]
    #[ignore]
    async fn test_http_source_live() {
        let source = HttpSuggestionSource::new(DEFAULT_ENDPOINT, Duration::from_secs(5)).unwrap();
        let suggestions = source.suggest("rust").await.unwrap();
        println!("{:?}", suggestions);
    }
}
