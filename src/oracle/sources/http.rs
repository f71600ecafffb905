//! HTTP price feed
//!
//! Polls a JSON endpoint that reports the latest KALE quote:
//!
//! ```json
//! { "price": "0.095123", "source": "stellar", "timestamp": "2024-05-01T12:00:00Z" }
//! ```
//!
//! `price` may be a number or a numeric string. The upstream `timestamp` is
//! informational only; samples are stamped when the response completes.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::oracle::sources::{FeedAdapter, FeedError};
use crate::types::{Sample, SampleSource};

#[derive(Debug, Clone, Deserialize)]
struct PricePayload {
    price: serde_json::Value,
    source: String,
    #[serde(default)]
    timestamp: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kalewatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_transport_error(&self, err: reqwest::Error) -> FeedError {
        if err.is_timeout() {
            FeedError::Timeout(self.timeout)
        } else if err.is_decode() {
            FeedError::Malformed(err.to_string())
        } else {
            FeedError::Transport(err.to_string())
        }
    }
}

/// Extract price and source tag from a response body
fn parse_payload(body: &str) -> Result<(f64, SampleSource), FeedError> {
    let payload: PricePayload =
        serde_json::from_str(body).map_err(|e| FeedError::Malformed(e.to_string()))?;

    let price = match &payload.price {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| FeedError::Malformed(format!("price is not numeric: {}", payload.price)))?;

    let source = SampleSource::from_str(&payload.source)
        .ok_or_else(|| FeedError::UnknownSource(payload.source.clone()))?;

    if let Some(ts) = payload.timestamp.as_deref() {
        tracing::trace!(upstream_ts = %ts, "Upstream quote timestamp");
    }

    Ok((price, source))
}

#[async_trait]
impl FeedAdapter for HttpFeed {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_sample(&self) -> Result<Sample, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let (price, source) = parse_payload(&body)?;
        Sample::now(price, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn parses_numeric_and_string_prices() {
        let (price, source) = parse_payload(r#"{"price":0.0951,"source":"stellar"}"#).unwrap();
        assert_eq!(price, 0.0951);
        assert_eq!(source, SampleSource::Stellar);

        let (price, source) =
            parse_payload(r#"{"price":"0.100000","source":"CSV","timestamp":"2024-05-01T12:00:00Z"}"#)
                .unwrap();
        assert_eq!(price, 0.1);
        assert_eq!(source, SampleSource::Csv);
    }

    #[test]
    fn rejects_unknown_source_tags() {
        let err = parse_payload(r#"{"price":0.1,"source":"soroban"}"#).unwrap_err();
        assert_eq!(err, FeedError::UnknownSource("soroban".to_string()));
    }

    #[test]
    fn rejects_garbage_bodies() {
        assert!(matches!(
            parse_payload("<html>bad gateway</html>"),
            Err(FeedError::Malformed(_))
        ));
        assert!(matches!(
            parse_payload(r#"{"price":true,"source":"csv"}"#),
            Err(FeedError::Malformed(_))
        ));
    }

    /// Serve exactly one canned HTTP response on an ephemeral port
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/price")
    }

    #[tokio::test]
    async fn fetch_builds_sample_from_endpoint() {
        let url = serve_once("200 OK", r#"{"price":"0.097500","source":"hardcoded"}"#).await;
        let feed = HttpFeed::new(url, Duration::from_secs(2)).unwrap();

        let sample = feed.fetch_sample().await.expect("fetch should succeed");
        assert_eq!(sample.price(), 0.0975);
        assert_eq!(sample.source(), SampleSource::Hardcoded);
    }

    #[tokio::test]
    async fn fetch_surfaces_http_status() {
        let url = serve_once("503 Service Unavailable", "{}").await;
        let feed = HttpFeed::new(url, Duration::from_secs(2)).unwrap();

        let err = feed.fetch_sample().await.unwrap_err();
        assert_eq!(err, FeedError::Status(503));
    }

    #[tokio::test]
    async fn fetch_rejects_non_positive_price() {
        let url = serve_once("200 OK", r#"{"price":0,"source":"csv"}"#).await;
        let feed = HttpFeed::new(url, Duration::from_secs(2)).unwrap();

        let err = feed.fetch_sample().await.unwrap_err();
        assert_eq!(err, FeedError::InvalidPrice(0.0));
    }
}
