//! HTTP retrieval for a single image URL
//!
//! One GET per URL, bounded by the configured timeouts, no retries. The
//! response headers are exposed before the body is read so the safety
//! validator can reject a response without downloading it.

use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use log::debug;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Response, Url};

use crate::core::config::{FetchConfig, ProgressCallback};
use crate::core::error::{Error, Result};
use crate::core::safety::SafetyPolicy;

/// Accept header advertising the image types we want
const ACCEPT_IMAGES: &str = "image/jpeg,image/png,image/gif,image/webp,*/*";

/// Upper bound for the body buffer allocated before any bytes arrive
const INITIAL_BUFFER_CAP: u64 = 1024 * 1024;

/// Metadata declared by the server
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMeta {
    /// URL after redirects
    pub final_url: Url,
    /// Raw Content-Type header, if any
    pub content_type: Option<String>,
    /// Content-Length header, if any and parseable
    pub content_length: Option<u64>,
}

/// A fully read response
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub meta: ResponseMeta,
    pub content: Bytes,
}

/// A successful response whose body has not been read yet
#[derive(Debug)]
pub struct PendingFetch {
    meta: ResponseMeta,
    response: Response,
}

/// Performs the network retrieval for single URLs
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a fetcher honouring the timeouts and User-Agent in `config`
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Send the GET and check the status. The body is left unread.
    pub async fn fetch(&self, url: &str) -> Result<PendingFetch> {
        let url = parse_url(url)?;
        debug!("GET {url}");

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, ACCEPT_IMAGES)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let meta = ResponseMeta {
            final_url: response.url().clone(),
            content_type: response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            content_length: response
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok()),
        };
        debug!(
            "{} -> {status}, type={:?}, length={:?}",
            meta.final_url, meta.content_type, meta.content_length
        );

        Ok(PendingFetch { meta, response })
    }
}

impl PendingFetch {
    pub fn meta(&self) -> &ResponseMeta {
        &self.meta
    }

    /// Read the body, aborting as soon as it grows past the policy limit
    pub async fn read_body(
        self,
        policy: &SafetyPolicy,
        progress: Option<&ProgressCallback>,
    ) -> Result<FetchResult> {
        let total = self.meta.content_length.unwrap_or(0);
        let capacity = initial_capacity(self.meta.content_length, policy.max_bytes());
        let mut content = BytesMut::with_capacity(capacity);

        let mut stream = self.response.bytes_stream();
        while let Some(chunk) = stream.try_next().await? {
            let downloaded = (content.len() + chunk.len()) as u64;
            policy.check_size(downloaded)?;
            content.extend_from_slice(&chunk);

            if let Some(progress) = progress {
                progress(downloaded, total);
            }
        }

        Ok(FetchResult {
            meta: self.meta,
            content: content.freeze(),
        })
    }
}

/// Starting buffer size; the buffer grows past it as chunks arrive
fn initial_capacity(declared: Option<u64>, max_bytes: u64) -> usize {
    declared
        .unwrap_or(0)
        .min(max_bytes)
        .min(INITIAL_BUFFER_CAP) as usize
}

/// Parse and check that the URL is an http(s) URL
pub fn parse_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|_| Error::InvalidUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(Error::InvalidUrl(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ErrorKind, Violation};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        Fetcher::new(&FetchConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_url() {
        assert!(parse_url("https://example.com/a.png").is_ok());
        assert!(parse_url("  http://example.com/a.png  ").is_ok());
        assert!(matches!(parse_url("not a url"), Err(Error::InvalidUrl(_))));
        assert!(matches!(
            parse_url("ftp://example.com/a.png"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_url("file:///etc/passwd"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_initial_capacity_is_bounded() {
        assert_eq!(initial_capacity(None, 10 * 1024 * 1024), 0);
        assert_eq!(initial_capacity(Some(4096), 10 * 1024 * 1024), 4096);
        assert_eq!(initial_capacity(Some(4096), 1024), 1024);
        // A huge declared length with a raised limit still starts small
        assert_eq!(
            initial_capacity(Some(u64::MAX), u64::MAX),
            INITIAL_BUFFER_CAP as usize
        );
    }

    #[tokio::test]
    async fn test_body_larger_than_initial_buffer_is_read_fully() {
        let mock_server = MockServer::start().await;
        let body = vec![5u8; INITIAL_BUFFER_CAP as usize + 4096];
        Mock::given(method("GET"))
            .and(path("/wide.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body.clone(), "image/png"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/wide.png", mock_server.uri());
        let pending = fetcher().fetch(&url).await.unwrap();
        let policy = SafetyPolicy::from_config(&FetchConfig::default());
        let result = pending.read_body(&policy, None).await.unwrap();
        assert_eq!(result.content.len(), body.len());
    }

    #[tokio::test]
    async fn test_fetch_success_exposes_metadata() {
        let mock_server = MockServer::start().await;
        let body = b"\x89PNG fake".to_vec();

        Mock::given(method("GET"))
            .and(path("/cat.png"))
            .and(header_exists("accept"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body.clone(), "image/png"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let url = format!("{}/cat.png", mock_server.uri());
        let pending = fetcher().fetch(&url).await.unwrap();

        assert_eq!(pending.meta().content_type.as_deref(), Some("image/png"));
        assert_eq!(pending.meta().content_length, Some(body.len() as u64));
        assert_eq!(pending.meta().final_url.path(), "/cat.png");

        let policy = SafetyPolicy::from_config(&FetchConfig::default());
        let result = pending.read_body(&policy, None).await.unwrap();
        assert_eq!(result.content.as_ref(), body.as_slice());
    }

    #[tokio::test]
    async fn test_non_2xx_is_network_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let url = format!("{}/missing.png", mock_server.uri());
        let err = fetcher().fetch(&url).await.unwrap_err();

        assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        // Port 1 is reserved and nothing listens on it in test environments
        let err = fetcher().fetch("http://127.0.0.1:1/a.png").await.unwrap_err();
        assert!(matches!(err, Error::Network(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_timeout_is_network_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"slow".to_vec(), "image/png")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let config = FetchConfig {
            timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let fetcher = Fetcher::new(&config).unwrap();
        let url = format!("{}/slow.png", mock_server.uri());

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_body_over_limit_is_rejected_while_streaming() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 64], "image/png"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/big.png", mock_server.uri());
        let pending = fetcher().fetch(&url).await.unwrap();
        let policy = SafetyPolicy::new(["image/png"], ["png"], 16);

        let err = pending.read_body(&policy, None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::UnsafeContent(Violation::TooLarge { limit: 16, .. })
        ));
    }

    #[tokio::test]
    async fn test_progress_reports_final_size() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dog.gif"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8; 300], "image/gif"))
            .mount(&mock_server)
            .await;

        let seen = Arc::new(AtomicU64::new(0));
        let seen_clone = Arc::clone(&seen);
        let progress: ProgressCallback = Arc::new(move |downloaded, _total| {
            seen_clone.store(downloaded, Ordering::SeqCst);
        });

        let url = format!("{}/dog.gif", mock_server.uri());
        let pending = fetcher().fetch(&url).await.unwrap();
        let policy = SafetyPolicy::from_config(&FetchConfig::default());
        pending.read_body(&policy, Some(&progress)).await.unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 300);
    }
}
