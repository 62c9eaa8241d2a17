//! Fetching remote artifacts.
//!
//! [`Transport`] is the seam between the retriever and the network. The HTTP
//! implementation talks to the public mirror; [`FsTransport`] reads a local
//! copy of it (`file://` URLs or plain paths), which is what tests and
//! offline re-runs use.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;

use crate::error::RetrievalError;

/// Fetch the complete body behind a URL.
pub trait Transport: Send + Sync {
  fn get<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<Bytes, RetrievalError>> + Send + 'a;
}

/// Join a base URL and a file name with exactly one `/`.
pub fn join_url(base: &str, file_name: &str) -> String {
  format!("{}/{}", base.trim_end_matches('/'), file_name)
}

// ─── HTTP ────────────────────────────────────────────────────────────────────

/// HTTP(S) transport.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpTransport {
  client: Client,
}

impl HttpTransport {
  pub fn new(timeout: Duration) -> Result<Self, RetrievalError> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| RetrievalError::Transport { url: String::new(), source: Box::new(e) })?;
    Ok(Self { client })
  }
}

impl Transport for HttpTransport {
  async fn get(&self, url: &str) -> Result<Bytes, RetrievalError> {
    let transport = |e: reqwest::Error| RetrievalError::Transport {
      url:    url.to_owned(),
      source: Box::new(e),
    };

    let resp = self.client.get(url).send().await.map_err(transport)?;
    if !resp.status().is_success() {
      return Err(RetrievalError::Status {
        url:    url.to_owned(),
        status: resp.status().as_u16(),
      });
    }
    resp.bytes().await.map_err(transport)
  }
}

// ─── Local mirror ────────────────────────────────────────────────────────────

/// Reads artifacts from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTransport;

impl Transport for FsTransport {
  async fn get(&self, url: &str) -> Result<Bytes, RetrievalError> {
    let path = url.strip_prefix("file://").unwrap_or(url);
    let data = tokio::fs::read(path).await?;
    Ok(Bytes::from(data))
  }
}

// ─── Selection by URL ────────────────────────────────────────────────────────

/// The transport matching a configured source URL.
#[derive(Clone)]
pub enum SourceTransport {
  Http(HttpTransport),
  Fs(FsTransport),
}

impl SourceTransport {
  /// `http://` and `https://` go over the network; anything else is treated
  /// as a local mirror.
  pub fn for_url(base_url: &str, timeout: Duration) -> Result<Self, RetrievalError> {
    let lower = base_url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
      Ok(Self::Http(HttpTransport::new(timeout)?))
    } else {
      Ok(Self::Fs(FsTransport))
    }
  }
}

impl Transport for SourceTransport {
  async fn get(&self, url: &str) -> Result<Bytes, RetrievalError> {
    match self {
      Self::Http(t) => t.get(url).await,
      Self::Fs(t) => t.get(url).await,
    }
  }
}
