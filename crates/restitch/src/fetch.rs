//! HTTP retrieval of playlist documents and media segments.

use std::sync::OnceLock;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Proxy};
use tracing::debug;

use crate::config::{FetchConfig, ProxyConfig, ProxyKind};
use crate::error::RestitchError;
use crate::retry::{RetryAction, RetryPolicy, run_with_retries};

fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Safe to ignore: can happen if another crate installed it first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Byte source for playlists and segments.
///
/// One call retrieves one URI to completion, retries included. The
/// orchestrator owns batching and concurrency.
#[async_trait]
pub trait SegmentSource: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Bytes, RestitchError>;
}

/// [`SegmentSource`] backed by a reqwest client with bounded
/// fixed-delay retry.
pub struct SegmentFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl SegmentFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, RestitchError> {
        install_rustls_provider();

        let mut builder = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone());

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(build_proxy(proxy)?);
        }

        let client = builder
            .build()
            .map_err(|e| RestitchError::configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            policy: RetryPolicy::from(config),
        })
    }

    /// One GET, classified for the retry loop. A non-success status or
    /// transport failure is worth retrying; a body that turns out to be
    /// an HTML document is an error page standing in for media bytes,
    /// which also burns an attempt before escalating.
    async fn attempt(&self, uri: &str) -> RetryAction<Bytes> {
        let response = match self.client.get(uri).send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                return RetryAction::Fail(RestitchError::invalid_url(uri, e.to_string()));
            }
            Err(e) => return RetryAction::Retry(RestitchError::transient(uri, e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            return RetryAction::Retry(RestitchError::transient_status(uri, status));
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return RetryAction::Retry(RestitchError::transient(uri, e.to_string())),
        };

        if looks_like_html(&body) {
            return RetryAction::Retry(RestitchError::fatal_fetch(uri));
        }

        RetryAction::Success(body)
    }
}

#[async_trait]
impl SegmentSource for SegmentFetcher {
    async fn fetch(&self, uri: &str) -> Result<Bytes, RestitchError> {
        let bytes = run_with_retries(&self.policy, |_| self.attempt(uri)).await?;
        debug!(url = %uri, bytes = bytes.len(), "fetched");
        Ok(bytes)
    }
}

fn build_proxy(config: &ProxyConfig) -> Result<Proxy, RestitchError> {
    let proxy = match config.kind {
        ProxyKind::Http => Proxy::http(&config.url),
        ProxyKind::Https => Proxy::https(&config.url),
        ProxyKind::All => Proxy::all(&config.url),
    }
    .map_err(|e| RestitchError::configuration(format!("proxy `{}`: {e}", config.url)))?;

    Ok(match (&config.username, &config.password) {
        (Some(username), Some(password)) => proxy.basic_auth(username, password),
        _ => proxy,
    })
}

fn looks_like_html(body: &[u8]) -> bool {
    const MARKER: &[u8] = b"<html";
    body.windows(MARKER.len())
        .any(|window| window.eq_ignore_ascii_case(MARKER))
}
