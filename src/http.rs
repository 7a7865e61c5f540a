//! HTTP transport used to reach upstream locations.
//!
//! A [`Transport`] performs exactly one request/response exchange. Redirect
//! handling happens above it, in the streamer, so that a redirect policy
//! sees every hop regardless of which transport is plugged in.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Request, Response};

use crate::client::StreamError;
use crate::options::TransportOptions;

/// One HTTP exchange: send a request, return the response head with the
/// body still unread.
///
/// Implementations must not follow redirects. Tests substitute their own
/// implementation to script upstream behaviour.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn round_trip(&self, request: Request) -> Result<Response, StreamError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn round_trip(&self, request: Request) -> Result<Response, StreamError> {
        (**self).round_trip(request).await
    }
}

/// reqwest-backed [`Transport`] sharing one connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport from options.
    pub fn new(options: &TransportOptions) -> Result<Self, StreamError> {
        Ok(Self {
            client: build_http_client(options)?,
        })
    }

    /// Wrap an existing client.
    ///
    /// The client should be built with `reqwest::redirect::Policy::none()`,
    /// otherwise reqwest follows redirects before any redirect policy is
    /// consulted.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn round_trip(&self, request: Request) -> Result<Response, StreamError> {
        Ok(self.client.execute(request).await?)
    }
}

/// Build a configured HTTP client from transport options.
///
/// Redirects are always disabled on the returned client.
///
/// # Example
/// ```ignore
/// let client = build_http_client(&transport_options)?;
/// ```
pub fn build_http_client(options: &TransportOptions) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().redirect(reqwest::redirect::Policy::none());

    if let Some(proxy_url) = &options.proxy {
        match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => builder = builder.proxy(proxy),
            Err(e) => tracing::warn!(proxy = %proxy_url, "ignoring invalid proxy: {}", e),
        }
    }

    if let Some(user_agent) = &options.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }

    if let Some(max) = options.pool_max_idle_per_host {
        builder = builder.pool_max_idle_per_host(max);
    }

    if let Some(nodelay) = options.tcp_nodelay {
        builder = builder.tcp_nodelay(nodelay);
    }

    builder.build()
}
