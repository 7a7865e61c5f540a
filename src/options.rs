//! Options for a single streaming attempt and for the HTTP transport.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::http::Transport;
use crate::redirect::RedirectPolicy;
use crate::tenant::ConfigLookup;
use crate::validate::ResponseValidator;

/// Describes one streaming attempt.
///
/// Built once by the caller and not modified by the streamer. Every
/// collaborator is optional:
/// - no `location`: the stream operation returns an empty result
/// - no `transport`: the streamer's default transport is used
/// - no `content_type`: negotiated from the response's `Content-Type`
/// - no `validator`: every response is accepted
/// - no `redirect_policy`: up to ten redirects are followed
/// - no `config_lookup`: the tenant header is sent empty
///
/// # Example
/// ```rust
/// use locstream::options::StreamOptions;
/// use locstream::redirect::PreventRedirects;
/// use locstream::validate::StatusValidator;
///
/// let options = StreamOptions::for_location("http://node.local:10250/containerLogs/ns/pod/c")
///     .with_flush(true)
///     .with_validator(StatusValidator)
///     .with_redirect_policy(PreventRedirects);
/// assert!(options.flush);
/// ```
#[derive(Clone, Default)]
pub struct StreamOptions {
    /// Target URL
    pub location: Option<String>,

    /// Transport overriding the streamer's default
    pub transport: Option<Arc<dyn Transport>>,

    /// Content type returned verbatim instead of the negotiated one
    pub content_type: Option<String>,

    /// Whether consumers should flush after each chunk
    pub flush: bool,

    pub validator: Option<Arc<dyn ResponseValidator>>,

    pub redirect_policy: Option<Arc<dyn RedirectPolicy>>,

    /// Source of the tenant name
    pub config_lookup: Option<Arc<dyn ConfigLookup>>,
}

impl StreamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_location(location: impl Into<String>) -> Self {
        Self::new().with_location(location)
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_flush(mut self, flush: bool) -> Self {
        self.flush = flush;
        self
    }

    pub fn with_validator(mut self, validator: impl ResponseValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn with_redirect_policy(mut self, policy: impl RedirectPolicy + 'static) -> Self {
        self.redirect_policy = Some(Arc::new(policy));
        self
    }

    /// Use a lookup shared with other options.
    pub fn with_config_lookup(mut self, lookup: Arc<dyn ConfigLookup>) -> Self {
        self.config_lookup = Some(lookup);
        self
    }
}

impl fmt::Debug for StreamOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOptions")
            .field("location", &self.location)
            .field("transport", &self.transport.is_some())
            .field("content_type", &self.content_type)
            .field("flush", &self.flush)
            .field("validator", &self.validator.is_some())
            .field("redirect_policy", &self.redirect_policy.is_some())
            .field("config_lookup", &self.config_lookup.is_some())
            .finish()
    }
}

/// Configuration of the reqwest-backed transport.
///
/// No request timeout is configured here: deadlines come from the
/// caller's [`Context`](crate::context::Context).
///
/// # Example
/// ```rust
/// use locstream::options::TransportOptions;
///
/// let options: TransportOptions = serde_json::from_str(
///     r#"{"proxy": "http://proxy.example.com:8080", "pool_max_idle_per_host": 4}"#,
/// ).unwrap();
/// assert_eq!(options.pool_max_idle_per_host, Some(4));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportOptions {
    /// HTTP proxy URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// `User-Agent` sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Idle connections kept per upstream host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_max_idle_per_host: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_nodelay: Option<bool>,
}

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    pub fn with_pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = Some(max);
        self
    }

    pub fn with_tcp_nodelay(mut self, nodelay: bool) -> Self {
        self.tcp_nodelay = Some(nodelay);
        self
    }
}
