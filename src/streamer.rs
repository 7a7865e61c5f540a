//! Location streamer: turns a URL into an open byte stream plus the
//! metadata a serving layer needs to forward it.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, LOCATION};
use reqwest::{Method, Request, Response, StatusCode, Url};

use crate::body::ByteStream;
use crate::client::{ResourceStreamer, StreamError};
use crate::context::Context;
use crate::http::{HttpTransport, Transport};
use crate::options::{StreamOptions, TransportOptions};
use crate::redirect::{LimitRedirects, RedirectPolicy};
use crate::tenant::{resolve_tenant, VIRTUAL_CLUSTER_NAME_HEADER};

/// Outcome of a successful stream operation.
///
/// `stream` is `None` only when no location was configured. When present,
/// the caller owns it and must close or drop it to release the connection.
#[derive(Debug, Default)]
pub struct StreamResult {
    pub stream: Option<ByteStream>,

    /// Whether consumers should flush after each chunk
    pub flush: bool,

    /// Negotiated or overridden media type, empty when unknown
    pub content_type: String,
}

impl StreamResult {
    /// The "nothing to stream" result.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Streams the contents of upstream locations.
///
/// Holds only the default transport; every call to [`LocationStreamer::stream`]
/// is independent.
///
/// # Example
/// ```no_run
/// use locstream::context::Context;
/// use locstream::options::StreamOptions;
/// use locstream::streamer::LocationStreamer;
/// use locstream::validate::StatusValidator;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let streamer = LocationStreamer::with_http_defaults()?;
///     let options = StreamOptions::for_location("http://up.example/x")
///         .with_validator(StatusValidator);
///
///     let mut result = streamer.stream(&Context::background(), &options).await?;
///     if let Some(stream) = result.stream.as_mut() {
///         let body = stream.read_to_end().await?;
///         println!("{} ({} bytes)", result.content_type, body.len());
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct LocationStreamer {
    default_transport: Arc<dyn Transport>,
}

impl LocationStreamer {
    /// Create a streamer falling back to `default_transport` when options
    /// carry no transport of their own.
    pub fn new(default_transport: Arc<dyn Transport>) -> Self {
        Self { default_transport }
    }

    /// Create a streamer whose default transport is an [`HttpTransport`]
    /// built from default options.
    pub fn with_http_defaults() -> Result<Self, StreamError> {
        let transport = HttpTransport::new(&TransportOptions::default())?;
        Ok(Self::new(Arc::new(transport)))
    }

    pub fn default_transport(&self) -> &Arc<dyn Transport> {
        &self.default_transport
    }

    /// Issue a GET against the configured location and return its body as a
    /// stream.
    ///
    /// Cancellation of `ctx` aborts the request, and once the stream is
    /// returned, fails the next read from it. No timeout of its own is
    /// applied.
    pub async fn stream(
        &self,
        ctx: &Context,
        options: &StreamOptions,
    ) -> Result<StreamResult, StreamError> {
        let Some(location) = options.location.as_deref() else {
            return Ok(StreamResult::empty());
        };

        let transport = options
            .transport
            .as_ref()
            .unwrap_or(&self.default_transport);

        let url = parse_location(location)?;

        let tenant = match &options.config_lookup {
            Some(lookup) => resolve_tenant(ctx, lookup.as_ref()).await,
            None => {
                tracing::debug!("no configuration lookup, sending empty virtual cluster name");
                String::new()
            }
        };

        let mut headers = HeaderMap::new();
        let tenant_value =
            HeaderValue::from_str(&tenant).map_err(|e| StreamError::construction(location, e))?;
        headers.insert(VIRTUAL_CLUSTER_NAME_HEADER, tenant_value);

        let response = send(
            ctx,
            transport.as_ref(),
            url,
            &headers,
            options.redirect_policy.as_deref(),
        )
        .await?;

        if let Some(validator) = &options.validator {
            if let Err(rejection) = validator.check(&response) {
                tracing::warn!(
                    location = %location,
                    status = %response.status(),
                    "upstream response rejected: {}",
                    rejection
                );
                drop(response);
                return Err(StreamError::ValidationRejected(rejection));
            }
        }

        let content_type = match options.content_type.as_deref() {
            Some(content_type) if !content_type.is_empty() => content_type.to_string(),
            _ => negotiate_content_type(response.headers()),
        };

        Ok(StreamResult {
            stream: Some(ByteStream::from_response(response, ctx.clone())),
            flush: options.flush,
            content_type,
        })
    }
}

#[async_trait]
impl ResourceStreamer for LocationStreamer {
    async fn input_stream(
        &self,
        ctx: &Context,
        options: &StreamOptions,
    ) -> Result<StreamResult, StreamError> {
        self.stream(ctx, options).await
    }
}

impl std::fmt::Debug for LocationStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationStreamer").finish_non_exhaustive()
    }
}

/// Media type of a `Content-Type` header with its parameters stripped.
///
/// # Example
/// ```
/// use locstream::streamer::negotiate_content_type;
/// use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
/// assert_eq!(negotiate_content_type(&headers), "text/plain");
/// assert_eq!(negotiate_content_type(&HeaderMap::new()), "");
/// ```
pub fn negotiate_content_type(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|media_type| media_type.trim().to_string())
        .unwrap_or_default()
}

fn parse_location(location: &str) -> Result<Url, StreamError> {
    let url = Url::parse(location).map_err(|e| StreamError::construction(location, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(StreamError::construction(
            location,
            format!("unsupported protocol scheme {:?}", scheme),
        )),
    }
}

fn get_request(url: Url, headers: &HeaderMap) -> Request {
    let mut request = Request::new(Method::GET, url);
    *request.headers_mut() = headers.clone();
    request
}

/// Send a GET, following redirects as `policy` allows.
async fn send(
    ctx: &Context,
    transport: &dyn Transport,
    url: Url,
    headers: &HeaderMap,
    policy: Option<&dyn RedirectPolicy>,
) -> Result<Response, StreamError> {
    let default_policy = LimitRedirects::default();
    let policy = policy.unwrap_or(&default_policy);

    let mut via: Vec<Url> = Vec::new();
    let mut request = get_request(url, headers);

    loop {
        let current = request.url().clone();
        tracing::debug!(url = %current, hop = via.len(), "sending upstream request");

        let response = tokio::select! {
            biased;
            reason = ctx.done() => return Err(StreamError::Cancelled(reason)),
            result = transport.round_trip(request) => result?,
        };

        let Some(next_url) = redirect_target(&response, &current)? else {
            return Ok(response);
        };

        via.push(current);
        let next = get_request(next_url, headers);

        if let Err(source) = policy.check(&next, &via) {
            tracing::warn!(to = %next.url(), hops = via.len(), "redirect rejected: {}", source);
            return Err(StreamError::RedirectRejected {
                url: next.url().clone(),
                source,
            });
        }

        tracing::debug!(status = %response.status(), to = %next.url(), "following redirect");
        drop(response);
        request = next;
    }
}

/// Where a redirect response points, or `None` if it is not a redirect.
fn redirect_target(response: &Response, current: &Url) -> Result<Option<Url>, StreamError> {
    let is_redirect = matches!(
        response.status(),
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    );
    if !is_redirect {
        return Ok(None);
    }

    let Some(location) = response.headers().get(LOCATION) else {
        return Ok(None);
    };

    location
        .to_str()
        .ok()
        .and_then(|location| current.join(location).ok())
        .map(Some)
        .ok_or_else(|| {
            StreamError::Transport(format!(
                "{} response from {} has an invalid Location header",
                response.status(),
                current
            ))
        })
}
