//! Core streaming trait and error types.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use thiserror::Error;

use crate::context::{Context, ContextError};
use crate::options::StreamOptions;
use crate::streamer::StreamResult;

/// Errors that can occur while opening a stream.
///
/// Any error means no content was streamed: no byte stream is handed back
/// alongside it.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("failed to construct request for {location}: {reason}")]
    RequestConstruction { location: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request aborted: {0}")]
    Cancelled(#[from] ContextError),

    #[error("Redirect to {url} rejected: {source}")]
    RedirectRejected {
        url: Url,
        #[source]
        source: Rejection,
    },

    #[error("Response rejected: {0}")]
    ValidationRejected(#[source] Rejection),
}

impl StreamError {
    pub(crate) fn construction(location: &str, reason: impl ToString) -> Self {
        StreamError::RequestConstruction {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for failures of the exchange itself (network, transport, or the
    /// context ending), as opposed to a policy or validator decision.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            StreamError::Http(_) | StreamError::Transport(_) | StreamError::Cancelled(_)
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamError::Cancelled(_))
    }
}

/// A refusal issued by a redirect policy or a response validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Rejection {
    message: String,
    status: Option<StatusCode>,
}

impl Rejection {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// Attach the upstream status that caused the rejection.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }
}

/// A resource whose contents can be opened as a byte stream.
///
/// The serving layer holds one of these and asks it for a stream per
/// incoming request. Implementations must not keep state across calls:
/// concurrent invocations are independent.
///
/// # Example
/// ```rust,ignore
/// let streamer = LocationStreamer::with_http_defaults()?;
/// let options = StreamOptions::for_location("http://upstream.local/logs")
///     .with_validator(StatusValidator);
///
/// let result = streamer.input_stream(&ctx, &options).await?;
/// if let Some(stream) = result.stream {
///     // forward bytes, flushing after each chunk if result.flush
/// }
/// ```
#[async_trait]
pub trait ResourceStreamer: Send + Sync {
    /// Open the stream described by `options`.
    ///
    /// Returns [`StreamResult::empty`] when `options` carries no location.
    /// Otherwise the returned stream is owned by the caller, who must close
    /// or drop it to release the underlying connection.
    async fn input_stream(
        &self,
        ctx: &Context,
        options: &StreamOptions,
    ) -> Result<StreamResult, StreamError>;
}
