//! The byte stream handed back to callers.
//!
//! Wraps an upstream response body so that every read is bound to the
//! caller's [`Context`]: once the context ends, the next read yields
//! [`StreamError::Cancelled`] and the connection is dropped.

use std::io;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

use crate::client::StreamError;
use crate::context::Context;

/// An open, sequentially readable upstream body.
///
/// Dropping the stream, or calling [`ByteStream::close`], releases the
/// underlying connection.
///
/// # Example
/// ```ignore
/// use futures::StreamExt;
///
/// while let Some(chunk) = stream.next().await {
///     writer.write_all(&chunk?).await?;
///     if flush {
///         writer.flush().await?;
///     }
/// }
/// ```
pub struct ByteStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, StreamError>> + Send>>,
}

impl ByteStream {
    pub(crate) fn from_response(response: reqwest::Response, ctx: Context) -> Self {
        Self::bound(response.bytes_stream(), ctx)
    }

    fn bound<S>(body: S, ctx: Context) -> Self
    where
        S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    {
        let inner = stream::unfold(Some((Box::pin(body), ctx)), |state| async move {
            let (mut body, ctx) = state?;

            let next = tokio::select! {
                biased;
                reason = ctx.done() => Err(reason),
                chunk = body.next() => Ok(chunk),
            };

            match next {
                Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some((body, ctx)))),
                Ok(Some(Err(e))) => Some((Err(StreamError::from(e)), None)),
                Ok(None) => None,
                Err(reason) => {
                    tracing::debug!("upstream read aborted: {}", reason);
                    Some((Err(StreamError::Cancelled(reason)), None))
                }
            }
        });

        Self {
            inner: Box::pin(inner),
        }
    }

    /// Read the remainder of the stream into memory.
    pub async fn read_to_end(&mut self) -> Result<Bytes, StreamError> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = self.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer.freeze())
    }

    /// Adapt into an [`AsyncRead`]; stream errors surface as `io::Error`s.
    pub fn into_async_read(self) -> impl AsyncRead + Send + Unpin {
        StreamReader::new(self.map(|chunk| chunk.map_err(io::Error::other)))
    }

    /// Release the underlying connection without reading further.
    pub fn close(self) {
        tracing::debug!("closing upstream stream");
        drop(self);
    }
}

impl Stream for ByteStream {
    type Item = Result<Bytes, StreamError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ByteStream")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextError;
    use tokio::io::AsyncReadExt;

    fn response_with_chunks(chunks: Vec<&'static str>) -> reqwest::Response {
        let chunks: Vec<Result<Bytes, io::Error>> =
            chunks.into_iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))).collect();
        http::Response::new(reqwest::Body::wrap_stream(stream::iter(chunks))).into()
    }

    fn pending_response() -> reqwest::Response {
        let body = stream::pending::<Result<Bytes, io::Error>>();
        http::Response::new(reqwest::Body::wrap_stream(body)).into()
    }

    #[tokio::test]
    async fn test_read_to_end() {
        let mut stream = ByteStream::from_response(
            response_with_chunks(vec!["hel", "lo"]),
            Context::background(),
        );
        assert_eq!(stream.read_to_end().await.unwrap(), Bytes::from_static(b"hello"));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_into_async_read() {
        let stream = ByteStream::from_response(
            response_with_chunks(vec!["line one\n", "line two\n"]),
            Context::background(),
        );
        let mut text = String::new();
        stream.into_async_read().read_to_string(&mut text).await.unwrap();
        assert_eq!(text, "line one\nline two\n");
    }

    #[tokio::test]
    async fn test_read_after_cancel_fails() {
        let ctx = Context::background();
        let mut stream = ByteStream::from_response(response_with_chunks(vec!["data"]), ctx.clone());
        ctx.cancel();

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, StreamError::Cancelled(ContextError::Canceled)));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_pending_read_ends_at_deadline() {
        let ctx = Context::background().with_timeout(std::time::Duration::from_millis(20));
        let mut stream = ByteStream::from_response(pending_response(), ctx);

        let err = stream.read_to_end().await.unwrap_err();
        assert!(matches!(err, StreamError::Cancelled(ContextError::DeadlineExceeded)));
    }
}
