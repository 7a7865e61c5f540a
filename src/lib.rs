//! # locstream - Upstream location streaming
//!
//! Opens an HTTP GET against an upstream location and hands the response
//! body back as a lazily consumed byte stream, together with the metadata a
//! serving layer needs to proxy it (content type, flush policy). Nothing is
//! buffered and exactly one request is made per call; no retries.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Caller-driven cancellation: the [`Context`] bounds both the request and
//!   every later read from the stream
//! - Tenant propagation via the `virtualcluster-name` header, resolved from a
//!   pluggable configuration lookup
//! - Pluggable response validation and redirect policies
//! - Injectable transport, so tests can script upstream behaviour
//!
//! ## Architecture
//!
//! - **`LocationStreamer`**: orchestrates one streaming attempt
//! - **`StreamOptions`**: what to stream and with which collaborators
//! - **`Transport`**: a single HTTP exchange (reqwest-backed by default)
//! - **`RedirectPolicy`** / **`ResponseValidator`**: single-method checks
//! - **`ConfigLookup`**: source of the tenant record
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use locstream::context::Context;
//! use locstream::options::StreamOptions;
//! use locstream::redirect::PreventRedirects;
//! use locstream::streamer::LocationStreamer;
//! use locstream::tenant::{StaticConfigLookup, TenantRecord};
//! use locstream::validate::StatusValidator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lookup = StaticConfigLookup::new();
//!     lookup.insert(
//!         TenantRecord::new("kube-system", "virtualcluster-info")
//!             .with_entry("VirtualClusterName", "tenant-a"),
//!     );
//!
//!     let options = StreamOptions::for_location("http://node.local:10250/logs")
//!         .with_validator(StatusValidator)
//!         .with_redirect_policy(PreventRedirects)
//!         .with_config_lookup(Arc::new(lookup));
//!
//!     let streamer = LocationStreamer::with_http_defaults()?;
//!     let result = streamer.stream(&Context::background(), &options).await?;
//!
//!     if let Some(mut stream) = result.stream {
//!         while let Some(chunk) = stream.next().await {
//!             print!("{}", String::from_utf8_lossy(&chunk?));
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod body;
pub mod client;
pub mod context;
pub mod http;
pub mod options;
pub mod redirect;
pub mod streamer;
pub mod tenant;
pub mod validate;

// Re-exports for convenience
pub use body::ByteStream;
pub use client::{Rejection, ResourceStreamer, StreamError};
pub use context::{Context, ContextError};
pub use options::{StreamOptions, TransportOptions};
pub use streamer::{LocationStreamer, StreamResult};
