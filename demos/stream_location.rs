//! Stream an upstream URL to stdout.
//!
//! Run with:
//! ```bash
//! cargo run --example stream_location -- http://localhost:8080/logs [virtual-cluster]
//! ```
//!
//! Set `RUST_LOG=locstream=debug` to see request and redirect tracing.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use locstream::context::Context;
use locstream::options::StreamOptions;
use locstream::redirect::PreventRedirects;
use locstream::streamer::LocationStreamer;
use locstream::tenant::{
    StaticConfigLookup, TenantRecord, VIRTUAL_CLUSTER_INFO_NAME, VIRTUAL_CLUSTER_INFO_NAMESPACE,
    VIRTUAL_CLUSTER_NAME_KEY,
};
use locstream::validate::StatusValidator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let location = args
        .next()
        .expect("usage: stream_location <url> [virtual-cluster]");

    let lookup = StaticConfigLookup::new();
    if let Some(tenant) = args.next() {
        lookup.insert(
            TenantRecord::new(VIRTUAL_CLUSTER_INFO_NAMESPACE, VIRTUAL_CLUSTER_INFO_NAME)
                .with_entry(VIRTUAL_CLUSTER_NAME_KEY, tenant),
        );
    }

    let options = StreamOptions::for_location(location)
        .with_flush(true)
        .with_validator(StatusValidator)
        .with_redirect_policy(PreventRedirects)
        .with_config_lookup(Arc::new(lookup));

    // Ctrl-C cancels the stream; otherwise give up after a minute.
    let ctx = Context::background().with_timeout(Duration::from_secs(60));
    let canceller = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    let streamer = LocationStreamer::with_http_defaults()?;
    let result = streamer.stream(&ctx, &options).await?;
    eprintln!("content type: {:?}", result.content_type);

    let Some(mut stream) = result.stream else {
        return Ok(());
    };

    let mut stdout = std::io::stdout();
    while let Some(chunk) = stream.next().await {
        stdout.write_all(&chunk?)?;
        if result.flush {
            stdout.flush()?;
        }
    }
    stream.close();

    Ok(())
}
