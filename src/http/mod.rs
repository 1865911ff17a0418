//! HTTP server. Routing lives in `handlers.rs`.

use hyper::service::service_fn;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
};
use std::{
    convert::Infallible,
    future::Future,
    net::{IpAddr, SocketAddr},
    panic::AssertUnwindSafe,
    sync::Arc,
};
use tokio::net::TcpListener;

use crate::{api, config::Config, prelude::*};
use self::handlers::handle;


mod handlers;
mod log;
mod response;


/// HTTP server configuration.
#[derive(Debug, Clone, confique::Config)]
pub(crate) struct HttpConfig {
    /// The TCP port the HTTP server should listen on. Can also be set via
    /// the `PORT` environment variable.
    #[config(default = 3000, env = "PORT")]
    pub(crate) port: u16,

    /// The bind address to listen on.
    #[config(default = "127.0.0.1")]
    pub(crate) address: IpAddr,

    /// Whether to serve the interactive GraphiQL console. It is served on
    /// `/graphql` itself, to browsers only (i.e. requests that accept
    /// `text/html` and do not carry a query).
    #[config(default = true)]
    pub(crate) graphiql: bool,
}


// `juniper_hyper` produces `String` bodies, so every response uses them.
type Response<T = String> = hyper::Response<T>;
type Request<T = hyper::body::Incoming> = hyper::Request<T>;


/// Shared, read-only state of all request handlers.
struct Context {
    api_root: Arc<api::RootNode>,
    api_context: Arc<api::Context>,
    graphiql: bool,
    log_headers: bool,
}


/// Binds to the configured address and serves requests until Ctrl+C.
pub(crate) async fn serve(
    config: &Config,
    api_root: api::RootNode,
    api_context: api::Context,
) -> Result<()> {
    let ctx = Arc::new(Context {
        api_root: Arc::new(api_root),
        api_context: Arc::new(api_context),
        graphiql: config.http.graphiql,
        log_headers: config.log.log_http_headers,
    });

    let addr = SocketAddr::new(config.http.address, config.http.port);
    let listener = TcpListener::bind(addr).await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    loop {
        let (stream, peer) = tokio::select! {
            res = listener.accept() => match res {
                Ok(v) => v,
                Err(e) => {
                    warn!("Failed to accept TCP connection: {e}");
                    continue;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down HTTP server");
                return Ok(());
            }
        };
        trace!("Accepted connection from {peer}");

        // One task per connection. Everything inside only needs the shared,
        // read-only context.
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            let service = service_fn(move |req| {
                handle_internal_errors(handle(req, Arc::clone(&ctx)))
            });
            let builder = auto::Builder::new(TokioExecutor::new());
            if let Err(e) = builder.serve_connection(TokioIo::new(stream), service).await {
                debug!("Error while serving connection from {peer}: {e}");
            }
        });
    }
}

/// Turns a panic while polling `future` into a `500` response, so the client
/// gets an answer instead of a reset connection.
async fn handle_internal_errors(
    future: impl Future<Output = Response>,
) -> Result<Response, Infallible> {
    // Handlers only read shared state, so a panic cannot leave anything in an
    // inconsistent state.
    let panic = match AssertUnwindSafe(future).catch_unwind().await {
        Ok(response) => return Ok(response),
        Err(panic) => panic,
    };

    let msg = panic.downcast_ref::<&str>().copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string payload>");
    error!("HTTP handler panicked: {msg}");

    Ok(response::internal_server_error())
}
