use hyper::{header, Method};
use std::{sync::Arc, time::Instant};

use crate::prelude::*;
use super::{log, response, Context, Request, Response};


/// This is the main HTTP entry point, called for each incoming request.
pub(super) async fn handle(req: Request, ctx: Arc<Context>) -> Response {
    log::req::log(&req);
    if ctx.log_headers {
        log::headers::log(&req);
    }

    let method = req.method().clone();
    let path = req.uri().path().trim_end_matches('/').to_owned();

    match path.as_str() {
        "/graphql" => match method {
            Method::GET if ctx.graphiql && wants_graphiql(&req) => {
                juniper_hyper::graphiql("/graphql", None).await
            }
            Method::GET | Method::POST => handle_api(req, &ctx).await,
            _ => response::method_not_allowed(),
        },

        _ => {
            debug!(%method, path = %path, "Responding with 404");
            response::not_found()
        }
    }
}

/// Handles a request to `/graphql`.
async fn handle_api(req: Request, ctx: &Context) -> Response {
    let before = Instant::now();
    let response = juniper_hyper::graphql(
        Arc::clone(&ctx.api_root),
        Arc::clone(&ctx.api_context),
        req,
    ).await;
    debug!("Finished /graphql query in {:.2?}", before.elapsed());

    response
}

/// Whether this looks like a browser navigating to the endpoint, as opposed to
/// an API client sending a query via `GET`.
fn wants_graphiql<B>(req: &hyper::Request<B>) -> bool {
    let accepts_html = req.headers()
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("text/html"));

    let has_query = req.uri().query().is_some_and(|q| {
        q.split('&').any(|pair| pair.split('=').next() == Some("query"))
    });

    accepts_html && !has_query
}
