use hyper::StatusCode;

use super::Response;


pub(crate) fn not_found() -> Response {
    plain_text(StatusCode::NOT_FOUND, "404 Not found")
}

pub(crate) fn method_not_allowed() -> Response {
    plain_text(StatusCode::METHOD_NOT_ALLOWED, "405 Method not allowed")
}

pub(crate) fn internal_server_error() -> Response {
    plain_text(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

fn plain_text(status: StatusCode, body: &str) -> Response {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=UTF-8")
        .body(body.to_owned())
        .unwrap()
}
