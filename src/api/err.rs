//! API error handling.
//!
//! We define our own error to use for all resolvers. It has `From` impls to be
//! created from other common errors that occur (e.g. DB errors). The error
//! carries a coarse "error kind" which is exposed to clients in the
//! `extensions` of each GraphQL error.

use juniper::{FieldError, IntoFieldError, ScalarValue, graphql_value};

use crate::prelude::*;


pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) msg: String,
    pub(crate) kind: ApiErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    /// Some server error out of control of the API user, e.g. the database
    /// being unreachable.
    InternalServerError,
}

impl ApiErrorKind {
    fn kind_str(&self) -> &str {
        match self {
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    fn message_prefix(&self) -> &str {
        match self {
            Self::InternalServerError => "Internal server error",
        }
    }
}

impl From<tokio_postgres::Error> for ApiError {
    fn from(src: tokio_postgres::Error) -> Self {
        // At this point, it's very likely that the error is sent back to the
        // user. And this is the last time we can get detailed information
        // about it.
        error!("DB Error when executing query: {src}");
        debug!("Detailed error: {src:#?}");

        Self {
            msg: format!("DB error: {src}"),
            kind: ApiErrorKind::InternalServerError,
        }
    }
}

impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(src: deadpool_postgres::PoolError) -> Self {
        error!("Failed to obtain DB connection for API request: {src}");
        debug!("Detailed error: {src:#?}");

        Self {
            msg: "could not obtain database connection".into(),
            kind: ApiErrorKind::InternalServerError,
        }
    }
}

impl<S: ScalarValue> IntoFieldError<S> for ApiError {
    fn into_field_error(self) -> FieldError<S> {
        let msg = format!("{}: {}", self.kind.message_prefix(), self.msg);
        let ext = graphql_value!({
            "kind": (self.kind.kind_str()),
        });

        FieldError::new(msg, ext)
    }
}

