//! Error types for the storage layer and the HTTP API
//!
//! `StorageError` is what the URL store reports. Handlers classify it into an
//! `ApiError`, which renders as a single JSON envelope per failed request.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::model::{FieldError, Status};

/// Failures reported by the URL store
#[derive(Debug, Error)]
pub enum StorageError {
    /// The alias is already mapped to a URL; nothing was written
    #[error("url already exists")]
    AliasExists,

    /// No record carries the requested alias
    #[error("url not found")]
    NotFound,

    /// A required input was empty
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("database error: {0}")]
    Database(#[from] redb::Error),

    #[error("record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Request-scoped failures, each mapped to one response body
#[derive(Debug)]
pub enum ApiError {
    /// Body could not be decoded as the expected JSON shape
    Decode,
    /// One or more fields failed validation
    Validation(Vec<FieldError>),
    InvalidRequest(&'static str),
    Conflict(&'static str),
    NotFound(&'static str),
    Internal(&'static str),
    Unauthorized,
}

/// Realm announced in `WWW-Authenticate` for protected routes
pub const AUTH_REALM: &str = "url-shortener";

#[derive(Serialize)]
struct ErrorBody {
    status: Status,
    error: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, fields) = match self {
            ApiError::Decode => (
                StatusCode::BAD_REQUEST,
                "failed to decode request",
                Vec::new(),
            ),
            ApiError::Validation(fields) => (StatusCode::BAD_REQUEST, "invalid request", fields),
            ApiError::InvalidRequest(message) => (StatusCode::BAD_REQUEST, message, Vec::new()),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message, Vec::new()),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message, Vec::new()),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message, Vec::new())
            }
            ApiError::Unauthorized => {
                let body = ErrorBody {
                    status: Status::Error,
                    error: "unauthorized",
                    fields: Vec::new(),
                };
                return (
                    StatusCode::UNAUTHORIZED,
                    [(
                        header::WWW_AUTHENTICATE,
                        format!("Basic realm=\"{AUTH_REALM}\""),
                    )],
                    Json(body),
                )
                    .into_response();
            }
        };

        let body = ErrorBody {
            status: Status::Error,
            error,
            fields,
        };

        (status, Json(body)).into_response()
    }
}

macro_rules! impl_from_redb {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for StorageError {
                fn from(err: $err) -> Self {
                    StorageError::Database(err.into())
                }
            }
        )*
    };
}

impl_from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
