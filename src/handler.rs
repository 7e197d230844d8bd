//! HTTP request handlers for the URL shortener API
//!
//! This module implements the three request flows:
//! - Saving a URL under a caller-supplied or generated alias
//! - Redirecting an alias to its target URL
//! - Deleting an alias
//!
//! Each handler depends only on the store capability it uses (`UrlSaver`,
//! `UrlGetter`, `UrlDeleter`) and is built with an explicit `tracing::Span`
//! that parents every event it emits.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error, info, info_span, Span};
use validator::Validate;

use crate::error::{ApiError, StorageError};
use crate::model::{AliasResponse, DeleteRequest, FieldError, SaveRequest};
use crate::random::generate_alias;

/// Length of generated aliases
pub const ALIAS_LENGTH: usize = 6;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Persists a new alias -> URL mapping
#[cfg_attr(test, mockall::automock)]
pub trait UrlSaver: Send + Sync {
    fn save_url(&self, url: &str, alias: &str) -> Result<u64, StorageError>;
}

/// Resolves an alias to its target URL
#[cfg_attr(test, mockall::automock)]
pub trait UrlGetter: Send + Sync {
    fn get_url(&self, alias: &str) -> Result<String, StorageError>;
}

/// Removes an alias
#[cfg_attr(test, mockall::automock)]
pub trait UrlDeleter: Send + Sync {
    fn delete_url(&self, alias: &str) -> Result<(), StorageError>;
}

fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
}

/// `POST /url`
#[derive(Clone)]
pub struct SaveHandler {
    saver: Arc<dyn UrlSaver>,
    log: Span,
}

impl SaveHandler {
    pub fn new(saver: Arc<dyn UrlSaver>, log: Span) -> Self {
        Self { saver, log }
    }

    /// Decodes and validates the JSON body, fills in a random alias if none
    /// was given and stores the mapping. The store is never called for an
    /// invalid payload. The body is decoded whatever its content type.
    pub fn handle(&self, request_id: &str, body: &[u8]) -> Result<AliasResponse, ApiError> {
        let span = info_span!(parent: &self.log, "save", op = "handlers.url.save", request_id);
        let _enter = span.enter();

        let req = serde_json::from_slice::<SaveRequest>(body).map_err(|err| {
            error!(error = %err, "failed to decode request body");
            ApiError::Decode
        })?;
        debug!(request = ?req, "request body decoded");

        if let Err(errors) = req.validate() {
            error!(error = %errors, "invalid request");
            return Err(ApiError::Validation(FieldError::from_validation(&errors)));
        }

        let Some(url) = req.url else {
            return Err(ApiError::InvalidRequest("invalid request"));
        };
        let alias = req
            .alias
            .filter(|alias| !alias.is_empty())
            .unwrap_or_else(|| generate_alias(ALIAS_LENGTH));

        match self.saver.save_url(&url, &alias) {
            Ok(id) => {
                info!(id, alias = %alias, "url added");
                Ok(AliasResponse::ok(alias))
            }
            Err(StorageError::AliasExists) => {
                info!(url = %url, alias = %alias, "url already exists");
                Err(ApiError::Conflict("url already exists"))
            }
            Err(err) => {
                error!(error = %err, "failed to add url");
                Err(ApiError::Internal("failed to add url"))
            }
        }
    }
}

/// Creates a short URL
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/very/long/url", "alias": "my-link" }
/// ```
///
/// # Response
///
/// - **201 Created** - `{"status":"OK","alias":"..."}`
/// - **400 Bad Request** - undecodable body or field validation failure
/// - **409 Conflict** - alias already taken
/// - **500 Internal Server Error** - storage failure
pub async fn save(
    State(handler): State<SaveHandler>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<AliasResponse>), ApiError> {
    let response = handler.handle(request_id(&headers), &body)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /{alias}`
#[derive(Clone)]
pub struct RedirectHandler {
    getter: Arc<dyn UrlGetter>,
    log: Span,
}

impl RedirectHandler {
    pub fn new(getter: Arc<dyn UrlGetter>, log: Span) -> Self {
        Self { getter, log }
    }

    /// Resolves `alias` to the URL to redirect to
    pub fn handle(&self, request_id: &str, alias: &str) -> Result<String, ApiError> {
        let span = info_span!(parent: &self.log, "redirect", op = "handlers.url.redirect", request_id);
        let _enter = span.enter();

        if alias.is_empty() {
            info!("alias is empty");
            return Err(ApiError::InvalidRequest("invalid request"));
        }

        match self.getter.get_url(alias) {
            Ok(url) => {
                info!(url = %url, "got url");
                Ok(url)
            }
            Err(StorageError::NotFound) => {
                info!(alias, "url not found");
                Err(ApiError::NotFound("not found"))
            }
            Err(err) => {
                error!(error = %err, "failed to get url");
                Err(ApiError::Internal("internal error"))
            }
        }
    }
}

/// Redirects an alias to its original destination with **302 Found**
///
/// Unknown aliases get a 404 JSON envelope instead.
pub async fn redirect(
    State(handler): State<RedirectHandler>,
    headers: HeaderMap,
    Path(alias): Path<String>,
) -> Result<Response, ApiError> {
    let url = handler.handle(request_id(&headers), &alias)?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}

/// `DELETE /url` and `DELETE /url/{alias}`
#[derive(Clone)]
pub struct DeleteHandler {
    deleter: Arc<dyn UrlDeleter>,
    log: Span,
}

impl DeleteHandler {
    pub fn new(deleter: Arc<dyn UrlDeleter>, log: Span) -> Self {
        Self { deleter, log }
    }

    /// Deletes the alias named in the body, falling back to the path segment
    /// when the body carries none. An empty alias never reaches the store.
    pub fn handle(
        &self,
        request_id: &str,
        path_alias: &str,
        body: &[u8],
    ) -> Result<AliasResponse, ApiError> {
        let span = info_span!(parent: &self.log, "delete", op = "handlers.url.delete", request_id);
        let _enter = span.enter();

        let req = if body.iter().all(u8::is_ascii_whitespace) {
            DeleteRequest::default()
        } else {
            serde_json::from_slice::<DeleteRequest>(body).map_err(|err| {
                error!(error = %err, "failed to decode request body");
                ApiError::Decode
            })?
        };
        debug!(request = ?req, "request body decoded");

        if let Err(errors) = req.validate() {
            error!(error = %errors, "invalid request");
            return Err(ApiError::Validation(FieldError::from_validation(&errors)));
        }

        let alias = req
            .alias
            .filter(|alias| !alias.is_empty())
            .unwrap_or_else(|| path_alias.to_string());
        if alias.is_empty() {
            error!("alias can't be empty");
            return Err(ApiError::InvalidRequest("alias can't be empty"));
        }

        match self.deleter.delete_url(&alias) {
            Ok(()) => {
                info!(alias = %alias, "url deleted");
                Ok(AliasResponse::ok(alias))
            }
            Err(StorageError::NotFound) => {
                info!(alias = %alias, "url not found");
                Err(ApiError::NotFound("url not found"))
            }
            Err(err) => {
                error!(error = %err, "failed to delete url");
                Err(ApiError::Internal("failed to delete url"))
            }
        }
    }
}

/// Deletes a short URL named by the path segment or the body `alias`
///
/// # Response
///
/// - **200 OK** - `{"status":"OK","alias":"..."}`
/// - **400 Bad Request** - undecodable body, invalid `url` field or empty alias
/// - **404 Not Found** - alias does not exist
pub async fn delete(
    State(handler): State<DeleteHandler>,
    headers: HeaderMap,
    Path(alias): Path<String>,
    body: Bytes,
) -> Result<Json<AliasResponse>, ApiError> {
    handler
        .handle(request_id(&headers), &alias, &body)
        .map(Json)
}

/// Deletes the short URL named by the body `alias` (`DELETE /url`)
pub async fn delete_by_body(
    State(handler): State<DeleteHandler>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AliasResponse>, ApiError> {
    handler.handle(request_id(&headers), "", &body).map(Json)
}
