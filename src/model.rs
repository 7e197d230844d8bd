//! Data models for the URL shortener application
//!
//! This module defines the request/response payloads exchanged over HTTP
//! and the record structure persisted by the URL store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// A URL mapping stored in the database
///
/// Records are created by save, read by redirect and removed by delete.
/// There is no update path: changing a mapping means delete and save again.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UrlRecord {
    /// Sequence number assigned by the store on insert
    pub id: u64,

    /// Public short identifier, unique across all records
    pub alias: String,

    /// Target URL the alias redirects to
    pub url: String,

    /// Timestamp when this record was created
    pub created_at: DateTime<Utc>,
}

/// Outcome marker carried by every response body
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Error")]
    Error,
}

/// Request payload for `POST /url`
///
/// # Example
/// ```json
/// {
///   "url": "https://example.com/very/long/url",
///   "alias": "my-link"  // Optional
/// }
/// ```
#[derive(Deserialize, Validate, Debug, Default)]
pub struct SaveRequest {
    #[validate(required, url)]
    pub url: Option<String>,

    /// Optional alias; a random one is generated when absent or empty
    pub alias: Option<String>,
}

/// Request payload for `DELETE /url/{alias}`
///
/// Lookup is by alias only. `url` is accepted for compatibility with the
/// save payload shape and only checked for well-formedness when present.
#[derive(Deserialize, Validate, Debug, Default)]
pub struct DeleteRequest {
    #[validate(url)]
    pub url: Option<String>,

    pub alias: Option<String>,
}

/// Successful save/delete response
///
/// ```json
/// { "status": "OK", "alias": "abc123" }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AliasResponse {
    pub status: Status,
    pub alias: String,
}

impl AliasResponse {
    pub fn ok(alias: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            alias: alias.into(),
        }
    }
}

/// One failed field in a validation error response
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    /// Flattens validator output into `field -> reason` pairs, sorted by field name
    pub fn from_validation(errors: &ValidationErrors) -> Vec<FieldError> {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| FieldError {
                    field: field.to_string(),
                    reason: reason_for(&err.code).to_string(),
                })
            })
            .collect();

        fields.sort_by(|a, b| a.field.cmp(&b.field));
        fields
    }
}

fn reason_for(code: &str) -> &'static str {
    match code {
        "required" => "is a required field",
        "url" => "is not a valid URL",
        _ => "is not valid",
    }
}
