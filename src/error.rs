// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Error types for the Tabularium document-store client.
//!
//! All fallible operations in this crate return [`Result<T>`], an alias for
//! `std::result::Result<T, StoreError>`. The [`StoreError`] enum covers
//! credentials-file validation, network transport, provider-side failures,
//! and wire-format decoding. "Document absent" is deliberately *not* an
//! error: read operations return `Ok(None)` for a missing document, so
//! callers can always tell "not found" apart from "something went wrong".

use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for document-store operations.
///
/// Each variant carries enough context for callers to decide whether to fix
/// their input, surface a user-facing message, or escalate.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The service-account credentials file does not exist.
    #[error("Service account file not found: {}", .0.display())]
    CredentialsNotFound(PathBuf),

    /// The service-account credentials file exists but could not be read.
    #[error("Service account file not readable: {}: {source}", .path.display())]
    CredentialsUnreadable {
        /// Path that was passed to `connect`.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The credentials file is not syntactically valid JSON.
    #[error("Invalid JSON in service account file: {0}")]
    CredentialsInvalid(#[source] serde_json::Error),

    /// One of the eight required credentials fields is absent.
    #[error("Missing required field in service account: {0}")]
    MissingCredentialsField(&'static str),

    /// The service-account private key is not a usable RSA PEM.
    #[error("Invalid service account private key: {0}")]
    InvalidPrivateKey(#[source] jsonwebtoken::errors::Error),

    /// The requested document (or resource) was not found.
    ///
    /// Read operations convert this to `Ok(None)` before it reaches the
    /// caller; it surfaces directly from `update`, where a missing target
    /// violates the operation's precondition.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Authentication or authorization failed. Check the service account's
    /// key validity and IAM permissions.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An underlying HTTP / network transport error from `reqwest`.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The provider returned an HTTP error status with a message body.
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code (e.g. 500, 503).
        status: u16,
        /// Human-readable message from the provider's error envelope.
        message: String,
    },

    /// Client-side validation failed before any request was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A provider response could not be interpreted as the expected wire
    /// format (unknown value envelope tag, malformed timestamp, ...).
    #[error("Response decode error: {0}")]
    Decode(String),

    /// The request exceeded the configured timeout duration.
    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

impl StoreError {
    /// Classify a transport failure, surfacing timeouts separately from
    /// other network errors.
    pub(crate) fn from_transport(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            StoreError::Timeout(timeout_ms)
        } else {
            StoreError::Network(err)
        }
    }
}

/// Crate-level result alias using [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_not_found_display() {
        let err = StoreError::CredentialsNotFound(PathBuf::from("/etc/missing.json"));
        assert_eq!(
            err.to_string(),
            "Service account file not found: /etc/missing.json"
        );
    }

    #[test]
    fn test_missing_field_display() {
        let err = StoreError::MissingCredentialsField("token_uri");
        assert_eq!(
            err.to_string(),
            "Missing required field in service account: token_uri"
        );
    }

    #[test]
    fn test_server_error_display() {
        let err = StoreError::Server {
            status: 503,
            message: "backend unavailable".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("backend unavailable"));
    }

    #[test]
    fn test_validation_display() {
        let err = StoreError::Validation("collection id must not contain '/'".to_string());
        assert!(err.to_string().starts_with("Validation error"));
    }

    #[test]
    fn test_timeout_display() {
        let err = StoreError::Timeout(30_000);
        assert_eq!(err.to_string(), "Timeout after 30000ms");
    }
}
