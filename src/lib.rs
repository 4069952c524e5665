// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! # Tabularium
//!
//! A typed Rust access layer for Google Cloud Firestore over its REST v1
//! surface — service-account credential validation, lazy OAuth2 token
//! exchange, and collection-scoped document CRUD. The crate mediates calls
//! to the managed service; it does not try to be a database itself.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use tabularium::TabulariumClient;
//!
//! #[tokio::main]
//! async fn main() -> tabularium::Result<()> {
//!     let client = TabulariumClient::connect("/etc/svc/service_account.json")?;
//!
//!     let users = client.collection("users")?;
//!     users.set("alice", &json!({"name": "Alice", "age": 30})).await?;
//!
//!     if let Some(doc) = users.get("alice").await? {
//!         println!("alice: {}", serde_json::Value::Object(doc.data));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`client`] — Connection options, credential verification, and HTTP transport.
//! - [`credentials`] — Service-account key loading and validation.
//! - [`collection`] — Collection-scoped handles and identifier validation.
//! - [`document`] — Document CRUD operations.
//! - [`value`] — Codec between plain JSON and the typed value envelopes.
//! - [`types`] — Documents, write acknowledgements, and list pages.
//! - [`error`] — Error types and the crate-level `Result` alias.

pub mod client;
pub mod credentials;
mod token;
pub mod collection;
pub mod document;
pub mod value;
pub mod types;
pub mod error;

pub use client::{ConnectOptions, TabulariumClient, FIRESTORE_ENDPOINT};
pub use collection::CollectionRef;
pub use credentials::ServiceAccountKey;
pub use error::{Result, StoreError};
pub use types::{Document, DocumentPage, WriteResult};
