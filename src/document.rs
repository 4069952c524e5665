// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Document CRUD operations.
//!
//! Write semantics come in two deliberate flavors: [`CollectionRef::set`]
//! replaces the whole document (a patch with no field mask), while
//! [`CollectionRef::update`] patches only the named top-level fields and
//! requires the document to already exist. Reads distinguish "absent"
//! (`Ok(None)`) from "failed" (`Err`). Every operation emits one tracing
//! event with the collection and document id.

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::client::TabulariumClient;
use crate::collection::{validate_id, CollectionRef};
use crate::error::{Result, StoreError};
use crate::types::{Document, DocumentPage, ListResponse, RawDocument, WriteResult};
use crate::value;

impl CollectionRef<'_> {
    /// Write a document, replacing any existing content entirely.
    ///
    /// Creates the document if it does not exist. Fields absent from
    /// `data` do not survive; use [`update`](Self::update) to merge.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] before any network call if the
    /// id is invalid or `data` does not serialize to a non-empty JSON
    /// object.
    pub async fn set<T: Serialize>(&self, document_id: &str, data: &T) -> Result<WriteResult> {
        let (_, fields) = self.checked_write(document_id, data)?;

        let url = self
            .client
            .resource_url(&[self.name.as_str(), document_id]);
        let body = json!({ "fields": fields });

        let raw: RawDocument = match self.client.patch_json(url, &body).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(
                    collection = %self.name,
                    document = document_id,
                    error = %e,
                    "failed to write document"
                );
                return Err(e);
            }
        };

        info!(collection = %self.name, document = document_id, "document written");
        Ok(raw.write_result())
    }

    /// Read a document.
    ///
    /// Returns `Ok(None)` if the document does not exist; that case is
    /// logged at warn level and is not an error. Transport and server
    /// failures are.
    pub async fn get(&self, document_id: &str) -> Result<Option<Document>> {
        self.checked_id(document_id)?;

        let url = self
            .client
            .resource_url(&[self.name.as_str(), document_id]);

        let outcome = self
            .client
            .get_json::<RawDocument>(url)
            .await
            .and_then(RawDocument::into_document);

        match outcome {
            Ok(document) => {
                info!(collection = %self.name, document = document_id, "document read");
                Ok(Some(document))
            }
            Err(StoreError::NotFound(_)) => {
                warn!(collection = %self.name, document = document_id, "document not found");
                Ok(None)
            }
            Err(e) => {
                error!(
                    collection = %self.name,
                    document = document_id,
                    error = %e,
                    "failed to read document"
                );
                Err(e)
            }
        }
    }

    /// Patch the named top-level fields of an existing document.
    ///
    /// Fields not named in `updates` keep their current values. The write
    /// carries an exists precondition, so patching a document that was
    /// never created is [`StoreError::NotFound`] rather than a blind
    /// insert.
    ///
    /// # Errors
    ///
    /// Same validation as [`set`](Self::set); additionally
    /// [`StoreError::NotFound`] if the document does not exist.
    pub async fn update<T: Serialize>(
        &self,
        document_id: &str,
        updates: &T,
    ) -> Result<WriteResult> {
        let (map, fields) = self.checked_write(document_id, updates)?;

        let mut url = self
            .client
            .resource_url(&[self.name.as_str(), document_id]);
        {
            let mut pairs = url.query_pairs_mut();
            for key in map.keys() {
                pairs.append_pair("updateMask.fieldPaths", &value::field_mask_path(key));
            }
            pairs.append_pair("currentDocument.exists", "true");
        }
        let body = json!({ "fields": fields });

        let raw: RawDocument = match self.client.patch_json(url, &body).await {
            Ok(raw) => raw,
            Err(e @ StoreError::NotFound(_)) => {
                warn!(
                    collection = %self.name,
                    document = document_id,
                    "cannot update a document that does not exist"
                );
                return Err(e);
            }
            Err(e) => {
                error!(
                    collection = %self.name,
                    document = document_id,
                    error = %e,
                    "failed to update document"
                );
                return Err(e);
            }
        };

        info!(collection = %self.name, document = document_id, "document updated");
        Ok(raw.write_result())
    }

    /// Delete a document.
    ///
    /// Idempotent: deleting a document that does not exist succeeds.
    pub async fn delete(&self, document_id: &str) -> Result<()> {
        self.checked_id(document_id)?;

        let url = self
            .client
            .resource_url(&[self.name.as_str(), document_id]);

        if let Err(e) = self.client.delete_resource(url).await {
            error!(
                collection = %self.name,
                document = document_id,
                error = %e,
                "failed to delete document"
            );
            return Err(e);
        }

        info!(collection = %self.name, document = document_id, "document deleted");
        Ok(())
    }

    /// Create a document under a freshly generated UUID v4 id.
    ///
    /// Returns the generated id alongside the write acknowledgement.
    pub async fn add<T: Serialize>(&self, data: &T) -> Result<(String, WriteResult)> {
        let document_id = Uuid::new_v4().to_string();
        let result = self.set(&document_id, data).await?;
        Ok((document_id, result))
    }

    /// List one page of the collection's documents.
    ///
    /// # Arguments
    ///
    /// * `page_size`  — Maximum number of documents (server may cap this).
    /// * `page_token` — Continuation token from a previous page, if any.
    pub async fn list(
        &self,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> Result<DocumentPage> {
        let mut url = self.client.resource_url(&[self.name.as_str()]);
        if page_size.is_some() || page_token.is_some() {
            let mut pairs = url.query_pairs_mut();
            if let Some(size) = page_size {
                pairs.append_pair("pageSize", &size.to_string());
            }
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
        }

        let outcome = self
            .client
            .get_json::<ListResponse>(url)
            .await
            .and_then(|response| {
                let documents = response
                    .documents
                    .into_iter()
                    .map(RawDocument::into_document)
                    .collect::<Result<Vec<_>>>()?;
                Ok(DocumentPage {
                    documents,
                    next_page_token: response.next_page_token,
                })
            });

        match outcome {
            Ok(page) => {
                info!(
                    collection = %self.name,
                    count = page.documents.len(),
                    "documents listed"
                );
                Ok(page)
            }
            Err(e) => {
                error!(collection = %self.name, error = %e, "failed to list documents");
                Err(e)
            }
        }
    }

    /// Validate a document id, logging a rejection at error level.
    fn checked_id(&self, document_id: &str) -> Result<()> {
        if let Err(e) = validate_id(document_id, "document") {
            error!(
                collection = %self.name,
                document = document_id,
                error = %e,
                "rejected document id"
            );
            return Err(e);
        }
        Ok(())
    }

    /// Client-side checks for a write: id rules, payload shape, wire
    /// encoding. Rejections are logged here; nothing has been sent yet.
    fn checked_write<T: Serialize>(
        &self,
        document_id: &str,
        data: &T,
    ) -> Result<(Map<String, Value>, Map<String, Value>)> {
        match prepare_write(document_id, data) {
            Ok(prepared) => Ok(prepared),
            Err(e) => {
                error!(
                    collection = %self.name,
                    document = document_id,
                    error = %e,
                    "rejected document write"
                );
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience surface
// ---------------------------------------------------------------------------

/// Single-call wrappers for callers that do not hold a [`CollectionRef`].
impl TabulariumClient {
    /// Write a document, replacing any existing content entirely.
    pub async fn set_document<T: Serialize>(
        &self,
        collection: &str,
        document_id: &str,
        data: &T,
    ) -> Result<WriteResult> {
        self.collection(collection)?.set(document_id, data).await
    }

    /// Read a document; `Ok(None)` if it does not exist.
    pub async fn get_document(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Option<Document>> {
        self.collection(collection)?.get(document_id).await
    }

    /// Patch the named top-level fields of an existing document.
    pub async fn update_document<T: Serialize>(
        &self,
        collection: &str,
        document_id: &str,
        updates: &T,
    ) -> Result<WriteResult> {
        self.collection(collection)?.update(document_id, updates).await
    }

    /// Delete a document. Idempotent.
    pub async fn delete_document(&self, collection: &str, document_id: &str) -> Result<()> {
        self.collection(collection)?.delete(document_id).await
    }
}

/// Validate id and payload for a write, returning the payload map and its
/// wire encoding.
fn prepare_write<T: Serialize>(
    document_id: &str,
    data: &T,
) -> Result<(Map<String, Value>, Map<String, Value>)> {
    validate_id(document_id, "document")?;
    let map = payload_map(data)?;
    let fields = value::encode_fields(&map)?;
    Ok((map, fields))
}

/// Serialize a payload and require it to be a non-empty JSON object.
fn payload_map<T: Serialize>(data: &T) -> Result<Map<String, Value>> {
    let value = serde_json::to_value(data)?;
    let map = match value {
        Value::Object(map) => map,
        _ => {
            return Err(StoreError::Validation(
                "document payload must be a JSON object".to_string(),
            ))
        }
    };
    if map.is_empty() {
        return Err(StoreError::Validation(
            "document payload must not be empty".to_string(),
        ));
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_must_be_an_object() {
        assert!(matches!(
            payload_map(&json!(42)),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            payload_map(&json!(["a", "b"])),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_payload_rejected() {
        assert!(matches!(
            payload_map(&json!({})),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_struct_payload_serializes() {
        #[derive(Serialize)]
        struct Profile {
            name: &'static str,
            age: u8,
        }

        let map = payload_map(&Profile {
            name: "Ada",
            age: 36,
        })
        .unwrap();
        assert_eq!(map.get("name"), Some(&json!("Ada")));
        assert_eq!(map.get("age"), Some(&json!(36)));
    }
}
