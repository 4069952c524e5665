// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Result types returned by document operations, and the wire shapes they
//! are decoded from.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::value;

/// A document read from the store, with its envelope fields decoded back
/// to plain JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Identifier within its collection (the last segment of the resource
    /// name).
    pub id: String,
    /// The document's key-value payload.
    pub data: Map<String, Value>,
    /// Server-assigned creation time.
    pub create_time: Option<DateTime<Utc>>,
    /// Server-assigned time of the last mutation.
    pub update_time: Option<DateTime<Utc>>,
}

/// Server acknowledgement of a write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteResult {
    /// When the document was first created; unchanged by overwrites.
    pub create_time: Option<DateTime<Utc>>,
    /// When this write was applied.
    pub update_time: Option<DateTime<Utc>>,
}

/// One page of a collection listing.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPage {
    /// Documents in this page, in the server's default order.
    pub documents: Vec<Document>,
    /// Token for the next page; `None` when this page is the last.
    pub next_page_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Wire shapes (REST v1)
// ---------------------------------------------------------------------------

/// A document as it appears on the wire: full resource name and typed
/// value envelopes.
#[derive(Debug, Deserialize)]
pub(crate) struct RawDocument {
    pub name: String,
    /// Omitted entirely for a document with no fields.
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(rename = "createTime")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(rename = "updateTime")]
    pub update_time: Option<DateTime<Utc>>,
}

impl RawDocument {
    /// The document id: the last segment of the resource name.
    pub(crate) fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    /// Decode the envelope fields and drop the wire framing.
    pub(crate) fn into_document(self) -> Result<Document> {
        let data = value::decode_fields(&self.fields)?;
        Ok(Document {
            id: self.id().to_string(),
            data,
            create_time: self.create_time,
            update_time: self.update_time,
        })
    }

    pub(crate) fn write_result(&self) -> WriteResult {
        WriteResult {
            create_time: self.create_time,
            update_time: self.update_time,
        }
    }
}

/// Response body of a collection list call.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub documents: Vec<RawDocument>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// The provider's error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_document_id() {
        let raw: RawDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/users/alice",
            "fields": {},
        }))
        .unwrap();
        assert_eq!(raw.id(), "alice");
    }

    #[test]
    fn test_into_document_decodes_fields() {
        let raw: RawDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/users/alice",
            "fields": {
                "name": {"stringValue": "Alice"},
                "age": {"integerValue": "30"},
            },
            "createTime": "2026-01-02T03:04:05.678Z",
            "updateTime": "2026-01-02T03:04:06.000Z",
        }))
        .unwrap();

        let doc = raw.into_document().unwrap();
        assert_eq!(doc.id, "alice");
        assert_eq!(doc.data, json!({"name": "Alice", "age": 30}).as_object().unwrap().clone());
        assert!(doc.create_time.unwrap() < doc.update_time.unwrap());
    }

    #[test]
    fn test_empty_document_has_no_fields_key() {
        let raw: RawDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/users/empty",
        }))
        .unwrap();

        let doc = raw.into_document().unwrap();
        assert!(doc.data.is_empty());
        assert!(doc.create_time.is_none());
    }

    #[test]
    fn test_list_response_defaults() {
        let resp: ListResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.documents.is_empty());
        assert!(resp.next_page_token.is_none());
    }

    #[test]
    fn test_error_envelope() {
        let env: ErrorEnvelope = serde_json::from_value(json!({
            "error": {
                "code": 404,
                "message": "Document not found",
                "status": "NOT_FOUND",
            }
        }))
        .unwrap();
        assert_eq!(env.error.code, 404);
        assert_eq!(env.error.status.as_deref(), Some("NOT_FOUND"));
    }
}
