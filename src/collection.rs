// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Collection-scoped access handles and identifier validation.
//!
//! A [`CollectionRef`] borrows its client, so the compiler enforces the
//! scoping discipline: the handle cannot outlive the connection it came
//! from, and it is released on every exit path of the block that created
//! it. There is no open/close protocol to get wrong.

use tracing::error;

use crate::client::TabulariumClient;
use crate::error::{Result, StoreError};

/// Provider limit on collection and document identifiers.
const MAX_ID_BYTES: usize = 1500;

/// A handle scoped to one named collection.
///
/// Created by [`TabulariumClient::collection`]; only exists while the
/// client does. Document operations live in `impl CollectionRef` blocks in
/// the document module.
#[derive(Clone)]
pub struct CollectionRef<'a> {
    pub(crate) client: &'a TabulariumClient,
    pub(crate) name: String,
}

impl CollectionRef<'_> {
    /// The collection name this handle is scoped to.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TabulariumClient {
    /// Scope a handle to one collection.
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] if the name is empty, contains `/`, is
    /// `.` or `..`, uses the reserved `__…__` form, or exceeds the
    /// provider's 1500-byte limit.
    pub fn collection(&self, name: &str) -> Result<CollectionRef<'_>> {
        if let Err(e) = validate_id(name, "collection") {
            error!(collection = name, error = %e, "rejected collection name");
            return Err(e);
        }
        Ok(CollectionRef {
            client: self,
            name: name.to_string(),
        })
    }
}

/// Check one collection or document identifier against the provider's
/// naming rules. `kind` names the identifier in error messages.
pub(crate) fn validate_id(id: &str, kind: &str) -> Result<()> {
    if id.is_empty() {
        return Err(StoreError::Validation(format!(
            "{kind} id must not be empty"
        )));
    }
    if id.contains('/') {
        return Err(StoreError::Validation(format!(
            "{kind} id must not contain '/': {id:?}"
        )));
    }
    if id == "." || id == ".." {
        return Err(StoreError::Validation(format!(
            "{kind} id must not be {id:?}"
        )));
    }
    if id.len() >= 4 && id.starts_with("__") && id.ends_with("__") {
        return Err(StoreError::Validation(format!(
            "{kind} id uses the reserved __…__ form: {id:?}"
        )));
    }
    if id.len() > MAX_ID_BYTES {
        return Err(StoreError::Validation(format!(
            "{kind} id exceeds {MAX_ID_BYTES} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_validation(result: Result<()>) -> bool {
        matches!(result, Err(StoreError::Validation(_)))
    }

    #[test]
    fn test_ordinary_ids_pass() {
        assert!(validate_id("users", "collection").is_ok());
        assert!(validate_id("user-profiles_v2", "collection").is_ok());
        assert!(validate_id("ALice.9", "document").is_ok());
        // A lone pair of underscores is unusual but not reserved.
        assert!(validate_id("__", "document").is_ok());
        assert!(validate_id("naïve", "document").is_ok());
    }

    #[test]
    fn test_empty_id_rejected() {
        assert!(is_validation(validate_id("", "collection")));
    }

    #[test]
    fn test_slash_rejected() {
        assert!(is_validation(validate_id("users/alice", "collection")));
        assert!(is_validation(validate_id("/", "document")));
    }

    #[test]
    fn test_relative_segments_rejected() {
        assert!(is_validation(validate_id(".", "document")));
        assert!(is_validation(validate_id("..", "document")));
        // A dot inside a longer id is fine.
        assert!(validate_id("a.b", "document").is_ok());
    }

    #[test]
    fn test_reserved_form_rejected() {
        assert!(is_validation(validate_id("__internal__", "collection")));
        assert!(is_validation(validate_id("____", "collection")));
        // Reserved form needs both the prefix and the suffix.
        assert!(validate_id("__leading", "collection").is_ok());
        assert!(validate_id("trailing__", "collection").is_ok());
    }

    #[test]
    fn test_length_limit_is_in_bytes() {
        let exact = "a".repeat(1500);
        assert!(validate_id(&exact, "document").is_ok());

        let over = "a".repeat(1501);
        assert!(is_validation(validate_id(&over, "document")));

        // 501 three-byte characters: 501 chars, 1503 bytes.
        let multibyte = "€".repeat(501);
        assert!(is_validation(validate_id(&multibyte, "document")));
    }
}
