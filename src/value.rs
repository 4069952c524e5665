// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Conversion between plain JSON and the typed value envelopes the wire
//! format uses.
//!
//! Every stored field is a one-key object naming its type: `42` travels as
//! `{"integerValue": "42"}`, `"a"` as `{"stringValue": "a"}`, and so on.
//! Encoding covers the JSON-expressible types; decoding additionally accepts
//! server-side types with no JSON equivalent (`timestampValue`,
//! `bytesValue`, `referenceValue` decode to their string forms,
//! `geoPointValue` to a `{latitude, longitude}` object).
//!
//! Two envelope rules are enforced client-side because the server rejects
//! them with opaque errors: an array may not directly contain another
//! array, and integers outside the signed 64-bit range cannot be stored.

use serde_json::{json, Map, Value};

use crate::error::{Result, StoreError};

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a plain JSON object into a `fields` map of typed envelopes.
pub fn encode_fields(data: &Map<String, Value>) -> Result<Map<String, Value>> {
    let mut fields = Map::with_capacity(data.len());
    for (key, value) in data {
        fields.insert(key.clone(), encode_value(value)?);
    }
    Ok(fields)
}

/// Encode one plain JSON value into its typed envelope.
pub fn encode_value(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(json!({ "nullValue": null })),
        Value::Bool(b) => Ok(json!({ "booleanValue": b })),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                // 64-bit integers are carried as decimal strings so they
                // survive JSON parsers that round through f64.
                Ok(json!({ "integerValue": i.to_string() }))
            } else if n.is_u64() {
                Err(StoreError::Validation(format!(
                    "integer {n} exceeds the signed 64-bit range"
                )))
            } else if let Some(f) = n.as_f64() {
                Ok(json!({ "doubleValue": f }))
            } else {
                Err(StoreError::Validation(format!("unencodable number: {n}")))
            }
        }
        Value::String(s) => Ok(json!({ "stringValue": s })),
        Value::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                if item.is_array() {
                    return Err(StoreError::Validation(
                        "nested arrays are not supported".to_string(),
                    ));
                }
                values.push(encode_value(item)?);
            }
            Ok(json!({ "arrayValue": { "values": values } }))
        }
        Value::Object(map) => {
            let fields = encode_fields(map)?;
            Ok(json!({ "mapValue": { "fields": fields } }))
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a `fields` map of typed envelopes back into plain JSON.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>> {
    let mut data = Map::with_capacity(fields.len());
    for (key, envelope) in fields {
        data.insert(key.clone(), decode_value(envelope)?);
    }
    Ok(data)
}

/// Decode one typed envelope into a plain JSON value.
pub fn decode_value(envelope: &Value) -> Result<Value> {
    let map = envelope.as_object().ok_or_else(|| {
        StoreError::Decode(format!("value envelope is not an object: {envelope}"))
    })?;
    let (tag, inner) = map.iter().next().ok_or_else(|| {
        StoreError::Decode("value envelope is empty".to_string())
    })?;

    match tag.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| StoreError::Decode(format!("invalid booleanValue: {inner}"))),
        "integerValue" => decode_integer(inner),
        "doubleValue" => inner
            .as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| StoreError::Decode(format!("invalid doubleValue: {inner}"))),
        // Server-side types with no plain-JSON equivalent keep their wire
        // string form.
        "stringValue" | "timestampValue" | "bytesValue" | "referenceValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| StoreError::Decode(format!("invalid {tag}: {inner}"))),
        "geoPointValue" => {
            let lat = inner.get("latitude").and_then(Value::as_f64).unwrap_or(0.0);
            let lng = inner.get("longitude").and_then(Value::as_f64).unwrap_or(0.0);
            Ok(json!({ "latitude": lat, "longitude": lng }))
        }
        "arrayValue" => {
            // An empty array is serialized with its "values" key omitted.
            let items = match inner.get("values") {
                Some(Value::Array(items)) => items.as_slice(),
                Some(other) => {
                    return Err(StoreError::Decode(format!(
                        "invalid arrayValue: {other}"
                    )))
                }
                None => &[],
            };
            let mut decoded = Vec::with_capacity(items.len());
            for item in items {
                decoded.push(decode_value(item)?);
            }
            Ok(Value::Array(decoded))
        }
        "mapValue" => {
            // An empty map is serialized with its "fields" key omitted.
            let fields = match inner.get("fields") {
                Some(Value::Object(fields)) => decode_fields(fields)?,
                Some(other) => {
                    return Err(StoreError::Decode(format!("invalid mapValue: {other}")))
                }
                None => Map::new(),
            };
            Ok(Value::Object(fields))
        }
        other => Err(StoreError::Decode(format!(
            "unknown value type: {other:?}"
        ))),
    }
}

fn decode_integer(inner: &Value) -> Result<Value> {
    match inner {
        Value::String(s) => s
            .parse::<i64>()
            .map(|i| Value::Number(i.into()))
            .map_err(|_| StoreError::Decode(format!("invalid integerValue: {s:?}"))),
        // Tolerated on decode even though the canonical form is a string.
        Value::Number(n) if n.as_i64().is_some() => Ok(inner.clone()),
        other => Err(StoreError::Decode(format!("invalid integerValue: {other}"))),
    }
}

// ---------------------------------------------------------------------------
// Field masks
// ---------------------------------------------------------------------------

/// Render one top-level key as a field-mask path.
///
/// Keys shaped like identifiers pass through bare; anything else is
/// backtick-quoted with `` ` `` and `\` escaped, per the document field
/// path grammar. Dots inside a key are part of the key, not a nesting
/// separator.
pub fn field_mask_path(key: &str) -> String {
    let mut chars = key.chars();
    let bare = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if bare {
        return key.to_string();
    }

    let mut quoted = String::with_capacity(key.len() + 2);
    quoted.push('`');
    for c in key.chars() {
        if c == '`' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('`');
    quoted
}
