// SPDX-License-Identifier: PMPL-1.0-or-later
//! Property-based tests for the value-envelope codec and field-mask paths.

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use tabularium::value::{decode_fields, encode_fields, encode_value, field_mask_path};

/// Generate arbitrary field keys, identifier-shaped and otherwise.
fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z_][a-zA-Z0-9_]{0,11}",
        "[ -~]{1,12}",
    ]
}

/// Generate arbitrary scalar values the codec can store.
fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|i| json!(i)),
        (prop::num::f64::NORMAL | prop::num::f64::ZERO | prop::num::f64::SUBNORMAL)
            .prop_map(|f| json!(f)),
        "[a-zA-Z0-9 .,!?]{0,16}".prop_map(Value::String),
    ]
}

/// Generate arbitrary storable values: scalars, maps, and arrays whose
/// direct elements are never arrays.
fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 24, 4, |inner| {
        let non_array = inner
            .clone()
            .prop_filter("array elements must not be arrays", |v| !v.is_array());
        prop_oneof![
            prop::collection::vec(non_array, 0..4).prop_map(Value::Array),
            prop::collection::btree_map(arb_key(), inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Generate arbitrary document payloads.
fn arb_payload() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(arb_key(), arb_value(), 0..5)
        .prop_map(|m| m.into_iter().collect())
}

/// Reverse of `field_mask_path`: strip quoting and unescape.
fn unescape_mask_path(path: &str) -> String {
    if !path.starts_with('`') {
        return path.to_string();
    }
    let inner = &path[1..path.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

proptest! {
    #[test]
    fn test_payload_round_trips_through_envelopes(payload in arb_payload()) {
        let encoded = encode_fields(&payload).unwrap();
        let decoded = decode_fields(&encoded).unwrap();
        prop_assert_eq!(decoded, payload);
    }

    #[test]
    fn test_integers_travel_as_strings(i in any::<i64>()) {
        let envelope = encode_value(&json!(i)).unwrap();
        prop_assert_eq!(envelope, json!({"integerValue": i.to_string()}));
    }

    #[test]
    fn test_every_envelope_has_exactly_one_tag(value in arb_value()) {
        let envelope = encode_value(&value).unwrap();
        let map = envelope.as_object().unwrap();
        prop_assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_mask_paths_are_reversible(key in any::<String>()) {
        let path = field_mask_path(&key);
        prop_assert_eq!(unescape_mask_path(&path), key);
    }

    #[test]
    fn test_identifier_keys_stay_bare(key in "[a-zA-Z_][a-zA-Z0-9_]{0,20}") {
        prop_assert_eq!(field_mask_path(&key), key);
    }

    #[test]
    fn test_non_identifier_keys_are_quoted(key in "[0-9 .`\\\\][ -~]{0,10}") {
        let path = field_mask_path(&key);
        prop_assert!(path.starts_with('`') && path.ends_with('`'));
    }
}

/// A realistic mixed document survives one encode/decode cycle intact.
#[test]
fn test_realistic_document_round_trip() {
    let payload: Map<String, Value> = json!({
        "title": "Invoice 2026-081",
        "total": 1299,
        "vat_rate": 0.2,
        "paid": false,
        "line items": [
            {"sku": "A-17", "qty": 2, "unit": 550.0},
            {"sku": "B-02", "qty": 1, "unit": 199.0},
        ],
        "customer": {
            "name": "Ada Lovelace",
            "address": {"city": "London", "postcode": "N1 9GU"},
        },
        "notes": null,
    })
    .as_object()
    .unwrap()
    .clone();

    let encoded = encode_fields(&payload).unwrap();
    let decoded = decode_fields(&encoded).unwrap();
    assert_eq!(decoded, payload);
}
