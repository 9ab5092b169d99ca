//! Helpers for the `{ "<resource>": payload }` envelopes the API answers with.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ApiError;

/// Extract `key` from `body`, or return `fallback` when the body is absent
/// (null or an empty string) or does not carry the key.
///
/// A key that is present with an explicit `null` value is returned as
/// `null`; only a missing key falls back.
pub fn unwrap(body: &Value, key: &str, fallback: Value) -> Value {
    if is_absent(body) {
        return fallback;
    }
    match body.get(key) {
        Some(value) => value.clone(),
        None => fallback,
    }
}

/// Typed counterpart of [`unwrap`]: decode the value under `key`, or return
/// `fallback` when it is missing or null.
pub(crate) fn unwrap_as<T: DeserializeOwned>(
    body: &Value,
    key: &str,
    fallback: T,
) -> Result<T, ApiError> {
    match unwrap(body, key, Value::Null) {
        Value::Null => Ok(fallback),
        value => serde_json::from_value(value).map_err(|e| {
            ApiError::InvalidResponse(format!("failed to decode `{}`: {}", key, e))
        }),
    }
}

fn is_absent(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_extracts_key() {
        let body = json!({ "user": { "id": 7, "name": "Mina" } });
        assert_eq!(unwrap(&body, "user", Value::Null), json!({ "id": 7, "name": "Mina" }));
    }

    #[test]
    fn test_unwrap_fallback_when_absent() {
        assert_eq!(unwrap(&Value::Null, "meals", json!([])), json!([]));
        assert_eq!(unwrap(&json!(""), "meals", json!([])), json!([]));
        assert_eq!(unwrap(&json!({ "other": 1 }), "meals", json!([])), json!([]));
    }

    #[test]
    fn test_unwrap_keeps_explicit_null() {
        let body = json!({ "user": null });
        assert_eq!(unwrap(&body, "user", json!("fallback")), Value::Null);
    }

    #[test]
    fn test_unwrap_non_object_body() {
        assert_eq!(unwrap(&json!([1, 2]), "items", json!("none")), json!("none"));
        assert_eq!(unwrap(&json!("plain text"), "items", json!("none")), json!("none"));
    }

    #[test]
    fn test_unwrap_as_decodes_and_falls_back() {
        let body = json!({ "meals": ["a", "b"] });
        let meals: Vec<String> = unwrap_as(&body, "meals", Vec::new()).unwrap();
        assert_eq!(meals, vec!["a", "b"]);

        let empty: Vec<String> = unwrap_as(&json!({ "meals": null }), "meals", Vec::new()).unwrap();
        assert!(empty.is_empty());

        let err = unwrap_as::<Vec<String>>(&json!({ "meals": 3 }), "meals", Vec::new()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }
}
