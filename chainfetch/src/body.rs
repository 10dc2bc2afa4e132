use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::{params::Headers, Result};

/// A value handed to [`Request::send`](crate::Request::send).
///
/// Text and bytes go on the wire verbatim. Only `Structured` values (JSON
/// objects and arrays) are serialized, according to the request's
/// `content-type`.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Text(String),
    Bytes(Bytes),
    Structured(Value),
}

impl Payload {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(serde_json::to_value(value)?.into())
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Payload::Empty,
            Value::String(s) => Payload::Text(s),
            Value::Object(_) | Value::Array(_) => Payload::Structured(value),
            scalar => Payload::Text(scalar.to_string()),
        }
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<Bytes> for Payload {
    fn from(value: Bytes) -> Self {
        Payload::Bytes(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Bytes(value.into())
    }
}

impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(value: Option<T>) -> Self {
        value.map_or(Payload::Empty, Into::into)
    }
}

/// The request body as stored on a builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Bytes(Bytes),
    /// A structured value left unserialized because the caller declared a
    /// content type this crate does not encode. Goes out as compact JSON.
    Value(Value),
}

impl Body {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        match self {
            Body::Text(text) => Bytes::from(text.clone()),
            Body::Bytes(bytes) => bytes.clone(),
            Body::Value(value) => Bytes::from(value.to_string()),
        }
    }
}

/// Turns a payload into a body, consulting and possibly filling in the
/// `content-type` header.
pub(crate) fn encode(payload: Payload, headers: &mut Headers) -> Option<Body> {
    let value = match payload {
        Payload::Empty => return None,
        Payload::Text(text) => return Some(Body::Text(text)),
        Payload::Bytes(bytes) => return Some(Body::Bytes(bytes)),
        Payload::Structured(value) => value,
    };
    match headers.get("content-type").map(str::to_ascii_lowercase) {
        Some(content_type) if content_type.contains("application/json") => {
            Some(Body::Text(value.to_string()))
        }
        Some(content_type) if content_type.contains("urlencoded") => {
            Some(Body::Text(to_form(&value)))
        }
        Some(content_type) => {
            trace!(%content_type, "leaving structured body unserialized");
            Some(Body::Value(value))
        }
        None => {
            headers.insert("content-type", "application/json");
            Some(Body::Text(value.to_string()))
        }
    }
}

fn form_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(_) | Value::Bool(_) => value.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Form-encodes a structured value. Arrays repeat their key; nested objects
/// and nulls encode as empty values.
pub fn to_form(value: &Value) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::Array(items) => {
                        for item in items {
                            serializer.append_pair(key, &form_scalar(item));
                        }
                    }
                    value => {
                        serializer.append_pair(key, &form_scalar(value));
                    }
                }
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                serializer.append_pair(&index.to_string(), &form_scalar(item));
            }
        }
        scalar => return form_scalar(scalar),
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_json_by_default() {
        let mut headers = Headers::new();
        let body = encode(Payload::from(json!({"a": 1})), &mut headers);
        assert_eq!(body, Some(Body::Text(r#"{"a":1}"#.to_string())));
        assert_eq!(headers.get("content-type"), Some("application/json"));
    }

    #[test]
    fn test_declared_json() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "application/json; charset=utf-8");
        let body = encode(Payload::from(json!([1, 2])), &mut headers);
        assert_eq!(body, Some(Body::Text("[1,2]".to_string())));
        assert_eq!(
            headers.get("content-type"),
            Some("application/json; charset=utf-8")
        );
    }

    #[test]
    fn test_form() {
        let mut headers = Headers::new();
        headers.insert("content-type", "application/x-www-form-urlencoded");
        let body = encode(Payload::from(json!({"a": 1})), &mut headers);
        assert_eq!(body, Some(Body::Text("a=1".to_string())));

        let value = json!({"b": [1, "two"], "c": "x y", "d": null, "e": {"f": 1}, "g": true});
        assert_eq!(to_form(&value), "b=1&b=two&c=x+y&d=&e=&g=true");
        assert_eq!(to_form(&json!(["a", "b"])), "0=a&1=b");
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let value = json!({"zeta": 1, "alpha": 2, "mid": [3, 4]});
        let mut headers = Headers::new();
        let body = encode(Payload::from(value.clone()), &mut headers).unwrap();
        assert_eq!(
            body.to_bytes(),
            Bytes::from_static(br#"{"zeta":1,"alpha":2,"mid":[3,4]}"#)
        );
        assert_eq!(to_form(&value), "zeta=1&alpha=2&mid=3&mid=4");
    }

    #[test]
    fn test_other_content_type_opts_out() {
        let mut headers = Headers::new();
        headers.insert("content-type", "application/xml");
        let body = encode(Payload::from(json!({"a": 1})), &mut headers).unwrap();
        assert_eq!(body, Body::Value(json!({"a": 1})));
        assert_eq!(body.to_bytes(), Bytes::from_static(br#"{"a":1}"#));
        assert_eq!(headers.get("content-type"), Some("application/xml"));
    }

    #[test]
    fn test_verbatim_payloads() {
        let mut headers = Headers::new();
        assert_eq!(
            encode(Payload::from("<a/>"), &mut headers),
            Some(Body::Text("<a/>".to_string()))
        );
        assert_eq!(
            encode(Payload::from(vec![0u8, 1]), &mut headers),
            Some(Body::Bytes(Bytes::from_static(&[0, 1])))
        );
        assert_eq!(encode(Payload::from(json!(42)), &mut headers).unwrap().as_text(), Some("42"));
        assert_eq!(encode(Payload::from(json!("raw")), &mut headers).unwrap().as_text(), Some("raw"));
        assert_eq!(encode(Payload::from(Value::Null), &mut headers), None);
        assert_eq!(encode(Payload::from(None::<String>), &mut headers), None);
        assert!(headers.is_empty());
    }

    #[test]
    fn test_payload_json() {
        #[derive(Serialize)]
        struct Login<'a> {
            user: &'a str,
            remember: bool,
        }
        let payload = Payload::json(&Login {
            user: "ann",
            remember: true,
        })
        .unwrap();
        assert_eq!(
            payload,
            Payload::Structured(json!({"user": "ann", "remember": true}))
        );
    }
}
