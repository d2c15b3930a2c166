use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::providers::base::Usage;

/// Field name backends conventionally put the generated text under
pub const RESPONSE_KEY: &str = "response";
/// Secondary field name checked when `response` is absent
pub const TEXT_KEY: &str = "text";

/// A typed reply from a backend that exposes the generated text as a named field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl Reply {
    pub fn with_response<S: Into<String>>(response: S) -> Self {
        Self {
            response: Some(response.into()),
            ..Default::default()
        }
    }

    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// One element of an ordered, part-wise response
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePart {
    /// A `(key, value)` pair, as emitted by backends that stream their fields
    Pair(String, Value),
    Item(Value),
}

/// The shapes a model backend's result can take
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    Reply(Reply),
    Mapping(Map<String, Value>),
    Parts(Vec<ResponsePart>),
    Opaque(Value),
}

impl ModelResponse {
    /// Classify an untyped JSON value by shape
    ///
    /// Objects become mappings, arrays become parts (two-element arrays led by a string are
    /// read as key/value pairs) and anything else is opaque.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => ModelResponse::Mapping(map),
            Value::Array(items) => ModelResponse::Parts(
                items.into_iter().map(ResponsePart::from_json).collect(),
            ),
            other => ModelResponse::Opaque(other),
        }
    }

    /// Flatten the response to plain text. Never fails.
    pub fn normalize(&self) -> String {
        match self {
            ModelResponse::Reply(reply) => reply
                .response
                .clone()
                .or_else(|| reply.text.clone())
                .unwrap_or_else(|| render_reply(reply)),
            ModelResponse::Mapping(map) => map
                .get(RESPONSE_KEY)
                .or_else(|| map.get(TEXT_KEY))
                .map(render_value)
                .unwrap_or_else(|| render_value(&Value::Object(map.clone()))),
            ModelResponse::Parts(parts) => {
                let mut rendered = Vec::with_capacity(parts.len());
                for part in parts {
                    match part {
                        ResponsePart::Pair(key, value) if key == RESPONSE_KEY => {
                            return render_value(value)
                        }
                        ResponsePart::Pair(key, value) => rendered.push(format!(
                            "({}, {})",
                            key,
                            render_value(value)
                        )),
                        ResponsePart::Item(value) => rendered.push(render_value(value)),
                    }
                }
                if rendered.is_empty() {
                    "[]".to_string()
                } else {
                    rendered.join("\n")
                }
            }
            ModelResponse::Opaque(value) => render_value(value),
        }
    }
}

impl From<Reply> for ModelResponse {
    fn from(reply: Reply) -> Self {
        ModelResponse::Reply(reply)
    }
}

impl From<Value> for ModelResponse {
    fn from(value: Value) -> Self {
        ModelResponse::from_json(value)
    }
}

impl ResponsePart {
    fn from_json(value: Value) -> Self {
        if let Value::Array(pair) = &value {
            if let [Value::String(key), item] = pair.as_slice() {
                return ResponsePart::Pair(key.clone(), item.clone());
            }
        }
        ResponsePart::Item(value)
    }
}

/// Strings render as their contents, everything else as compact JSON
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_reply(reply: &Reply) -> String {
    serde_json::to_string(reply).unwrap_or_else(|_| format!("{:?}", reply))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(value: Value) -> ModelResponse {
        match value {
            Value::Object(map) => ModelResponse::Mapping(map),
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_mapping_with_response_key() {
        assert_eq!(mapping(json!({"response": "x"})).normalize(), "x");
    }

    #[test]
    fn test_mapping_falls_back_to_text_key() {
        assert_eq!(mapping(json!({"text": "t", "done": true})).normalize(), "t");
    }

    #[test]
    fn test_mapping_without_known_keys_renders_whole() {
        assert_eq!(mapping(json!({"done": true})).normalize(), r#"{"done":true}"#);
    }

    #[test]
    fn test_reply_field() {
        assert_eq!(ModelResponse::from(Reply::with_response("y")).normalize(), "y");
        assert_eq!(ModelResponse::from(Reply::with_text("w")).normalize(), "w");
    }

    #[test]
    fn test_reply_prefers_response_over_text() {
        let reply = Reply {
            response: Some("primary".to_string()),
            text: Some("secondary".to_string()),
            ..Default::default()
        };
        assert_eq!(ModelResponse::Reply(reply).normalize(), "primary");
    }

    #[test]
    fn test_empty_reply_renders_whole() {
        let reply = Reply {
            model: Some("qwen".to_string()),
            ..Default::default()
        };
        assert_eq!(ModelResponse::Reply(reply).normalize(), r#"{"model":"qwen"}"#);
    }

    #[test]
    fn test_parts_short_circuit_on_sentinel_pair() {
        let response = ModelResponse::Parts(vec![
            ResponsePart::Pair("response".to_string(), json!("z")),
            ResponsePart::Item(json!("ignored")),
        ]);
        assert_eq!(response.normalize(), "z");
    }

    #[test]
    fn test_parts_sentinel_after_other_parts() {
        let response = ModelResponse::from_json(json!([["model", "qwen"], ["response", "late"]]));
        assert_eq!(response.normalize(), "late");
    }

    #[test]
    fn test_unstructured_parts_are_joined() {
        let response = ModelResponse::from_json(json!(["a", "b"]));
        assert_eq!(response.normalize(), "a\nb");
    }

    #[test]
    fn test_empty_parts_render_whole() {
        assert_eq!(ModelResponse::Parts(vec![]).normalize(), "[]");
    }

    #[test]
    fn test_opaque_integer() {
        assert_eq!(ModelResponse::from_json(json!(42)).normalize(), "42");
    }

    #[test]
    fn test_from_json_classification() {
        assert!(matches!(
            ModelResponse::from_json(json!({"response": "x"})),
            ModelResponse::Mapping(_)
        ));
        assert!(matches!(
            ModelResponse::from_json(json!("bare")),
            ModelResponse::Opaque(_)
        ));
        assert_eq!(
            ModelResponse::from_json(json!([["k", 1], [1, 2], "s"])),
            ModelResponse::Parts(vec![
                ResponsePart::Pair("k".to_string(), json!(1)),
                ResponsePart::Item(json!([1, 2])),
                ResponsePart::Item(json!("s")),
            ])
        );
    }
}
