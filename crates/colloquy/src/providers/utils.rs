use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::ModelCallError;
use crate::models::message::Message;

/// Convert our messages to the role/content list chat backends accept
pub fn messages_to_chat_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role.as_chat_role(),
                "content": message.content,
            })
        })
        .collect()
}

/// Set `key` on a JSON object payload when a value is present
pub fn insert_optional<T: Serialize>(payload: &mut Value, key: &str, value: Option<T>) {
    if let (Some(object), Some(value)) = (payload.as_object_mut(), value) {
        object.insert(key.to_string(), json!(value));
    }
}

/// POST a JSON payload and decode the JSON body of a successful response
pub async fn post_json(
    client: &Client,
    url: &str,
    payload: &Value,
    bearer: Option<&str>,
) -> Result<Value, ModelCallError> {
    tracing::debug!(url, %payload, "sending model request");

    let mut request = client.post(url).json(payload);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }
    let response = request.send().await?;

    match response.status() {
        status if status.is_success() => response
            .json()
            .await
            .map_err(|e| ModelCallError::InvalidResponse(e.to_string())),
        status if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() => {
            Err(ModelCallError::Server(status.as_u16()))
        }
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(ModelCallError::Request {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Read an integer count from a response object
pub fn count(data: &Value, key: &str) -> Option<i32> {
    data.get(key)
        .and_then(|v| v.as_i64())
        .and_then(|v| i32::try_from(v).ok())
}

/// Join a base host and an API path without doubling slashes
pub fn endpoint(host: &str, path: &str) -> String {
    format!("{}/{}", host.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_to_chat_spec() {
        let messages = vec![
            Message::instruction("You are Alice."),
            Message::own("Alice: hi"),
            Message::other("Bob: hello"),
        ];

        let spec = messages_to_chat_spec(&messages);

        assert_eq!(spec.len(), 3);
        assert_eq!(spec[0]["role"], "system");
        assert_eq!(spec[0]["content"], "You are Alice.");
        assert_eq!(spec[1]["role"], "assistant");
        assert_eq!(spec[1]["content"], "Alice: hi");
        assert_eq!(spec[2]["role"], "user");
        assert_eq!(spec[2]["content"], "Bob: hello");
    }

    #[test]
    fn test_insert_optional() {
        let mut payload = json!({"model": "m"});
        insert_optional(&mut payload, "temperature", Some(0.5));
        insert_optional::<i32>(&mut payload, "max_tokens", None);

        assert_eq!(payload["temperature"], json!(0.5));
        assert!(payload.get("max_tokens").is_none());
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            endpoint("http://localhost:11434/", "/api/chat"),
            "http://localhost:11434/api/chat"
        );
        assert_eq!(endpoint("http://h", "v1/completions"), "http://h/v1/completions");
    }

    #[test]
    fn test_count() {
        let data = json!({"eval_count": 7, "name": "x"});
        assert_eq!(count(&data, "eval_count"), Some(7));
        assert_eq!(count(&data, "name"), None);
        assert_eq!(count(&data, "missing"), None);

        let huge = json!({"eval_count": 4_294_967_296_i64, "negative": -3});
        assert_eq!(count(&huge, "eval_count"), None);
        assert_eq!(count(&huge, "negative"), Some(-3));
    }
}
