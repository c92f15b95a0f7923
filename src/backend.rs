use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::ChatError;

/// Shown when the backend answers without a usable `message` or `reply`.
pub const NO_RESPONSE: &str = "No response from server";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Client for the task assistant's `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    base_url: String,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        ChatClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Sends one user message and returns the text to show as the bot reply.
    pub async fn send(&self, message: &str) -> Result<String, ChatError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(%url, len = message.len(), "sending chat message");

        let result = self.post(&url, message).await;
        if let Err(e) = &result {
            error!(status = ?e.status_code(), error = %e, "API Error");
        }
        result
    }

    async fn post(&self, url: &str, message: &str) -> Result<String, ChatError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|e| ChatError::transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::status(status.as_u16(), &body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ChatError::Decode(e.to_string()))?;
        Ok(reply_text(&body))
    }
}

/// Picks `message`, then `reply`, then the fixed fallback.
pub fn reply_text(body: &Value) -> String {
    ["message", "reply"]
        .iter()
        .filter_map(|field| body.get(field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .unwrap_or(NO_RESPONSE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_reply_text_prefers_message() {
        assert_eq!(reply_text(&json!({"message": "a", "reply": "b"})), "a");
        assert_eq!(reply_text(&json!({"reply": "b"})), "b");
        assert_eq!(reply_text(&json!({"message": "", "reply": "b"})), "b");
        assert_eq!(reply_text(&json!({"message": 3})), NO_RESPONSE);
        assert_eq!(reply_text(&json!({})), NO_RESPONSE);
    }

    #[tokio::test]
    async fn test_send_posts_json_and_returns_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(header("accept", "application/json"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"message": "hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(server.uri());
        assert_eq!(client.send("hello").await, Ok("ok".to_string()));
    }

    #[tokio::test]
    async fn test_send_reports_status_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = ChatClient::new(format!("{}/", server.uri()));
        let err = client.send("hi").await.unwrap_err();
        assert_eq!(
            err,
            ChatError::Status {
                status: 500,
                detail: "boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_send_empty_object_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = ChatClient::new(server.uri());
        assert_eq!(client.send("hi").await.unwrap(), NO_RESPONSE);
    }

    #[tokio::test]
    async fn test_send_rejects_non_json_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = ChatClient::new(server.uri());
        assert!(matches!(client.send("hi").await, Err(ChatError::Decode(_))));
    }

    #[tokio::test]
    async fn test_send_transport_failure() {
        // Nothing listens on port 9 locally.
        let client = ChatClient::new("http://127.0.0.1:9");
        let err = client.send("hi").await.unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
        assert!(err.user_message().starts_with("Error: "));
    }
}
