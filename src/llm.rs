use crate::config::Config;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

// Generation waits on a full completion, so it gets a longer leash than
// the embedding calls.
const CHAT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

/// Client for an OpenAI-style `/chat/completions` endpoint.
pub struct ChatClient {
    http: reqwest::blocking::Client,
    config: Config,
}

impl ChatClient {
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(CHAT_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(ChatClient { http, config })
    }

    /// Sends the messages and returns the model's reply. A failed request
    /// yields an "Error: ..." string rather than an error; callers print
    /// whatever comes back.
    pub fn generate(&self, messages: &[Message]) -> String {
        match self.try_generate(messages) {
            Ok(reply) => reply,
            Err(e) => format!("Error: {e:#}"),
        }
    }

    fn try_generate(&self, messages: &[Message]) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = ChatRequest {
            model: &self.config.chat_model,
            messages,
        };

        let result: Value = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .with_context(|| format!("chat request to {url} failed"))?
            .error_for_status()
            .context("chat request rejected by provider")?
            .json()
            .context("chat response was not JSON")?;

        Ok(extract_reply(&result).unwrap_or_else(|| result.to_string()))
    }
}

/// Pulls the reply text out of an OpenAI-like response, tolerating the
/// chat shape (`choices[0].message.content`), the completion shape
/// (`choices[0].text`), and a bare top-level `output` string.
fn extract_reply(result: &Value) -> Option<String> {
    if let Some(first) = result.get("choices").and_then(|c| c.get(0)) {
        if let Some(content) = first
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            return Some(content.to_string());
        }
        if let Some(text) = first
            .get("text")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            return Some(text.to_string());
        }
    }
    result
        .get("output")
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_reply_prefers_chat_message_content() {
        let result = json!({
            "choices": [{"message": {"content": "hello"}, "text": "ignored"}]
        });
        assert_eq!(extract_reply(&result).as_deref(), Some("hello"));
    }

    #[test]
    fn test_extract_reply_falls_back_to_completion_text() {
        let result = json!({"choices": [{"text": "plain completion"}]});
        assert_eq!(extract_reply(&result).as_deref(), Some("plain completion"));
    }

    #[test]
    fn test_extract_reply_falls_back_to_output_field() {
        let result = json!({"output": "from output"});
        assert_eq!(extract_reply(&result).as_deref(), Some("from output"));
    }

    #[test]
    fn test_extract_reply_gives_up_on_unknown_shape() {
        let result = json!({"usage": {"total_tokens": 12}});
        assert_eq!(extract_reply(&result), None);
    }

    #[test]
    fn test_empty_content_falls_through_to_text() {
        let result = json!({
            "choices": [{"message": {"content": ""}, "text": "fallback"}]
        });
        assert_eq!(extract_reply(&result).as_deref(), Some("fallback"));
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let messages = vec![Message::user("hi")];
        let body = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: &messages,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }
}
