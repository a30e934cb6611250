use serde::{Deserialize, Serialize};

/// One `{role, content}` entry of a chat-completion request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Non-streaming chat-completion response body.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub model: String,
    pub choices: Vec<ChatResponseChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_generation_parameters() {
        let request = ChatRequest {
            model: "gpt-4o".to_string(),
            messages: vec![ChatMessage::new("user", "hi")],
            temperature: 0.5,
            max_tokens: 1000,
        };

        let value = serde_json::to_value(&request).expect("request should serialize");
        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
        assert_eq!(value["temperature"], 0.5);
        assert_eq!(value["max_tokens"], 1000);
    }

    #[test]
    fn response_usage_is_optional() {
        let body = r#"{"model":"gpt-4o","choices":[{"message":{"role":"assistant","content":"ok"}}]}"#;
        let response: ChatResponse = serde_json::from_str(body).expect("body should parse");
        assert_eq!(response.model, "gpt-4o");
        assert_eq!(response.choices[0].message.content, "ok");
        assert!(response.usage.is_none());
    }

    #[test]
    fn response_without_choices_content_is_rejected() {
        let body = r#"{"model":"gpt-4o","choices":[{"message":{"role":"assistant"}}]}"#;
        assert!(serde_json::from_str::<ChatResponse>(body).is_err());
    }
}
