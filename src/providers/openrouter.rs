use crate::core::error::RelayError;
use crate::providers::base_client::HttpClient;
use crate::providers::{CompletionProvider, Message};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

/// Chat-completion client for the OpenRouter API. Model and endpoint are
/// fixed at construction; every call is a single attempt.
#[derive(Clone)]
pub struct OpenRouterProvider {
    client: HttpClient,
    model: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_endpoint(DEFAULT_BASE_URL.to_string(), api_key, model)
    }

    pub fn with_endpoint(base_url: String, api_key: String, model: String) -> Self {
        let auth_header = Some(("Authorization".to_string(), format!("Bearer {}", api_key)));

        Self {
            client: HttpClient::new(base_url, auth_header),
            model,
        }
    }
}

#[async_trait::async_trait]
impl CompletionProvider for OpenRouterProvider {
    async fn complete(&self, messages: &[Message]) -> Result<String, RelayError> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post("chat/completions", &payload)
            .await
            .map_err(|e| RelayError::Completion(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RelayError::Completion(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(RelayError::Completion(format!(
                "API returned status {}",
                status.as_u16()
            )));
        }

        parse_completion(&body)
    }
}

/// Extract `choices[0].message.content` from a completion response body. Any
/// other shape is a failure; garbled output must never pass as a reply.
fn parse_completion(body: &str) -> Result<String, RelayError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| RelayError::Completion(format!("Failed to decode response: {}", e)))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RelayError::Completion("No choices in API response".to_string()))?;

    Ok(choice.message.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Role;

    #[test]
    fn parses_well_formed_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hi there"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Hi there");
    }

    #[test]
    fn rejects_empty_choices() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, RelayError::Completion(_)));
    }

    #[test]
    fn rejects_unexpected_shape() {
        let err = parse_completion(r#"{"error":{"message":"rate limited"}}"#).unwrap_err();
        assert!(matches!(err, RelayError::Completion(_)));
    }

    #[test]
    fn request_body_preserves_message_order() {
        let messages = vec![
            Message::new(Role::User, "A"),
            Message::new(Role::Assistant, "B"),
            Message::new(Role::User, "C"),
        ];
        let payload = ChatCompletionRequest {
            model: "mistralai/mistral-7b-instruct",
            messages: &messages,
        };
        let json = serde_json::to_value(&payload).unwrap();
        let roles: Vec<&str> = json["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, ["user", "assistant", "user"]);
        assert_eq!(json["model"], "mistralai/mistral-7b-instruct");
    }
}
