use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::Message;

/// Terminal failure of one exchange. Cancellation is not represented
/// here: a cancelled request is aborted before it can report, and the
/// session synthesizes its own notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// Network or HTTP failure; carries the server's message when one
    /// was provided, otherwise the underlying transport detail.
    #[error("{0}")]
    Transport(String),

    /// The endpoint answered 2xx but the payload held no completion.
    #[error("response contained no completion text")]
    Malformed,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    messages: &'a [Message],
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
///
/// The request contract is the Azure-style one: POST the full message
/// list plus a `max_tokens` bound, authenticated with an `api-key`
/// header; the deployment/model is part of the endpoint URL.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
    api_key: String,
    max_tokens: u32,
}

impl ChatClient {
    pub fn new(endpoint: &str, api_key: &str, max_tokens: u32) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            max_tokens,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends the conversation and returns the reply text, trimmed.
    pub async fn complete(&self, messages: &[Message]) -> Result<String, ExchangeError> {
        let request = CompletionRequest {
            messages,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ExchangeError::Transport(error_detail(status.as_u16(), &body)));
        }

        extract_completion(&body)
    }
}

/// Pulls the reply text out of a 2xx body.
fn extract_completion(body: &str) -> Result<String, ExchangeError> {
    let parsed: CompletionResponse =
        serde_json::from_str(body).map_err(|_| ExchangeError::Malformed)?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(ExchangeError::Malformed)
}

/// Best-effort extraction of the server's error message from a non-2xx
/// body, falling back to the HTTP status.
fn error_detail(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| format!("request failed with status {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_payload_shape() {
        let messages = vec![Message::user("hello"), Message::assistant("hi")];
        let request = CompletionRequest {
            messages: &messages,
            max_tokens: 1000,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "messages": [
                    { "role": "user", "content": "hello" },
                    { "role": "assistant", "content": "hi" },
                ],
                "max_tokens": 1000,
            })
        );
    }

    #[test]
    fn extracts_and_trims_the_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"  hi there \n"}}]}"#;
        assert_eq!(extract_completion(body).unwrap(), "hi there");
    }

    #[test]
    fn empty_choice_list_is_malformed() {
        assert_eq!(
            extract_completion(r#"{"choices":[]}"#),
            Err(ExchangeError::Malformed)
        );
    }

    #[test]
    fn missing_content_is_malformed() {
        assert_eq!(
            extract_completion(r#"{"choices":[{"message":{}}]}"#),
            Err(ExchangeError::Malformed)
        );
        assert_eq!(
            extract_completion(r#"{"choices":[{"message":{"content":"   "}}]}"#),
            Err(ExchangeError::Malformed)
        );
    }

    #[test]
    fn non_json_body_is_malformed() {
        assert_eq!(
            extract_completion("<html>oops</html>"),
            Err(ExchangeError::Malformed)
        );
    }

    #[test]
    fn error_detail_prefers_the_server_message() {
        let body = r#"{"error":{"message":"model overloaded"}}"#;
        assert_eq!(error_detail(429, body), "model overloaded");
    }

    #[test]
    fn error_detail_falls_back_to_the_status() {
        assert_eq!(
            error_detail(502, "bad gateway"),
            "request failed with status 502"
        );
    }
}
