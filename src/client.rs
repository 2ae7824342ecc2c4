//! LLM completion client: schema-constrained chat completions.
//!
//! One request shape, used for everything: a system message telling the
//! model to answer in JSON, the user prompt, `response_format =
//! {"type": "json_object"}`, and an output-token cap. Asking for JSON mode
//! without *also* instructing the model in-band to produce JSON makes some
//! models emit an unending stream of whitespace until they hit the token
//! limit, so the system message is not optional decoration.
//!
//! The HTTP call is blocking on purpose: the core processes one document and
//! one request at a time (see the crate docs), so async buys nothing here.

use serde::{Deserialize, Serialize};

use crate::error::CardAgreeError;

/// System message accompanying every JSON-mode request.
pub const JSON_SYSTEM_PROMPT: &str = "You are a helpful assistant designed to output JSON.";

/// One completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// What the oracle consumes from a completion response.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Provider-reported stop reason; `"stop"` means normal termination.
    pub finish_reason: String,
    /// The message body (JSON text when the request succeeded).
    pub content: String,
    /// Total tokens billed for the request (prompt + completion).
    pub total_tokens: u64,
}

/// Issues schema-constrained completion requests.
///
/// A trait so the oracle can be exercised against scripted responses in
/// tests; the shipping implementation is [`OpenAiClient`].
pub trait CompletionClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion, CardAgreeError>;
}

// ── Wire types (OpenAI-compatible chat completions) ──────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    finish_reason: Option<String>,
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u64,
}

// ── OpenAI client ────────────────────────────────────────────────────────

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Blocking client for the OpenAI chat-completions API (or any compatible
/// endpoint via [`OpenAiClient::with_api_url`]).
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    api_url: String,
    api_key: String,
}

impl OpenAiClient {
    /// Create a client with an explicit credential.
    ///
    /// # Errors
    /// [`CardAgreeError::MissingCredential`] when the key is empty — better
    /// to fail here than after reading a 50-page document.
    pub fn new(api_key: impl Into<String>) -> Result<Self, CardAgreeError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CardAgreeError::MissingCredential);
        }
        Ok(Self {
            http: reqwest::blocking::Client::new(),
            api_url: DEFAULT_API_URL.to_string(),
            api_key,
        })
    }

    /// Point the client at an OpenAI-compatible endpoint.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion, CardAgreeError> {
        let body = ChatRequest {
            model: request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: JSON_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(CardAgreeError::LlmApi {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json()?;
        let choice = parsed.choices.into_iter().next();
        Ok(Completion {
            finish_reason: choice
                .as_ref()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_default(),
            content: choice.and_then(|c| c.message.content).unwrap_or_default(),
            total_tokens: parsed.usage.map(|u| u.total_tokens).unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_credential_fails_fast() {
        assert!(matches!(
            OpenAiClient::new(""),
            Err(CardAgreeError::MissingCredential)
        ));
        assert!(matches!(
            OpenAiClient::new("   "),
            Err(CardAgreeError::MissingCredential)
        ));
        assert!(OpenAiClient::new("sk-test").is_ok());
    }

    #[test]
    fn request_body_shape() {
        let body = ChatRequest {
            model: "gpt-4o-2024-05-13",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: JSON_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: "Q",
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            max_tokens: 2000,
            temperature: 0.2,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["max_tokens"], 2000);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Q");
    }

    #[test]
    fn response_fields_decode() {
        let raw = r#"{
            "choices": [{
                "finish_reason": "stop",
                "message": {"role": "assistant", "content": "{\"bank_name\": \"Acme\"}"}
            }],
            "usage": {"prompt_tokens": 800, "completion_tokens": 12, "total_tokens": 812}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let choice = &parsed.choices[0];
        assert_eq!(choice.finish_reason.as_deref(), Some("stop"));
        assert!(choice.message.content.as_deref().unwrap().contains("Acme"));
        assert_eq!(parsed.usage.unwrap().total_tokens, 812);
    }
}
