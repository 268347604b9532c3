// Text-completion HTTP client
//
// Speaks the Messages-style completion protocol: one POST per request,
// system prompt + ordered user/assistant turns in, a list of content blocks
// out. Status handling maps HTTP failures onto `Error` variants so callers
// can fail closed without inspecting raw responses.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Protocol version header sent with every request.
pub const API_VERSION: &str = "2023-06-01";

/// Default endpoint for the hosted completion service.
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

// ── Request / response types ────────────────────────────────────────

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A request to complete a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System prompt (context/instructions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Conversation messages
    pub messages: Vec<Message>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature (0.0 = deterministic)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Creates a new completion request with default settings.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            system_prompt: None,
            messages,
            max_tokens: 1024,
            temperature: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    #[serde(other)]
    Other,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(rename = "input_tokens")]
    pub input: u64,
    #[serde(rename = "output_tokens")]
    pub output: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}

/// Response from a completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Concatenated text of all text blocks
    pub content: String,
    pub tokens_used: TokenUsage,
    pub stop_reason: Option<StopReason>,
}

// ── Wire shapes ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    content: Vec<WireBlock>,
    stop_reason: Option<StopReason>,
    #[serde(default)]
    usage: TokenUsage,
}

#[derive(Deserialize)]
struct WireBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct WireErrorEnvelope {
    error: WireError,
}

#[derive(Deserialize)]
struct WireError {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

// ── Client ──────────────────────────────────────────────────────────

/// HTTP client for the completion service.
///
/// Holds a pre-configured `reqwest::Client` carrying the API key and
/// protocol version as default headers, so each call is a single POST.
pub struct CompletionClient {
    http: reqwest::Client,
    endpoint: Url,
    model: String,
    timeout: Duration,
}

impl CompletionClient {
    /// Create a client for `endpoint` using `model`.
    pub fn new(
        endpoint: Url,
        model: impl Into<String>,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key.expose_secret()).map_err(|_| {
            Error::Authentication {
                message: "API key contains characters not allowed in an HTTP header".into(),
            }
        })?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self {
            http,
            endpoint,
            model: model.into(),
            timeout: transport.timeout,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for any authentication headers.
    pub fn with_client(http: reqwest::Client, endpoint: Url, model: impl Into<String>) -> Self {
        Self {
            http,
            endpoint,
            model: model.into(),
            timeout: TransportConfig::default().timeout,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one completion request and return the concatenated text.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, Error> {
        let body = WireRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            system: request.system_prompt.as_deref(),
            messages: &request.messages,
            temperature: request.temperature,
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "POST completion");

        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        self.parse_response(resp).await
    }

    fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }

    async fn parse_response(&self, resp: reqwest::Response) -> Result<CompletionResponse, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("completion service rejected the API key (HTTP {status})"),
            });
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(1);
            return Err(Error::RateLimited { retry_after_secs });
        }

        let text = resp.text().await.map_err(|e| self.map_transport(e))?;
        trace!(bytes = text.len(), "completion response body received");

        if !status.is_success() {
            let (kind, message) = match serde_json::from_str::<WireErrorEnvelope>(&text) {
                Ok(env) => (
                    env.error.kind,
                    env.error.message.unwrap_or_else(|| status.to_string()),
                ),
                Err(_) => (None, text.chars().take(200).collect()),
            };
            return Err(Error::Api {
                message,
                kind,
                status: status.as_u16(),
            });
        }

        let wire: WireResponse = serde_json::from_str(&text).map_err(|e| {
            let preview: String = text.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: text.clone(),
            }
        })?;

        let content = wire
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect::<String>();

        if content.trim().is_empty() {
            return Err(Error::EmptyCompletion);
        }

        Ok(CompletionResponse {
            content,
            tokens_used: wire.usage,
            stop_reason: wire.stop_reason,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_sets_fields() {
        let req = CompletionRequest::new(vec![Message::user("show clock")])
            .with_system_prompt("You are a router")
            .with_max_tokens(256)
            .with_temperature(0.0);

        assert_eq!(req.system_prompt.as_deref(), Some("You are a router"));
        assert_eq!(req.max_tokens, 256);
        assert_eq!(req.temperature, Some(0.0));
        assert_eq!(req.messages[0].role, Role::User);
    }

    #[test]
    fn wire_request_omits_absent_system_prompt() {
        let messages = vec![Message::user("hi")];
        let body = WireRequest {
            model: "m",
            max_tokens: 10,
            system: None,
            messages: &messages,
            temperature: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn unknown_stop_reason_decodes_as_other() {
        let reason: StopReason = serde_json::from_str("\"tool_use\"").unwrap();
        assert_eq!(reason, StopReason::Other);
    }

    #[test]
    fn token_usage_total() {
        let usage = TokenUsage {
            input: 12,
            output: 30,
        };
        assert_eq!(usage.total(), 42);
    }
}
