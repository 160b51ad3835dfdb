//! Per-provider request shaping and reply extraction.
//!
//! OpenAI, Claude and Groq share the chat-completions wire shape with a bearer
//! token. Gemini takes the key as a query parameter and nests its reply under
//! `candidates[0].content.parts[0].text`.

use super::retry::RetryPolicy;
use super::transport::{HttpReply, HttpRequest};
use super::{CallError, ModelConfig};
use crate::util::snippet;
use serde_json::{json, Value};
use std::time::Duration;

pub const TEMPERATURE: f64 = 0.3;
pub const MAX_TOKENS: u32 = 120;

/// Characters of a response body kept in error messages.
const BODY_SNIPPET_CHARS: usize = 100;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[value(name = "openai")]
    OpenAi,
    Gemini,
    Claude,
    Groq,
}

impl Provider {
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4",
            Self::Gemini => "gemini-pro",
            Self::Claude => "claude-3-7-sonnet-20250219",
            Self::Groq => "llama-3.1-8b-instant",
        }
    }

    /// Only Gemini retries out of the box; the others make a single attempt
    /// with no timeout.
    pub fn default_retry_policy(self) -> RetryPolicy {
        match self {
            Self::Gemini => RetryPolicy {
                max_attempts: 5,
                initial_backoff: Duration::from_secs(5),
                timeout: Some(Duration::from_secs(60)),
            },
            Self::OpenAi | Self::Claude | Self::Groq => RetryPolicy::single_attempt(),
        }
    }

    fn uses_chat_completions(self) -> bool {
        !matches!(self, Self::Gemini)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Gemini => write!(f, "gemini"),
            Self::Claude => write!(f, "claude"),
            Self::Groq => write!(f, "groq"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            "claude" => Ok(Self::Claude),
            "groq" => Ok(Self::Groq),
            other => Err(format!(
                "unknown provider {other:?} (expected openai, gemini, claude or groq)"
            )),
        }
    }
}

pub fn build_request(config: &ModelConfig, prompt: &str) -> HttpRequest {
    if config.provider.uses_chat_completions() {
        HttpRequest {
            url: config.endpoint.clone(),
            query: Vec::new(),
            headers: vec![(
                "Authorization".to_string(),
                format!("Bearer {}", config.api_key),
            )],
            body: json!({
                "model": config.model,
                "messages": [{"role": "user", "content": prompt}],
                "temperature": TEMPERATURE,
                "max_tokens": MAX_TOKENS,
            }),
        }
    } else {
        HttpRequest {
            url: config.endpoint.clone(),
            query: vec![("key".to_string(), config.api_key.clone())],
            headers: Vec::new(),
            body: json!({
                "contents": [{"parts": [{"text": prompt}]}],
            }),
        }
    }
}

pub fn extract_reply(provider: Provider, reply: &HttpReply) -> Result<String, CallError> {
    if reply.status != 200 {
        return Err(CallError::HttpStatus {
            status: reply.status,
            body_snippet: snippet(&reply.body, BODY_SNIPPET_CHARS),
        });
    }
    let value: Value =
        serde_json::from_str(&reply.body).map_err(|_| CallError::InvalidResponse {
            snippet: snippet(&reply.body, BODY_SNIPPET_CHARS),
        })?;

    if provider.uses_chat_completions() {
        chat_completion_text(&value)
    } else {
        gemini_text(&value)
    }
}

fn chat_completion_text(value: &Value) -> Result<String, CallError> {
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .ok_or(CallError::UnexpectedShape)
}

fn gemini_text(value: &Value) -> Result<String, CallError> {
    let first_candidate = value
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first());

    if let Some(candidate) = first_candidate {
        let parts = candidate
            .get("content")
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .ok_or(CallError::UnexpectedShape)?;
        let part = parts.first().ok_or(CallError::EmptyReply)?;
        return part
            .get("text")
            .and_then(Value::as_str)
            .map(|text| text.trim().to_string())
            .ok_or(CallError::UnexpectedShape);
    }

    if let Some(feedback) = value.get("promptFeedback") {
        let reason = feedback
            .get("blockReason")
            .and_then(Value::as_str)
            .unwrap_or("Unknown reason");
        return Err(CallError::Blocked {
            reason: reason.to_string(),
        });
    }

    Err(CallError::UnexpectedShape)
}
