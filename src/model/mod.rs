//! Hosted language-model client.
//!
//! One client covers every provider: [`providers`] shapes the request and
//! extracts the reply, [`retry`] applies the provider's retry policy, and
//! [`transport`] performs the HTTP exchange. All failures come back as a
//! [`CallError`]; nothing in this module panics on a bad response.

pub mod providers;
pub mod retry;
pub mod transport;

pub use providers::Provider;
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};
pub use transport::{Transport, TransportError, UreqTransport};

use std::time::Instant;

/// Everything needed to call one provider, resolved once per run.
#[derive(Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub provider: Provider,
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Why a model call produced no usable reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("service unavailable after {attempts} attempts (throttled, overloaded or unreachable)")]
    ServiceUnavailable { attempts: u32 },
    #[error("HTTP {status}: {body_snippet}")]
    HttpStatus { status: u16, body_snippet: String },
    #[error("response is not valid JSON: {snippet}")]
    InvalidResponse { snippet: String },
    #[error("prompt blocked by provider: {reason}")]
    Blocked { reason: String },
    #[error("response JSON has an unexpected shape")]
    UnexpectedShape,
    #[error("response contained no content parts")]
    EmptyReply,
}

impl CallError {
    /// Stable identifier used in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::HttpStatus { .. } => "http_status",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::Blocked { .. } => "blocked",
            Self::UnexpectedShape => "unexpected_shape",
            Self::EmptyReply => "empty_reply",
        }
    }
}

/// Anything that can turn a prompt into a raw textual reply.
pub trait ModelClient {
    fn complete(&self, prompt: &str) -> Result<String, CallError>;
}

impl<C: ModelClient + ?Sized> ModelClient for &C {
    fn complete(&self, prompt: &str) -> Result<String, CallError> {
        (**self).complete(prompt)
    }
}

/// HTTP-backed client for one configured provider.
pub struct HttpModelClient<T = UreqTransport, S = ThreadSleeper> {
    config: ModelConfig,
    transport: T,
    sleeper: S,
}

impl HttpModelClient {
    pub fn new(config: ModelConfig) -> Self {
        let transport = UreqTransport::new(config.retry.timeout);
        Self::with_parts(config, transport, ThreadSleeper)
    }
}

impl<T: Transport, S: Sleeper> HttpModelClient<T, S> {
    pub fn with_parts(config: ModelConfig, transport: T, sleeper: S) -> Self {
        Self {
            config,
            transport,
            sleeper,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

impl<T: Transport, S: Sleeper> ModelClient for HttpModelClient<T, S> {
    fn complete(&self, prompt: &str) -> Result<String, CallError> {
        let start = Instant::now();
        let request = providers::build_request(&self.config, prompt);
        tracing::debug!(
            provider = %self.config.provider,
            model = %self.config.model,
            prompt_bytes = prompt.len(),
            "sending model request"
        );

        let outcome = retry::send_with_retry(
            &self.transport,
            &self.sleeper,
            &self.config.retry,
            &request,
        )
        .and_then(|reply| providers::extract_reply(self.config.provider, &reply));

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            Ok(reply) => tracing::info!(
                provider = %self.config.provider,
                elapsed_ms,
                response_bytes = reply.len(),
                "model call complete"
            ),
            Err(err) => tracing::warn!(
                provider = %self.config.provider,
                elapsed_ms,
                error_kind = err.kind(),
                error = %err,
                "model call failed"
            ),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::transport::{HttpReply, HttpRequest};
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    struct Replay {
        replies: RefCell<VecDeque<Result<HttpReply, TransportError>>>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl Replay {
        fn new(replies: Vec<Result<HttpReply, TransportError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Replay {
        fn post_json(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
            self.seen.borrow_mut().push(request.clone());
            self.replies
                .borrow_mut()
                .pop_front()
                .expect("unexpected extra request")
        }
    }

    struct NoSleep;

    impl Sleeper for NoSleep {
        fn sleep(&self, _duration: Duration) {}
    }

    fn config(provider: Provider) -> ModelConfig {
        ModelConfig {
            provider,
            endpoint: "http://model.invalid/v1".to_string(),
            api_key: "secret-key".to_string(),
            model: "test-model".to_string(),
            retry: provider.default_retry_policy(),
        }
    }

    #[test]
    fn gemini_retries_then_extracts_text() {
        let transport = Replay::new(vec![
            Ok(HttpReply::new(503, "overloaded")),
            Ok(HttpReply::new(
                200,
                r#"{"candidates":[{"content":{"parts":[{"text":"Billing"}]}}]}"#,
            )),
        ]);
        let client = HttpModelClient::with_parts(config(Provider::Gemini), &transport, NoSleep);

        assert_eq!(client.complete("prompt").unwrap(), "Billing");
        assert_eq!(transport.seen.borrow().len(), 2);
    }

    #[test]
    fn chat_provider_surfaces_transport_failure_as_error() {
        let transport = Replay::new(vec![Err(TransportError::Timeout)]);
        let client = HttpModelClient::with_parts(config(Provider::Groq), &transport, NoSleep);

        let err = client.complete("prompt").unwrap_err();
        assert_eq!(err, CallError::Transport(TransportError::Timeout));
        assert_eq!(err.kind(), "transport");
    }

    #[test]
    fn chat_provider_does_not_retry_throttling() {
        let transport = Replay::new(vec![Ok(HttpReply::new(429, "rate limited"))]);
        let client = HttpModelClient::with_parts(config(Provider::OpenAi), &transport, NoSleep);

        let err = client.complete("prompt").unwrap_err();
        assert_eq!(
            err,
            CallError::HttpStatus {
                status: 429,
                body_snippet: "rate limited".to_string()
            }
        );
        assert_eq!(transport.seen.borrow().len(), 1);
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let rendered = format!("{:?}", config(Provider::Claude));
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
