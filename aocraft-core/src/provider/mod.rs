//! # LLM Provider Gateway
//!
//! A trait-based abstraction for sending a rendered conversation to an LLM
//! backend and getting generated source text back.
//!
//! ## Design
//! - `LlmProvider` trait defines the `complete` capability
//! - One implementation per backend (OpenAI-compatible, Anthropic)
//! - `Gateway` is the closed set of backends, chosen once per session
//! - No retry by default; `RetryPolicy` opts into bounded backoff

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAIProvider;

use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

type Result<T, E = Error> = std::result::Result<T, E>;

// ============================================================================
// Core Types
// ============================================================================

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Request parameters for a completion
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub id: String,
    pub model: String,
    pub content: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Unknown,
}

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

// ============================================================================
// Provider Errors
// ============================================================================

/// Error type for provider operations
#[derive(Debug)]
pub enum ProviderError {
    /// Network/connection error
    Network(String),
    /// API returned an error
    Api { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Rate limited
    RateLimited { retry_after: Option<u64> },
    /// Model not found
    ModelNotFound(String),
    /// Authentication failed
    AuthenticationFailed,
    /// The backend answered without any text
    EmptyResponse,
}

impl ProviderError {
    /// Whether another attempt at the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500 || *status == 408,
            _ => false,
        }
    }

    /// Map into the unified error, tagging the backend that failed
    pub fn into_error(self, provider: &str, model: &str) -> Error {
        let kind = match &self {
            Self::Network(_) => ErrorKind::NetworkFailed,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            Self::ModelNotFound(_) => ErrorKind::ConfigInvalid,
            Self::Api { .. } | Self::Parse(_) | Self::EmptyResponse => ErrorKind::InferenceFailed,
        };
        let retryable = self.is_retryable();
        let err = Error::new(kind, self.to_string())
            .with_operation("provider::complete")
            .with_context("provider", provider)
            .with_context("model", model);
        if retryable {
            err.temporary()
        } else {
            err.permanent()
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {}", e),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::RateLimited { retry_after } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry after {}s)", secs)?;
                }
                Ok(())
            }
            Self::ModelNotFound(m) => write!(f, "Model not found: {}", m),
            Self::AuthenticationFailed => write!(f, "Authentication failed"),
            Self::EmptyResponse => write!(f, "No content in response"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Shared status-code handling for the HTTP backends
pub(crate) fn error_for_status(
    status: u16,
    retry_after: Option<u64>,
    body: String,
    model: &str,
) -> ProviderError {
    match status {
        401 | 403 => ProviderError::AuthenticationFailed,
        404 => ProviderError::ModelNotFound(model.to_string()),
        429 => ProviderError::RateLimited { retry_after },
        _ => ProviderError::Api {
            status,
            message: body,
        },
    }
}

/// Seconds from a `Retry-After` header, if present and numeric
pub(crate) fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

// ============================================================================
// Provider Trait
// ============================================================================

/// The chat-completion capability every backend provides.
#[allow(async_fn_in_trait)]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn name(&self) -> &str;

    /// The model requests go to unless overridden
    fn default_model(&self) -> &str;

    /// Send a completion request and get a full response
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// The closed set of supported backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    /// Any OpenAI-compatible endpoint (Ollama, vLLM, ...)
    Local,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::OpenAI, ProviderKind::Anthropic, ProviderKind::Local];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Local => "local",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "gpt-4o",
            ProviderKind::Anthropic => "claude-3-5-sonnet-latest",
            ProviderKind::Local => "llama3.1",
        }
    }

    /// Environment variable holding the credential, if the backend needs one
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAI => Some("OPENAI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Local => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| {
                Error::unsupported(format!("unsupported provider '{}'", s.trim()))
                    .with_operation("provider::parse_kind")
                    .with_context("provider", s.trim())
            })
    }
}

/// Configuration for creating providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub headers: HashMap<String, String>,
    /// `None` means no client-side timeout
    pub timeout_secs: Option<u64>,
    pub max_tokens: usize,
    pub temperature: Option<f32>,
    /// Log full request payloads at debug level
    pub trace_payloads: bool,
}

pub const LOCAL_BASE_URL_VAR: &str = "AOCRAFT_LOCAL_BASE_URL";
const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:11434/v1";
const DEFAULT_MAX_TOKENS: usize = 4096;

impl ProviderConfig {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::OpenAI,
            api_key: Some(api_key.into()),
            base_url: Some("https://api.openai.com/v1".into()),
            model: ProviderKind::OpenAI.default_model().into(),
            headers: HashMap::new(),
            timeout_secs: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            trace_payloads: false,
        }
    }

    pub fn anthropic(api_key: impl Into<String>) -> Self {
        let mut headers = HashMap::new();
        headers.insert("anthropic-version".into(), "2023-06-01".into());

        Self {
            kind: ProviderKind::Anthropic,
            api_key: Some(api_key.into()),
            base_url: Some("https://api.anthropic.com/v1".into()),
            model: ProviderKind::Anthropic.default_model().into(),
            headers,
            timeout_secs: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            trace_payloads: false,
        }
    }

    pub fn local(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::Local,
            api_key: None,
            base_url: Some(base_url.into()),
            model: model.into(),
            headers: HashMap::new(),
            timeout_secs: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            trace_payloads: false,
        }
    }

    /// Build a config for `kind` from the process environment.
    pub fn from_env(kind: ProviderKind, model: Option<&str>) -> Result<Self> {
        Self::from_lookup(kind, model, |var| std::env::var(var).ok())
    }

    /// Same as [`ProviderConfig::from_env`] with an injectable variable lookup.
    pub fn from_lookup(
        kind: ProviderKind,
        model: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_key = match kind.api_key_var() {
            Some(var) => {
                let key = lookup(var).filter(|k| !k.trim().is_empty()).ok_or_else(|| {
                    Error::config_invalid(format!("{} is not set", var))
                        .with_operation("provider::from_env")
                        .with_context("provider", kind.as_str())
                })?;
                Some(key)
            }
            None => None,
        };

        let config = match kind {
            ProviderKind::OpenAI => Self::openai(api_key.unwrap_or_default()),
            ProviderKind::Anthropic => Self::anthropic(api_key.unwrap_or_default()),
            ProviderKind::Local => {
                let base_url = lookup(LOCAL_BASE_URL_VAR)
                    .unwrap_or_else(|| DEFAULT_LOCAL_BASE_URL.to_string());
                Self::local(base_url, kind.default_model())
            }
        };

        Ok(match model {
            Some(m) if !m.trim().is_empty() => config.with_model(m.trim()),
            _ => config,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_trace_payloads(mut self, enabled: bool) -> Self {
        self.trace_payloads = enabled;
        self
    }

    /// Shared HTTP client construction for the backends
    pub(crate) fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build().map_err(|e| {
            Error::config_invalid("failed to create HTTP client")
                .with_operation("provider::new")
                .with_context("provider", self.kind.as_str())
                .set_source(e)
        })
    }
}

// ============================================================================
// Gateway - the backend a session is bound to
// ============================================================================

/// One concrete backend, selected from a [`ProviderConfig`] at construction.
pub enum Gateway {
    OpenAI(OpenAIProvider),
    Anthropic(AnthropicProvider),
}

impl Gateway {
    pub fn from_config(config: ProviderConfig) -> Result<Self> {
        match config.kind {
            ProviderKind::OpenAI | ProviderKind::Local => {
                Ok(Gateway::OpenAI(OpenAIProvider::new(config)?))
            }
            ProviderKind::Anthropic => Ok(Gateway::Anthropic(AnthropicProvider::new(config)?)),
        }
    }
}

impl LlmProvider for Gateway {
    fn name(&self) -> &str {
        match self {
            Gateway::OpenAI(p) => p.name(),
            Gateway::Anthropic(p) => p.name(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            Gateway::OpenAI(p) => p.default_model(),
            Gateway::Anthropic(p) => p.default_model(),
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        match self {
            Gateway::OpenAI(p) => p.complete(request).await,
            Gateway::Anthropic(p) => p.complete(request).await,
        }
    }
}

// ============================================================================
// Retry
// ============================================================================

/// Bounded exponential backoff for retryable provider failures.
///
/// The default performs no retries: every failure surfaces immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Delay before retry number `step` (0-based), doubling up to `max_delay`
    pub fn delay_for(&self, step: u32) -> Duration {
        let factor = 1u32.checked_shl(step.min(16)).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// Run `complete`, retrying retryable failures according to `policy`.
pub async fn complete_with_retry<P: LlmProvider>(
    provider: &P,
    request: CompletionRequest,
    policy: &RetryPolicy,
) -> Result<CompletionResponse, ProviderError> {
    let mut step = 0;
    loop {
        match provider.complete(request.clone()).await {
            Ok(response) => return Ok(response),
            Err(e) if e.is_retryable() && step < policy.max_retries => {
                let delay = match &e {
                    ProviderError::RateLimited {
                        retry_after: Some(secs),
                    } => Duration::from_secs(*secs).min(policy.max_delay),
                    _ => policy.delay_for(step),
                };
                tracing::warn!(
                    provider = provider.name(),
                    error = %e,
                    retry = step + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "retrying provider request"
                );
                tokio::time::sleep(delay).await;
                step += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

// ============================================================================
// Usage Tracking
// ============================================================================

/// Tracks token usage across multiple calls
#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageTracker {
    pub total_calls: usize,
    pub total_prompt_tokens: usize,
    pub total_completion_tokens: usize,
    pub by_model: HashMap<String, Usage>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, model: &str, usage: &Usage) {
        self.total_calls += 1;
        self.total_prompt_tokens += usage.prompt_tokens;
        self.total_completion_tokens += usage.completion_tokens;

        let entry = self.by_model.entry(model.to_string()).or_default();
        entry.prompt_tokens += usage.prompt_tokens;
        entry.completion_tokens += usage.completion_tokens;
        entry.total_tokens += usage.total_tokens;
    }

    pub fn total_tokens(&self) -> usize {
        self.total_prompt_tokens + self.total_completion_tokens
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_chat_message_wire_roles() {
        let msg = ChatMessage::new(Role::System, "You are helpful");
        assert_eq!(msg.content, "You are helpful");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new(vec![ChatMessage::new(Role::User, "Hello")]).with_model("gpt-4o");

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.model, Some("gpt-4o".into()));
        assert_eq!(request.temperature, None);
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert_eq!("Anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert_eq!(" local ".parse::<ProviderKind>().unwrap(), ProviderKind::Local);

        let err = "gemini".parse::<ProviderKind>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(err.kind().is_configuration());
        assert_eq!(err.context_value("provider"), Some("gemini"));
    }

    #[test]
    fn test_provider_config() {
        let config = ProviderConfig::openai("sk-test");
        assert_eq!(config.kind, ProviderKind::OpenAI);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout_secs, None);

        let config = ProviderConfig::anthropic("sk-ant-test").with_model("claude-3-5-haiku-latest");
        assert_eq!(config.kind, ProviderKind::Anthropic);
        assert!(config.headers.contains_key("anthropic-version"));
        assert_eq!(config.model, "claude-3-5-haiku-latest");
    }

    #[test]
    fn test_config_from_lookup() {
        let config = ProviderConfig::from_lookup(ProviderKind::OpenAI, None, |var| {
            (var == "OPENAI_API_KEY").then(|| "sk-abc".to_string())
        })
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-abc"));
        assert_eq!(config.model, "gpt-4o");

        let config = ProviderConfig::from_lookup(ProviderKind::Local, Some("qwen2.5-coder"), |var| {
            (var == LOCAL_BASE_URL_VAR).then(|| "http://gpu-box:8000/v1".to_string())
        })
        .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://gpu-box:8000/v1"));
        assert_eq!(config.model, "qwen2.5-coder");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_config_missing_key() {
        let err = ProviderConfig::from_lookup(ProviderKind::Anthropic, None, |_| None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.message().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_provider_error_mapping() {
        let err = ProviderError::Network("connection reset".into()).into_error("openai", "gpt-4o");
        assert_eq!(err.kind(), ErrorKind::NetworkFailed);
        assert!(err.is_retryable());
        assert_eq!(err.context_value("model"), Some("gpt-4o"));

        let err = ProviderError::AuthenticationFailed.into_error("anthropic", "claude");
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        assert!(!err.is_retryable());

        let err = ProviderError::Api { status: 400, message: "bad".into() }.into_error("openai", "gpt-4o");
        assert_eq!(err.kind(), ErrorKind::InferenceFailed);
        assert!(!err.is_retryable());

        assert!(ProviderError::Api { status: 503, message: String::new() }.is_retryable());
    }

    #[test]
    fn test_retry_delay_backoff() {
        let policy = RetryPolicy::none().with_max_retries(5);
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(10), Duration::from_secs(8));
    }

    #[test]
    fn test_usage_tracker() {
        let mut tracker = UsageTracker::new();

        tracker.track("gpt-4o", &Usage {
            prompt_tokens: 100,
            completion_tokens: 50,
            total_tokens: 150,
        });

        tracker.track("gpt-4o", &Usage {
            prompt_tokens: 200,
            completion_tokens: 100,
            total_tokens: 300,
        });

        assert_eq!(tracker.total_calls, 2);
        assert_eq!(tracker.total_prompt_tokens, 300);
        assert_eq!(tracker.total_completion_tokens, 150);
        assert_eq!(tracker.total_tokens(), 450);
        assert_eq!(tracker.by_model["gpt-4o"].total_tokens, 450);
    }

    /// Fails with the queued errors, then answers "ok"
    struct Flaky {
        failures: Mutex<Vec<ProviderError>>,
        calls: AtomicUsize,
    }

    impl LlmProvider for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn default_model(&self) -> &str {
            "flaky-1"
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.failures.lock().unwrap().pop() {
                return Err(err);
            }
            Ok(CompletionResponse {
                id: "1".into(),
                model: "flaky-1".into(),
                content: Some("ok".into()),
                finish_reason: FinishReason::Stop,
                usage: Usage::default(),
            })
        }
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let provider = Flaky {
            failures: Mutex::new(vec![ProviderError::Network("down".into())]),
            calls: AtomicUsize::new(0),
        };

        let result = complete_with_retry(&provider, CompletionRequest::default(), &RetryPolicy::default()).await;
        assert!(matches!(result, Err(ProviderError::Network(_))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_from_transient_failures() {
        let provider = Flaky {
            failures: Mutex::new(vec![
                ProviderError::Network("down".into()),
                ProviderError::Api { status: 502, message: "bad gateway".into() },
            ]),
            calls: AtomicUsize::new(0),
        };

        let policy = RetryPolicy::none().with_max_retries(2);
        let response = complete_with_retry(&provider, CompletionRequest::default(), &policy)
            .await
            .unwrap();
        assert_eq!(response.content.as_deref(), Some("ok"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_skips_permanent_failures() {
        let provider = Flaky {
            failures: Mutex::new(vec![ProviderError::AuthenticationFailed]),
            calls: AtomicUsize::new(0),
        };

        let policy = RetryPolicy::none().with_max_retries(3);
        let result = complete_with_retry(&provider, CompletionRequest::default(), &policy).await;
        assert!(matches!(result, Err(ProviderError::AuthenticationFailed)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
