//! # aocraft core
//!
//! Drives an LLM through rounds of code generation and human feedback until a
//! puzzle solution is accepted.
//!
//! ## Core Concepts
//! - **Provider**: trait-based LLM communication (OpenAI, Anthropic, local)
//! - **Prompt**: ordered messages built from the puzzle and the conversation so far
//! - **Session**: attempt counter plus append-only history for one (day, part)
//! - **Store**: durable, collision-free persistence of each candidate

pub mod error;
pub mod prompt;
pub mod provider;
pub mod puzzle;
pub mod session;
pub mod store;

pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use prompt::{escape, unescape, PromptAssembler, PromptOptions, PromptTemplate};
pub use provider::{
    complete_with_retry, AnthropicProvider, ChatMessage, CompletionRequest, CompletionResponse, FinishReason,
    Gateway, LlmProvider, OpenAIProvider, ProviderConfig, ProviderError, ProviderKind, RetryPolicy, Role, Usage,
    UsageTracker,
};
pub use puzzle::{read_prior_solution, Part, PuzzleContext, PuzzleInputs};
pub use session::{
    extract_source, Attempt, ConversationHistory, ConversationTurn, ProviderBinding, Session, SessionState,
};
pub use store::{AttemptStore, StoredAttempt};
