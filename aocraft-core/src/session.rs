//! # Conversation sessions
//!
//! A session owns everything one solving run accumulates: the puzzle, the
//! provider binding, the attempt counter and the append-only history of
//! attempts and feedback.
//!
//! ## Lifecycle
//!
//! ```text
//! Fresh --generate_attempt--> AwaitingFeedback --incorporate_feedback--> Regenerating
//!                                  ^    |                                     |
//!                                  |    +--terminate--> Terminal              |
//!                                  +------------------------------------------+
//! ```
//!
//! The counter advances and the history grows only inside
//! `incorporate_feedback`, and every generating call returns the [`Attempt`]
//! stamped with the counter value it was produced under.

use crate::error::{Error, Result};
use crate::prompt::PromptAssembler;
use crate::provider::{
    complete_with_retry, CompletionRequest, Gateway, LlmProvider, ProviderConfig, ProviderError, ProviderKind,
    RetryPolicy, UsageTracker,
};
use crate::puzzle::{Part, PuzzleContext};
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// Conversation History
// ═══════════════════════════════════════════════════════════════════════════════

/// One entry of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationTurn {
    /// Candidate program produced under attempt number `attempt`
    AssistantAttempt { attempt: u32, text: String },
    /// Free-form text from the operator
    HumanFeedback { text: String },
}

/// Ordered turns, oldest first. Entries are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Completed attempt/feedback rounds
    pub fn rounds(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| matches!(t, ConversationTurn::HumanFeedback { .. }))
            .count()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Session Structures
// ═══════════════════════════════════════════════════════════════════════════════

/// Backend and model a session talks to; fixed for the session's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderBinding {
    pub kind: ProviderKind,
    pub model: String,
}

impl ProviderBinding {
    pub fn new(kind: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Fresh,
    AwaitingFeedback,
    Regenerating,
    Terminal,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Fresh => "fresh",
            SessionState::AwaitingFeedback => "awaiting_feedback",
            SessionState::Regenerating => "regenerating",
            SessionState::Terminal => "terminal",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate solution, ready to be persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub day: u32,
    pub part: Part,
    pub number: u32,
    pub provider: ProviderKind,
    pub model: String,
    pub source: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Session
// ═══════════════════════════════════════════════════════════════════════════════

/// One solving run for a single (day, part).
pub struct Session<P: LlmProvider = Gateway> {
    context: PuzzleContext,
    binding: ProviderBinding,
    provider: P,
    assembler: PromptAssembler,
    retry: RetryPolicy,
    history: ConversationHistory,
    attempt: u32,
    state: SessionState,
    usage: UsageTracker,
}

impl Session<Gateway> {
    /// Bind a session to the backend described by `config`
    pub fn new(context: PuzzleContext, config: ProviderConfig) -> Result<Self> {
        let binding = ProviderBinding::new(config.kind, config.model.clone());
        let gateway = Gateway::from_config(config).map_err(|e| e.with_operation("session::new"))?;
        Ok(Self::with_provider(context, binding, gateway))
    }
}

impl<P: LlmProvider> Session<P> {
    pub fn with_provider(context: PuzzleContext, binding: ProviderBinding, provider: P) -> Self {
        tracing::info!(
            day = context.day(),
            part = context.part().number(),
            provider = %binding.kind,
            model = %binding.model,
            "session started"
        );
        Self {
            context,
            binding,
            provider,
            assembler: PromptAssembler::default(),
            retry: RetryPolicy::default(),
            history: ConversationHistory::new(),
            attempt: 1,
            state: SessionState::Fresh,
            usage: UsageTracker::new(),
        }
    }

    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn context(&self) -> &PuzzleContext {
        &self.context
    }

    pub fn binding(&self) -> &ProviderBinding {
        &self.binding
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn assembler(&self) -> &PromptAssembler {
        &self.assembler
    }

    /// Number the next (or current) attempt is stamped with
    pub fn attempt_number(&self) -> u32 {
        self.attempt
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Produce the first attempt.
    ///
    /// Also resumes a session whose regeneration failed at the provider; the
    /// feedback already recorded is not appended again.
    pub async fn generate_attempt(&mut self) -> Result<Attempt> {
        match self.state {
            SessionState::Fresh | SessionState::Regenerating => {}
            other => {
                return Err(Error::invalid_state(other.as_str(), "generate an attempt")
                    .with_operation("session::generate_attempt"));
            }
        }

        let attempt = self.request().await?;
        self.state = SessionState::AwaitingFeedback;
        Ok(attempt)
    }

    /// Record `prior_text` and `feedback`, advance the counter, and regenerate.
    pub async fn incorporate_feedback(&mut self, prior_text: &str, feedback: &str) -> Result<Attempt> {
        if self.state != SessionState::AwaitingFeedback {
            return Err(Error::invalid_state(self.state.as_str(), "incorporate feedback")
                .with_operation("session::incorporate_feedback"));
        }

        self.history.push(ConversationTurn::AssistantAttempt {
            attempt: self.attempt,
            text: prior_text.to_string(),
        });
        self.history.push(ConversationTurn::HumanFeedback {
            text: feedback.to_string(),
        });
        self.attempt += 1;
        self.state = SessionState::Regenerating;

        tracing::debug!(
            attempt = self.attempt,
            history = self.history.len(),
            feedback_len = feedback.len(),
            "feedback recorded"
        );

        let attempt = self.request().await?;
        self.state = SessionState::AwaitingFeedback;
        Ok(attempt)
    }

    /// End the session. Any later generation fails.
    pub fn terminate(&mut self) {
        if self.state != SessionState::Terminal {
            tracing::info!(
                day = self.context.day(),
                part = self.context.part().number(),
                attempts = self.attempt,
                "session terminated"
            );
        }
        self.state = SessionState::Terminal;
    }

    async fn request(&mut self) -> Result<Attempt> {
        let messages = self.assembler.render(&self.context, &self.history)?;
        tracing::debug!(
            attempt = self.attempt,
            messages = messages.len(),
            prompt_chars = messages.iter().map(|m| m.content.len()).sum::<usize>(),
            "requesting attempt"
        );

        let request = CompletionRequest::new(messages).with_model(self.binding.model.clone());
        let provider_name = self.binding.kind.as_str();
        let response = complete_with_retry(&self.provider, request, &self.retry)
            .await
            .map_err(|e| e.into_error(provider_name, &self.binding.model).with_operation("session::request"))?;

        self.usage.track(&response.model, &response.usage);

        let text = response
            .content
            .ok_or_else(|| ProviderError::EmptyResponse.into_error(provider_name, &self.binding.model))?;

        Ok(Attempt {
            day: self.context.day(),
            part: self.context.part(),
            number: self.attempt,
            provider: self.binding.kind,
            model: self.binding.model.clone(),
            source: extract_source(&text),
        })
    }
}

/// Unwrap a Markdown code fence if the model added one
pub fn extract_source(text: &str) -> String {
    let Some((_, rest)) = text.split_once("```") else {
        return text.trim().to_string();
    };

    // Skip the info string ("python", "py", ...) on the opening line
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    let body = body.split_once("```").map_or(body, |(code, _)| code);
    let body = body.trim_matches('\n').trim_end();

    if body.trim().is_empty() {
        text.trim().to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::provider::{ChatMessage, CompletionResponse, FinishReason, Role, Usage};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies and records every prompt it receives
    struct Scripted {
        replies: Mutex<VecDeque<std::result::Result<String, ProviderError>>>,
        prompts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl Scripted {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
                prompts: Mutex::default(),
            }
        }

        fn fail_next(&self, err: ProviderError) {
            self.replies.lock().unwrap().push_front(Err(err));
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        fn prompt(&self, index: usize) -> Vec<ChatMessage> {
            self.prompts.lock().unwrap()[index].clone()
        }
    }

    impl LlmProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn default_model(&self) -> &str {
            "scripted-1"
        }

        async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, ProviderError> {
            self.prompts.lock().unwrap().push(request.messages);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("print('fallback')".to_string()))?;
            Ok(CompletionResponse {
                id: "r".into(),
                model: "scripted-1".into(),
                content: Some(reply),
                finish_reason: FinishReason::Stop,
                usage: Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                },
            })
        }
    }

    fn binding() -> ProviderBinding {
        ProviderBinding::new(ProviderKind::OpenAI, "gpt-4o")
    }

    fn part_one_session(replies: &[&str]) -> Session<Scripted> {
        let context = PuzzleContext::new(4, 1, "Find XMAS", "MMMSXXMASM", None).unwrap();
        Session::with_provider(context, binding(), Scripted::new(replies))
    }

    #[tokio::test]
    async fn test_first_attempt_leaves_history_untouched() {
        let mut session = part_one_session(&["print(18)"]);
        assert_eq!(session.state(), SessionState::Fresh);

        let attempt = session.generate_attempt().await.unwrap();
        assert_eq!(attempt.number, 1);
        assert_eq!(attempt.day, 4);
        assert_eq!(attempt.part, Part::One);
        assert_eq!(attempt.provider, ProviderKind::OpenAI);
        assert_eq!(attempt.model, "gpt-4o");
        assert_eq!(attempt.source, "print(18)");
        assert_eq!(session.attempt_number(), 1);
        assert!(session.history().is_empty());
        assert_eq!(session.state(), SessionState::AwaitingFeedback);
        assert_eq!(session.usage().total_tokens(), 15);
    }

    #[tokio::test]
    async fn test_counter_and_history_track_rounds() {
        let replies = ["t1", "t2", "t3", "t4"];
        let mut session = part_one_session(&replies);

        let mut attempt = session.generate_attempt().await.unwrap();
        assert_eq!(attempt.number, 1);

        for round in 1..=3u32 {
            let feedback = format!("wrong answer {}", round);
            attempt = session.incorporate_feedback(&attempt.source, &feedback).await.unwrap();
            assert_eq!(attempt.number, round + 1);
            assert_eq!(session.attempt_number(), round + 1);
            assert_eq!(session.history().len(), 2 * round as usize);
        }

        let turns = session.history().turns();
        for (i, pair) in turns.chunks(2).enumerate() {
            assert_eq!(
                pair[0],
                ConversationTurn::AssistantAttempt {
                    attempt: i as u32 + 1,
                    text: replies[i].to_string(),
                }
            );
            assert_eq!(
                pair[1],
                ConversationTurn::HumanFeedback {
                    text: format!("wrong answer {}", i + 1),
                }
            );
        }
        assert_eq!(session.history().rounds(), 3);
        assert_eq!(session.provider().calls(), 4);
    }

    #[tokio::test]
    async fn test_day_six_part_two_scenario() {
        let prior = "def walk(grid):\n    return {(0, 0)}\n\nprint(len(walk(open('input/input.txt'))))";
        let t1 = "def walk(grid):\n    return {(0, 0)}\n\nprint(len(walk(open('input/input.txt'))), 0)";
        let t2 = "print('fixed')";
        let context = PuzzleContext::new(6, 2, "Place obstructions.", "....#.....", Some(prior.to_string())).unwrap();
        let mut session = Session::with_provider(context, binding(), Scripted::new(&[t1, t2]));

        let first = session.generate_attempt().await.unwrap();
        assert_eq!(first.number, 1);
        assert_eq!(first.source, t1);
        assert!(session.provider().prompt(0)[1].content.contains(prior));

        let second = session.incorporate_feedback(&first.source, "this loops incorrectly").await.unwrap();
        assert_eq!(second.number, 2);
        assert_eq!(second.source, t2);
        assert_eq!(session.attempt_number(), 2);
        assert_eq!(session.history().len(), 2);

        let prompt = session.provider().prompt(1);
        assert!(prompt.iter().any(|m| m.role == Role::Assistant && m.content.contains(t1)));
        assert!(prompt.iter().any(|m| m.role == Role::User && m.content.contains("this loops incorrectly")));

        session.terminate();
        assert_eq!(session.state(), SessionState::Terminal);
        assert_eq!(session.attempt_number(), 2);
        assert_eq!(session.provider().calls(), 2);
    }

    #[tokio::test]
    async fn test_terminal_session_is_inert() {
        let mut session = part_one_session(&["print(1)"]);
        let attempt = session.generate_attempt().await.unwrap();
        session.terminate();

        let err = session.generate_attempt().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        let err = session.incorporate_feedback(&attempt.source, "more").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(session.provider().calls(), 1);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_feedback_before_first_attempt_rejected() {
        let mut session = part_one_session(&[]);
        let err = session.incorporate_feedback("x", "y").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.context_value("state"), Some("fresh"));
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces_and_resumes() {
        let mut session = part_one_session(&["t1", "t2"]);
        let first = session.generate_attempt().await.unwrap();

        session.provider().fail_next(ProviderError::Network("connection reset".into()));
        let err = session.incorporate_feedback(&first.source, "off by one").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailed);
        assert_eq!(err.context_value("provider"), Some("openai"));
        assert_eq!(session.state(), SessionState::Regenerating);
        assert_eq!(session.attempt_number(), 2);

        let second = session.generate_attempt().await.unwrap();
        assert_eq!(second.number, 2);
        assert_eq!(second.source, "t2");
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_gateway_session_binding() {
        let context = PuzzleContext::new(1, 1, "d", "i", None).unwrap();
        let config = ProviderConfig::anthropic("sk-ant").with_model("claude-3-5-haiku-latest");
        let session = Session::new(context, config).unwrap();
        assert_eq!(session.binding().kind, ProviderKind::Anthropic);
        assert_eq!(session.binding().model, "claude-3-5-haiku-latest");
        assert_eq!(session.provider().name(), "anthropic");
    }

    #[test]
    fn test_extract_source() {
        assert_eq!(extract_source("  print(1)\n"), "print(1)");
        assert_eq!(extract_source("```python\nprint(1)\n```"), "print(1)");
        assert_eq!(
            extract_source("Here you go:\n```py\nimport sys\n\nprint(2)\n```\nEnjoy"),
            "import sys\n\nprint(2)"
        );
        assert_eq!(extract_source("```\nx = {1}\n```"), "x = {1}");
    }
}
