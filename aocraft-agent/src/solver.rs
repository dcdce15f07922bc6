//! Solver implementation - the generate / persist / present / feedback loop

use crate::operator::{classify, Operator, Verdict};
use aocraft_core::{AttemptStore, Gateway, LlmProvider, Part, Result, Session, UsageTracker};
use serde::Serialize;
use std::path::PathBuf;

/// Configuration for the loop
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Log a summary of every round at info level
    pub verbose: bool,
    /// Warn once the conversation has grown past this many feedback rounds
    pub warn_after_rounds: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            warn_after_rounds: 8,
        }
    }
}

/// How the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Operator accepted the last attempt
    Accepted,
    /// Operator asked to stop
    Stopped,
    /// Operator input ended before a verdict
    InputClosed,
}

/// Summary returned when the loop finishes
#[derive(Debug, Clone, Serialize)]
pub struct LoopReport {
    pub day: u32,
    pub part: Part,
    pub outcome: Outcome,
    /// Number of the last attempt presented
    pub final_attempt: u32,
    /// Every persisted attempt, in order
    pub attempts: Vec<PathBuf>,
    pub usage: UsageTracker,
}

/// Runs one session to completion against an operator.
pub struct Solver<O: Operator, P: LlmProvider = Gateway> {
    session: Session<P>,
    store: AttemptStore,
    operator: O,
    config: LoopConfig,
}

impl<O: Operator, P: LlmProvider> Solver<O, P> {
    pub fn new(session: Session<P>, store: AttemptStore, operator: O) -> Self {
        Self::with_config(session, store, operator, LoopConfig::default())
    }

    pub fn with_config(session: Session<P>, store: AttemptStore, operator: O, config: LoopConfig) -> Self {
        Self {
            session,
            store,
            operator,
            config,
        }
    }

    pub fn session(&self) -> &Session<P> {
        &self.session
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    /// Loop until the operator accepts, stops, or runs out of input.
    ///
    /// Any provider, storage or operator failure ends the loop and is
    /// returned as is; attempts persisted before it stay on disk.
    pub async fn run(&mut self) -> Result<LoopReport> {
        let mut attempts = Vec::new();
        let mut warned = false;
        let mut attempt = self.session.generate_attempt().await?;

        let outcome = loop {
            let location = self.store.persist(&attempt)?;
            self.operator.present(&attempt, &location)?;
            attempts.push(location);

            let rounds = self.session.history().rounds();
            if self.config.verbose {
                tracing::info!(
                    attempt = attempt.number,
                    rounds,
                    history = self.session.history().len(),
                    total_tokens = self.session.usage().total_tokens(),
                    "attempt ready for review"
                );
            }
            if !warned && rounds > self.config.warn_after_rounds {
                tracing::warn!(
                    rounds,
                    threshold = self.config.warn_after_rounds,
                    "conversation keeps growing; every round resends the full history"
                );
                warned = true;
            }

            let Some(reply) = self.operator.feedback()? else {
                tracing::warn!(attempt = attempt.number, "operator input closed, stopping");
                break Outcome::InputClosed;
            };

            match classify(&reply) {
                Verdict::Accept => break Outcome::Accepted,
                Verdict::Stop => break Outcome::Stopped,
                Verdict::Revise(feedback) => {
                    attempt = self.session.incorporate_feedback(&attempt.source, &feedback).await?;
                }
            }
        };

        self.session.terminate();

        let report = LoopReport {
            day: self.session.context().day(),
            part: self.session.context().part(),
            outcome,
            final_attempt: attempt.number,
            attempts,
            usage: self.session.usage().clone(),
        };
        tracing::info!(
            outcome = ?report.outcome,
            attempts = report.attempts.len(),
            calls = report.usage.total_calls,
            total_tokens = report.usage.total_tokens(),
            "solving finished"
        );
        Ok(report)
    }
}
