//! # aocraft agent
//!
//! The interaction loop around a session:
//! 1. Session generates an attempt from the puzzle and history
//! 2. Attempt is persisted to the store
//! 3. Operator sees it and replies
//! 4. `yes` / `exit` end the loop, anything else goes back to the model
//!
//! The loop is the only place that knows a human is involved.

mod operator;
mod solver;

pub use operator::{classify, ConsoleOperator, Operator, Verdict};
pub use solver::{LoopConfig, LoopReport, Outcome, Solver};
