//! The human side of the loop: showing attempts and collecting feedback

use aocraft_core::{Attempt, Error, Result};
use std::io::{BufRead, Write};
use std::path::Path;

/// What the operator's reply means for the loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The attempt solved the puzzle
    Accept,
    /// Give up without accepting
    Stop,
    /// Anything else, passed to the model verbatim
    Revise(String),
}

/// Interpret one reply. `yes` and `exit` end the loop in any case and with
/// any surrounding whitespace; every other reply is feedback.
pub fn classify(reply: &str) -> Verdict {
    let token = reply.trim();
    if token.eq_ignore_ascii_case("yes") {
        Verdict::Accept
    } else if token.eq_ignore_ascii_case("exit") {
        Verdict::Stop
    } else {
        Verdict::Revise(reply.to_string())
    }
}

/// Whoever judges the attempts.
pub trait Operator {
    /// Show a persisted attempt
    fn present(&mut self, attempt: &Attempt, location: &Path) -> Result<()>;

    /// One reply per round; `None` once no more input can arrive
    fn feedback(&mut self) -> Result<Option<String>>;
}

/// Operator on a terminal (or any reader/writer pair)
pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
}

impl ConsoleOperator<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn present(&mut self, attempt: &Attempt, location: &Path) -> Result<()> {
        writeln!(
            self.output,
            "=== Day {} part {}, attempt {} ({}/{}) ===",
            attempt.day, attempt.part, attempt.number, attempt.provider, attempt.model
        )?;
        writeln!(self.output, "{}", attempt.source)?;
        writeln!(self.output, "=== saved to {} ===", location.display())?;
        self.output.flush()?;
        Ok(())
    }

    fn feedback(&mut self) -> Result<Option<String>> {
        write!(
            self.output,
            "\nDoes it work? Type 'yes' to accept, 'exit' to stop, or describe what went wrong:\n> "
        )?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| Error::from(e).with_operation("operator::feedback"))?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}
