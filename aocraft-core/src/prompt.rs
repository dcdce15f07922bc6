//! # Prompt assembly
//!
//! Turns a puzzle context and the conversation so far into the ordered
//! message sequence a provider sees:
//!
//! 1. fixed system instructions (output contract)
//! 2. the puzzle: description plus a bounded input sample, or for part 2 the
//!    accepted part 1 program to extend
//! 3. every history turn, attempts as assistant code blocks and feedback as
//!    user messages
//! 4. a closing directive naming the part being solved
//!
//! Assembly happens in two steps. [`PromptAssembler::template`] splices the
//! puzzle and history text into message templates that still contain
//! `{placeholder}` slots; [`PromptTemplate::render`] then fills the slots.
//! Puzzle text and generated code are full of braces, so every brace in them
//! is doubled by [`escape`] before splicing and collapsed again by the render
//! pass, so the provider sees the text exactly as written.

use crate::error::{Error, Result};
use crate::provider::{ChatMessage, Role};
use crate::puzzle::{Part, PuzzleContext};
use crate::session::{ConversationHistory, ConversationTurn};
use std::collections::HashMap;

const SYSTEM_TEMPLATE: &str = "You are an expert {language} programmer helping to solve Advent of Code puzzles.
Generate a complete {language} solution for the given puzzle description.
The solution should:
1. Be complete and self-contained, runnable as a single file
2. Be well-commented and clearly explain the approach
3. Read the puzzle input from the file `{input_path}`, relative to the working directory
4. Parse the input file correctly
5. Print the final answer

Return only the {language} code, no explanations before or after.";

const DIRECTIVE_TEMPLATE: &str = "You are currently solving Part {part} of day {day}.

Please generate a {language} solution to solve this puzzle.";

/// Knobs for the rendered prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    /// How many characters of the puzzle input to show as a sample
    pub sample_limit: usize,
    /// Language named in the instructions
    pub language: String,
    /// Info string for code fences
    pub fence: String,
    /// File extension for persisted attempts
    pub extension: String,
    /// Where the generated program should read its input
    pub input_path: String,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            sample_limit: 200,
            language: "Python".into(),
            fence: "python".into(),
            extension: "py".into(),
            input_path: "input/input.txt".into(),
        }
    }
}

/// Double every brace so the text survives a render pass unchanged
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '{' => out.push_str("{{"),
            '}' => out.push_str("}}"),
            _ => out.push(c),
        }
    }
    out
}

/// Collapse doubled braces; inverse of [`escape`]
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if (c == '{' || c == '}') && chars.peek() == Some(&c) {
            chars.next();
        }
    }
    out
}

/// One message whose text still has placeholders and escaped braces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMessage {
    pub role: Role,
    pub template: String,
}

/// A message sequence waiting for its placeholders to be filled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptTemplate {
    messages: Vec<TemplateMessage>,
}

impl PromptTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: Role, template: impl Into<String>) {
        self.messages.push(TemplateMessage {
            role,
            template: template.into(),
        });
    }

    pub fn messages(&self) -> &[TemplateMessage] {
        &self.messages
    }

    /// Fill placeholders and collapse escaped braces.
    ///
    /// Fails on a placeholder with no value or a lone `}`.
    pub fn render(&self, vars: &HashMap<&str, String>) -> Result<Vec<ChatMessage>> {
        self.messages
            .iter()
            .map(|m| {
                Ok(ChatMessage::new(m.role, render_text(&m.template, vars)?))
            })
            .collect()
    }
}

fn render_text(template: &str, vars: &HashMap<&str, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed {
                    return Err(Error::template_failed(name)
                        .with_operation("prompt::render")
                        .with_context("reason", "unterminated placeholder"));
                }
                let value = vars
                    .get(name.as_str())
                    .ok_or_else(|| Error::template_failed(name.clone()).with_operation("prompt::render"))?;
                out.push_str(value);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => {
                return Err(Error::template_failed("}")
                    .with_operation("prompt::render")
                    .with_context("reason", "single '}' in template"));
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Builds provider prompts from a puzzle and its conversation history.
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    options: PromptOptions,
}

impl PromptAssembler {
    pub fn new(options: PromptOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PromptOptions {
        &self.options
    }

    /// Render the full message sequence. Pure: same inputs, same output.
    pub fn render(&self, context: &PuzzleContext, history: &ConversationHistory) -> Result<Vec<ChatMessage>> {
        self.template(context, history).render(&self.variables(context))
    }

    /// Placeholder values available to every template
    pub fn variables(&self, context: &PuzzleContext) -> HashMap<&'static str, String> {
        HashMap::from([
            ("day", context.day().to_string()),
            ("part", context.part().to_string()),
            ("language", self.options.language.clone()),
            ("input_path", self.options.input_path.clone()),
        ])
    }

    /// Splice escaped puzzle and history text into the message templates
    pub fn template(&self, context: &PuzzleContext, history: &ConversationHistory) -> PromptTemplate {
        let mut template = PromptTemplate::new();
        template.push(Role::System, SYSTEM_TEMPLATE);
        template.push(Role::User, self.context_message(context));

        for turn in history.turns() {
            match turn {
                ConversationTurn::AssistantAttempt { text, .. } => {
                    template.push(Role::Assistant, self.code_block(text));
                }
                ConversationTurn::HumanFeedback { text } => {
                    template.push(
                        Role::User,
                        format!(
                            "That solution did not produce the accepted answer. \
                             Feedback from running it:\n{}\n\n\
                             Fix the problem and return the complete corrected program.",
                            escape(text)
                        ),
                    );
                }
            }
        }

        template.push(Role::User, DIRECTIVE_TEMPLATE);
        template
    }

    fn context_message(&self, context: &PuzzleContext) -> String {
        let sample: String = context
            .sample_input()
            .chars()
            .take(self.options.sample_limit)
            .collect();

        let puzzle = format!(
            "Here is the puzzle description:\n{}\n\n\
             Here is a sample of the input format (first {} characters only):\n{}",
            escape(context.description()),
            self.options.sample_limit,
            escape(&sample)
        );

        match (context.part(), context.prior_solution()) {
            (Part::Two, Some(prior)) => format!(
                "{}\n\n\
                 Here is the accepted solution for Part 1:\n{}\n\n\
                 Extend this solution to also solve Part 2 rather than writing a new one. \
                 Keep its existing helper functions, and keep it able to compute and print \
                 the Part 1 answer alongside the Part 2 answer.",
                puzzle,
                self.code_block(prior)
            ),
            _ => puzzle,
        }
    }

    /// Fence `code` unchanged; a newline is added only when it lacks one
    fn code_block(&self, code: &str) -> String {
        let newline = if code.ends_with('\n') { "" } else { "\n" };
        format!("```{}\n{}{}```", self.options.fence, escape(code), newline)
    }
}
