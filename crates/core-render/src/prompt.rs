//! Prompt tokens drawn before the input and at the start of continuation lines.

use core_text::{TextSnapshot, Token, TokenType, str_width};

pub trait Prompt: Send + Sync {
    fn prompt(&self, snapshot: &TextSnapshot) -> Vec<Token>;

    /// Tokens starting every line after the first. Defaults to dots under the
    /// visible prompt text padded with spaces to the prompt's full width.
    fn second_line_prefix(&self, snapshot: &TextSnapshot) -> Vec<Token> {
        second_line_prefix_for(&self.prompt(snapshot))
    }
}

pub fn second_line_prefix_for(prompt: &[Token]) -> Vec<Token> {
    let text: String = prompt.iter().map(|t| t.literal.as_str()).collect();
    let total = str_width(&text);
    let visible = str_width(text.trim_end());
    vec![
        Token::new(TokenType::PROMPT_SECOND_LINE_PREFIX, ".".repeat(visible)),
        Token::new(TokenType::PROMPT_SECOND_LINE_PREFIX, " ".repeat(total - visible)),
    ]
}

/// Static prompt text, `"> "` by default.
#[derive(Debug, Clone)]
pub struct BasePrompt {
    text: String,
}

impl Default for BasePrompt {
    fn default() -> Self {
        Self::new("> ")
    }
}

impl BasePrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Prompt for BasePrompt {
    fn prompt(&self, _snapshot: &TextSnapshot) -> Vec<Token> {
        vec![Token::new(TokenType::PROMPT, self.text.clone())]
    }
}
