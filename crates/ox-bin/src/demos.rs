//! The sample programs selectable with `--demo`.

use clap::ValueEnum;
use oxline::{
    Prompt, SessionOptions, TextSnapshot, TickEventSource, Token, TokenType, Tokenizer,
    WordCompleter,
};
use std::time::Duration;

const ANIMALS: &[&str] = &[
    "bat",
    "bear",
    "beaver",
    "bee",
    "bison",
    "butterfly",
    "cat",
    "chicken",
    "crocodile",
    "dinosaur",
    "dog",
    "dolphin",
    "dove",
    "duck",
    "eagle",
    "elephant",
    "fish",
    "goat",
    "gorilla",
    "kangaroo",
    "leopard",
    "lion",
    "mouse",
    "rabbit",
    "rat",
    "snake",
    "spider",
    "turkey",
    "turtle",
];

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    /// Echo every accepted line.
    Echo,
    /// Prompt with the wall clock, redrawn every second.
    Clock,
    /// Tab completion over a word list.
    Complete,
    /// Multi-line input, finished by an empty line.
    Multiline,
}

impl Demo {
    pub fn configure(self, options: SessionOptions) -> SessionOptions {
        match self {
            Demo::Echo => options,
            Demo::Clock => options
                .with_prompt(ClockPrompt)
                .with_source(TickEventSource::new(Duration::from_secs(1))),
            Demo::Complete => options.with_completer(WordCompleter::new(ANIMALS.iter().copied())),
            Demo::Multiline => SessionOptions {
                auto_indent: true,
                ..options.with_tokenizer(ParagraphTokenizer)
            },
        }
    }

    /// Printed once before the first read.
    pub fn banner(self) -> Option<&'static str> {
        match self {
            Demo::Echo | Demo::Clock => None,
            Demo::Complete => Some("Press tab to complete"),
            Demo::Multiline => Some("Press enter on an empty line to finish"),
        }
    }
}

/// `HH:MM:SS Enter something: `, re-evaluated at every render.
pub struct ClockPrompt;

impl Prompt for ClockPrompt {
    fn prompt(&self, _snapshot: &TextSnapshot) -> Vec<Token> {
        let now = chrono::Local::now().format("%H:%M:%S");
        vec![Token::new(
            TokenType::PROMPT,
            format!("{now} Enter something: "),
        )]
    }
}

/// Keeps reading lines until the input ends with an empty one.
pub struct ParagraphTokenizer;

impl Tokenizer for ParagraphTokenizer {
    fn tokens(&self, snapshot: &TextSnapshot) -> Vec<Token> {
        if snapshot.is_empty() {
            return Vec::new();
        }
        vec![Token::new(TokenType::TEXT, snapshot.text())]
    }

    fn continues_input(&self, snapshot: &TextSnapshot) -> bool {
        let text = snapshot.text().trim_end_matches([' ', '\t']);
        !text.is_empty() && !text.ends_with('\n')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn paragraphs_end_at_an_empty_line() {
        let continues = |text: &str| ParagraphTokenizer.continues_input(&TextSnapshot::at_end(text));
        assert!(!continues(""));
        assert!(!continues("   "));
        assert!(continues("first"));
        assert!(continues("first\nsecond"));
        assert!(!continues("first\n"));
        assert!(!continues("first\n    "));
    }

    #[test]
    fn clock_prompt_shows_the_time() {
        let tokens = ClockPrompt.prompt(&TextSnapshot::default());
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenType::PROMPT);
        let (time, rest) = tokens[0].literal.split_at(8);
        assert_eq!(rest, " Enter something: ");
        assert_eq!(time.matches(':').count(), 2);
    }

    #[test]
    fn only_multiline_indents() {
        assert!(Demo::Multiline.configure(SessionOptions::default()).auto_indent);
        assert!(!Demo::Complete.configure(SessionOptions::default()).auto_indent);
        assert_eq!(Demo::Complete.banner(), Some("Press tab to complete"));
    }
}
