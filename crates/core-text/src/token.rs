//! Token types and the tokenizer contract.
//!
//! Token types form a dotted hierarchy (`literal.string.double` is a child of
//! `literal.string`), which the style schema uses for parent fallback.

use crate::TextSnapshot;
use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenType(Cow<'static, str>);

impl TokenType {
    pub const UNSPECIFIC: TokenType = TokenType::from_static("unspecific");
    pub const TEXT: TokenType = TokenType::from_static("text");
    pub const WHITESPACE: TokenType = TokenType::from_static("whitespace");
    pub const ERROR: TokenType = TokenType::from_static("error");
    pub const KEYWORD: TokenType = TokenType::from_static("keyword");
    pub const KEYWORD_CONSTANT: TokenType = TokenType::from_static("keyword.constant");
    pub const KEYWORD_DECLARATION: TokenType = TokenType::from_static("keyword.declaration");
    pub const NAME: TokenType = TokenType::from_static("name");
    pub const NAME_BUILTIN: TokenType = TokenType::from_static("name.builtin");
    pub const NAME_FUNCTION: TokenType = TokenType::from_static("name.function");
    pub const LITERAL: TokenType = TokenType::from_static("literal");
    pub const STRING: TokenType = TokenType::from_static("literal.string");
    pub const STRING_DOUBLE: TokenType = TokenType::from_static("literal.string.double");
    pub const NUMBER: TokenType = TokenType::from_static("literal.number");
    pub const NUMBER_INTEGER: TokenType = TokenType::from_static("literal.number.integer");
    pub const OPERATOR: TokenType = TokenType::from_static("operator");
    pub const PUNCTUATION: TokenType = TokenType::from_static("punctuation");
    pub const COMMENT: TokenType = TokenType::from_static("comment");
    pub const COMMENT_SINGLE: TokenType = TokenType::from_static("comment.single");

    pub const PROMPT: TokenType = TokenType::from_static("prompt");
    pub const PROMPT_SECOND_LINE_PREFIX: TokenType =
        TokenType::from_static("prompt.second_line_prefix");

    pub const COMPLETION_MENU: TokenType = TokenType::from_static("completion_menu");
    pub const COMPLETION_MENU_COMPLETION: TokenType =
        TokenType::from_static("completion_menu.completion");
    pub const COMPLETION_MENU_COMPLETION_CURRENT: TokenType =
        TokenType::from_static("completion_menu.completion_current");
    pub const COMPLETION_MENU_META: TokenType = TokenType::from_static("completion_menu.meta");
    pub const COMPLETION_MENU_META_CURRENT: TokenType =
        TokenType::from_static("completion_menu.meta_current");
    pub const COMPLETION_MENU_PROGRESS_BAR: TokenType =
        TokenType::from_static("completion_menu.progress_bar");
    pub const COMPLETION_MENU_PROGRESS_BUTTON: TokenType =
        TokenType::from_static("completion_menu.progress_button");

    pub const SELECTION: TokenType = TokenType::from_static("selection");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `child` lies strictly below `self` in the dotted hierarchy.
    pub fn has_child(&self, child: &TokenType) -> bool {
        child
            .as_str()
            .strip_prefix(self.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }

    /// Parent type (`a.b.c` -> `a.b`), `None` at the root.
    pub fn parent(&self) -> Option<TokenType> {
        self.as_str()
            .rsplit_once('.')
            .map(|(parent, _)| TokenType::new(parent))
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenType {
    fn from(value: &str) -> Self {
        TokenType::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenType,
    pub literal: String,
}

impl Token {
    pub fn new(kind: TokenType, literal: impl Into<String>) -> Self {
        Self {
            kind,
            literal: literal.into(),
        }
    }
}

/// Splits a snapshot into styled tokens.
///
/// The concatenated literals must equal the snapshot text exactly (all
/// whitespace included); screen coordinate mapping relies on it. Violations
/// misplace the cursor but never panic.
pub trait Tokenizer: Send + Sync {
    fn tokens(&self, snapshot: &TextSnapshot) -> Vec<Token>;

    /// Whether Enter should insert a newline instead of accepting the input.
    fn continues_input(&self, _snapshot: &TextSnapshot) -> bool {
        false
    }
}

/// Emits the whole text as one `text` token.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTokenizer;

impl Tokenizer for PlainTokenizer {
    fn tokens(&self, snapshot: &TextSnapshot) -> Vec<Token> {
        if snapshot.is_empty() {
            return Vec::new();
        }
        vec![Token::new(TokenType::TEXT, snapshot.text())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy() {
        assert!(TokenType::LITERAL.has_child(&TokenType::STRING_DOUBLE));
        assert!(TokenType::STRING.has_child(&TokenType::STRING_DOUBLE));
        assert!(!TokenType::STRING.has_child(&TokenType::STRING));
        assert!(!TokenType::new("lit").has_child(&TokenType::LITERAL));
        assert_eq!(TokenType::STRING_DOUBLE.parent(), Some(TokenType::STRING));
        assert_eq!(TokenType::TEXT.parent(), None);
    }

    #[test]
    fn plain_tokenizer_preserves_text() {
        let snap = TextSnapshot::new("a b\n c", 0);
        let joined: String = PlainTokenizer
            .tokens(&snap)
            .into_iter()
            .map(|t| t.literal)
            .collect();
        assert_eq!(joined, "a b\n c");
    }
}
