//! Completion contract and the per-session completion state.

use core_text::TextSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    /// Shown in the menu.
    pub display: String,
    /// Secondary column, empty when there is nothing to show.
    pub meta: String,
    /// Inserted at the cursor when the item is selected.
    pub suffix: String,
}

impl CompletionItem {
    pub fn new(display: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            meta: String::new(),
            suffix: suffix.into(),
        }
    }

    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = meta.into();
        self
    }
}

pub trait Completer: Send + Sync {
    /// Suffix to insert immediately on a single completion keystroke, empty
    /// when there is no unambiguous completion.
    fn complete(&self, _snapshot: &TextSnapshot) -> String {
        String::new()
    }

    fn completions(&self, snapshot: &TextSnapshot) -> Vec<CompletionItem>;

    /// Open the menu after every insert.
    fn complete_while_typing(&self, _snapshot: &TextSnapshot) -> bool {
        false
    }
}

/// Offers nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCompletion;

impl Completer for NoCompletion {
    fn completions(&self, _snapshot: &TextSnapshot) -> Vec<CompletionItem> {
        Vec::new()
    }
}

/// Offers every word of a fixed list that extends the word before the cursor.
#[derive(Debug, Clone, Default)]
pub struct WordCompleter {
    words: Vec<String>,
    while_typing: bool,
}

impl WordCompleter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
            while_typing: false,
        }
    }

    pub fn while_typing(mut self, enabled: bool) -> Self {
        self.while_typing = enabled;
        self
    }

    fn current_word(snapshot: &TextSnapshot) -> String {
        let before = snapshot.current_line_before_cursor();
        let word: String = before
            .chars()
            .rev()
            .take_while(|c| !core_text::is_word_delimiter(*c))
            .collect();
        word.chars().rev().collect()
    }
}

impl Completer for WordCompleter {
    fn complete(&self, snapshot: &TextSnapshot) -> String {
        let items = self.completions(snapshot);
        match items.as_slice() {
            [only] => only.suffix.clone(),
            _ => String::new(),
        }
    }

    fn completions(&self, snapshot: &TextSnapshot) -> Vec<CompletionItem> {
        let word = Self::current_word(snapshot);
        if word.is_empty() {
            return Vec::new();
        }
        self.words
            .iter()
            .filter(|w| w.starts_with(&word) && w.len() > word.len())
            .map(|w| CompletionItem::new(w.clone(), &w[word.len()..]))
            .collect()
    }

    fn complete_while_typing(&self, _snapshot: &TextSnapshot) -> bool {
        self.while_typing
    }
}

/// Active completion: the snapshot it started from, the offered items and
/// the selected index (`None` means the original text is shown).
#[derive(Debug, Clone)]
pub struct CompletionState {
    pub original: TextSnapshot,
    pub items: Vec<CompletionItem>,
    pub index: Option<usize>,
}

impl CompletionState {
    pub fn new(original: TextSnapshot, items: Vec<CompletionItem>) -> Self {
        Self {
            original,
            items,
            index: None,
        }
    }

    pub fn current_suffix(&self) -> &str {
        self.index
            .and_then(|i| self.items.get(i))
            .map(|item| item.suffix.as_str())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_completer_extends_current_word() {
        let c = WordCompleter::new(["print", "println", "panic"]);
        let snap = TextSnapshot::at_end("x = pri");
        let items = c.completions(&snap);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].suffix, "ntln");
        assert_eq!(c.complete(&snap), "");
        assert_eq!(c.complete(&TextSnapshot::at_end("pa")), "nic");
        assert!(c.completions(&TextSnapshot::at_end("x ")).is_empty());
    }
}
