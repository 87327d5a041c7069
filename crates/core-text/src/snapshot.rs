//! Immutable text + cursor view.
//!
//! A `TextSnapshot` is built from the edit buffer once per render tick and
//! handed to tokenizers, completers and the screen composer. Offsets are
//! expressed in Unicode scalar values (`char`s), never bytes. The line index
//! (start offset and length per `\n`-separated line) is computed on first use
//! and cached for the lifetime of the snapshot.

use regex::Regex;
use std::sync::{LazyLock, OnceLock};

/// A run of characters that are neither whitespace nor one of `[]{}().`.
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\s\[\]\{\}\(\)\.]+").expect("word pattern is valid"));

const BRACKET_PAIRS: [(char, char); 4] = [('(', ')'), ('[', ']'), ('{', '}'), ('<', '>')];

/// Word delimiter used by word motions and word deletion.
pub fn is_word_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | '(' | ')' | '[' | ']' | '{' | '}')
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LineIndex {
    starts: Vec<usize>,
    lengths: Vec<usize>,
}

impl LineIndex {
    fn build(chars: &[char]) -> Self {
        let mut starts = vec![0];
        let mut lengths = Vec::new();
        let mut current = 0usize;
        for (i, &c) in chars.iter().enumerate() {
            if c == '\n' {
                lengths.push(current);
                starts.push(i + 1);
                current = 0;
            } else {
                current += 1;
            }
        }
        lengths.push(current);
        Self { starts, lengths }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextSnapshot {
    text: String,
    chars: Vec<char>,
    cursor: usize,
    index: OnceLock<LineIndex>,
}

impl PartialEq for TextSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.cursor == other.cursor
    }
}

impl Eq for TextSnapshot {}

impl TextSnapshot {
    /// Build a snapshot; the cursor is clamped into `[0, len]`.
    pub fn new(text: impl Into<String>, cursor: usize) -> Self {
        let text = text.into();
        let chars: Vec<char> = text.chars().collect();
        let cursor = cursor.min(chars.len());
        Self {
            text,
            chars,
            cursor,
            index: OnceLock::new(),
        }
    }

    /// Snapshot with the cursor parked after the last character.
    pub fn at_end(text: impl Into<String>) -> Self {
        Self::new(text, usize::MAX)
    }

    fn index(&self) -> &LineIndex {
        self.index.get_or_init(|| LineIndex::build(&self.chars))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Same text, different cursor.
    pub fn with_cursor(&self, cursor: usize) -> Self {
        Self {
            text: self.text.clone(),
            chars: self.chars.clone(),
            cursor: cursor.min(self.chars.len()),
            index: self.index.clone(),
        }
    }

    fn char_relative_to_cursor(&self, offset: isize) -> Option<char> {
        let index = self.cursor as isize + offset;
        if index < 0 {
            return None;
        }
        self.chars.get(index as usize).copied()
    }

    pub fn current_char(&self) -> Option<char> {
        self.char_relative_to_cursor(0)
    }

    pub fn char_before_cursor(&self) -> Option<char> {
        self.char_relative_to_cursor(-1)
    }

    pub fn text_before_cursor(&self) -> String {
        self.chars[..self.cursor].iter().collect()
    }

    pub fn text_after_cursor(&self) -> String {
        self.chars[self.cursor..].iter().collect()
    }

    pub fn current_line_before_cursor(&self) -> String {
        let start = self.index().starts[self.cursor_row()];
        self.chars[start..self.cursor].iter().collect()
    }

    pub fn current_line_after_cursor(&self) -> String {
        self.chars[self.cursor..]
            .iter()
            .take_while(|&&c| c != '\n')
            .collect()
    }

    pub fn current_line(&self) -> String {
        let mut line = self.current_line_before_cursor();
        line.push_str(&self.current_line_after_cursor());
        line
    }

    pub fn leading_whitespace_in_current_line(&self) -> String {
        self.current_line()
            .chars()
            .take_while(|c| c.is_whitespace())
            .collect()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    /// Lines from the cursor row to the end of the text.
    pub fn lines_from_current(&self) -> impl Iterator<Item = &str> {
        self.lines().skip(self.cursor_row())
    }

    pub fn line_count(&self) -> usize {
        self.index().starts.len()
    }

    /// Per-line length in characters, newline excluded.
    pub fn line_lengths(&self) -> &[usize] {
        &self.index().lengths
    }

    /// Offset of the first character of every line.
    pub fn line_start_offsets(&self) -> &[usize] {
        &self.index().starts
    }

    pub fn cursor_row(&self) -> usize {
        self.locate(self.cursor).0
    }

    pub fn cursor_col(&self) -> usize {
        self.locate(self.cursor).1
    }

    pub fn on_first_line(&self) -> bool {
        self.cursor_row() == 0
    }

    pub fn on_last_line(&self) -> bool {
        self.cursor_row() + 1 == self.line_count()
    }

    pub fn is_cursor_at_end(&self) -> bool {
        self.cursor == self.chars.len()
    }

    pub fn is_cursor_at_end_of_line(&self) -> bool {
        matches!(self.current_char(), None | Some('\n'))
    }

    /// Translate an offset into `(row, col)`. Offsets past the end clamp to it.
    pub fn locate(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.chars.len());
        let starts = &self.index().starts;
        let row = starts.partition_point(|&s| s <= offset).saturating_sub(1);
        (row, offset - starts[row])
    }

    /// Translate `(row, col)` into an offset; row and col clamp into the text.
    pub fn offset_from(&self, row: usize, col: usize) -> usize {
        let index = self.index();
        let row = row.min(index.starts.len() - 1);
        let col = col.min(index.lengths[row]);
        (index.starts[row] + col).min(self.chars.len())
    }

    /// Offset one line up, keeping the column when the previous line is long
    /// enough. `None` on the first line.
    pub fn cursor_up_position(&self) -> Option<usize> {
        let (row, col) = self.locate(self.cursor);
        if row == 0 {
            return None;
        }
        let previous_len = self.index().lengths[row - 1];
        if col > previous_len {
            Some(self.cursor - col - 1)
        } else {
            Some(self.cursor - previous_len - 1)
        }
    }

    /// Offset one line down, keeping the column when the next line is long
    /// enough. `None` on the last line.
    pub fn cursor_down_position(&self) -> Option<usize> {
        let (row, col) = self.locate(self.cursor);
        let index = self.index();
        if row + 1 >= index.starts.len() {
            return None;
        }
        let after_len = index.lengths[row] - col;
        let next_len = index.lengths[row + 1];
        Some(self.cursor + after_len + col.min(next_len) + 1)
    }

    /// Relative (non-positive) distance to the start of the word before the
    /// cursor, or 0 when there is none.
    pub fn find_start_of_previous_word(&self) -> isize {
        let before = self.text_before_cursor();
        match WORD.find_iter(&before).last() {
            Some(m) => {
                let start = before[..m.start()].chars().count();
                -((self.cursor - start) as isize)
            }
            None => 0,
        }
    }

    /// Distance to the start of the next word after the cursor (skipping the
    /// word under the cursor), or 0 when there is none.
    pub fn find_next_word_beginning(&self) -> usize {
        let after = self.text_after_cursor();
        WORD.find_iter(&after)
            .find(|m| m.start() > 0)
            .map(|m| after[..m.start()].chars().count())
            .unwrap_or(0)
    }

    /// Distance to the end of the next word. When `include_current` is false
    /// the character under the cursor is skipped first.
    pub fn find_next_word_ending(&self, include_current: bool) -> usize {
        let skip = usize::from(!include_current);
        let mut step = 0;
        let mut in_word = false;
        for &c in self.chars[self.cursor..].iter().skip(skip) {
            if is_word_delimiter(c) {
                if in_word {
                    break;
                }
            } else {
                in_word = true;
            }
            step += 1;
        }
        step + skip
    }

    pub fn has_match_at_cursor(&self, sub: &str) -> bool {
        let sub: Vec<char> = sub.chars().collect();
        self.chars[self.cursor..].starts_with(&sub)
    }

    /// Offset of the bracket matching the one under the cursor.
    pub fn matching_bracket_position(&self) -> Option<usize> {
        let current = self.current_char()?;
        for (left, right) in BRACKET_PAIRS {
            if current == left {
                let mut depth = 1usize;
                for (i, &c) in self.chars.iter().enumerate().skip(self.cursor + 1) {
                    if c == left {
                        depth += 1;
                    } else if c == right {
                        depth -= 1;
                        if depth == 0 {
                            return Some(i);
                        }
                    }
                }
                return None;
            }
            if current == right {
                let mut depth = 1usize;
                for i in (0..self.cursor).rev() {
                    let c = self.chars[i];
                    if c == right {
                        depth += 1;
                    } else if c == left {
                        depth -= 1;
                        if depth == 0 {
                            return Some(i);
                        }
                    }
                }
                return None;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn locate_second_line() {
        let text = "line 1\nline 2\n";
        let cursor = "line 1\nlin".chars().count();
        let snap = TextSnapshot::new(text, cursor);
        assert_eq!(snap.cursor_row(), 1);
        assert_eq!(snap.cursor_col(), 3);
        assert_eq!(snap.line_count(), 3);
        assert_eq!(snap.line_lengths(), &[6, 6, 0]);
        assert_eq!(snap.line_start_offsets(), &[0, 7, 14]);
    }

    #[test]
    fn offset_from_clamps() {
        let snap = TextSnapshot::new("ab\ncdef", 0);
        assert_eq!(snap.offset_from(0, 10), 2);
        assert_eq!(snap.offset_from(9, 1), 4);
        assert_eq!(snap.offset_from(1, 99), 7);
    }

    #[test]
    fn current_line_pieces() {
        let snap = TextSnapshot::new("first\n  second line\nthird", 12);
        assert_eq!(snap.current_line_before_cursor(), "  sec");
        assert_eq!(snap.current_line_after_cursor(), "ond line");
        assert_eq!(snap.leading_whitespace_in_current_line(), "  ");
        assert_eq!(
            snap.lines_from_current().collect::<Vec<_>>(),
            vec!["  second line", "third"]
        );
        assert!(!snap.on_first_line());
        assert!(!snap.on_last_line());
    }

    #[test]
    fn vertical_positions_keep_column() {
        // cursor at col 4 of "abcdef"
        let snap = TextSnapshot::new("ab\nabcdef\nabcdefgh", 7);
        assert_eq!(snap.cursor_up_position(), Some(2));
        assert_eq!(snap.cursor_down_position(), Some(14));
        let first = TextSnapshot::new("ab\ncd", 1);
        assert_eq!(first.cursor_up_position(), None);
        assert_eq!(first.cursor_down_position(), Some(4));
        let last = TextSnapshot::new("ab\ncd", 4);
        assert_eq!(last.cursor_down_position(), None);
    }

    #[test]
    fn word_finders() {
        let snap = TextSnapshot::new("foo.bar  baz", 12);
        assert_eq!(snap.find_start_of_previous_word(), -3);
        let snap = TextSnapshot::new("foo.bar  baz", 0);
        assert_eq!(snap.find_next_word_beginning(), 4);
        assert_eq!(snap.find_next_word_ending(true), 3);
        let snap = TextSnapshot::new("   ", 3);
        assert_eq!(snap.find_start_of_previous_word(), 0);
        assert_eq!(snap.find_next_word_beginning(), 0);
    }

    #[test]
    fn next_word_ending_skips_current() {
        let snap = TextSnapshot::new("ab cd", 1);
        assert_eq!(snap.find_next_word_ending(false), 4);
    }

    #[test]
    fn brackets_match_both_directions() {
        let snap = TextSnapshot::new("f(a, (b))", 1);
        assert_eq!(snap.matching_bracket_position(), Some(8));
        let snap = TextSnapshot::new("f(a, (b))", 7);
        assert_eq!(snap.matching_bracket_position(), Some(5));
        let snap = TextSnapshot::new("f(a", 1);
        assert_eq!(snap.matching_bracket_position(), None);
    }

    #[test]
    fn match_at_cursor() {
        let snap = TextSnapshot::new("hello", 2);
        assert!(snap.has_match_at_cursor("ll"));
        assert!(!snap.has_match_at_cursor("llox"));
    }

    proptest! {
        #[test]
        fn locate_then_offset_round_trips(text in "[a-c\n✓字]{0,40}", frac in 0.0f64..=1.0) {
            let len = text.chars().count();
            let cursor = ((len as f64) * frac).round() as usize;
            let snap = TextSnapshot::new(text, cursor);
            let (row, col) = snap.locate(cursor);
            prop_assert_eq!(snap.offset_from(row, col), cursor);
        }
    }
}
