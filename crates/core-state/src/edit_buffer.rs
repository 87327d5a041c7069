//! Rope-backed live editing state: text, cursor and undo stack.
//!
//! Positions are character offsets. Every insert/delete clamps out-of-range
//! positions and counts instead of failing.

use crate::undo::UndoStack;
use core_text::TextSnapshot;
use ropey::Rope;
use tracing::trace;

#[derive(Debug, Default)]
pub struct EditBuffer {
    rope: Rope,
    cursor: usize,
    undo: UndoStack,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let cursor = rope.len_chars();
        Self {
            rope,
            cursor,
            undo: UndoStack::new(),
        }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.rope.len_chars());
    }

    fn set_cursor_signed(&mut self, pos: isize) {
        self.set_cursor(pos.max(0) as usize);
    }

    pub fn snapshot(&self) -> TextSnapshot {
        TextSnapshot::new(self.text(), self.cursor)
    }

    /// Replace the whole text; the cursor is clamped into the new text.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.cursor = self.cursor.min(self.rope.len_chars());
    }

    /// Empty text, cursor at 0, undo stack cleared.
    pub fn reset(&mut self) {
        self.rope = Rope::new();
        self.cursor = 0;
        self.undo.clear();
    }

    // ---- undo -------------------------------------------------------------

    pub fn save_to_undo_stack(&mut self) {
        self.undo.save(&self.rope, self.cursor);
    }

    /// Restore the most recently saved entry. Returns false when the stack is empty.
    pub fn undo(&mut self) -> bool {
        match self.undo.pop() {
            Some(entry) => {
                self.rope = entry.text;
                self.set_cursor(entry.cursor);
                true
            }
            None => false,
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.depth()
    }

    // ---- cursor movement --------------------------------------------------

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.rope.len_chars();
    }

    pub fn cursor_left(&mut self, count: usize) {
        self.cursor = self.cursor.saturating_sub(count);
    }

    pub fn cursor_right(&mut self, count: usize) {
        self.set_cursor(self.cursor.saturating_add(count));
    }

    pub fn cursor_up(&mut self) {
        if let Some(pos) = self.snapshot().cursor_up_position() {
            self.set_cursor(pos);
        }
    }

    pub fn cursor_down(&mut self) {
        if let Some(pos) = self.snapshot().cursor_down_position() {
            self.set_cursor(pos);
        }
    }

    pub fn cursor_word_back(&mut self) {
        let delta = self.snapshot().find_start_of_previous_word();
        self.set_cursor_signed(self.cursor as isize + delta);
    }

    pub fn cursor_word_forward(&mut self) {
        let delta = self.snapshot().find_next_word_beginning();
        self.set_cursor(self.cursor + delta);
    }

    /// Move onto the last character of the next word.
    pub fn cursor_to_end_of_word(&mut self) {
        let pos = self.snapshot().find_next_word_ending(false);
        if pos > 1 {
            self.set_cursor(self.cursor + pos - 1);
        }
    }

    pub fn cursor_to_end_of_line(&mut self) {
        let count = self.snapshot().current_line_after_cursor().chars().count();
        self.set_cursor(self.cursor + count);
    }

    /// Move to the start of the line, or to its first non-blank character
    /// when `after_whitespace` is set.
    pub fn cursor_to_start_of_line(&mut self, after_whitespace: bool) {
        let snap = self.snapshot();
        let col = snap.current_line_before_cursor().chars().count();
        self.cursor -= col;
        if after_whitespace {
            let ws = snap.leading_whitespace_in_current_line().chars().count();
            self.set_cursor(self.cursor + ws);
        }
    }

    // ---- editing ----------------------------------------------------------

    /// Insert `data` at the cursor.
    pub fn insert_text(&mut self, data: &str, move_cursor: bool) {
        self.rope.insert(self.cursor, data);
        if move_cursor {
            self.cursor += data.chars().count();
        }
    }

    /// Replace characters from the cursor onwards, never past the end of the
    /// current line.
    pub fn overwrite_text(&mut self, data: &str, move_cursor: bool) {
        let count = data.chars().count();
        let line_rest = self.snapshot().current_line_after_cursor().chars().count();
        let replaced = count.min(line_rest);
        self.rope.remove(self.cursor..self.cursor + replaced);
        self.insert_text(data, move_cursor);
    }

    fn remove(&mut self, start: usize, count: usize) -> String {
        let start = start.min(self.rope.len_chars());
        let end = start.saturating_add(count).min(self.rope.len_chars());
        let removed = self.rope.slice(start..end).to_string();
        self.rope.remove(start..end);
        trace!(target: "state.edit", start, end, "remove_chars");
        removed
    }

    /// Delete up to `count` characters before the cursor and return them.
    pub fn delete_before(&mut self, count: usize) -> String {
        if self.cursor == 0 {
            return String::new();
        }
        let start = self.cursor.saturating_sub(count);
        let removed = self.remove(start, self.cursor - start);
        self.cursor = start;
        removed
    }

    /// Delete up to `count` characters after the cursor and return them.
    pub fn delete_after(&mut self, count: usize) -> String {
        if self.cursor >= self.rope.len_chars() {
            return String::new();
        }
        self.remove(self.cursor, count)
    }

    /// Delete from the cursor to the start of the next word.
    pub fn delete_word(&mut self) -> String {
        let count = self.snapshot().find_next_word_beginning();
        self.delete_after(count)
    }

    pub fn delete_word_before_cursor(&mut self) -> String {
        let count = -self.snapshot().find_start_of_previous_word();
        if count > 0 {
            self.delete_before(count as usize)
        } else {
            String::new()
        }
    }

    pub fn delete_until_end_of_line(&mut self) -> String {
        let count = self.snapshot().current_line_after_cursor().chars().count();
        self.delete_after(count)
    }

    pub fn delete_from_start_of_line(&mut self) -> String {
        let count = self.snapshot().current_line_before_cursor().chars().count();
        self.delete_before(count)
    }

    /// Remove the cursor's line and park the cursor on the first non-blank
    /// character of the line that takes its place.
    pub fn delete_current_line(&mut self) -> String {
        let snap = self.snapshot();
        let row = snap.cursor_row();
        let deleted = snap.current_line();
        let mut lines: Vec<&str> = snap.lines().collect();
        lines.remove(row);
        self.rope = Rope::from_str(&lines.join("\n"));
        let after = TextSnapshot::new(self.text(), 0);
        self.cursor = after.offset_from(row, 0);
        self.cursor_to_start_of_line(true);
        deleted
    }

    pub fn join_next_line(&mut self) {
        self.cursor_to_end_of_line();
        self.delete_after(1);
    }

    /// Swap the two characters before the cursor.
    pub fn swap_characters_before_cursor(&mut self) {
        if self.cursor < 2 {
            return;
        }
        let a = self.rope.char(self.cursor - 2);
        let b = self.rope.char(self.cursor - 1);
        self.rope.remove(self.cursor - 2..self.cursor);
        let mut swapped = String::with_capacity(8);
        swapped.push(b);
        swapped.push(a);
        self.rope.insert(self.cursor - 2, &swapped);
    }

    pub fn insert_line_above(&mut self, copy_margin: bool) {
        let insert = if copy_margin {
            self.snapshot().leading_whitespace_in_current_line() + "\n"
        } else {
            "\n".to_string()
        };
        self.cursor_to_start_of_line(false);
        self.insert_text(&insert, true);
        self.cursor -= 1;
    }

    pub fn insert_line_below(&mut self, copy_margin: bool) {
        let insert = if copy_margin {
            "\n".to_string() + &self.snapshot().leading_whitespace_in_current_line()
        } else {
            "\n".to_string()
        };
        self.cursor_to_end_of_line();
        self.insert_text(&insert, true);
    }

    pub fn goto_matching_bracket(&mut self) {
        if let Some(pos) = self.snapshot().matching_bracket_position() {
            self.set_cursor(pos);
        }
    }

    /// Apply `f` to lines `[start, end)`; out-of-range indices are ignored.
    pub fn transform_lines(&mut self, start: usize, end: usize, f: impl Fn(&str) -> String) {
        let text = self.text();
        let lines: Vec<String> = text
            .split('\n')
            .enumerate()
            .map(|(i, line)| {
                if i >= start && i < end {
                    f(line)
                } else {
                    line.to_string()
                }
            })
            .collect();
        self.set_text(&lines.join("\n"));
    }

    /// Apply `f` to the characters in `[from, to)`.
    pub fn transform_region(&mut self, from: usize, to: usize, f: impl Fn(&str) -> String) {
        let len = self.rope.len_chars();
        let (from, to) = (from.min(len), to.min(len));
        if from >= to {
            return;
        }
        let transformed = f(&self.rope.slice(from..to).to_string());
        self.rope.remove(from..to);
        self.rope.insert(from, &transformed);
        self.set_cursor(self.cursor);
    }

    /// Remove the characters in `[start, end)` and put the cursor at `start`.
    pub fn delete_range(&mut self, start: usize, end: usize) -> String {
        let removed = self.remove(start, end.saturating_sub(start));
        self.set_cursor(start);
        removed
    }
}
