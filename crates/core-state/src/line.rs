//! Session-level editing state layered over `EditBuffer`: line mode, the
//! completion state machine, the history working set and the accepted flag.
//!
//! The working set is the history entries followed by the current draft.
//! Navigating history swaps the buffer text for another working entry while
//! keeping edits made to the entry being left, so returning to the draft
//! restores whatever was typed.

use crate::completion::{Completer, CompletionItem, CompletionState};
use crate::edit_buffer::EditBuffer;
use crate::history::History;
use anyhow::Result;
use core_text::{TextSnapshot, Token, Tokenizer};
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
    Normal,
    Complete,
}

pub struct Line {
    buffer: EditBuffer,
    mode: LineMode,
    completion: Option<CompletionState>,
    history: Box<dyn History>,
    working_lines: Vec<String>,
    working_index: usize,
    auto_indent: bool,
    accepted: bool,
    /// Input selection `[start, end)` made with the mouse; typing replaces it.
    selection: Option<(usize, usize)>,
    selection_cancelled: bool,
    completer: Arc<dyn Completer>,
    tokenizer: Arc<dyn Tokenizer>,
}

impl Line {
    pub fn new(
        history: Box<dyn History>,
        completer: Arc<dyn Completer>,
        tokenizer: Arc<dyn Tokenizer>,
        auto_indent: bool,
    ) -> Self {
        let mut line = Self {
            buffer: EditBuffer::new(),
            mode: LineMode::Normal,
            completion: None,
            history,
            working_lines: Vec::new(),
            working_index: 0,
            auto_indent,
            accepted: false,
            selection: None,
            selection_cancelled: false,
            completer,
            tokenizer,
        };
        line.reset();
        line
    }

    /// Start a fresh input: empty buffer, normal mode, working set rebuilt
    /// from history.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.mode = LineMode::Normal;
        self.completion = None;
        self.accepted = false;
        self.selection = None;
        self.working_lines = self.history.get_all().to_vec();
        self.working_lines.push(String::new());
        self.working_index = self.working_lines.len() - 1;
        trace!(target: "state.line", working = self.working_lines.len(), "line_reset");
    }

    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut EditBuffer {
        &mut self.buffer
    }

    pub fn snapshot(&self) -> TextSnapshot {
        self.buffer.snapshot()
    }

    pub fn tokens(&self, snapshot: &TextSnapshot) -> Vec<Token> {
        self.tokenizer.tokens(snapshot)
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn has_text(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn mode(&self) -> LineMode {
        self.mode
    }

    /// Completion state while in `Complete` mode.
    pub fn completion(&self) -> Option<&CompletionState> {
        match self.mode {
            LineMode::Complete => self.completion.as_ref(),
            LineMode::Normal => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn auto_indent(&self) -> bool {
        self.auto_indent
    }

    pub fn set_auto_indent(&mut self, enabled: bool) {
        self.auto_indent = enabled;
    }

    pub fn history(&self) -> &dyn History {
        self.history.as_ref()
    }

    pub fn save_to_undo_stack(&mut self) {
        self.buffer.save_to_undo_stack();
    }

    pub fn undo(&mut self) {
        self.buffer.undo();
    }

    // ---- modes ------------------------------------------------------------

    /// Leave completion mode keeping the selected completion.
    pub fn to_normal_mode(&mut self) {
        if self.mode == LineMode::Complete {
            self.accept_complete();
        }
    }

    // ---- vertical movement and history ------------------------------------

    /// Previous completion, line above, or previous history entry.
    pub fn auto_up(&mut self) {
        if self.mode == LineMode::Complete {
            self.complete_previous(1);
        } else if self.snapshot().cursor_row() > 0 {
            self.buffer.cursor_up();
        } else {
            self.history_backward();
        }
    }

    /// Next completion, line below, or next history entry.
    pub fn auto_down(&mut self) {
        if self.mode == LineMode::Complete {
            self.complete_next(1);
        } else if !self.snapshot().on_last_line() {
            self.buffer.cursor_down();
        } else {
            self.history_forward();
        }
    }

    fn load_working_line(&mut self, index: usize) {
        self.working_lines[self.working_index] = self.buffer.text();
        self.working_index = index;
        let text = self.working_lines[index].clone();
        self.buffer.set_text(&text);
        self.buffer.end();
        debug!(target: "state.history", index, "history_select");
    }

    pub fn history_forward(&mut self) {
        if self.working_index + 1 < self.working_lines.len() {
            self.load_working_line(self.working_index + 1);
        }
    }

    pub fn history_backward(&mut self) {
        if self.working_index > 0 {
            self.load_working_line(self.working_index - 1);
        }
    }

    // ---- enter ------------------------------------------------------------

    pub fn is_multiline(&self) -> bool {
        self.tokenizer.continues_input(&self.snapshot())
    }

    /// Insert a newline, copying the current indentation when auto-indent is on.
    pub fn newline(&mut self) {
        let indent = self.snapshot().leading_whitespace_in_current_line();
        self.buffer.insert_text("\n", true);
        if self.auto_indent {
            self.buffer.insert_text(&indent, true);
        }
    }

    /// Accept the completion, continue a multi-line input, or accept the input.
    pub fn auto_enter(&mut self) -> Result<()> {
        if self.mode == LineMode::Complete {
            self.accept_complete();
            return Ok(());
        }
        if self.is_multiline() {
            self.newline();
            Ok(())
        } else {
            self.accept_input()
        }
    }

    /// Mark the input accepted and append it to history when it is non-empty
    /// and differs from the last entry.
    pub fn accept_input(&mut self) -> Result<()> {
        self.accepted = true;
        let text = self.buffer.text();
        if text.is_empty() || self.history.last() == Some(text.as_str()) {
            return Ok(());
        }
        self.history.append(&text)
    }

    // ---- insertion --------------------------------------------------------

    /// Insert typed text, replacing any mouse selection, and open the
    /// completion menu when the completer asks for it.
    pub fn insert_text(&mut self, data: &str) {
        if let Some((start, end)) = self.selection.take() {
            if end > start {
                self.buffer.delete_range(start, end);
                self.selection_cancelled = true;
            }
        }
        self.buffer.insert_text(data, true);
        if self.completer.complete_while_typing(&self.snapshot()) {
            self.start_complete(false);
        }
    }

    // ---- completion -------------------------------------------------------

    /// Insert the completer's immediate suffix. Returns false when there is none.
    pub fn complete(&mut self) -> bool {
        let suffix = self.completer.complete(&self.snapshot());
        if suffix.is_empty() {
            return false;
        }
        self.buffer.insert_text(&suffix, true);
        true
    }

    pub fn complete_next(&mut self, count: usize) {
        if self.mode != LineMode::Complete {
            self.start_complete(true);
            return;
        }
        let Some(state) = self.completion.as_ref() else {
            return;
        };
        let len = state.items.len();
        let index = match state.index {
            None => 0,
            Some(i) => (i + count) % len,
        };
        self.goto_completion(Some(index));
    }

    pub fn complete_previous(&mut self, count: usize) {
        if self.mode != LineMode::Complete {
            self.start_complete(false);
        }
        let Some(state) = self.completion.as_ref() else {
            return;
        };
        let len = state.items.len();
        let index = match state.index {
            None => len - 1,
            Some(i) => (i + len - count % len) % len,
        };
        self.goto_completion(Some(index));
    }

    pub fn start_complete(&mut self, goto_first: bool) {
        let snapshot = self.snapshot();
        let items = self.completer.completions(&snapshot);
        if items.is_empty() {
            self.mode = LineMode::Normal;
            self.completion = None;
            return;
        }
        debug!(target: "state.complete", items = items.len(), "complete_start");
        self.completion = Some(CompletionState::new(snapshot, items));
        self.mode = LineMode::Complete;
        if goto_first {
            self.goto_completion(Some(0));
        }
    }

    /// Everything the completer offers for the current text, without
    /// entering completion mode.
    pub fn completions(&self) -> Vec<CompletionItem> {
        self.completer.completions(&self.snapshot())
    }

    pub fn accept_complete(&mut self) {
        self.mode = LineMode::Normal;
        self.completion = None;
    }

    /// Drop the completion and restore the text it started from.
    pub fn cancel_complete(&mut self) {
        if self.mode == LineMode::Complete {
            self.goto_completion(None);
            self.mode = LineMode::Normal;
            self.completion = None;
        }
    }

    /// Replace the selected item's suffix with the suffix of `index`.
    pub fn goto_completion(&mut self, index: Option<usize>) {
        if self.mode != LineMode::Complete {
            return;
        }
        let Some(state) = self.completion.as_mut() else {
            return;
        };
        let previous = state.current_suffix().chars().count();
        state.index = index.filter(|&i| i < state.items.len());
        let suffix = state.current_suffix().to_string();
        if previous > 0 {
            self.buffer.delete_before(previous);
        }
        self.buffer.insert_text(&suffix, true);
        trace!(target: "state.complete", index = ?index, "complete_goto");
    }

    // ---- rendering helpers ------------------------------------------------

    /// Character range from the bracket matching the one under the cursor to
    /// the cursor (inclusive), ordered.
    pub fn matching_bracket_span(&self) -> Option<(usize, usize)> {
        let snapshot = self.snapshot();
        let other = snapshot.matching_bracket_position()?;
        let cursor = snapshot.cursor();
        Some((other.min(cursor), other.max(cursor) + 1))
    }

    pub fn selection(&self) -> Option<(usize, usize)> {
        self.selection
    }

    /// True once after typing replaced the selection.
    pub fn take_selection_cancelled(&mut self) -> bool {
        std::mem::take(&mut self.selection_cancelled)
    }

    // ---- mouse ------------------------------------------------------------

    /// Press inside the input (at `location`) and/or on a completion item.
    pub fn mouse_down(&mut self, location: Option<(usize, usize)>, completion: Option<usize>) {
        match location {
            Some((row, col)) => {
                let pos = self.snapshot().offset_from(row, col);
                self.buffer.set_cursor(pos);
                self.selection = Some((pos, pos));
            }
            None => self.selection = None,
        }
        if completion.is_some() {
            self.goto_completion(completion);
        }
    }

    /// Drag or release inside the input.
    pub fn mouse_move(&mut self, location: (usize, usize)) {
        let pos = self.snapshot().offset_from(location.0, location.1);
        self.buffer.set_cursor(pos);
        if let Some((start, _)) = self.selection {
            self.selection = Some((start.min(pos), start.max(pos)));
        }
    }

    pub fn mouse_up(&mut self, location: (usize, usize)) {
        self.mouse_move(location);
    }

    /// Select the whitespace-delimited word at `location`.
    pub fn dblclick(&mut self, location: (usize, usize)) {
        let snapshot = self.snapshot();
        let chars = snapshot.chars();
        let pos = snapshot.offset_from(location.0, location.1);
        let end = (pos + 1..chars.len())
            .find(|&i| chars[i].is_whitespace())
            .unwrap_or(chars.len());
        let start = (0..pos)
            .rev()
            .find(|&i| chars[i].is_whitespace())
            .map(|i| i + 1)
            .unwrap_or(0);
        if start >= end {
            return;
        }
        self.selection = Some((start, end));
        self.buffer.set_cursor(end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionItem, NoCompletion, WordCompleter};
    use crate::history::MemHistory;
    use core_text::PlainTokenizer;
    use pretty_assertions::assert_eq;

    struct Multiline;

    impl Tokenizer for Multiline {
        fn tokens(&self, snapshot: &TextSnapshot) -> Vec<Token> {
            PlainTokenizer.tokens(snapshot)
        }
        fn continues_input(&self, snapshot: &TextSnapshot) -> bool {
            !snapshot.text().ends_with(';')
        }
    }

    struct Fixed(Vec<CompletionItem>);

    impl Completer for Fixed {
        fn completions(&self, _snapshot: &TextSnapshot) -> Vec<CompletionItem> {
            self.0.clone()
        }
    }

    fn line_with(history: &[&str], completer: Arc<dyn Completer>) -> Line {
        let mut mem = MemHistory::new();
        for h in history {
            mem.append(h).unwrap();
        }
        Line::new(Box::new(mem), completer, Arc::new(PlainTokenizer), false)
    }

    fn fixed(suffixes: &[&str]) -> Arc<dyn Completer> {
        Arc::new(Fixed(
            suffixes.iter().map(|s| CompletionItem::new(*s, *s)).collect(),
        ))
    }

    #[test]
    fn history_navigation_keeps_draft() {
        let mut line = line_with(&["one", "two"], Arc::new(NoCompletion));
        line.insert_text("draft");
        line.auto_up();
        assert_eq!(line.text(), "two");
        line.auto_up();
        assert_eq!(line.text(), "one");
        assert_eq!(line.buffer().cursor(), 3);
        line.auto_up();
        assert_eq!(line.text(), "one");
        line.auto_down();
        line.auto_down();
        assert_eq!(line.text(), "draft");
    }

    #[test]
    fn accept_appends_distinct_non_empty() {
        let mut line = line_with(&["same"], Arc::new(NoCompletion));
        line.insert_text("same");
        line.accept_input().unwrap();
        assert!(line.is_accepted());
        assert_eq!(line.history().get_all().len(), 1);
        line.reset();
        assert!(!line.is_accepted());
        line.accept_input().unwrap();
        assert_eq!(line.history().get_all().len(), 1);
        line.reset();
        line.insert_text("new");
        line.accept_input().unwrap();
        assert_eq!(line.history().last(), Some("new"));
    }

    #[test]
    fn complete_next_wraps_and_replaces_suffix() {
        let mut line = line_with(&[], fixed(&["aa", "b", "ccc"]));
        line.insert_text("x");
        line.complete_next(1);
        assert_eq!(line.mode(), LineMode::Complete);
        assert_eq!(line.text(), "xaa");
        line.complete_next(1);
        assert_eq!(line.text(), "xb");
        line.complete_next(2);
        assert_eq!(line.text(), "xaa");
        assert_eq!(line.completion().unwrap().index, Some(0));
    }

    #[test]
    fn complete_previous_from_none_selects_last() {
        let mut line = line_with(&[], fixed(&["aa", "b", "ccc"]));
        line.complete_previous(1);
        assert_eq!(line.text(), "ccc");
        line.complete_previous(1);
        assert_eq!(line.text(), "b");
    }

    #[test]
    fn cancel_restores_original_text() {
        let mut line = line_with(&[], fixed(&["aa", "b"]));
        line.insert_text("x");
        line.complete_next(1);
        line.cancel_complete();
        assert_eq!(line.text(), "x");
        assert_eq!(line.mode(), LineMode::Normal);
        assert!(line.completion().is_none());
    }

    #[test]
    fn empty_completions_stay_normal() {
        let mut line = line_with(&[], Arc::new(NoCompletion));
        line.complete_next(1);
        assert_eq!(line.mode(), LineMode::Normal);
        assert!(!line.complete());
    }

    #[test]
    fn fast_path_complete_inserts_unique_suffix() {
        let mut line = line_with(&[], Arc::new(WordCompleter::new(["select"])));
        line.insert_text("sel");
        assert!(line.complete());
        assert_eq!(line.text(), "select");
    }

    #[test]
    fn complete_while_typing_opens_menu() {
        let completer = WordCompleter::new(["alpha", "alpine"]).while_typing(true);
        let mut line = line_with(&[], Arc::new(completer));
        line.insert_text("al");
        assert_eq!(line.mode(), LineMode::Complete);
        assert_eq!(line.completion().unwrap().index, None);
        assert_eq!(line.text(), "al");
    }

    #[test]
    fn auto_enter_multiline_with_indent() {
        let mut line = Line::new(
            Box::new(MemHistory::new()),
            Arc::new(NoCompletion),
            Arc::new(Multiline),
            true,
        );
        line.insert_text("  let x = 1");
        line.auto_enter().unwrap();
        assert!(!line.is_accepted());
        assert_eq!(line.text(), "  let x = 1\n  ");
        line.insert_text(";");
        line.auto_enter().unwrap();
        assert!(line.is_accepted());
    }

    #[test]
    fn auto_enter_accepts_completion_first() {
        let mut line = line_with(&[], fixed(&["aa"]));
        line.complete_next(1);
        line.auto_enter().unwrap();
        assert!(!line.is_accepted());
        assert_eq!(line.mode(), LineMode::Normal);
        assert_eq!(line.text(), "aa");
    }

    #[test]
    fn bracket_span_covers_range() {
        let mut line = line_with(&[], Arc::new(NoCompletion));
        line.insert_text("f(ab)");
        line.buffer_mut().set_cursor(4);
        assert_eq!(line.matching_bracket_span(), Some((1, 5)));
    }

    #[test]
    fn typing_replaces_mouse_selection() {
        let mut line = line_with(&[], Arc::new(NoCompletion));
        line.insert_text("hello world");
        line.dblclick((0, 8));
        assert_eq!(line.selection(), Some((6, 11)));
        line.insert_text("there");
        assert_eq!(line.text(), "hello there");
        assert!(line.take_selection_cancelled());
        assert!(!line.take_selection_cancelled());
    }

    #[test]
    fn mouse_down_on_menu_selects_item() {
        let mut line = line_with(&[], fixed(&["aa", "b"]));
        line.complete_next(1);
        line.mouse_down(None, Some(1));
        assert_eq!(line.text(), "b");
    }
}
