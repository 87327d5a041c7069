use ropey::Rope;
use tracing::trace;

/// Maximum number of entries retained in the undo stack.
pub const UNDO_HISTORY_MAX: usize = 200;

/// Saved text + cursor. `Rope` clones share structure, so entries are cheap.
#[derive(Clone, Debug)]
pub struct UndoEntry {
    pub text: Rope,
    pub cursor: usize,
}

/// Undo stack that never holds two consecutive entries with identical text.
#[derive(Debug, Default)]
pub struct UndoStack {
    entries: Vec<UndoEntry>,
    coalesced: u64,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Number of saves folded into the previous entry because the text matched.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Save `text`/`cursor`. When the top entry already holds the same text
    /// only its cursor is updated.
    pub fn save(&mut self, text: &Rope, cursor: usize) {
        if let Some(last) = self.entries.last_mut()
            && last.text == *text
        {
            last.cursor = cursor;
            self.coalesced += 1;
            trace!(target: "state.undo", undo_depth = self.entries.len(), cursor, "undo_save_coalesced");
            return;
        }
        self.entries.push(UndoEntry {
            text: text.clone(),
            cursor,
        });
        trace!(target: "state.undo", undo_depth = self.entries.len(), chars = text.len_chars(), "undo_save");
        if self.entries.len() > UNDO_HISTORY_MAX {
            let _ = self.entries.remove(0);
            trace!(target: "state.undo", "undo_stack_trimmed");
        }
    }

    pub fn pop(&mut self) -> Option<UndoEntry> {
        let entry = self.entries.pop();
        if entry.is_some() {
            trace!(target: "state.undo", undo_depth = self.entries.len(), "undo_pop");
        }
        entry
    }
}
