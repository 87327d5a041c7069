//! Streaming key decoder.
//!
//! Input arrives one `char` at a time. Characters accumulate in `pending`
//! while they form a strict prefix of a known sequence. When the next
//! character breaks the prefix, the first character of `pending` is resolved
//! on its own (ESC becomes an Escape key, anything else a literal insert) and
//! the rest of `pending` plus the new character are reprocessed in order. No
//! input character is ever dropped.
//!
//! A lone ESC or a truncated sequence stays pending until the caller's poll
//! timeout calls [`KeyDecoder::flush`], which resolves it the same way.

use crate::key_table;
use core_events::{KeyEvent, KeyKind};
use smallvec::SmallVec;
use std::collections::VecDeque;
use tracing::trace;

const ESC: char = '\x1b';

#[derive(Debug, Default)]
pub struct KeyDecoder {
    pending: String,
}

/// Events produced by one `feed` call; almost always zero or one.
pub type Decoded = SmallVec<[KeyEvent; 2]>;

impl KeyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn feed(&mut self, c: char) -> Decoded {
        let mut out = Decoded::new();
        let mut queue = VecDeque::from([c]);
        self.drain(&mut queue, &mut out);
        out
    }

    pub fn feed_str(&mut self, s: &str) -> Vec<KeyEvent> {
        let mut out = Vec::new();
        for c in s.chars() {
            out.extend(self.feed(c));
        }
        out
    }

    /// Resolve everything still pending (poll timeout).
    pub fn flush(&mut self) -> Decoded {
        let mut out = Decoded::new();
        while !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            trace!(target: "input.decoder", pending = ?pending, "flush_pending");
            let mut queue = self.resolve_first(&pending, &mut out);
            self.drain(&mut queue, &mut out);
        }
        out
    }

    pub fn reset(&mut self) {
        self.pending.clear();
    }

    fn drain(&mut self, queue: &mut VecDeque<char>, out: &mut Decoded) {
        while let Some(c) = queue.pop_front() {
            self.step(c, queue, out);
        }
    }

    fn step(&mut self, c: char, queue: &mut VecDeque<char>, out: &mut Decoded) {
        let mut candidate = self.pending.clone();
        candidate.push(c);
        if let Some(kind) = key_table::lookup(&candidate) {
            self.pending.clear();
            out.push(KeyEvent::new(kind, candidate));
        } else if key_table::is_prefix(&candidate) {
            self.pending = candidate;
        } else if self.pending.is_empty() {
            out.push(KeyEvent::insert(c));
        } else {
            let pending = std::mem::take(&mut self.pending);
            trace!(target: "input.decoder", pending = ?pending, next = ?c, "false_prefix");
            let rest = self.resolve_first(&pending, out);
            for ch in rest.into_iter().chain(std::iter::once(c)).rev() {
                queue.push_front(ch);
            }
        }
    }

    /// Emit the event for the first char of `pending`; return the remainder.
    fn resolve_first(&self, pending: &str, out: &mut Decoded) -> VecDeque<char> {
        let mut chars = pending.chars();
        match chars.next() {
            Some(ESC) => out.push(KeyEvent::escape()),
            Some(first) => out.push(KeyEvent::insert(first)),
            None => {}
        }
        chars.collect()
    }
}

/// True for events that insert literal text.
pub fn is_literal(event: &KeyEvent) -> bool {
    event.kind == KeyKind::InsertChar
}
