//! Emacs-flavored default bindings.

use crate::{EventHandler, PointerTarget, Signals};
use core_events::{KeyEvent, KeyKind, MouseKind};
use core_state::{Line, LineMode};
use tracing::{trace, warn};

const TAB_SPACES: &str = "    ";

/// Whether `key` starts a new undo step. A run of typed characters is one
/// step, and undo itself never saves.
pub fn needs_to_save(previous: Option<KeyKind>, key: KeyKind) -> bool {
    match key {
        KeyKind::CtrlUnderscore => false,
        KeyKind::InsertChar => previous != Some(KeyKind::InsertChar),
        _ => true,
    }
}

#[derive(Debug, Default)]
pub struct BaseHandler {
    last_key: Option<KeyKind>,
}

impl BaseHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn tab(line: &mut Line) {
        if line.mode() == LineMode::Complete {
            line.accept_complete();
            return;
        }
        if line.complete() {
            return;
        }
        line.complete_next(1);
        if line.mode() == LineMode::Normal {
            line.insert_text(TAB_SPACES);
        }
    }

    fn enter(line: &mut Line) -> Signals {
        if let Err(e) = line.auto_enter() {
            warn!(target: "state.history", error = %e, "history_append_failed");
        }
        if line.is_accepted() {
            Signals::ACCEPT
        } else {
            Signals::empty()
        }
    }

    /// Step back to the most recent saved text that differs from the current one.
    fn undo(line: &mut Line) {
        line.to_normal_mode();
        let current = line.text();
        while line.buffer_mut().undo() {
            if line.text() != current {
                break;
            }
        }
    }
}

impl EventHandler for BaseHandler {
    fn handle_key(&mut self, line: &mut Line, key: &KeyEvent) -> Signals {
        if needs_to_save(self.last_key, key.kind) {
            line.save_to_undo_stack();
        }
        self.last_key = Some(key.kind);
        trace!(target: "actions.dispatch", key = %key, mode = ?line.mode(), "key");

        match key.kind {
            KeyKind::CtrlC => return Signals::ABORT,
            KeyKind::CtrlD => {
                if !line.has_text() {
                    return Signals::EXIT;
                }
                line.to_normal_mode();
                line.buffer_mut().delete_after(1);
            }
            KeyKind::CtrlJ | KeyKind::CtrlM => return Self::enter(line),
            KeyKind::CtrlI => Self::tab(line),
            KeyKind::BackTab => line.complete_previous(1),
            KeyKind::CtrlL => return Signals::CLEAR,
            KeyKind::CtrlSpace => return Signals::LIST_COMPLETIONS,
            KeyKind::CtrlN | KeyKind::ArrowDown => line.auto_down(),
            KeyKind::CtrlP | KeyKind::ArrowUp => line.auto_up(),
            KeyKind::Escape => line.cancel_complete(),
            KeyKind::CtrlUnderscore => Self::undo(line),
            KeyKind::InsertChar => {
                line.to_normal_mode();
                line.insert_text(&key.payload);
            }
            kind => {
                line.to_normal_mode();
                let buffer = line.buffer_mut();
                match kind {
                    KeyKind::CtrlA | KeyKind::Home => buffer.cursor_to_start_of_line(false),
                    KeyKind::CtrlE | KeyKind::End => buffer.cursor_to_end_of_line(),
                    KeyKind::CtrlB | KeyKind::ArrowLeft => buffer.cursor_left(1),
                    KeyKind::CtrlF | KeyKind::ArrowRight => buffer.cursor_right(1),
                    KeyKind::CtrlH | KeyKind::Backspace => {
                        buffer.delete_before(1);
                    }
                    KeyKind::Delete => {
                        buffer.delete_after(1);
                    }
                    KeyKind::CtrlK => {
                        buffer.delete_until_end_of_line();
                    }
                    KeyKind::CtrlU => {
                        buffer.delete_from_start_of_line();
                    }
                    KeyKind::CtrlW => {
                        buffer.delete_word_before_cursor();
                    }
                    KeyKind::CtrlT => buffer.swap_characters_before_cursor(),
                    _ => {}
                }
            }
        }
        Signals::empty()
    }

    fn handle_mouse(&mut self, line: &mut Line, target: PointerTarget) -> Signals {
        self.last_key = None;
        match (target.kind, target.location) {
            (MouseKind::Down, location) => {
                line.save_to_undo_stack();
                line.mouse_down(location, target.completion);
            }
            (MouseKind::Drag, Some(location)) => line.mouse_move(location),
            (MouseKind::Up, Some(location)) => line.mouse_up(location),
            (MouseKind::DoubleClick, Some(location)) => line.dblclick(location),
            _ => {}
        }
        Signals::empty()
    }
}
