//! Default key and mouse bindings.
//!
//! A handler turns one decoded event into edits on a [`Line`] and reports
//! session-level requests (accept, abort, exit, clear, list completions) as
//! [`Signals`]. The session loop owns the decision of what those signals mean;
//! the handler only raises them.

mod handler;

pub use handler::{BaseHandler, needs_to_save};

use bitflags::bitflags;
use core_events::{KeyEvent, MouseKind};
use core_state::Line;

bitflags! {
    /// Requests raised by a handler for the session loop.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Signals: u8 {
        const ACCEPT = 1 << 0;
        const ABORT = 1 << 1;
        const EXIT = 1 << 2;
        /// Erase the screen (direct mode) or pin the input to the top (full screen).
        const CLEAR = 1 << 3;
        /// Print all completions for the current input as columns.
        const LIST_COMPLETIONS = 1 << 4;
    }
}

/// Pointer input already mapped onto the line: the text location under the
/// pointer and the completion item under it, when there is one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerTarget {
    pub kind: MouseKind,
    pub location: Option<(usize, usize)>,
    pub completion: Option<usize>,
}

pub trait EventHandler: Send {
    fn handle_key(&mut self, line: &mut Line, key: &KeyEvent) -> Signals;

    fn handle_mouse(&mut self, _line: &mut Line, _target: PointerTarget) -> Signals {
        Signals::empty()
    }
}
