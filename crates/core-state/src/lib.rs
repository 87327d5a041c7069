//! Mutable editing state: the rope-backed edit buffer with its undo stack,
//! completion and history contracts, and the per-session `Line` that ties
//! them together.

pub mod completion;
pub mod edit_buffer;
pub mod history;
pub mod line;
pub mod undo;

pub use completion::{Completer, CompletionItem, CompletionState, NoCompletion, WordCompleter};
pub use edit_buffer::EditBuffer;
pub use history::{FileHistory, History, MemHistory};
pub use line::{Line, LineMode};
pub use undo::{UNDO_HISTORY_MAX, UndoEntry, UndoStack};
