//! Rendering: styles, the virtual screen, frame composition, the completion
//! menu and the two output backends.
//!
//! Every repaint composes a fresh [`VirtualScreen`] from a [`Frame`] (prompt,
//! input tokens, cursor, completion state). The screen is a sparse grid of
//! styled cells plus the mapping between text locations and the cells they
//! landed on. Backends consume it:
//!
//! - [`DiffRenderer`] rewrites the frame in place on the normal screen and
//!   walks the cursor back with relative moves.
//! - [`ScrollingCellRenderer`] keeps every frame in a scrollback view on the
//!   alternate screen and adds mouse selection with clipboard sync.

pub mod backend;
pub mod cell_renderer;
pub mod completion_menu;
pub mod compose;
pub mod diff_renderer;
pub mod geometry;
pub mod prompt;
pub mod screen;
pub mod scroll_view;
pub mod style;

pub use backend::{MouseOutcome, RenderBackend};
pub use cell_renderer::ScrollingCellRenderer;
pub use completion_menu::{CompletionMenuInfo, MENU_MAX_HEIGHT, draw_completion_menu, menu_window};
pub use compose::{Composed, Frame, compose_screen, in_columns};
pub use diff_renderer::{DiffRenderer, SizeProbe};
pub use geometry::{Area, Coordinate, Location};
pub use prompt::{BasePrompt, Prompt, second_line_prefix_for};
pub use screen::{Cell, VirtualScreen};
pub use scroll_view::{ScrollTextView, XCell};
pub use style::{Color, Schema, Style};
