//! Interactive line editing for terminal programs.
//!
//! ```no_run
//! use oxline::{LineError, Session, SessionOptions};
//!
//! # async fn run() -> Result<(), LineError> {
//! let mut session = Session::new(SessionOptions::default())?;
//! while let Some(text) = session.read_input().await? {
//!     session.print(&format!("you typed {text:?}"))?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A session reads raw input (stdin runes in direct mode, crossterm events
//! in full-screen mode), runs each key through an [`EventHandler`] against
//! the [`Line`] state and repaints through a [`RenderBackend`]. Ctrl-C and
//! Ctrl-D are resolved by the [`Policy`] set in [`SessionOptions`].

mod error;
mod options;
mod session;

pub use error::LineError;
pub use options::{DEFAULT_INPUT_TIMEOUT, Policy, SessionOptions};
pub use session::Session;

pub use core_actions::{BaseHandler, EventHandler, PointerTarget, Signals};
pub use core_config::{LineConfig, discover, load_from};
pub use core_events::{
    AsyncEventSource, InputMessage, KeyEvent, KeyKind, MouseEvent, MouseKind, RedrawHandle,
    TickEventSource, input_channel,
};
pub use core_render::{
    BasePrompt, Color, DiffRenderer, Frame, Location, MouseOutcome, Prompt, RenderBackend, Schema,
    ScrollingCellRenderer, Style,
};
pub use core_state::{
    Completer, CompletionItem, FileHistory, History, Line, MemHistory, NoCompletion, WordCompleter,
};
pub use core_text::{PlainTokenizer, TextSnapshot, Token, TokenType, Tokenizer};
