//! Input acquisition: the key sequence table, the streaming [`KeyDecoder`],
//! the blocking stdin rune reader used in direct mode and the crossterm
//! event-stream forwarder used in full-screen mode.

pub mod crossterm_source;
pub mod decoder;
pub mod key_table;
pub mod stdin_source;

pub use crossterm_source::{
    AsyncInputShutdown, ClickTracker, MULTI_CLICK_WINDOW, map_key_event, spawn_crossterm_input,
    spawn_stream_input,
};
pub use decoder::{Decoded, KeyDecoder, is_literal};
pub use stdin_source::{Utf8Decoder, spawn_rune_reader};
