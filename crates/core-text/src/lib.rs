//! Text primitives shared by the line editor: immutable snapshots with a
//! cached line index, token types and the tokenizer contract, and display
//! width helpers.

pub mod snapshot;
pub mod token;
pub mod width;

pub use snapshot::{TextSnapshot, is_word_delimiter};
pub use token::{PlainTokenizer, Token, TokenType, Tokenizer};
pub use width::{char_width, ljust_width, str_width, truncate_width};
