use std::io;
use thiserror::Error;

/// Why [`Session::read_input`](crate::Session::read_input) returned without text.
#[derive(Debug, Error)]
pub enum LineError {
    #[error("user abort")]
    Abort,
    #[error("user exit")]
    Exit,
    #[error("not in a terminal")]
    NotATerminal,
    #[error("input read failed: {0}")]
    Read(#[source] io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LineError {
    /// Abort and exit are user choices rather than failures.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, LineError::Abort | LineError::Exit)
    }
}
