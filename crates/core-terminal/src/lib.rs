//! Terminal backend abstraction and crossterm implementation.
//!
//! Two modes exist. `Inline` only toggles raw mode so output stays in the
//! normal scrollback. `FullScreen` additionally switches to the alternate
//! screen and enables mouse capture and bracketed paste.

use anyhow::Result;
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
    },
    tty::IsTty,
};
use std::io::{stdin, stdout};
use tracing::debug;

pub mod clipboard;
pub use clipboard::{Clipboard, MemoryClipboard, SystemClipboard};

/// Fallback when the size query fails (output redirected, CI).
pub const DEFAULT_SIZE: (u16, u16) = (80, 24);

pub trait TerminalBackend: Send {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
    fn set_title(&mut self, title: &str) -> Result<()>;
    /// `(columns, rows)`.
    fn size(&self) -> (u16, u16);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminalMode {
    #[default]
    Inline,
    FullScreen,
}

/// True when both stdin and stdout are attached to a terminal.
pub fn is_terminal() -> bool {
    stdin().is_tty() && stdout().is_tty()
}

pub fn terminal_size() -> (u16, u16) {
    crossterm::terminal::size().unwrap_or(DEFAULT_SIZE)
}

pub struct CrosstermBackend {
    mode: TerminalMode,
    entered: bool,
}

/// RAII guard ensuring terminal state restoration even if caller early-returns or panics.
pub struct TerminalGuard<'a> {
    backend: &'a mut dyn TerminalBackend,
    active: bool,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new(TerminalMode::Inline)
    }
}

impl CrosstermBackend {
    pub fn new(mode: TerminalMode) -> Self {
        Self {
            mode,
            entered: false,
        }
    }

    pub fn mode(&self) -> TerminalMode {
        self.mode
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }
}

/// Enter and return a guard that will leave on drop.
pub fn enter_guard(backend: &mut dyn TerminalBackend) -> Result<TerminalGuard<'_>> {
    backend.enter()?;
    Ok(TerminalGuard {
        backend,
        active: true,
    })
}

impl TerminalGuard<'_> {
    /// Leave now, surfacing the error instead of swallowing it in `Drop`.
    pub fn release(mut self) -> Result<()> {
        self.active = false;
        self.backend.leave()
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            if self.mode == TerminalMode::FullScreen {
                execute!(
                    stdout(),
                    EnterAlternateScreen,
                    EnableMouseCapture,
                    EnableBracketedPaste
                )?;
            }
            self.entered = true;
            debug!(target: "terminal", mode = ?self.mode, "terminal_entered");
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            if self.mode == TerminalMode::FullScreen {
                execute!(
                    stdout(),
                    DisableBracketedPaste,
                    DisableMouseCapture,
                    LeaveAlternateScreen
                )?;
            }
            disable_raw_mode()?;
            self.entered = false;
            debug!(target: "terminal", mode = ?self.mode, "terminal_left");
        }
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        execute!(stdout(), SetTitle(title))?;
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        terminal_size()
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

impl Drop for TerminalGuard<'_> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.backend.leave();
        }
    }
}
