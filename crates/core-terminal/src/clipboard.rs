//! System clipboard access for mouse selections.

use anyhow::{Result, anyhow};
use copypasta::{ClipboardContext, ClipboardProvider};
use std::sync::{Arc, Mutex};

pub trait Clipboard: Send {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// Writes through the platform clipboard. A context is opened per write so
/// the handle never has to cross threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        let mut ctx = ClipboardContext::new().map_err(|err| anyhow!(err.to_string()))?;
        ctx.set_contents(text.to_string())
            .map_err(|err| anyhow!(err.to_string()))?;
        tracing::debug!(target: "terminal", len = text.len(), "clipboard_set");
        Ok(())
    }
}

/// In-process clipboard; clones share the same contents.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    writes: Arc<Mutex<Vec<String>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest contents, if anything was written.
    pub fn contents(&self) -> Option<String> {
        self.writes.lock().ok()?.last().cloned()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|w| w.len()).unwrap_or(0)
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.writes
            .lock()
            .map_err(|_| anyhow!("clipboard lock poisoned"))?
            .push(text.to_string());
        Ok(())
    }
}
