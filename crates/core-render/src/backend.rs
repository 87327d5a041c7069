use crate::compose::Frame;
use crate::geometry::Location;
use anyhow::Result;
use core_events::MouseEvent;
use core_state::CompletionItem;

/// What a mouse event hit, translated into text terms for the key handler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MouseOutcome {
    /// Nearest input location on the clicked row.
    pub location: Option<Location>,
    /// Completion menu item under the pointer.
    pub completion: Option<usize>,
}

/// Output side of a session. The direct backend diffs frames in place; the
/// full-screen backend keeps scrollback and handles the mouse.
pub trait RenderBackend: Send {
    /// Repaint `frame`. `conclude` is set for the final frame of an input
    /// (accepted or aborted); the next render starts on a fresh row.
    fn render(&mut self, frame: &Frame<'_>, conclude: bool) -> Result<()>;

    /// Print every completion below the input in columns.
    fn list_completions(&mut self, items: &[CompletionItem]) -> Result<()>;

    /// Clear the screen, or pin the input to the top of the window.
    fn clear(&mut self) -> Result<()>;

    /// Output text above the input.
    fn print(&mut self, text: &str) -> Result<()>;

    fn resize(&mut self, _width: u16, _height: u16) -> Result<()> {
        Ok(())
    }

    /// Bring the view back to the input after the user scrolled away.
    fn restore_scroll(&mut self) {}

    fn cancel_selection(&mut self) {}

    fn mouse(&mut self, _event: MouseEvent) -> MouseOutcome {
        MouseOutcome::default()
    }
}
