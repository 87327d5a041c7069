//! Full-screen backend with scrollback, mouse selection and clipboard sync.
//!
//! Frames land in a [`ScrollTextView`]; the visible window of that view is
//! painted row by row onto the alternate screen. Rows whose content and
//! selection state hash the same as last time are skipped.

use crate::backend::{MouseOutcome, RenderBackend};
use crate::completion_menu::CompletionMenuInfo;
use crate::compose::{Frame, compose_screen, in_columns};
use crate::geometry::{Area, Coordinate, Location};
use crate::screen::VirtualScreen;
use crate::scroll_view::ScrollTextView;
use crate::style::Schema;
use ahash::AHasher;
use anyhow::Result;
use core_events::{MouseEvent, MouseKind};
use core_state::CompletionItem;
use core_terminal::{Clipboard, SystemClipboard};
use core_text::{Token, TokenType};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::io::{self, Write};
use tracing::{trace, warn};

/// Columns searched on each side of a click for an input position.
const LOCATION_SEARCH: usize = 4;

pub struct ScrollingCellRenderer<W: Write + Send> {
    out: W,
    schema: Schema,
    view: ScrollTextView,
    clipboard: Box<dyn Clipboard>,
    size: (u16, u16),
    /// Input locations of the current frame, keyed by buffer coordinate.
    locations: HashMap<Coordinate, Location>,
    /// Menu of the current frame in buffer coordinates.
    menu: Option<CompletionMenuInfo>,
    /// Cursor in buffer coordinates.
    cursor: Coordinate,
    painted: Vec<Option<u64>>,
}

impl ScrollingCellRenderer<io::Stdout> {
    pub fn stdout(schema: Schema) -> Self {
        Self::new(
            io::stdout(),
            schema,
            Box::new(SystemClipboard),
            core_terminal::terminal_size(),
        )
    }
}

impl<W: Write + Send> ScrollingCellRenderer<W> {
    pub fn new(out: W, schema: Schema, clipboard: Box<dyn Clipboard>, size: (u16, u16)) -> Self {
        Self {
            out,
            schema,
            view: ScrollTextView::new(),
            clipboard,
            size,
            locations: HashMap::new(),
            menu: None,
            cursor: Coordinate::default(),
            painted: Vec::new(),
        }
    }

    pub fn view(&self) -> &ScrollTextView {
        &self.view
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }

    fn width(&self) -> usize {
        usize::from(self.size.0).max(1)
    }

    fn height(&self) -> usize {
        usize::from(self.size.1).max(1)
    }

    /// Keep the input row on screen when it runs past the bottom.
    fn follow(&mut self, y: usize) {
        let bottom = self.view.offset_limit_y() + self.height();
        if y >= bottom {
            self.view.move_up(y + 1 - bottom);
        }
    }

    fn closest_location(&self, c: Coordinate) -> Option<Location> {
        let left = c.x.saturating_sub(LOCATION_SEARCH);
        (left..=c.x)
            .rev()
            .chain(c.x..=c.x + LOCATION_SEARCH)
            .find_map(|x| self.locations.get(&Coordinate::new(x, c.y)).copied())
    }

    fn outcome(&self, window: Coordinate) -> MouseOutcome {
        let c = self.view.window_to_buffer(window);
        let glyph = self.view.window_to_buffer(self.view.char_start(window));
        MouseOutcome {
            location: self.closest_location(glyph),
            completion: self.menu.and_then(|menu| menu.complete_index(c)),
        }
    }

    fn row_hash(&self, window_y: usize, width: usize) -> u64 {
        let mut hasher = AHasher::default();
        width.hash(&mut hasher);
        if let Some(line) = self.view.line_at(window_y) {
            for xc in line {
                xc.hash(&mut hasher);
                self.view
                    .in_selection(Coordinate::new(xc.x, window_y))
                    .hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    fn paint(&mut self) -> io::Result<()> {
        let (width, height) = (self.width(), self.height());
        self.painted.resize(height, None);
        queue!(self.out, Hide)?;
        let mut repainted = 0usize;
        for wy in 0..height {
            let hash = self.row_hash(wy, width);
            if self.painted[wy] == Some(hash) {
                continue;
            }
            queue!(self.out, MoveTo(0, cells(wy)), Clear(ClearType::CurrentLine))?;
            if let Some(line) = self.view.line_at(wy) {
                for xc in line {
                    if xc.x + xc.cell.width > width {
                        break;
                    }
                    let style = if self.view.in_selection(Coordinate::new(xc.x, wy)) {
                        xc.cell.style.with_reverse(true)
                    } else {
                        xc.cell.style
                    };
                    xc.cell.write_styled(&mut self.out, style)?;
                }
            }
            self.painted[wy] = Some(hash);
            repainted += 1;
        }
        let cursor_row = self
            .cursor
            .y
            .checked_sub(self.view.offset_y())
            .filter(|&y| y < height);
        if let Some(y) = cursor_row {
            queue!(self.out, MoveTo(cells(self.cursor.x), cells(y)), Show)?;
        }
        self.out.flush()?;
        trace!(
            target: "render.cells",
            repainted,
            offset = self.view.offset_y(),
            rows = self.view.len(),
            "window_painted"
        );

        if let Some(text) = self.view.selection_update() {
            if let Err(err) = self.clipboard.set_text(&text) {
                warn!(target: "render.cells", error = %err, "clipboard_write_failed");
            }
        }
        Ok(())
    }
}

impl<W: Write + Send> RenderBackend for ScrollingCellRenderer<W> {
    fn render(&mut self, frame: &Frame<'_>, conclude: bool) -> Result<()> {
        let width = self.width();
        let input_y = self.view.input_y();
        let composed = compose_screen(frame, &self.schema, width);
        self.view.read_screen(&composed.screen);
        let shift = |c: &Coordinate| Coordinate::new(c.x, c.y + input_y);
        if conclude {
            self.view.accept_input();
            self.locations.clear();
            self.menu = None;
            self.cursor = Coordinate::new(0, self.view.input_y());
        } else {
            self.locations = composed
                .screen
                .input_locations()
                .map(|(c, loc)| (shift(c), *loc))
                .collect();
            self.menu = composed.menu.map(|menu| CompletionMenuInfo {
                area: Area::new(shift(&menu.area.from), shift(&menu.area.to)),
                ..menu
            });
            self.cursor = shift(&composed.cursor);
        }
        self.follow(self.cursor.y);
        self.paint()?;
        Ok(())
    }

    fn list_completions(&mut self, items: &[CompletionItem]) -> Result<()> {
        let displays: Vec<&str> = items.iter().map(|c| c.display.as_str()).collect();
        let mut text = in_columns(&displays, self.width()).join("\n");
        text.push('\n');
        self.print(&text)
    }

    fn clear(&mut self) -> Result<()> {
        let above = self.view.input_y().saturating_sub(self.view.offset_y());
        self.view.move_up(above);
        Ok(())
    }

    fn print(&mut self, text: &str) -> Result<()> {
        let printed = {
            let mut screen = VirtualScreen::new(&self.schema, self.width());
            screen.write_tokens(&[Token::new(TokenType::TEXT, text)], false);
            self.view.read_screen(&screen);
            screen.row_count()
        };
        self.view.input_to_end();
        self.cursor = Coordinate::new(0, self.view.input_y());
        self.follow(self.cursor.y);
        trace!(target: "render.cells", rows = printed, "output_printed");
        self.paint()?;
        Ok(())
    }

    fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        self.size = (width, height);
        self.painted.clear();
        queue!(self.out, Clear(ClearType::All))?;
        Ok(())
    }

    fn restore_scroll(&mut self) {
        self.view.restore_scroll();
    }

    fn cancel_selection(&mut self) {
        self.view.cancel_selection();
    }

    fn mouse(&mut self, event: MouseEvent) -> MouseOutcome {
        let window = Coordinate::new(usize::from(event.column), usize::from(event.row));
        match event.kind {
            MouseKind::WheelUp => {
                self.view.scroll_down(1);
                MouseOutcome::default()
            }
            MouseKind::WheelDown => {
                self.view.scroll_up(1);
                MouseOutcome::default()
            }
            MouseKind::Down => {
                self.view.mouse_down(window);
                self.outcome(window)
            }
            MouseKind::Drag => {
                self.view.mouse_move(window);
                self.outcome(window)
            }
            MouseKind::Up => {
                self.view.mouse_up(window);
                self.outcome(window)
            }
            MouseKind::DoubleClick => {
                self.view.dblclick(window);
                self.outcome(window)
            }
            MouseKind::TripleClick => {
                self.view.triple_click(window);
                self.outcome(window)
            }
        }
    }
}

fn cells(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}
