//! Scrollback model for the full-screen backend.
//!
//! `data` holds every row ever shown. Rows from `input_y` on belong to the
//! input being edited and are replaced on each frame; rows above it are
//! frozen history. `offset_y` is the first buffer row shown in the window.
//! It may move up to `offset_limit_y`, which only grows when the input is
//! pinned to the top (clear) or scrolls off the bottom.
//!
//! Selections are kept in buffer coordinates so they stay attached to the
//! text while the window scrolls.

use crate::geometry::{Area, Coordinate};
use crate::screen::{Cell, VirtualScreen};
use tracing::trace;

/// Column reached by a triple-click selection; past any real row.
const ROW_END: usize = 1 << 24;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct XCell {
    pub cell: Cell,
    pub x: usize,
}

#[derive(Debug)]
pub struct ScrollTextView {
    data: Vec<Vec<XCell>>,
    input_y: usize,
    offset_y: usize,
    offset_limit_y: usize,
    selection: Area,
    /// Last selection text handed out by `selection_update`.
    selection_text: String,
}

impl Default for ScrollTextView {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollTextView {
    pub fn new() -> Self {
        Self {
            data: vec![Vec::new()],
            input_y: 0,
            offset_y: 0,
            offset_limit_y: 0,
            selection: Area::default(),
            selection_text: String::new(),
        }
    }

    /// Replace the input rows with the rows of `screen`.
    pub fn read_screen(&mut self, screen: &VirtualScreen<'_>) {
        let last = screen.last_coordinate();
        self.data.truncate(self.input_y);
        self.grow_to(self.input_y + last.y);
        for y in 0..=last.y {
            let Some(row) = screen.row(y) else {
                continue;
            };
            let end_x = row.keys().next_back().copied().unwrap_or(0);
            let line = &mut self.data[self.input_y + y];
            let mut x = 0;
            while x <= end_x {
                let cell = row.get(&x).cloned().unwrap_or_else(Cell::blank);
                let width = cell.width;
                line.push(XCell { cell, x });
                x += width;
            }
        }
        // A shorter draft must not leave the window past the last row.
        let max = self.data.len().saturating_sub(1);
        self.offset_limit_y = self.offset_limit_y.min(max);
        self.offset_y = self.offset_y.min(self.offset_limit_y);
    }

    fn grow_to(&mut self, y: usize) {
        while self.data.len() <= y {
            self.data.push(Vec::new());
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().all(Vec::is_empty)
    }

    pub fn input_y(&self) -> usize {
        self.input_y
    }

    pub fn offset_y(&self) -> usize {
        self.offset_y
    }

    pub fn offset_limit_y(&self) -> usize {
        self.offset_limit_y
    }

    pub fn line(&self, y: usize) -> Option<&[XCell]> {
        self.data.get(y).map(Vec::as_slice)
    }

    /// Row shown at window row `y`.
    pub fn line_at(&self, y: usize) -> Option<&[XCell]> {
        self.line(self.offset_y + y)
    }

    /// Position just after the last cell of the last row.
    pub fn last_coordinate(&self) -> Coordinate {
        let y = self.data.len() - 1;
        let x = self.data[y]
            .last()
            .map(|xc| xc.x + xc.cell.width)
            .unwrap_or(0);
        Coordinate::new(x, y)
    }

    pub fn restore_scroll(&mut self) {
        self.offset_y = self.offset_limit_y;
    }

    /// Shift the content up, raising the scroll limit with it. Returns the
    /// rows actually moved.
    pub fn move_up(&mut self, n: usize) -> usize {
        let n = n.min((self.data.len() - 1).saturating_sub(self.offset_limit_y));
        self.offset_y += n;
        self.offset_limit_y += n;
        trace!(target: "render.cells", moved = n, limit = self.offset_limit_y, "view_move_up");
        n
    }

    pub fn move_down(&mut self, n: usize) -> usize {
        let n = n.min(self.offset_limit_y).min(self.offset_y);
        self.offset_y -= n;
        self.offset_limit_y -= n;
        n
    }

    /// Scroll towards newer rows, never past the limit.
    pub fn scroll_up(&mut self, n: usize) -> usize {
        let n = n.min(self.offset_limit_y.saturating_sub(self.offset_y));
        self.offset_y += n;
        n
    }

    /// Scroll towards older rows.
    pub fn scroll_down(&mut self, n: usize) -> usize {
        let n = n.min(self.offset_y);
        self.offset_y -= n;
        n
    }

    /// Treat the last row as the start of the input (after printing output
    /// that did not end on a fresh row).
    pub fn input_to_end(&mut self) {
        self.input_y = self.data.len() - 1;
    }

    /// Freeze the current input and start a new one on the next row.
    pub fn accept_input(&mut self) {
        self.input_y = self.data.len();
        self.grow_to(self.input_y);
    }

    pub fn contains_line(&self, window_y: usize) -> bool {
        self.offset_y + window_y < self.data.len()
    }

    pub fn input_contains_line(&self, window_y: usize) -> bool {
        let y = self.offset_y + window_y;
        self.input_y <= y && y < self.data.len()
    }

    /// Start of the rightmost cell at or left of `window` on its row.
    pub fn closest_char_coordinate(&self, window: Coordinate) -> Option<Coordinate> {
        let line = self.line_at(window.y)?;
        line.iter()
            .take_while(|xc| xc.x <= window.x)
            .last()
            .map(|xc| Coordinate::new(xc.x, window.y))
    }

    /// Start of the glyph covering `window`; `window` itself when no glyph
    /// covers it.
    pub fn char_start(&self, window: Coordinate) -> Coordinate {
        let Some(start) = self.closest_char_coordinate(window) else {
            return window;
        };
        let covers = self
            .line_at(window.y)
            .and_then(|line| line.iter().find(|xc| xc.x == start.x))
            .is_some_and(|xc| xc.x + xc.cell.width > window.x);
        if covers { start } else { window }
    }

    /// Whitespace-delimited word around buffer coordinate `c`; the row edges
    /// bound it when no whitespace is found.
    pub fn word_area(&self, c: Coordinate) -> Area {
        let Some(line) = self.line(c.y) else {
            return Area::default();
        };
        let Some(index) = line.iter().rposition(|xc| xc.x <= c.x) else {
            return Area::default();
        };
        let end = line[index..]
            .iter()
            .find(|xc| xc.cell.is_whitespace())
            .map(|xc| xc.x)
            .or_else(|| line.last().map(|xc| xc.x + xc.cell.width))
            .unwrap_or(0);
        let start = line[..=index]
            .iter()
            .rev()
            .find(|xc| xc.cell.is_whitespace())
            .map(|xc| xc.x + xc.cell.width)
            .unwrap_or(line[0].x);
        Area::new(Coordinate::new(start, c.y), Coordinate::new(end, c.y))
    }

    pub fn window_to_buffer(&self, window: Coordinate) -> Coordinate {
        Coordinate::new(window.x, window.y + self.offset_y)
    }

    pub fn mouse_down(&mut self, window: Coordinate) {
        let c = self.window_to_buffer(window);
        self.selection = Area::new(c, c);
    }

    pub fn mouse_move(&mut self, window: Coordinate) {
        self.selection.to = self.window_to_buffer(window);
    }

    pub fn mouse_up(&mut self, window: Coordinate) {
        self.selection.to = self.window_to_buffer(window);
        self.selection.limit_to(self.last_coordinate());
    }

    pub fn dblclick(&mut self, window: Coordinate) {
        let c = self.window_to_buffer(window);
        self.selection = self.word_area(c);
    }

    pub fn triple_click(&mut self, window: Coordinate) {
        let c = self.window_to_buffer(window);
        self.selection = Area::new(Coordinate::new(0, c.y), Coordinate::new(ROW_END, c.y));
    }

    pub fn selection(&self) -> Area {
        self.selection
    }

    pub fn in_selection(&self, window: Coordinate) -> bool {
        self.selection.contains(self.window_to_buffer(window))
    }

    /// Selected glyphs, rows joined with `\n`.
    pub fn selection_text(&self) -> String {
        let (start, end) = (self.selection.start(), self.selection.end());
        let mut text = String::new();
        for y in start.y..=end.y {
            if let Some(line) = self.line(y) {
                for xc in line {
                    if self.selection.contains(Coordinate::new(xc.x, y)) {
                        text.push_str(&xc.cell.glyph);
                    }
                }
            }
            if y != end.y {
                text.push('\n');
            }
        }
        text
    }

    pub fn cancel_selection(&mut self) {
        self.selection = Area::default();
    }

    /// Selection text when it is non-empty and differs from the last one
    /// returned.
    pub fn selection_update(&mut self) -> Option<String> {
        if self.selection.is_empty() {
            return None;
        }
        let text = self.selection_text();
        if text == self.selection_text {
            return None;
        }
        self.selection_text = text.clone();
        Some(text)
    }
}
