//! Direct-terminal backend.
//!
//! Every render rewinds to the first row of the previous frame, erases down
//! and prints the new frame in full. The only state carried between frames
//! is the row the cursor was left on. Afterwards the cursor is walked back
//! from where printing stopped to the input cursor with relative moves.

use crate::backend::RenderBackend;
use crate::compose::{Frame, compose_screen, in_columns};
use crate::geometry::Coordinate;
use crate::style::Schema;
use anyhow::Result;
use core_state::CompletionItem;
use crossterm::cursor::{MoveLeft, MoveRight, MoveTo, MoveUp};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};
use tracing::trace;

pub type SizeProbe = Box<dyn Fn() -> (u16, u16) + Send>;

pub struct DiffRenderer<W: Write + Send> {
    out: W,
    schema: Schema,
    /// Row of the cursor relative to the first row of the last frame.
    cursor_row: usize,
    size: SizeProbe,
}

impl DiffRenderer<io::Stdout> {
    pub fn stdout(schema: Schema) -> Self {
        Self::new(io::stdout(), schema)
    }
}

impl<W: Write + Send> DiffRenderer<W> {
    pub fn new(out: W, schema: Schema) -> Self {
        Self {
            out,
            schema,
            cursor_row: 0,
            size: Box::new(core_terminal::terminal_size),
        }
    }

    /// Replace the terminal size query (tests, fixed-width output).
    pub fn with_size_probe(mut self, probe: impl Fn() -> (u16, u16) + Send + 'static) -> Self {
        self.size = Box::new(probe);
        self
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    fn width(&self) -> usize {
        usize::from((self.size)().0).max(1)
    }

    fn rewind(&mut self) -> io::Result<()> {
        if self.cursor_row > 0 {
            queue!(self.out, MoveUp(cells(self.cursor_row)))?;
        }
        queue!(self.out, Print('\r'), Clear(ClearType::FromCursorDown))
    }

    fn reposition(&mut self, last: Coordinate, cursor: Coordinate, width: usize) -> io::Result<()> {
        if last.y > cursor.y {
            queue!(self.out, MoveUp(cells(last.y - cursor.y)))?;
        }
        // Printing exactly to the right edge leaves the cursor in the pending
        // wrap state, one column short of `last.x`.
        if last.x >= width {
            queue!(self.out, Print('\r'))?;
            if cursor.x > 0 {
                queue!(self.out, MoveRight(cells(cursor.x)))?;
            }
        } else if last.x > cursor.x {
            queue!(self.out, MoveLeft(cells(last.x - cursor.x)))?;
        } else if last.x < cursor.x {
            queue!(self.out, MoveRight(cells(cursor.x - last.x)))?;
        }
        Ok(())
    }
}

impl<W: Write + Send> RenderBackend for DiffRenderer<W> {
    fn render(&mut self, frame: &Frame<'_>, conclude: bool) -> Result<()> {
        let width = self.width();
        self.rewind()?;
        let (last, cursor, rows) = {
            let composed = compose_screen(frame, &self.schema, width);
            let last = composed.screen.write_output(&mut self.out)?;
            (last, composed.cursor, composed.screen.row_count())
        };
        if conclude {
            self.cursor_row = 0;
            queue!(self.out, Print("\r\n"))?;
        } else {
            self.reposition(last, cursor, width)?;
            self.cursor_row = cursor.y;
        }
        self.out.flush()?;
        trace!(
            target: "render.diff",
            rows,
            cursor_x = cursor.x,
            cursor_y = cursor.y,
            conclude,
            "frame_rendered"
        );
        Ok(())
    }

    fn list_completions(&mut self, items: &[CompletionItem]) -> Result<()> {
        let width = self.width();
        let displays: Vec<&str> = items.iter().map(|c| c.display.as_str()).collect();
        queue!(self.out, Print("\r\n"))?;
        for line in in_columns(&displays, width) {
            queue!(self.out, Print(line), Print("\r\n"))?;
        }
        self.out.flush()?;
        self.cursor_row = 0;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        self.out.flush()?;
        self.cursor_row = 0;
        Ok(())
    }

    fn print(&mut self, text: &str) -> Result<()> {
        self.rewind()?;
        queue!(self.out, Print(text.replace('\n', "\r\n")))?;
        self.out.flush()?;
        self.cursor_row = 0;
        Ok(())
    }
}

fn cells(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::BasePrompt;
    use core_state::{Line, MemHistory, NoCompletion};
    use core_text::PlainTokenizer;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn renderer(width: u16) -> DiffRenderer<Vec<u8>> {
        DiffRenderer::new(Vec::new(), Schema::empty()).with_size_probe(move || (width, 24))
    }

    fn line_with(text: &str) -> Line {
        let mut line = Line::new(
            Box::new(MemHistory::new()),
            Arc::new(NoCompletion),
            Arc::new(PlainTokenizer),
            false,
        );
        line.insert_text(text);
        line
    }

    fn take(r: &mut DiffRenderer<Vec<u8>>) -> String {
        String::from_utf8(std::mem::take(r.writer_mut())).unwrap()
    }

    #[test]
    fn first_frame_and_cursor_at_end() {
        let mut r = renderer(80);
        let line = line_with("abc");
        r.render(&Frame::new(&line, &BasePrompt::default()), false).unwrap();
        assert_eq!(take(&mut r), "\r\x1b[J> abc");
        assert_eq!(r.cursor_row(), 0);
    }

    #[test]
    fn cursor_moves_back_into_the_text() {
        let mut r = renderer(80);
        let mut line = line_with("abc\ndef");
        line.buffer_mut().set_cursor(1);
        r.render(&Frame::new(&line, &BasePrompt::default()), false).unwrap();
        assert_eq!(take(&mut r), "\r\x1b[J> abc\r\n. def\x1b[1A\x1b[2D");
        assert_eq!(r.cursor_row(), 0);

        line.buffer_mut().set_cursor(5);
        r.render(&Frame::new(&line, &BasePrompt::default()), false).unwrap();
        assert_eq!(take(&mut r), "\r\x1b[J> abc\r\n. def\x1b[2D");
        assert_eq!(r.cursor_row(), 1);

        // The next frame starts by climbing back to the prompt row.
        r.render(&Frame::new(&line, &BasePrompt::default()), true).unwrap();
        assert_eq!(take(&mut r), "\x1b[1A\r\x1b[J> abc\r\n. def\r\n");
        assert_eq!(r.cursor_row(), 0);
    }

    #[test]
    fn edge_of_screen_uses_carriage_return() {
        let mut r = renderer(5);
        let mut line = line_with("abc");
        line.buffer_mut().set_cursor(1);
        r.render(&Frame::new(&line, &BasePrompt::default()), false).unwrap();
        assert_eq!(take(&mut r), "\r\x1b[J> abc\r\x1b[3C");
    }

    #[test]
    fn print_rewinds_and_converts_newlines() {
        let mut r = renderer(80);
        let line = line_with("a\nb");
        r.render(&Frame::new(&line, &BasePrompt::default()), false).unwrap();
        take(&mut r);
        r.print("out 1\nout 2\n").unwrap();
        assert_eq!(take(&mut r), "\x1b[1A\r\x1b[Jout 1\r\nout 2\r\n");
        assert_eq!(r.cursor_row(), 0);
    }

    #[test]
    fn completions_are_listed_in_columns() {
        let mut r = renderer(10);
        let items = [
            CompletionItem::new("abc", ""),
            CompletionItem::new("de", ""),
            CompletionItem::new("fghi", ""),
        ];
        r.list_completions(&items).unwrap();
        assert_eq!(take(&mut r), "\r\nabc  de\r\nfghi\r\n");
    }

    #[test]
    fn clear_homes_the_cursor() {
        let mut r = renderer(80);
        r.clear().unwrap();
        assert_eq!(take(&mut r), "\x1b[2J\x1b[1;1H");
    }
}
