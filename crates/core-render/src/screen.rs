//! Virtual screen: one render frame as a sparse grid of styled cells.
//!
//! Tokens are written glyph by glyph. Wide glyphs take two columns, zero
//! width marks join the previous cell, and a glyph that would cross the
//! right edge wraps to the next row. Input tokens also record the mapping
//! between each text location and the cell it landed on, including the
//! position just past the last character, so the renderer can place the
//! cursor and translate mouse clicks back into text positions.

use crate::geometry::{Coordinate, Location};
use crate::style::{Schema, Style};
use core_text::{Token, char_width};
use crossterm::queue;
use crossterm::style::{Print, PrintStyledContent};
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use std::ops::Range;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Base character plus any combining marks.
    pub glyph: String,
    pub style: Style,
    /// Columns occupied; always at least one.
    pub width: usize,
}

impl Cell {
    pub fn new(glyph: impl Into<String>, style: Style, width: usize) -> Self {
        Self {
            glyph: glyph.into(),
            style,
            width: width.max(1),
        }
    }

    pub fn blank() -> Self {
        Self::new(" ", Style::default(), 1)
    }

    pub fn is_whitespace(&self) -> bool {
        self.glyph.chars().all(char::is_whitespace)
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.write_styled(out, self.style)
    }

    pub fn write_styled<W: Write>(&self, out: &mut W, style: Style) -> io::Result<()> {
        if style.is_plain() {
            queue!(out, Print(&self.glyph))
        } else {
            queue!(out, PrintStyledContent(style.content_style().apply(&self.glyph)))
        }
    }
}

pub type Row = BTreeMap<usize, Cell>;

pub struct VirtualScreen<'s> {
    schema: &'s Schema,
    width: usize,
    buffer: BTreeMap<usize, Row>,
    x: usize,
    y: usize,
    input_row: usize,
    input_col: usize,
    /// Character offset into the input of the next input glyph.
    input_offset: usize,
    coordinates: HashMap<Location, Coordinate>,
    locations: HashMap<Coordinate, Location>,
    /// Furthest position reached: written cells and rows opened by newlines.
    last: Coordinate,
    second_line_prefix: Option<Vec<Token>>,
    highlights: Vec<Range<usize>>,
}

impl<'s> VirtualScreen<'s> {
    pub fn new(schema: &'s Schema, width: usize) -> Self {
        Self {
            schema,
            width: width.max(1),
            buffer: BTreeMap::new(),
            x: 0,
            y: 0,
            input_row: 0,
            input_col: 0,
            input_offset: 0,
            coordinates: HashMap::new(),
            locations: HashMap::new(),
            last: Coordinate::default(),
            second_line_prefix: None,
            highlights: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// Tokens written after every newline inside the input.
    pub fn set_second_line_prefix(&mut self, prefix: Option<Vec<Token>>) {
        self.second_line_prefix = prefix;
    }

    /// Input character ranges drawn with the selection style.
    pub fn set_highlights(&mut self, highlights: Vec<Range<usize>>) {
        self.highlights = highlights;
    }

    pub fn write_tokens(&mut self, tokens: &[Token], is_input: bool) {
        for token in tokens {
            let style = self.schema.style_for_token(&token.kind);
            for c in token.literal.chars() {
                self.write_char(c, style, is_input);
            }
        }
    }

    /// Decorations (the completion menu) placed at an absolute position.
    pub fn write_tokens_at(&mut self, x: usize, y: usize, tokens: &[Token]) {
        self.x = x;
        self.y = y;
        self.write_tokens(tokens, false);
    }

    pub fn write_char(&mut self, c: char, style: Style, is_input: bool) {
        if c == '\n' {
            if is_input {
                self.save_input_pos();
                self.input_row += 1;
                self.input_col = 0;
                self.input_offset += 1;
            }
            self.y += 1;
            self.x = 0;
            self.bump_last(Coordinate::new(0, self.y));
            if is_input {
                if let Some(prefix) = self.second_line_prefix.clone() {
                    self.write_tokens(&prefix, false);
                }
            }
            return;
        }

        let style = if is_input && self.is_highlighted(self.input_offset) {
            self.schema.style_for_selection(style)
        } else {
            style
        };

        let width = char_width(c);
        if width == 0 && !c.is_control() && self.attach_to_previous(c) {
            if is_input {
                self.save_input_pos();
                self.advance_input();
            }
            return;
        }
        // Control characters and orphaned marks occupy a blank column.
        let (glyph, width) = if width == 0 {
            if c.is_control() {
                (String::from(" "), 1)
            } else {
                (format!(" {c}"), 1)
            }
        } else {
            (c.to_string(), width)
        };

        if self.x > 0 && self.x + width > self.width {
            self.y += 1;
            self.x = 0;
        }
        if is_input {
            self.save_input_pos();
            self.advance_input();
        }
        let at = Coordinate::new(self.x, self.y);
        self.buffer
            .entry(at.y)
            .or_default()
            .insert(at.x, Cell::new(glyph, style, width));
        self.bump_last(at);
        self.x += width;
    }

    /// Record the current position for the current input location.
    pub fn save_input_pos(&mut self) {
        let location = Location::new(self.input_row, self.input_col);
        let coordinate = Coordinate::new(self.x, self.y);
        self.coordinates.insert(location, coordinate);
        self.locations.insert(coordinate, location);
    }

    /// Screen position of a text location; the origin when never recorded.
    pub fn coordinate(&self, location: Location) -> Coordinate {
        self.coordinates.get(&location).copied().unwrap_or_default()
    }

    pub fn location(&self, coordinate: Coordinate) -> Option<Location> {
        self.locations.get(&coordinate).copied()
    }

    pub fn input_locations(&self) -> impl Iterator<Item = (&Coordinate, &Location)> {
        self.locations.iter()
    }

    pub fn last_coordinate(&self) -> Coordinate {
        self.last
    }

    /// Current write position.
    pub fn position(&self) -> Coordinate {
        Coordinate::new(self.x, self.y)
    }

    pub fn row_count(&self) -> usize {
        self.last.y + 1
    }

    pub fn row(&self, y: usize) -> Option<&Row> {
        self.buffer.get(&y)
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.buffer.get(&y)?.get(&x)
    }

    /// Print the frame row by row, blanks filling gaps, CRLF between rows.
    /// Returns where the terminal cursor ends up.
    pub fn write_output<W: Write>(&self, out: &mut W) -> io::Result<Coordinate> {
        let rows = self.row_count();
        let mut end = Coordinate::new(0, rows - 1);
        for y in 0..rows {
            end.x = 0;
            if let Some(row) = self.buffer.get(&y) {
                let cols = row
                    .last_key_value()
                    .map(|(x, cell)| x + cell.width)
                    .unwrap_or(0);
                let mut x = 0;
                while x < cols {
                    match row.get(&x) {
                        Some(cell) => {
                            cell.write_to(out)?;
                            x += cell.width;
                        }
                        None => {
                            queue!(out, Print(' '))?;
                            x += 1;
                        }
                    }
                }
                end.x = x;
            }
            if y + 1 < rows {
                queue!(out, Print("\r\n"))?;
            }
        }
        Ok(end)
    }

    pub fn output(&self) -> io::Result<(String, Coordinate)> {
        let mut buf = Vec::new();
        let end = self.write_output(&mut buf)?;
        Ok((String::from_utf8_lossy(&buf).into_owned(), end))
    }

    fn attach_to_previous(&mut self, c: char) -> bool {
        let x = self.x;
        match self
            .buffer
            .get_mut(&self.y)
            .and_then(|row| row.range_mut(..x).next_back())
        {
            Some((_, cell)) => {
                cell.glyph.push(c);
                true
            }
            None => false,
        }
    }

    fn advance_input(&mut self) {
        self.input_col += 1;
        self.input_offset += 1;
    }

    fn is_highlighted(&self, offset: usize) -> bool {
        self.highlights.iter().any(|r| r.contains(&offset))
    }

    fn bump_last(&mut self, at: Coordinate) {
        if at > self.last {
            self.last = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::TokenType;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Vec<Token> {
        vec![Token::new(TokenType::TEXT, s)]
    }

    #[test]
    fn plain_output_and_end_position() {
        let schema = Schema::empty();
        let mut screen = VirtualScreen::new(&schema, 80);
        screen.write_tokens(&[Token::new(TokenType::PROMPT, "> ")], false);
        screen.write_tokens(&text("ab\ncd"), true);
        screen.save_input_pos();
        let (out, end) = screen.output().unwrap();
        assert_eq!(out, "> ab\r\ncd");
        assert_eq!(end, Coordinate::new(2, 1));
        assert_eq!(screen.coordinate(Location::new(0, 0)), Coordinate::new(2, 0));
        assert_eq!(screen.coordinate(Location::new(0, 2)), Coordinate::new(4, 0));
        assert_eq!(screen.coordinate(Location::new(1, 2)), Coordinate::new(2, 1));
        assert_eq!(screen.location(Coordinate::new(3, 0)), Some(Location::new(0, 1)));
    }

    #[test]
    fn second_line_prefix_follows_input_newlines() {
        let schema = Schema::empty();
        let mut screen = VirtualScreen::new(&schema, 80);
        screen.write_tokens(&[Token::new(TokenType::PROMPT, "> ")], false);
        screen.set_second_line_prefix(Some(vec![Token::new(
            TokenType::PROMPT_SECOND_LINE_PREFIX,
            ". ",
        )]));
        screen.write_tokens(&text("a\nb"), true);
        screen.save_input_pos();
        let (out, _) = screen.output().unwrap();
        assert_eq!(out, "> a\r\n. b");
        assert_eq!(screen.coordinate(Location::new(1, 0)), Coordinate::new(2, 1));
    }

    #[test]
    fn wide_glyph_wraps_before_crossing_the_edge() {
        let schema = Schema::empty();
        let mut screen = VirtualScreen::new(&schema, 5);
        screen.write_tokens(&text("abcd字"), true);
        screen.save_input_pos();
        assert_eq!(screen.coordinate(Location::new(0, 4)), Coordinate::new(0, 1));
        assert_eq!(screen.coordinate(Location::new(0, 5)), Coordinate::new(2, 1));
        let (out, end) = screen.output().unwrap();
        assert_eq!(out, "abcd\r\n字");
        assert_eq!(end, Coordinate::new(2, 1));
    }

    #[test]
    fn exact_fill_leaves_cursor_at_the_edge() {
        let schema = Schema::empty();
        let mut screen = VirtualScreen::new(&schema, 4);
        screen.write_tokens(&text("abcd"), true);
        screen.save_input_pos();
        let (_, end) = screen.output().unwrap();
        assert_eq!(end, Coordinate::new(4, 0));
        assert_eq!(screen.coordinate(Location::new(0, 4)), Coordinate::new(4, 0));
    }

    #[test]
    fn combining_mark_joins_previous_cell() {
        let schema = Schema::empty();
        let mut screen = VirtualScreen::new(&schema, 80);
        screen.write_tokens(&text("e\u{301}x"), true);
        assert_eq!(screen.cell(0, 0).unwrap().glyph, "e\u{301}");
        assert_eq!(screen.cell(1, 0).unwrap().glyph, "x");
    }

    #[test]
    fn trailing_newline_opens_an_empty_row() {
        let schema = Schema::empty();
        let mut screen = VirtualScreen::new(&schema, 80);
        screen.write_tokens(&text("abc\n"), true);
        screen.save_input_pos();
        let (out, end) = screen.output().unwrap();
        assert_eq!(out, "abc\r\n");
        assert_eq!(end, Coordinate::new(0, 1));
    }

    #[test]
    fn gaps_are_filled_with_blanks() {
        let schema = Schema::empty();
        let mut screen = VirtualScreen::new(&schema, 80);
        screen.write_tokens(&text("ab"), true);
        screen.write_tokens_at(4, 1, &text("m"));
        let (out, end) = screen.output().unwrap();
        assert_eq!(out, "ab\r\n    m");
        assert_eq!(end, Coordinate::new(5, 1));
    }

    #[test]
    fn styled_cells_reset_after_glyph() {
        let mut schema = Schema::empty();
        schema.set(TokenType::KEYWORD, Style::fg_hex("#ff0000").unwrap());
        let mut screen = VirtualScreen::new(&schema, 80);
        screen.write_tokens(&[Token::new(TokenType::KEYWORD, "x")], true);
        let (out, _) = screen.output().unwrap();
        assert_eq!(out, "\x1b[38;5;9mx\x1b[39m");
    }

    #[test]
    fn highlighted_input_uses_selection_style() {
        let schema = Schema::default();
        let mut screen = VirtualScreen::new(&schema, 80);
        screen.set_highlights(vec![1..3]);
        screen.write_tokens(&text("(a)"), true);
        assert!(screen.cell(0, 0).unwrap().style.is_plain());
        assert_eq!(
            screen.cell(1, 0).unwrap().style,
            schema.style_for_selection(Style::default())
        );
        assert!(!screen.cell(2, 0).unwrap().style.is_plain());
    }
}
