//! Frame composition shared by both backends.
//!
//! A [`Frame`] is everything a backend needs from the session for one
//! repaint. [`compose_screen`] lays it out on a fresh [`VirtualScreen`]:
//! prompt, input (with continuation prefixes), then the completion menu.

use crate::completion_menu::{CompletionMenuInfo, draw_completion_menu};
use crate::geometry::{Coordinate, Location};
use crate::prompt::Prompt;
use crate::screen::VirtualScreen;
use crate::style::Schema;
use core_state::{CompletionState, Line};
use core_text::{Token, str_width};
use std::ops::Range;

pub struct Frame<'a> {
    pub prompt: Vec<Token>,
    pub second_line_prefix: Vec<Token>,
    pub tokens: Vec<Token>,
    pub cursor: Location,
    pub completion: Option<&'a CompletionState>,
    /// Input character ranges drawn with the selection style.
    pub highlights: Vec<Range<usize>>,
}

impl<'a> Frame<'a> {
    pub fn new(line: &'a Line, prompt: &dyn Prompt) -> Self {
        let snapshot = line.snapshot();
        let mut highlights = Vec::new();
        if let Some((start, end)) = line.matching_bracket_span() {
            highlights.push(start..end);
        }
        Self {
            prompt: prompt.prompt(&snapshot),
            second_line_prefix: prompt.second_line_prefix(&snapshot),
            tokens: line.tokens(&snapshot),
            cursor: Location::new(snapshot.cursor_row(), snapshot.cursor_col()),
            completion: line.completion(),
            highlights,
        }
    }
}

pub struct Composed<'s> {
    pub screen: VirtualScreen<'s>,
    /// Where the terminal cursor belongs.
    pub cursor: Coordinate,
    pub menu: Option<CompletionMenuInfo>,
}

pub fn compose_screen<'s>(frame: &Frame<'_>, schema: &'s Schema, width: usize) -> Composed<'s> {
    let mut screen = VirtualScreen::new(schema, width);
    screen.write_tokens(&frame.prompt, false);
    screen.set_second_line_prefix(Some(frame.second_line_prefix.clone()));
    screen.set_highlights(frame.highlights.clone());
    screen.write_tokens(&frame.tokens, true);
    screen.save_input_pos();
    screen.set_second_line_prefix(None);

    let menu = frame
        .completion
        .and_then(|state| draw_completion_menu(&mut screen, state));
    let cursor = screen.coordinate(frame.cursor);
    Composed {
        screen,
        cursor,
        menu,
    }
}

/// Lay `items` out left to right in equal columns one wider than the widest
/// item, as many per line as fit in `width` (at least one).
pub fn in_columns<S: AsRef<str>>(items: &[S], width: usize) -> Vec<String> {
    let column = items
        .iter()
        .map(|s| str_width(s.as_ref()) + 1)
        .max()
        .unwrap_or(1);
    let per_line = (width / column).max(1);
    items
        .chunks(per_line)
        .map(|chunk| {
            let mut line = String::new();
            for (i, item) in chunk.iter().enumerate() {
                let item = item.as_ref();
                line.push_str(item);
                if i + 1 < chunk.len() {
                    line.push_str(&" ".repeat(column - str_width(item)));
                }
            }
            line
        })
        .collect()
}
