//! Completion menu drawn under the cursor position the completion started at.

use crate::geometry::{Area, Coordinate, Location};
use crate::screen::VirtualScreen;
use core_state::{CompletionItem, CompletionState};
use core_text::{Token, TokenType, ljust_width, str_width, truncate_width};

pub const MENU_MAX_HEIGHT: usize = 7;

/// Where the menu landed and which items it shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompletionMenuInfo {
    pub area: Area,
    pub slice_from: usize,
    pub slice_to: usize,
}

impl CompletionMenuInfo {
    /// Index of the item drawn at `c`, if any.
    pub fn complete_index(&self, c: Coordinate) -> Option<usize> {
        if !self.area.rect_contains(c) {
            return None;
        }
        Some(self.slice_from + (c.y - self.area.start().y))
    }
}

/// Visible item range `[from, to)`. Once the selection passes the middle of
/// a full menu the window scrolls to keep it centered, stopping when the
/// last item reaches the bottom.
pub fn menu_window(len: usize, index: Option<usize>, height: usize) -> (usize, usize) {
    let from = match index {
        Some(i) if len > height && i > height / 2 => (i - height / 2).min(len - height),
        _ => 0,
    };
    (from, (from + height).min(len))
}

pub fn draw_completion_menu(
    screen: &mut VirtualScreen<'_>,
    state: &CompletionState,
) -> Option<CompletionMenuInfo> {
    let items = &state.items;
    if items.is_empty() {
        return None;
    }
    let (slice_from, slice_to) = menu_window(items.len(), state.index, MENU_MAX_HEIGHT);

    let half = screen.width() / 2;
    let item_width = items
        .iter()
        .map(|c| str_width(&c.display))
        .max()
        .unwrap_or(0)
        .min(half);
    let show_meta = items.iter().any(|c| !c.meta.is_empty());
    let meta_width = items
        .iter()
        .filter(|c| !c.meta.is_empty())
        .map(|c| str_width(&c.meta))
        .max()
        .unwrap_or(0)
        .min(half);

    let origin = origin(screen, state, item_width + meta_width + 5);
    for (row, item) in items[slice_from..slice_to].iter().enumerate() {
        let current = state.index == Some(slice_from + row);
        let tokens = row_tokens(item, current, show_meta, item_width, meta_width);
        screen.write_tokens_at(origin.x, origin.y + row, &tokens);
    }

    let row_width = 1 + (1 + item_width) + if show_meta { 1 + meta_width } else { 0 } + 2;
    let to = Coordinate::new(origin.x + row_width, origin.y + (slice_to - slice_from));
    Some(CompletionMenuInfo {
        area: Area::new(origin, to),
        slice_from,
        slice_to,
    })
}

/// One cell below and left of the original cursor, shifted left when the
/// menu would cross the right edge.
fn origin(screen: &VirtualScreen<'_>, state: &CompletionState, menu_width: usize) -> Coordinate {
    let cursor = screen.coordinate(Location::new(
        state.original.cursor_row(),
        state.original.cursor_col(),
    ));
    let mut x = cursor.x.saturating_sub(1);
    if x + menu_width > screen.width() {
        x = x.saturating_sub(x + menu_width - screen.width() + 1);
    }
    Coordinate::new(x, cursor.y + 1)
}

fn row_tokens(
    item: &CompletionItem,
    current: bool,
    show_meta: bool,
    item_width: usize,
    meta_width: usize,
) -> Vec<Token> {
    let (item_kind, meta_kind, progress) = if current {
        (
            TokenType::COMPLETION_MENU_COMPLETION_CURRENT,
            TokenType::COMPLETION_MENU_META_CURRENT,
            TokenType::COMPLETION_MENU_PROGRESS_BUTTON,
        )
    } else {
        (
            TokenType::COMPLETION_MENU_COMPLETION,
            TokenType::COMPLETION_MENU_META,
            TokenType::COMPLETION_MENU_PROGRESS_BAR,
        )
    };
    let display = truncate_width(&item.display, item_width);
    let mut tokens = vec![
        Token::new(TokenType::UNSPECIFIC, " "),
        Token::new(item_kind, format!(" {}", ljust_width(display, item_width))),
    ];
    if show_meta {
        let meta = truncate_width(&item.meta, meta_width);
        tokens.push(Token::new(meta_kind, format!(" {}", ljust_width(meta, meta_width))));
    }
    tokens.push(Token::new(progress, " "));
    tokens.push(Token::new(TokenType::UNSPECIFIC, " "));
    tokens
}
