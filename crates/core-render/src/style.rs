//! Colors, text styles and the token-type style schema.
//!
//! Colors are xterm-256 palette indices; `#rrggbb` values snap to the nearest
//! palette entry by squared RGB distance over all 256 entries. A schema maps
//! dotted token types to styles and falls back to the nearest styled ancestor
//! (`literal.string.double` -> `literal.string` -> `literal`).

use anyhow::{Result, bail};
use core_text::TokenType;
use crossterm::style::{Attribute, ContentStyle};
use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Color {
    /// Terminal default; emits no SGR color code.
    #[default]
    Default,
    Indexed(u8),
}

const CUBE_LEVELS: [u8; 6] = [0x00, 0x5f, 0x87, 0xaf, 0xd7, 0xff];

const BASIC_COLORS: [(u8, u8, u8); 16] = [
    (0, 0, 0),
    (128, 0, 0),
    (0, 128, 0),
    (128, 128, 0),
    (0, 0, 128),
    (128, 0, 128),
    (0, 128, 128),
    (192, 192, 192),
    (128, 128, 128),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (0, 0, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

static PALETTE: LazyLock<[(u8, u8, u8); 256]> = LazyLock::new(|| {
    let mut palette = [(0u8, 0u8, 0u8); 256];
    palette[..16].copy_from_slice(&BASIC_COLORS);
    for r in 0..6 {
        for g in 0..6 {
            for b in 0..6 {
                palette[16 + 36 * r + 6 * g + b] = (CUBE_LEVELS[r], CUBE_LEVELS[g], CUBE_LEVELS[b]);
            }
        }
    }
    for (i, slot) in palette[232..].iter_mut().enumerate() {
        let level = 8 + 10 * i as u8;
        *slot = (level, level, level);
    }
    palette
});

impl Color {
    /// Nearest palette entry; the first one wins on ties.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Color {
        let dist = |&(pr, pg, pb): &(u8, u8, u8)| {
            let d = |a: u8, b: u8| (i32::from(a) - i32::from(b)).pow(2);
            d(r, pr) + d(g, pg) + d(b, pb)
        };
        let (index, _) = PALETTE
            .iter()
            .enumerate()
            .min_by_key(|(i, rgb)| (dist(rgb), *i))
            .unwrap_or((0, &(0, 0, 0)));
        Color::Indexed(index as u8)
    }

    /// `#rrggbb`; the empty string is the default color.
    pub fn from_hex(hex: &str) -> Result<Color> {
        if hex.is_empty() {
            return Ok(Color::Default);
        }
        let Some(digits) = hex.strip_prefix('#').filter(|d| d.len() == 6) else {
            bail!("invalid hex color {hex:?}");
        };
        let n = u32::from_str_radix(digits, 16)?;
        Ok(Color::from_rgb((n >> 16) as u8, (n >> 8) as u8, n as u8))
    }

    /// Accepts `#rrggbb`, a palette index `0..=255`, `default` or the empty string.
    pub fn parse(value: &str) -> Result<Color> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("default") {
            return Ok(Color::Default);
        }
        if value.starts_with('#') {
            return Color::from_hex(value);
        }
        match value.parse::<u8>() {
            Ok(n) => Ok(Color::Indexed(n)),
            Err(_) => bail!("invalid color {value:?}"),
        }
    }

    pub fn is_default(self) -> bool {
        self == Color::Default
    }

    fn to_crossterm(self) -> Option<crossterm::style::Color> {
        match self {
            Color::Default => None,
            Color::Indexed(n) => Some(crossterm::style::Color::AnsiValue(n)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub fg: Color,
    pub bg: Color,
    pub bold: bool,
    pub underline: bool,
    pub italic: bool,
    pub reverse: bool,
}

impl Style {
    pub fn fg_hex(hex: &str) -> Result<Style> {
        Ok(Style {
            fg: Color::from_hex(hex)?,
            ..Style::default()
        })
    }

    pub fn bg_hex(hex: &str) -> Result<Style> {
        Ok(Style {
            bg: Color::from_hex(hex)?,
            ..Style::default()
        })
    }

    pub fn hex(fg: &str, bg: &str) -> Result<Style> {
        Ok(Style {
            fg: Color::from_hex(fg)?,
            bg: Color::from_hex(bg)?,
            ..Style::default()
        })
    }

    pub fn with_fg(self, fg: Color) -> Style {
        Style { fg, ..self }
    }

    pub fn with_reverse(self, reverse: bool) -> Style {
        Style { reverse, ..self }
    }

    /// No color and no attribute: printed without any SGR codes.
    pub fn is_plain(&self) -> bool {
        *self == Style::default()
    }

    pub fn content_style(&self) -> ContentStyle {
        let mut style = ContentStyle::new();
        style.foreground_color = self.fg.to_crossterm();
        style.background_color = self.bg.to_crossterm();
        if self.reverse {
            style.attributes.set(Attribute::Reverse);
        }
        if self.bold {
            style.attributes.set(Attribute::Bold);
        }
        if self.underline {
            style.attributes.set(Attribute::Underlined);
        }
        if self.italic {
            style.attributes.set(Attribute::Italic);
        }
        style
    }
}

#[derive(Clone, Debug)]
pub struct Schema {
    styles: HashMap<TokenType, Style>,
}

impl Default for Schema {
    fn default() -> Self {
        let entries = [
            (TokenType::KEYWORD, "#ee00ee", ""),
            (TokenType::OPERATOR, "#aa6666", ""),
            (TokenType::NUMBER, "#2aacb8", ""),
            (TokenType::STRING, "#6aab73", ""),
            (TokenType::ERROR, "#000000", "#ff8888"),
            (TokenType::COMMENT, "#0000dd", ""),
            (TokenType::COMPLETION_MENU_COMPLETION, "#ffffbb", "#888888"),
            (TokenType::COMPLETION_MENU_COMPLETION_CURRENT, "#000000", "#dddddd"),
            (TokenType::COMPLETION_MENU_META_CURRENT, "#000000", "#bbbbbb"),
            (TokenType::COMPLETION_MENU_META, "#cccccc", "#888888"),
            (TokenType::COMPLETION_MENU_PROGRESS_BAR, "", "#aaaaaa"),
            (TokenType::COMPLETION_MENU_PROGRESS_BUTTON, "", "#000000"),
            (TokenType::SELECTION, "", "#40334d"),
        ];
        let styles = entries
            .into_iter()
            .filter_map(|(kind, fg, bg)| Style::hex(fg, bg).ok().map(|s| (kind, s)))
            .collect();
        Schema { styles }
    }
}

impl Schema {
    /// A schema with no entries; every token renders unstyled.
    pub fn empty() -> Self {
        Schema {
            styles: HashMap::new(),
        }
    }

    pub fn set(&mut self, kind: TokenType, style: Style) {
        self.styles.insert(kind, style);
    }

    pub fn get(&self, kind: &TokenType) -> Option<&Style> {
        self.styles.get(kind)
    }

    /// Replace entries with user-provided styles.
    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (TokenType, Style)>,
    {
        for (kind, style) in overrides {
            tracing::debug!(target: "config", kind = %kind, "style_override");
            self.styles.insert(kind, style);
        }
    }

    pub fn style_for_token(&self, kind: &TokenType) -> Style {
        if let Some(style) = self.styles.get(kind) {
            return *style;
        }
        let mut current = kind.parent();
        while let Some(parent) = current {
            if let Some(style) = self.styles.get(&parent) {
                return *style;
            }
            current = parent.parent();
        }
        Style::default()
    }

    /// Selection style over a cell drawn with `original`. A selection entry
    /// without a foreground keeps the original text color.
    pub fn style_for_selection(&self, original: Style) -> Style {
        let selection = self
            .styles
            .get(&TokenType::SELECTION)
            .copied()
            .unwrap_or_else(|| Style::bg_hex("#40334d").unwrap_or_default());
        if selection.fg.is_default() {
            selection.with_fg(original.fg)
        } else {
            selection
        }
    }
}
