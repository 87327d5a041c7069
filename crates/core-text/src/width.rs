//! Terminal display width.
//!
//! All width decisions for the screen and the completion menu go through
//! these helpers. Wide glyphs count as 2 columns, combining marks and
//! control characters as 0.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

pub fn str_width(s: &str) -> usize {
    s.width()
}

/// Left-justify `s` to `width` columns, padding with spaces. Longer strings
/// are returned unchanged.
pub fn ljust_width(s: &str, width: usize) -> String {
    let w = str_width(s);
    let mut out = String::with_capacity(s.len() + width.saturating_sub(w));
    out.push_str(s);
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(w)));
    out
}

/// Longest prefix of `s` that fits in `width` columns.
pub fn truncate_width(s: &str, width: usize) -> &str {
    let mut used = 0;
    for (i, c) in s.char_indices() {
        let w = char_width(c);
        if used + w > width {
            return &s[..i];
        }
        used += w;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_and_combining() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width('字'), 2);
        assert_eq!(char_width('\u{301}'), 0);
        assert_eq!(str_width("a字"), 3);
    }

    #[test]
    fn justify_and_truncate() {
        assert_eq!(ljust_width("ab", 4), "ab  ");
        assert_eq!(ljust_width("字", 3), "字 ");
        assert_eq!(ljust_width("abcdef", 3), "abcdef");
        assert_eq!(truncate_width("a字b", 2), "a");
        assert_eq!(truncate_width("a字b", 3), "a字");
        assert_eq!(truncate_width("ab", 9), "ab");
    }
}
