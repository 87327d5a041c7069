//! Byte sequences recognized as keys.
//!
//! C0 controls map one-to-one; DEL is backspace; CSI and SS3 sequences cover
//! arrows, navigation keys (with the common home/end variants) and F1-F20.

use core_events::KeyKind;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

const SEQUENCES: &[(&str, KeyKind)] = &[
    ("\x00", KeyKind::CtrlSpace),
    ("\x01", KeyKind::CtrlA),
    ("\x02", KeyKind::CtrlB),
    ("\x03", KeyKind::CtrlC),
    ("\x04", KeyKind::CtrlD),
    ("\x05", KeyKind::CtrlE),
    ("\x06", KeyKind::CtrlF),
    ("\x07", KeyKind::CtrlG),
    ("\x08", KeyKind::CtrlH),
    ("\x09", KeyKind::CtrlI),
    ("\x0a", KeyKind::CtrlJ),
    ("\x0b", KeyKind::CtrlK),
    ("\x0c", KeyKind::CtrlL),
    ("\x0d", KeyKind::CtrlM),
    ("\x0e", KeyKind::CtrlN),
    ("\x0f", KeyKind::CtrlO),
    ("\x10", KeyKind::CtrlP),
    ("\x11", KeyKind::CtrlQ),
    ("\x12", KeyKind::CtrlR),
    ("\x13", KeyKind::CtrlS),
    ("\x14", KeyKind::CtrlT),
    ("\x15", KeyKind::CtrlU),
    ("\x16", KeyKind::CtrlV),
    ("\x17", KeyKind::CtrlW),
    ("\x18", KeyKind::CtrlX),
    ("\x19", KeyKind::CtrlY),
    ("\x1a", KeyKind::CtrlZ),
    ("\x1c", KeyKind::CtrlBackslash),
    ("\x1d", KeyKind::CtrlSquareClose),
    ("\x1e", KeyKind::CtrlCircumflex),
    ("\x1f", KeyKind::CtrlUnderscore),
    ("\x7f", KeyKind::Backspace),
    ("\x1b[A", KeyKind::ArrowUp),
    ("\x1b[B", KeyKind::ArrowDown),
    ("\x1b[C", KeyKind::ArrowRight),
    ("\x1b[D", KeyKind::ArrowLeft),
    ("\x1b[H", KeyKind::Home),
    ("\x1bOH", KeyKind::Home),
    ("\x1b[1~", KeyKind::Home),
    ("\x1b[7~", KeyKind::Home),
    ("\x1b[F", KeyKind::End),
    ("\x1bOF", KeyKind::End),
    ("\x1b[4~", KeyKind::End),
    ("\x1b[8~", KeyKind::End),
    ("\x1b[3~", KeyKind::Delete),
    ("\x1b[3;2~", KeyKind::ShiftDelete),
    ("\x1b[5~", KeyKind::PageUp),
    ("\x1b[6~", KeyKind::PageDown),
    ("\x1b[Z", KeyKind::BackTab),
    ("\x1bOP", KeyKind::F1),
    ("\x1bOQ", KeyKind::F2),
    ("\x1bOR", KeyKind::F3),
    ("\x1bOS", KeyKind::F4),
    ("\x1b[15~", KeyKind::F5),
    ("\x1b[17~", KeyKind::F6),
    ("\x1b[18~", KeyKind::F7),
    ("\x1b[19~", KeyKind::F8),
    ("\x1b[20~", KeyKind::F9),
    ("\x1b[21~", KeyKind::F10),
    ("\x1b[23~", KeyKind::F11),
    ("\x1b[24~", KeyKind::F12),
    ("\x1b[25~", KeyKind::F13),
    ("\x1b[26~", KeyKind::F14),
    ("\x1b[28~", KeyKind::F15),
    ("\x1b[29~", KeyKind::F16),
    ("\x1b[31~", KeyKind::F17),
    ("\x1b[32~", KeyKind::F18),
    ("\x1b[33~", KeyKind::F19),
    ("\x1b[34~", KeyKind::F20),
];

struct KeyTable {
    exact: HashMap<&'static str, KeyKind>,
    /// Every strict prefix of every sequence.
    prefixes: HashSet<String>,
}

static TABLE: LazyLock<KeyTable> = LazyLock::new(|| {
    let mut exact = HashMap::with_capacity(SEQUENCES.len());
    let mut prefixes = HashSet::new();
    for &(seq, kind) in SEQUENCES {
        exact.insert(seq, kind);
        for (i, _) in seq.char_indices().skip(1) {
            prefixes.insert(seq[..i].to_string());
        }
    }
    KeyTable { exact, prefixes }
});

pub fn lookup(candidate: &str) -> Option<KeyKind> {
    TABLE.exact.get(candidate).copied()
}

/// True when `candidate` is a strict prefix of some sequence.
pub fn is_prefix(candidate: &str) -> bool {
    TABLE.prefixes.contains(candidate)
}

/// First sequence producing `kind`, used as the payload for keys that arrive
/// pre-parsed from the terminal library.
pub fn canonical_sequence(kind: KeyKind) -> Option<&'static str> {
    SEQUENCES
        .iter()
        .find(|(_, k)| *k == kind)
        .map(|(seq, _)| *seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_strict() {
        assert!(is_prefix("\x1b"));
        assert!(is_prefix("\x1b["));
        assert!(is_prefix("\x1b[3;"));
        assert!(!is_prefix("\x1b[A"));
        assert!(!is_prefix("\x01"));
        assert!(!is_prefix("a"));
    }

    #[test]
    fn home_end_variants() {
        for seq in ["\x1b[H", "\x1bOH", "\x1b[1~", "\x1b[7~"] {
            assert_eq!(lookup(seq), Some(KeyKind::Home));
        }
        for seq in ["\x1b[F", "\x1bOF", "\x1b[4~", "\x1b[8~"] {
            assert_eq!(lookup(seq), Some(KeyKind::End));
        }
        assert_eq!(canonical_sequence(KeyKind::Home), Some("\x1b[H"));
        assert_eq!(canonical_sequence(KeyKind::InsertChar), None);
    }

    #[test]
    fn every_function_key_is_mapped() {
        for n in 1..=20u8 {
            let kind = KeyKind::function(n).unwrap();
            assert!(canonical_sequence(kind).is_some(), "F{n} missing");
        }
    }
}
