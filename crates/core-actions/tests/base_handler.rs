use core_actions::{BaseHandler, EventHandler, PointerTarget, Signals};
use core_events::{KeyEvent, KeyKind, MouseKind};
use core_state::{Completer, Line, LineMode, MemHistory, NoCompletion, WordCompleter};
use core_text::{PlainTokenizer, TextSnapshot, Token, TokenType, Tokenizer};
use pretty_assertions::assert_eq;
use std::sync::Arc;

/// Input continues while it ends with a backslash.
struct Continuation;

impl Tokenizer for Continuation {
    fn tokens(&self, snapshot: &TextSnapshot) -> Vec<Token> {
        vec![Token::new(TokenType::TEXT, snapshot.text())]
    }

    fn continues_input(&self, snapshot: &TextSnapshot) -> bool {
        snapshot.text().ends_with('\\')
    }
}

fn line_with(completer: Arc<dyn Completer>, tokenizer: Arc<dyn Tokenizer>) -> Line {
    Line::new(Box::new(MemHistory::new()), completer, tokenizer, false)
}

fn plain_line() -> Line {
    line_with(Arc::new(NoCompletion), Arc::new(PlainTokenizer))
}

fn key(kind: KeyKind) -> KeyEvent {
    KeyEvent::new(kind, "")
}

fn type_str(h: &mut BaseHandler, line: &mut Line, text: &str) {
    for c in text.chars() {
        assert_eq!(h.handle_key(line, &KeyEvent::insert(c)), Signals::empty());
    }
}

#[test]
fn one_undo_reverts_a_typed_run() {
    let mut h = BaseHandler::new();
    let mut line = plain_line();
    type_str(&mut h, &mut line, "foo bar");
    h.handle_key(&mut line, &key(KeyKind::CtrlW));
    assert_eq!(line.text(), "foo ");
    type_str(&mut h, &mut line, "baz");
    assert_eq!(line.text(), "foo baz");

    h.handle_key(&mut line, &key(KeyKind::CtrlUnderscore));
    assert_eq!(line.text(), "foo ");
    h.handle_key(&mut line, &key(KeyKind::CtrlUnderscore));
    assert_eq!(line.text(), "foo bar");
    h.handle_key(&mut line, &key(KeyKind::CtrlUnderscore));
    assert_eq!(line.text(), "");
}

#[test]
fn undo_skips_saves_made_by_cursor_moves() {
    let mut h = BaseHandler::new();
    let mut line = plain_line();
    type_str(&mut h, &mut line, "abc");
    h.handle_key(&mut line, &key(KeyKind::ArrowLeft));
    h.handle_key(&mut line, &key(KeyKind::CtrlUnderscore));
    assert_eq!(line.text(), "");
}

#[test]
fn ctrl_d_exits_only_on_an_empty_buffer() {
    let mut h = BaseHandler::new();
    let mut line = plain_line();
    assert_eq!(h.handle_key(&mut line, &key(KeyKind::CtrlD)), Signals::EXIT);

    type_str(&mut h, &mut line, "ab");
    h.handle_key(&mut line, &key(KeyKind::CtrlA));
    assert_eq!(h.handle_key(&mut line, &key(KeyKind::CtrlD)), Signals::empty());
    assert_eq!(line.text(), "b");
}

#[test]
fn control_keys_raise_session_signals() {
    let mut h = BaseHandler::new();
    let mut line = plain_line();
    type_str(&mut h, &mut line, "x");
    assert_eq!(h.handle_key(&mut line, &key(KeyKind::CtrlC)), Signals::ABORT);
    assert_eq!(h.handle_key(&mut line, &key(KeyKind::CtrlL)), Signals::CLEAR);
    assert_eq!(
        h.handle_key(&mut line, &key(KeyKind::CtrlSpace)),
        Signals::LIST_COMPLETIONS
    );
    assert_eq!(line.text(), "x");
}

#[test]
fn enter_accepts_and_records_history() {
    let mut h = BaseHandler::new();
    let mut line = plain_line();
    type_str(&mut h, &mut line, "ls");
    assert_eq!(h.handle_key(&mut line, &key(KeyKind::CtrlM)), Signals::ACCEPT);
    assert!(line.is_accepted());
    assert_eq!(line.history().get_all().to_vec(), vec!["ls".to_string()]);

    line.reset();
    h.handle_key(&mut line, &key(KeyKind::ArrowUp));
    assert_eq!(line.text(), "ls");
}

#[test]
fn enter_continues_multiline_input() {
    let mut h = BaseHandler::new();
    let mut line = line_with(Arc::new(NoCompletion), Arc::new(Continuation));
    type_str(&mut h, &mut line, "a \\");
    assert_eq!(h.handle_key(&mut line, &key(KeyKind::CtrlJ)), Signals::empty());
    type_str(&mut h, &mut line, "b");
    assert_eq!(h.handle_key(&mut line, &key(KeyKind::CtrlM)), Signals::ACCEPT);
    assert_eq!(line.text(), "a \\\nb");
}

#[test]
fn tab_inserts_unique_suffix_or_opens_menu_or_indents() {
    let completer = Arc::new(WordCompleter::new(["alpha", "alps", "beta"]));
    let mut h = BaseHandler::new();
    let mut line = line_with(completer, Arc::new(PlainTokenizer));

    type_str(&mut h, &mut line, "be");
    h.handle_key(&mut line, &key(KeyKind::CtrlI));
    assert_eq!(line.text(), "beta");

    type_str(&mut h, &mut line, " al");
    h.handle_key(&mut line, &key(KeyKind::CtrlI));
    assert_eq!(line.mode(), LineMode::Complete);
    assert_eq!(line.text(), "beta alpha");
    h.handle_key(&mut line, &key(KeyKind::ArrowDown));
    assert_eq!(line.text(), "beta alps");
    h.handle_key(&mut line, &key(KeyKind::CtrlI));
    assert_eq!(line.mode(), LineMode::Normal);
    assert_eq!(line.text(), "beta alps");

    type_str(&mut h, &mut line, " ");
    h.handle_key(&mut line, &key(KeyKind::CtrlI));
    assert_eq!(line.text(), "beta alps     ");
}

#[test]
fn escape_restores_text_before_completion() {
    let completer = Arc::new(WordCompleter::new(["alpha", "alps"]));
    let mut h = BaseHandler::new();
    let mut line = line_with(completer, Arc::new(PlainTokenizer));
    type_str(&mut h, &mut line, "al");
    h.handle_key(&mut line, &key(KeyKind::BackTab));
    assert_eq!(line.text(), "alps");
    h.handle_key(&mut line, &key(KeyKind::Escape));
    assert_eq!(line.mode(), LineMode::Normal);
    assert_eq!(line.text(), "al");
}

#[test]
fn typing_while_completing_keeps_the_selection() {
    let completer = Arc::new(WordCompleter::new(["alpha", "alps"]));
    let mut h = BaseHandler::new();
    let mut line = line_with(completer, Arc::new(PlainTokenizer));
    type_str(&mut h, &mut line, "al");
    h.handle_key(&mut line, &key(KeyKind::CtrlI));
    type_str(&mut h, &mut line, "!");
    assert_eq!(line.mode(), LineMode::Normal);
    assert_eq!(line.text(), "alpha!");
}

#[test]
fn line_editing_keys() {
    let mut h = BaseHandler::new();
    let mut line = plain_line();
    type_str(&mut h, &mut line, "hello world");
    h.handle_key(&mut line, &key(KeyKind::CtrlT));
    assert_eq!(line.text(), "hello wordl");
    h.handle_key(&mut line, &key(KeyKind::CtrlH));
    assert_eq!(line.text(), "hello word");
    for _ in 0..4 {
        h.handle_key(&mut line, &key(KeyKind::CtrlB));
    }
    h.handle_key(&mut line, &key(KeyKind::CtrlK));
    assert_eq!(line.text(), "hello ");
    h.handle_key(&mut line, &key(KeyKind::Home));
    h.handle_key(&mut line, &key(KeyKind::Delete));
    assert_eq!(line.text(), "ello ");
    h.handle_key(&mut line, &key(KeyKind::End));
    h.handle_key(&mut line, &key(KeyKind::CtrlU));
    assert_eq!(line.text(), "");
}

#[test]
fn mouse_press_moves_the_cursor_and_drag_selects() {
    let mut h = BaseHandler::new();
    let mut line = plain_line();
    type_str(&mut h, &mut line, "one two");
    let press = |kind, col| PointerTarget {
        kind,
        location: Some((0, col)),
        completion: None,
    };
    h.handle_mouse(&mut line, press(MouseKind::Down, 1));
    assert_eq!(line.buffer().cursor(), 1);
    h.handle_mouse(&mut line, press(MouseKind::Drag, 3));
    h.handle_mouse(&mut line, press(MouseKind::Up, 3));
    assert_eq!(line.selection(), Some((1, 3)));

    h.handle_mouse(&mut line, press(MouseKind::DoubleClick, 5));
    assert_eq!(line.selection(), Some((4, 7)));
    type_str(&mut h, &mut line, "2");
    assert_eq!(line.text(), "one 2");
}

#[test]
fn clicking_a_menu_item_selects_it() {
    let completer = Arc::new(WordCompleter::new(["alpha", "alps"]));
    let mut h = BaseHandler::new();
    let mut line = line_with(completer, Arc::new(PlainTokenizer));
    type_str(&mut h, &mut line, "al");
    h.handle_key(&mut line, &key(KeyKind::CtrlI));
    h.handle_mouse(
        &mut line,
        PointerTarget {
            kind: MouseKind::Down,
            location: None,
            completion: Some(1),
        },
    );
    assert_eq!(line.text(), "alps");
    assert_eq!(line.mode(), LineMode::Complete);
}
