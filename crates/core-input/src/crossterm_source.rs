//! Full-screen input: forwards crossterm's `EventStream` into the session's
//! input channel.
//!
//! Keys arrive already parsed, so they bypass the [`KeyDecoder`] and are
//! mapped straight to [`KeyEvent`]s carrying the canonical byte sequence as
//! payload. Repeated left clicks on one cell are folded into double and
//! triple clicks. A stream error or end of stream is forwarded once as
//! `InputMessage::ReadError`.
//!
//! [`KeyDecoder`]: crate::KeyDecoder

use crate::key_table;
use core_events::{InputMessage, KeyEvent, KeyKind, MouseEvent, MouseKind};
use crossterm::event::{
    Event as CEvent, EventStream, KeyCode as CKeyCode, KeyEvent as CKeyEvent,
    KeyEventKind as CKind, KeyModifiers as CMods, MouseButton, MouseEvent as CMouseEvent,
    MouseEventKind as CMouseKind,
};
use smallvec::{SmallVec, smallvec};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Notify, mpsc::Sender};
use tokio::task;
use tokio_stream::StreamExt;
use tracing::{debug, info, trace, warn};

/// Two presses on the same cell closer than this count as one multi-click.
pub const MULTI_CLICK_WINDOW: Duration = Duration::from_millis(200);

#[derive(Clone, Debug)]
pub struct AsyncInputShutdown {
    notify: Arc<Notify>,
}

impl AsyncInputShutdown {
    pub fn signal(&self) {
        self.notify.notify_one();
    }
}

#[derive(Clone, Debug)]
struct ShutdownListener {
    notify: Arc<Notify>,
}

impl ShutdownListener {
    fn new_pair() -> (AsyncInputShutdown, Self) {
        let notify = Arc::new(Notify::new());
        (
            AsyncInputShutdown {
                notify: notify.clone(),
            },
            ShutdownListener { notify },
        )
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Spawn the forwarding task over the process terminal.
pub fn spawn_crossterm_input(
    sender: Sender<InputMessage>,
) -> (task::JoinHandle<()>, AsyncInputShutdown) {
    spawn_stream_input(sender, EventStream::new())
}

/// Spawn the forwarding task over any crossterm-shaped event stream.
pub fn spawn_stream_input<S>(
    sender: Sender<InputMessage>,
    stream: S,
) -> (task::JoinHandle<()>, AsyncInputShutdown)
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    let (shutdown, listener) = ShutdownListener::new_pair();
    let handle = task::spawn(CrosstermForwardTask::new(sender, stream, listener).run());
    (handle, shutdown)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExitReason {
    Running,
    ShutdownSignal,
    ChannelClosed,
    StreamEnded,
    StreamError,
}

impl ExitReason {
    fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Running => "running",
            ExitReason::ShutdownSignal => "shutdown_signal",
            ExitReason::ChannelClosed => "channel_closed",
            ExitReason::StreamEnded => "stream_ended",
            ExitReason::StreamError => "stream_error",
        }
    }
}

/// Folds left-button presses into single, double and triple clicks.
#[derive(Debug, Default)]
pub struct ClickTracker {
    last: Option<(u16, u16, Instant)>,
    count: u8,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, column: u16, row: u16, now: Instant) -> MouseKind {
        let repeated = matches!(
            self.last,
            Some((c, r, at)) if c == column && r == row && now.duration_since(at) < MULTI_CLICK_WINDOW
        );
        self.count = if repeated { self.count + 1 } else { 1 };
        self.last = Some((column, row, now));
        match self.count {
            1 => MouseKind::Down,
            2 => MouseKind::DoubleClick,
            _ => {
                self.count = 0;
                MouseKind::TripleClick
            }
        }
    }
}

struct CrosstermForwardTask<S>
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    sender: Sender<InputMessage>,
    stream: S,
    shutdown: ShutdownListener,
    clicks: ClickTracker,
    exit_reason: ExitReason,
}

impl<S> CrosstermForwardTask<S>
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    fn new(sender: Sender<InputMessage>, stream: S, shutdown: ShutdownListener) -> Self {
        Self {
            sender,
            stream,
            shutdown,
            clicks: ClickTracker::new(),
            exit_reason: ExitReason::Running,
        }
    }

    async fn run(mut self) {
        info!(target: "input.thread", "crossterm_input_started");
        let failure = loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.wait() => {
                    self.exit_reason = ExitReason::ShutdownSignal;
                    break None;
                }
                next = self.stream.next() => next,
            };
            let event = match next {
                Some(Ok(event)) => event,
                Some(Err(err)) => {
                    self.exit_reason = ExitReason::StreamError;
                    break Some(err);
                }
                None => {
                    self.exit_reason = ExitReason::StreamEnded;
                    break Some(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
                }
            };
            if !self.forward(event).await {
                self.exit_reason = ExitReason::ChannelClosed;
                break None;
            }
        };

        if let Some(err) = failure {
            if self.exit_reason == ExitReason::StreamError {
                warn!(target: "input.thread", error = %err, "crossterm_input_stream_error");
            }
            let _ = self.sender.send(InputMessage::ReadError(err)).await;
        }
        info!(target: "input.thread", reason = self.exit_reason.as_str(), "crossterm_input_stopped");
    }

    async fn forward(&mut self, event: CEvent) -> bool {
        match event {
            CEvent::Key(key) => {
                for ev in map_key_event(&key) {
                    trace!(target: "input.event", key = %ev, "key");
                    if !self.send(InputMessage::Key(ev)).await {
                        return false;
                    }
                }
                true
            }
            CEvent::Mouse(mouse) => match self.map_mouse(&mouse) {
                Some(ev) => self.send(InputMessage::Mouse(ev)).await,
                None => true,
            },
            CEvent::Resize(w, h) => {
                trace!(target: "input.event", w, h, "resize");
                self.send(InputMessage::Resize(w, h)).await
            }
            CEvent::Paste(data) => {
                trace!(target: "input.paste", len = data.len(), "paste_event");
                self.send(InputMessage::Key(KeyEvent::new(KeyKind::InsertChar, data)))
                    .await
            }
            CEvent::FocusGained | CEvent::FocusLost => true,
        }
    }

    fn map_mouse(&mut self, mouse: &CMouseEvent) -> Option<MouseEvent> {
        let kind = match mouse.kind {
            CMouseKind::Down(MouseButton::Left) => {
                self.clicks.press(mouse.column, mouse.row, Instant::now())
            }
            CMouseKind::Drag(MouseButton::Left) => MouseKind::Drag,
            CMouseKind::Up(MouseButton::Left) => MouseKind::Up,
            CMouseKind::ScrollUp => MouseKind::WheelUp,
            CMouseKind::ScrollDown => MouseKind::WheelDown,
            _ => return None,
        };
        Some(MouseEvent {
            kind,
            column: mouse.column,
            row: mouse.row,
        })
    }

    async fn send(&mut self, msg: InputMessage) -> bool {
        if self.sender.send(msg).await.is_err() {
            debug!(target: "input.thread", "crossterm_input_channel_closed");
            return false;
        }
        true
    }
}

fn keyed(kind: KeyKind) -> KeyEvent {
    KeyEvent::new(kind, key_table::canonical_sequence(kind).unwrap_or_default())
}

fn ctrl_char(c: char) -> Option<KeyEvent> {
    let kind = match c {
        ' ' | '@' | '2' => KeyKind::CtrlSpace,
        '\\' | '4' => KeyKind::CtrlBackslash,
        ']' | '5' => KeyKind::CtrlSquareClose,
        '^' | '6' => KeyKind::CtrlCircumflex,
        '_' | '-' | '7' => KeyKind::CtrlUnderscore,
        c => KeyKind::ctrl_letter(c)?,
    };
    Some(keyed(kind))
}

/// Translate a pre-parsed key into the events the byte decoder would have
/// produced for the same key. Alt prefixes become a leading Escape.
pub fn map_key_event(key: &CKeyEvent) -> SmallVec<[KeyEvent; 2]> {
    if key.kind == CKind::Release {
        return SmallVec::new();
    }
    let mut out: SmallVec<[KeyEvent; 2]> = match key.code {
        CKeyCode::Char(c) if key.modifiers.contains(CMods::CONTROL) => {
            ctrl_char(c).into_iter().collect()
        }
        CKeyCode::Char(c) => smallvec![KeyEvent::insert(c)],
        CKeyCode::Enter => smallvec![keyed(KeyKind::CtrlM)],
        CKeyCode::Tab => smallvec![keyed(KeyKind::CtrlI)],
        CKeyCode::BackTab => smallvec![keyed(KeyKind::BackTab)],
        CKeyCode::Backspace => smallvec![keyed(KeyKind::Backspace)],
        CKeyCode::Esc => smallvec![KeyEvent::escape()],
        CKeyCode::Up => smallvec![keyed(KeyKind::ArrowUp)],
        CKeyCode::Down => smallvec![keyed(KeyKind::ArrowDown)],
        CKeyCode::Left => smallvec![keyed(KeyKind::ArrowLeft)],
        CKeyCode::Right => smallvec![keyed(KeyKind::ArrowRight)],
        CKeyCode::Home => smallvec![keyed(KeyKind::Home)],
        CKeyCode::End => smallvec![keyed(KeyKind::End)],
        CKeyCode::Delete if key.modifiers.contains(CMods::SHIFT) => {
            smallvec![keyed(KeyKind::ShiftDelete)]
        }
        CKeyCode::Delete => smallvec![keyed(KeyKind::Delete)],
        CKeyCode::PageUp => smallvec![keyed(KeyKind::PageUp)],
        CKeyCode::PageDown => smallvec![keyed(KeyKind::PageDown)],
        CKeyCode::F(n) => KeyKind::function(n).map(keyed).into_iter().collect(),
        _ => SmallVec::new(),
    };
    if key.modifiers.contains(CMods::ALT) && !out.is_empty() {
        out.insert(0, KeyEvent::escape());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use pretty_assertions::assert_eq;

    fn key(code: CKeyCode, modifiers: CMods) -> CKeyEvent {
        CKeyEvent {
            code,
            modifiers,
            kind: CKind::Press,
            state: KeyEventState::empty(),
        }
    }

    #[test]
    fn ctrl_letters_carry_control_bytes() {
        let out = map_key_event(&key(CKeyCode::Char('a'), CMods::CONTROL));
        assert_eq!(out.into_vec(), vec![KeyEvent::new(KeyKind::CtrlA, "\x01")]);
        let out = map_key_event(&key(CKeyCode::Char('_'), CMods::CONTROL));
        assert_eq!(out[0].kind, KeyKind::CtrlUnderscore);
    }

    #[test]
    fn named_keys_use_canonical_sequences() {
        let out = map_key_event(&key(CKeyCode::Enter, CMods::NONE));
        assert_eq!(out.into_vec(), vec![KeyEvent::new(KeyKind::CtrlM, "\r")]);
        let out = map_key_event(&key(CKeyCode::Up, CMods::NONE));
        assert_eq!(out.into_vec(), vec![KeyEvent::new(KeyKind::ArrowUp, "\x1b[A")]);
        let out = map_key_event(&key(CKeyCode::Delete, CMods::SHIFT));
        assert_eq!(out[0].kind, KeyKind::ShiftDelete);
        let out = map_key_event(&key(CKeyCode::F(12), CMods::NONE));
        assert_eq!(out[0].kind, KeyKind::F12);
    }

    #[test]
    fn alt_prefixes_escape() {
        let out = map_key_event(&key(CKeyCode::Char('b'), CMods::ALT));
        assert_eq!(out.into_vec(), vec![KeyEvent::escape(), KeyEvent::insert('b')]);
    }

    #[test]
    fn releases_and_unknown_keys_are_ignored() {
        let mut ev = key(CKeyCode::Char('x'), CMods::NONE);
        ev.kind = CKind::Release;
        assert!(map_key_event(&ev).is_empty());
        assert!(map_key_event(&key(CKeyCode::CapsLock, CMods::NONE)).is_empty());
        assert!(map_key_event(&key(CKeyCode::F(30), CMods::NONE)).is_empty());
    }

    #[test]
    fn clicks_fold_into_double_and_triple() {
        let mut t = ClickTracker::new();
        let t0 = Instant::now();
        assert_eq!(t.press(3, 1, t0), MouseKind::Down);
        assert_eq!(t.press(3, 1, t0 + Duration::from_millis(50)), MouseKind::DoubleClick);
        assert_eq!(t.press(3, 1, t0 + Duration::from_millis(100)), MouseKind::TripleClick);
        assert_eq!(t.press(3, 1, t0 + Duration::from_millis(150)), MouseKind::Down);
        // Another cell starts over.
        assert_eq!(t.press(4, 1, t0 + Duration::from_millis(160)), MouseKind::Down);
        // Too slow.
        assert_eq!(t.press(4, 1, t0 + Duration::from_millis(600)), MouseKind::Down);
    }

    #[tokio::test]
    async fn stream_events_are_forwarded_then_end_is_reported() {
        let events = vec![
            Ok(CEvent::Key(key(CKeyCode::Char('h'), CMods::NONE))),
            Ok(CEvent::Resize(80, 24)),
            Ok(CEvent::Paste("pasted".into())),
            Ok(CEvent::FocusGained),
        ];
        let (tx, mut rx) = core_events::input_channel();
        let (handle, _shutdown) = spawn_stream_input(tx, tokio_stream::iter(events));
        match rx.recv().await {
            Some(InputMessage::Key(ev)) => assert_eq!(ev, KeyEvent::insert('h')),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(rx.recv().await, Some(InputMessage::Resize(80, 24))));
        match rx.recv().await {
            Some(InputMessage::Key(ev)) => assert_eq!(ev.payload, "pasted"),
            other => panic!("unexpected {other:?}"),
        }
        match rx.recv().await {
            Some(InputMessage::ReadError(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected {other:?}"),
        }
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_signal_stops_the_task() {
        let (tx, mut rx) = core_events::input_channel();
        let (handle, shutdown) = spawn_stream_input(tx, tokio_stream::pending());
        shutdown.signal();
        handle.await.unwrap();
        assert!(rx.recv().await.is_none());
    }
}
