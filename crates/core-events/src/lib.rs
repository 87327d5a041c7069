//! Event types shared by the input sources, the key handler and the session
//! loop, plus the redraw signal and the background event-source registry.

use std::fmt;
use std::io;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tokio::task::JoinHandle;

// -------------------------------------------------------------------------------------------------
// Channel sizing
// -------------------------------------------------------------------------------------------------
// Input is bounded small: the stdin reader parks on `blocking_send` when the loop falls behind,
// which is fine for a single human typist. Redraw requests are bounded large and drained in full
// at the top of every loop iteration so bursts collapse into one repaint.
// -------------------------------------------------------------------------------------------------
pub const INPUT_CHANNEL_CAP: usize = 16;
pub const REDRAW_CHANNEL_CAP: usize = 1024;

/// Closed set of recognized keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    CtrlSpace,
    CtrlA,
    CtrlB,
    CtrlC,
    CtrlD,
    CtrlE,
    CtrlF,
    CtrlG,
    CtrlH,
    CtrlI,
    CtrlJ,
    CtrlK,
    CtrlL,
    CtrlM,
    CtrlN,
    CtrlO,
    CtrlP,
    CtrlQ,
    CtrlR,
    CtrlS,
    CtrlT,
    CtrlU,
    CtrlV,
    CtrlW,
    CtrlX,
    CtrlY,
    CtrlZ,
    CtrlBackslash,
    CtrlSquareClose,
    CtrlCircumflex,
    CtrlUnderscore,
    Escape,
    Backspace,
    ArrowUp,
    ArrowDown,
    ArrowRight,
    ArrowLeft,
    Home,
    End,
    Delete,
    ShiftDelete,
    PageUp,
    PageDown,
    BackTab,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    /// Literal text; the payload is the inserted character(s).
    InsertChar,
}

impl KeyKind {
    /// Ctrl-A .. Ctrl-Z in order, indexed by `letter - 'a'`.
    pub const CTRL_LETTERS: [KeyKind; 26] = [
        KeyKind::CtrlA,
        KeyKind::CtrlB,
        KeyKind::CtrlC,
        KeyKind::CtrlD,
        KeyKind::CtrlE,
        KeyKind::CtrlF,
        KeyKind::CtrlG,
        KeyKind::CtrlH,
        KeyKind::CtrlI,
        KeyKind::CtrlJ,
        KeyKind::CtrlK,
        KeyKind::CtrlL,
        KeyKind::CtrlM,
        KeyKind::CtrlN,
        KeyKind::CtrlO,
        KeyKind::CtrlP,
        KeyKind::CtrlQ,
        KeyKind::CtrlR,
        KeyKind::CtrlS,
        KeyKind::CtrlT,
        KeyKind::CtrlU,
        KeyKind::CtrlV,
        KeyKind::CtrlW,
        KeyKind::CtrlX,
        KeyKind::CtrlY,
        KeyKind::CtrlZ,
    ];

    /// Function keys F1..F20, indexed by `n - 1`.
    pub const FUNCTION_KEYS: [KeyKind; 20] = [
        KeyKind::F1,
        KeyKind::F2,
        KeyKind::F3,
        KeyKind::F4,
        KeyKind::F5,
        KeyKind::F6,
        KeyKind::F7,
        KeyKind::F8,
        KeyKind::F9,
        KeyKind::F10,
        KeyKind::F11,
        KeyKind::F12,
        KeyKind::F13,
        KeyKind::F14,
        KeyKind::F15,
        KeyKind::F16,
        KeyKind::F17,
        KeyKind::F18,
        KeyKind::F19,
        KeyKind::F20,
    ];

    pub fn ctrl_letter(letter: char) -> Option<KeyKind> {
        let letter = letter.to_ascii_lowercase();
        if letter.is_ascii_lowercase() {
            Some(Self::CTRL_LETTERS[(letter as u8 - b'a') as usize])
        } else {
            None
        }
    }

    pub fn function(n: u8) -> Option<KeyKind> {
        Self::FUNCTION_KEYS.get((n as usize).checked_sub(1)?).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyKind,
    /// Raw input that produced the event.
    pub payload: String,
}

impl KeyEvent {
    pub fn new(kind: KeyKind, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    pub fn insert(c: char) -> Self {
        Self {
            kind: KeyKind::InsertChar,
            payload: c.to_string(),
        }
    }

    pub fn escape() -> Self {
        Self::new(KeyKind::Escape, "\x1b")
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.kind, self.payload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseKind {
    Down,
    Drag,
    Up,
    DoubleClick,
    TripleClick,
    WheelUp,
    WheelDown,
}

/// Mouse action at a window cell (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseKind,
    pub column: u16,
    pub row: u16,
}

/// Messages delivered to the session loop by an input source.
#[derive(Debug)]
pub enum InputMessage {
    /// One decoded character from the raw byte stream (direct mode).
    Rune(char),
    /// A key already recognized by the terminal library (full-screen mode).
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// The input stream failed or closed; ends the session with an error.
    ReadError(io::Error),
}

pub fn input_channel() -> (Sender<InputMessage>, Receiver<InputMessage>) {
    mpsc::channel(INPUT_CHANNEL_CAP)
}

/// Thread-safe "please repaint" signal. Cloneable; the only way background
/// tasks may influence the session.
#[derive(Debug, Clone)]
pub struct RedrawHandle {
    tx: Sender<()>,
}

impl RedrawHandle {
    /// Request a repaint. Returns false once the session is gone.
    pub fn request(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            // A full queue already guarantees a repaint.
            Err(TrySendError::Full(())) => {
                tracing::trace!(target: "runtime.events", "redraw_queue_full");
                true
            }
            Err(TrySendError::Closed(())) => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub fn redraw_channel() -> (RedrawHandle, Receiver<()>) {
    let (tx, rx) = mpsc::channel(REDRAW_CHANNEL_CAP);
    (RedrawHandle { tx }, rx)
}

// -------------------------------------------------------------------------------------------------
// Background event sources
// -------------------------------------------------------------------------------------------------

/// A background producer (clock, watcher, ...) that may only request redraws.
pub trait AsyncEventSource: Send + 'static {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;
    /// Consume self and spawn the task. Implementors stop once
    /// `RedrawHandle::request` returns false.
    fn spawn(self: Box<Self>, redraw: RedrawHandle) -> JoinHandle<()>;
}

#[derive(Default)]
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Spawn every registered source; the registry is left empty so a second
    /// call spawns nothing.
    pub fn spawn_all(&mut self, redraw: &RedrawHandle) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(redraw.clone()));
        }
        out
    }
}

/// Requests a redraw every `interval` (e.g. for a clock prompt).
pub struct TickEventSource {
    interval: std::time::Duration,
}

impl TickEventSource {
    pub fn new(interval: std::time::Duration) -> Self {
        Self { interval }
    }
}

impl AsyncEventSource for TickEventSource {
    fn name(&self) -> &'static str {
        "tick"
    }

    fn spawn(self: Box<Self>, redraw: RedrawHandle) -> JoinHandle<()> {
        let dur = self.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(dur);
            loop {
                interval.tick().await;
                if !redraw.request() {
                    break;
                }
            }
        })
    }
}
