//! The event loop: one owner of the line, the decoder and the renderer.
//!
//! Each iteration waits on three sources with `select!` (biased in this
//! order): an input message, a redraw request, the poll timeout. Redraw
//! requests are drained on receipt so a burst collapses into one repaint.
//! A timeout with no half-read escape sequence does nothing; with one, the
//! pending prefix is flushed as literal keys. Every other event is followed
//! by exactly one render.
//!
//! Keys decoded from one message are handled in order. When one of them
//! ends the input (accept, abort, exit) the rest stay queued and are handled
//! first by the next `read_input`.

use crate::error::LineError;
use crate::options::{Policy, SessionOptions};
use core_actions::{EventHandler, PointerTarget, Signals};
use core_events::{
    EventSourceRegistry, InputMessage, KeyEvent, MouseEvent, RedrawHandle, input_channel,
    redraw_channel,
};
use core_input::{AsyncInputShutdown, KeyDecoder, spawn_crossterm_input, spawn_rune_reader};
use core_render::{DiffRenderer, Frame, Prompt, RenderBackend, ScrollingCellRenderer};
use core_state::Line;
use core_terminal::{CrosstermBackend, TerminalBackend, TerminalMode, enter_guard};
use std::collections::VecDeque;
use std::io;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, debug, info, trace, warn};

enum InputSource {
    /// Reader thread over stdin, spawned by the first read.
    Stdin(Sender<InputMessage>),
    /// crossterm event stream, spawned by the first read.
    Crossterm(Sender<InputMessage>),
    Reader(thread::JoinHandle<()>),
    Stream {
        task: JoinHandle<()>,
        shutdown: AsyncInputShutdown,
    },
    /// Messages come from a channel the caller feeds.
    External,
}

enum Polled {
    Input(InputMessage),
    Redraw { coalesced: usize },
    Timeout,
    Closed,
}

enum Step {
    Continue,
    Finish(Option<String>),
}

pub struct Session {
    line: Line,
    prompt: Box<dyn Prompt>,
    handler: Box<dyn EventHandler>,
    backend: Box<dyn RenderBackend>,
    decoder: KeyDecoder,
    queued: VecDeque<KeyEvent>,
    input: Receiver<InputMessage>,
    input_source: InputSource,
    redraw: RedrawHandle,
    redraw_rx: Receiver<()>,
    on_abort: Policy,
    on_exit: Policy,
    timeout: Duration,
    dispatch: Option<Dispatch>,
    sources: EventSourceRegistry,
    source_handles: Vec<JoinHandle<()>>,
    terminal: Option<Box<dyn TerminalBackend>>,
    mode: TerminalMode,
    /// Full-screen mode stays on the alternate screen between reads.
    screen_entered: bool,
}

impl Session {
    /// A session on the process terminal. Fails with
    /// [`LineError::NotATerminal`] when stdin or stdout is redirected.
    pub fn new(mut options: SessionOptions) -> Result<Self, LineError> {
        if !core_terminal::is_terminal() {
            return Err(LineError::NotATerminal);
        }
        let (tx, rx) = input_channel();
        let schema = std::mem::take(&mut options.schema);
        let (mode, backend, source): (_, Box<dyn RenderBackend>, _) = if options.full_screen {
            (
                TerminalMode::FullScreen,
                Box::new(ScrollingCellRenderer::stdout(schema)),
                InputSource::Crossterm(tx),
            )
        } else {
            (
                TerminalMode::Inline,
                Box::new(DiffRenderer::stdout(schema)),
                InputSource::Stdin(tx),
            )
        };
        let mut session = Self::assemble(options, backend, rx, source);
        session.terminal = Some(Box::new(CrosstermBackend::new(mode)));
        session.mode = mode;
        Ok(session)
    }

    /// A session over any backend and input channel; no terminal modes are
    /// touched. Used by tests and embedders that own the terminal.
    pub fn from_parts(
        options: SessionOptions,
        backend: Box<dyn RenderBackend>,
        input: Receiver<InputMessage>,
    ) -> Self {
        Self::assemble(options, backend, input, InputSource::External)
    }

    fn assemble(
        options: SessionOptions,
        backend: Box<dyn RenderBackend>,
        input: Receiver<InputMessage>,
        input_source: InputSource,
    ) -> Self {
        let (redraw, redraw_rx) = redraw_channel();
        let line = Line::new(
            options.history,
            options.completer,
            options.tokenizer,
            options.auto_indent,
        );
        Self {
            line,
            prompt: options.prompt,
            handler: options.handler,
            backend,
            decoder: KeyDecoder::new(),
            queued: VecDeque::new(),
            input,
            input_source,
            redraw,
            redraw_rx,
            on_abort: options.on_abort,
            on_exit: options.on_exit,
            timeout: options.input_timeout,
            dispatch: options.dispatch,
            sources: options.sources,
            source_handles: Vec::new(),
            terminal: None,
            mode: TerminalMode::Inline,
            screen_entered: false,
        }
    }

    /// Handle for background tasks that need the prompt repainted.
    pub fn redraw_handle(&self) -> RedrawHandle {
        self.redraw.clone()
    }

    pub fn line(&self) -> &Line {
        &self.line
    }

    /// Read one input. `Ok(None)` comes from a `return_none` policy.
    pub async fn read_input(&mut self) -> Result<Option<String>, LineError> {
        match self.dispatch.clone() {
            Some(dispatch) => self.read_input_inner().with_subscriber(dispatch).await,
            None => self.read_input_inner().await,
        }
    }

    /// Write `text` above the input (direct mode) or into the scrollback
    /// (full screen). A missing trailing newline is added.
    pub fn print(&mut self, text: &str) -> Result<(), LineError> {
        match self.dispatch.clone() {
            Some(dispatch) => tracing::dispatcher::with_default(&dispatch, || self.print_inner(text)),
            None => self.print_inner(text),
        }
    }

    /// Leave the alternate screen and stop background tasks.
    pub fn close(&mut self) -> Result<(), LineError> {
        self.stop_tasks();
        if self.screen_entered {
            self.screen_entered = false;
            if let Some(terminal) = self.terminal.as_mut() {
                terminal.leave()?;
            }
        }
        Ok(())
    }

    fn print_inner(&mut self, text: &str) -> Result<(), LineError> {
        self.enter_screen()?;
        let mut text = text.to_string();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        trace!(target: "session.loop", bytes = text.len(), "print");
        self.backend.print(&text)?;
        Ok(())
    }

    async fn read_input_inner(&mut self) -> Result<Option<String>, LineError> {
        self.start_input()?;
        if !self.sources.is_empty() {
            let handles = self.sources.spawn_all(&self.redraw);
            self.source_handles.extend(handles);
        }
        info!(target: "session.loop", mode = ?self.mode, "read_input_start");

        let mut terminal = self.terminal.take();
        let result = self.run_in_terminal(terminal.as_mut()).await;
        self.terminal = terminal;

        match &result {
            Ok(text) => info!(target: "session.loop", accepted = text.is_some(), "read_input_end"),
            Err(e) => debug!(target: "session.loop", error = %e, "read_input_end"),
        }
        result
    }

    async fn run_in_terminal(
        &mut self,
        terminal: Option<&mut Box<dyn TerminalBackend>>,
    ) -> Result<Option<String>, LineError> {
        match terminal {
            Some(terminal) if self.mode == TerminalMode::Inline => {
                let guard = enter_guard(terminal.as_mut())?;
                let result = self.run_loop().await;
                let released = guard.release();
                let text = result?;
                released?;
                Ok(text)
            }
            Some(terminal) => {
                if !self.screen_entered {
                    terminal.enter()?;
                    self.screen_entered = true;
                }
                self.run_loop().await
            }
            None => self.run_loop().await,
        }
    }

    fn enter_screen(&mut self) -> Result<(), LineError> {
        if self.mode != TerminalMode::FullScreen || self.screen_entered {
            return Ok(());
        }
        if let Some(terminal) = self.terminal.as_mut() {
            terminal.enter()?;
            self.screen_entered = true;
        }
        Ok(())
    }

    fn start_input(&mut self) -> Result<(), LineError> {
        self.input_source = match std::mem::replace(&mut self.input_source, InputSource::External) {
            InputSource::Stdin(tx) => {
                let handle = spawn_rune_reader(io::stdin(), tx, self.dispatch.clone())
                    .map_err(LineError::Read)?;
                InputSource::Reader(handle)
            }
            InputSource::Crossterm(tx) => {
                let (task, shutdown) = spawn_crossterm_input(tx);
                InputSource::Stream { task, shutdown }
            }
            running => running,
        };
        Ok(())
    }

    async fn run_loop(&mut self) -> Result<Option<String>, LineError> {
        self.line.reset();
        self.render(false)?;
        loop {
            let signals = if !self.queued.is_empty() {
                self.handle_keys(std::iter::empty())
            } else {
                match self.poll().await {
                    Polled::Input(message) => self.handle_message(message)?,
                    Polled::Redraw { coalesced } => {
                        trace!(target: "session.loop", coalesced, "redraw");
                        Signals::empty()
                    }
                    Polled::Timeout => {
                        if !self.decoder.has_pending() {
                            continue;
                        }
                        let keys = self.decoder.flush();
                        debug!(target: "session.loop", keys = keys.len(), "timeout_flush");
                        self.handle_keys(keys)
                    }
                    Polled::Closed => {
                        return Err(LineError::Read(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "input channel closed",
                        )));
                    }
                }
            };
            if let Step::Finish(text) = self.resolve(signals)? {
                return Ok(text);
            }
            self.render(false)?;
        }
    }

    async fn poll(&mut self) -> Polled {
        tokio::select! {
            biased;
            message = self.input.recv() => match message {
                Some(message) => Polled::Input(message),
                None => Polled::Closed,
            },
            Some(()) = self.redraw_rx.recv() => {
                let mut coalesced = 0;
                while self.redraw_rx.try_recv().is_ok() {
                    coalesced += 1;
                }
                Polled::Redraw { coalesced }
            }
            _ = tokio::time::sleep(self.timeout) => Polled::Timeout,
        }
    }

    fn handle_message(&mut self, message: InputMessage) -> Result<Signals, LineError> {
        match message {
            InputMessage::Rune(c) => {
                let keys = self.decoder.feed(c);
                Ok(self.handle_keys(keys))
            }
            InputMessage::Key(key) => Ok(self.handle_keys(Some(key))),
            InputMessage::Mouse(event) => Ok(self.handle_mouse(event)),
            InputMessage::Resize(width, height) => {
                debug!(target: "session.loop", width, height, "resize");
                self.backend.resize(width, height)?;
                Ok(Signals::empty())
            }
            InputMessage::ReadError(e) => {
                warn!(target: "session.loop", error = %e, "input_read_failed");
                Err(LineError::Read(e))
            }
        }
    }

    /// Queue `keys` behind any leftovers and handle them until one ends the input.
    fn handle_keys(&mut self, keys: impl IntoIterator<Item = KeyEvent>) -> Signals {
        self.queued.extend(keys);
        let mut signals = Signals::empty();
        while let Some(key) = self.queued.pop_front() {
            self.backend.restore_scroll();
            signals |= self.handler.handle_key(&mut self.line, &key);
            if self.line.take_selection_cancelled() {
                self.backend.cancel_selection();
            }
            if signals.intersects(Signals::ACCEPT | Signals::ABORT | Signals::EXIT) {
                break;
            }
        }
        signals
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Signals {
        let outcome = self.backend.mouse(event);
        let target = PointerTarget {
            kind: event.kind,
            location: outcome.location.map(|l| (l.row, l.col)),
            completion: outcome.completion,
        };
        trace!(target: "session.loop", kind = ?event.kind, location = ?target.location, completion = ?target.completion, "mouse");
        self.handler.handle_mouse(&mut self.line, target)
    }

    fn resolve(&mut self, signals: Signals) -> Result<Step, LineError> {
        if signals.contains(Signals::EXIT) {
            if let Step::Finish(text) = self.interrupt(self.on_exit, LineError::Exit)? {
                return Ok(Step::Finish(text));
            }
        }
        if signals.contains(Signals::ABORT) {
            if let Step::Finish(text) = self.interrupt(self.on_abort, LineError::Abort)? {
                return Ok(Step::Finish(text));
            }
        }
        if signals.contains(Signals::CLEAR) {
            self.backend.clear()?;
        }
        if signals.contains(Signals::LIST_COMPLETIONS) {
            let items = self.line.completions();
            if !items.is_empty() {
                self.backend.list_completions(&items)?;
            }
        }
        if signals.contains(Signals::ACCEPT) {
            self.render(true)?;
            return Ok(Step::Finish(Some(self.line.text())));
        }
        Ok(Step::Continue)
    }

    fn interrupt(&mut self, policy: Policy, error: LineError) -> Result<Step, LineError> {
        debug!(target: "session.loop", ?policy, interrupt = %error, "interrupt");
        match policy {
            Policy::ReturnError => {
                self.render(true)?;
                Err(error)
            }
            Policy::ReturnNone => {
                self.render(true)?;
                Ok(Step::Finish(None))
            }
            Policy::Retry => {
                self.render(true)?;
                self.line.reset();
                Ok(Step::Continue)
            }
            Policy::Ignore => Ok(Step::Continue),
        }
    }

    fn render(&mut self, conclude: bool) -> Result<(), LineError> {
        let frame = Frame::new(&self.line, self.prompt.as_ref());
        self.backend.render(&frame, conclude)?;
        Ok(())
    }

    fn stop_tasks(&mut self) {
        for handle in self.source_handles.drain(..) {
            handle.abort();
        }
        if let InputSource::Stream { shutdown, .. } = &self.input_source {
            shutdown.signal();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop_tasks();
        if let InputSource::Stream { task, .. } = &self.input_source {
            task.abort();
        }
    }
}
