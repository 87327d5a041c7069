use anyhow::Result;
use oxline::{
    CompletionItem, FileHistory, Frame, InputMessage, LineError, Location, MouseEvent, MouseKind,
    MouseOutcome, Policy, RenderBackend, Session, SessionOptions, WordCompleter, input_channel,
};
use pretty_assertions::assert_eq;
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tracing::Subscriber;
use tracing::dispatcher::Dispatch;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Render { text: String, conclude: bool },
    List(Vec<String>),
    Clear,
    Print(String),
    Resize(u16, u16),
}

fn render(text: &str, conclude: bool) -> Call {
    Call::Render {
        text: text.to_string(),
        conclude,
    }
}

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
    click: Option<Location>,
}

impl Recorder {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn renders(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Render { .. }))
            .collect()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl RenderBackend for Recorder {
    fn render(&mut self, frame: &Frame<'_>, conclude: bool) -> Result<()> {
        let text = frame.tokens.iter().map(|t| t.literal.as_str()).collect();
        self.push(Call::Render { text, conclude });
        Ok(())
    }

    fn list_completions(&mut self, items: &[CompletionItem]) -> Result<()> {
        self.push(Call::List(items.iter().map(|i| i.display.clone()).collect()));
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.push(Call::Clear);
        Ok(())
    }

    fn print(&mut self, text: &str) -> Result<()> {
        self.push(Call::Print(text.to_string()));
        Ok(())
    }

    fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        self.push(Call::Resize(width, height));
        Ok(())
    }

    fn mouse(&mut self, _event: MouseEvent) -> MouseOutcome {
        MouseOutcome {
            location: self.click,
            completion: None,
        }
    }
}

fn session(options: SessionOptions) -> (Session, Sender<InputMessage>, Recorder) {
    session_with(options, Recorder::default())
}

fn session_with(
    options: SessionOptions,
    recorder: Recorder,
) -> (Session, Sender<InputMessage>, Recorder) {
    let (tx, rx) = input_channel();
    let s = Session::from_parts(options, Box::new(recorder.clone()), rx);
    (s, tx, recorder)
}

async fn feed(tx: &Sender<InputMessage>, text: &str) {
    for c in text.chars() {
        tx.send(InputMessage::Rune(c)).await.unwrap();
    }
}

fn feed_later(tx: &Sender<InputMessage>, after: Duration, text: &'static str) {
    let tx = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        feed(&tx, text).await;
    });
}

#[tokio::test(start_paused = true)]
async fn accept_renders_once_per_key() {
    let (mut s, tx, rec) = session(SessionOptions::default());
    feed(&tx, "hi\r").await;
    assert_eq!(s.read_input().await.unwrap(), Some("hi".to_string()));
    assert_eq!(
        rec.renders(),
        vec![
            render("", false),
            render("h", false),
            render("hi", false),
            render("hi", true),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn abort_retries_by_default() {
    let (mut s, tx, rec) = session(SessionOptions::default());
    feed(&tx, "ab\x03c\r").await;
    assert_eq!(s.read_input().await.unwrap(), Some("c".to_string()));
    let renders = rec.renders();
    assert!(renders.contains(&render("ab", true)));
    assert_eq!(renders.last(), Some(&render("c", true)));
}

#[tokio::test(start_paused = true)]
async fn exit_on_empty_buffer_returns_an_error_by_default() {
    let (mut s, tx, _rec) = session(SessionOptions::default());
    feed(&tx, "\x04").await;
    assert!(matches!(s.read_input().await, Err(LineError::Exit)));
}

#[tokio::test(start_paused = true)]
async fn policies_are_independent() {
    let options = SessionOptions {
        on_abort: Policy::ReturnNone,
        on_exit: Policy::Ignore,
        ..SessionOptions::default()
    };
    let (mut s, tx, _rec) = session(options);
    feed(&tx, "\x04x\x03").await;
    assert_eq!(s.read_input().await.unwrap(), None);

    let options = SessionOptions {
        on_abort: Policy::ReturnError,
        ..SessionOptions::default()
    };
    let (mut s, tx, _rec) = session(options);
    feed(&tx, "x\x03").await;
    let err = s.read_input().await.unwrap_err();
    assert!(err.is_interrupt());
    assert_eq!(err.to_string(), "user abort");
}

#[tokio::test(start_paused = true)]
async fn idle_timeouts_do_not_render() {
    let (mut s, tx, rec) = session(SessionOptions::default());
    feed_later(&tx, Duration::from_secs(2), "q\r");
    assert_eq!(s.read_input().await.unwrap(), Some("q".to_string()));
    assert_eq!(
        rec.renders(),
        vec![render("", false), render("q", false), render("q", true)]
    );
}

#[tokio::test(start_paused = true)]
async fn timeout_flushes_a_pending_escape_prefix() {
    let (mut s, tx, rec) = session(SessionOptions::default());
    feed(&tx, "\x1b[").await;
    feed_later(&tx, Duration::from_secs(1), "x\r");
    assert_eq!(s.read_input().await.unwrap(), Some("[x".to_string()));
    // The prefix was resolved on its own, before `x` arrived.
    assert!(rec.renders().contains(&render("[", false)));
}

#[tokio::test(start_paused = true)]
async fn redraw_bursts_collapse_into_one_render() {
    let (mut s, tx, rec) = session(SessionOptions::default());
    let redraw = s.redraw_handle();
    for _ in 0..5 {
        assert!(redraw.request());
    }
    feed_later(&tx, Duration::from_millis(10), "\r");
    assert_eq!(s.read_input().await.unwrap(), Some(String::new()));
    assert_eq!(
        rec.renders(),
        vec![render("", false), render("", false), render("", true)]
    );
}

#[tokio::test(start_paused = true)]
async fn list_and_clear_reach_the_backend() {
    let options =
        SessionOptions::default().with_completer(WordCompleter::new(["alpha", "alps", "beta"]));
    let (mut s, tx, rec) = session(options);
    feed(&tx, "al\x00\x0c\r").await;
    assert_eq!(s.read_input().await.unwrap(), Some("al".to_string()));
    let others: Vec<Call> = rec
        .calls()
        .into_iter()
        .filter(|c| !matches!(c, Call::Render { .. }))
        .collect();
    assert_eq!(
        others,
        vec![
            Call::List(vec!["alpha".to_string(), "alps".to_string()]),
            Call::Clear
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn accepted_input_is_recalled_from_file_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history");
    let options = SessionOptions::default().with_history(FileHistory::open(&path).unwrap());
    let (mut s, tx, _rec) = session(options);
    feed(&tx, "ls\r").await;
    assert_eq!(s.read_input().await.unwrap(), Some("ls".to_string()));
    feed(&tx, "\x10 -l\r").await;
    assert_eq!(s.read_input().await.unwrap(), Some("ls -l".to_string()));

    let reloaded = FileHistory::open(&path).unwrap();
    assert_eq!(
        oxline::History::get_all(&reloaded).to_vec(),
        vec!["ls".to_string(), "ls -l".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn read_failures_end_the_session() {
    let (mut s, tx, _rec) = session(SessionOptions::default());
    tx.send(InputMessage::ReadError(io::Error::new(
        io::ErrorKind::BrokenPipe,
        "gone",
    )))
    .await
    .unwrap();
    assert!(matches!(s.read_input().await, Err(LineError::Read(_))));

    drop(tx);
    match s.read_input().await {
        Err(LineError::Read(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
        other => panic!("expected read error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn mouse_press_moves_the_cursor() {
    let recorder = Recorder {
        click: Some(Location::new(0, 1)),
        ..Recorder::default()
    };
    let (mut s, tx, rec) = session_with(SessionOptions::default(), recorder);
    feed(&tx, "ab").await;
    tx.send(InputMessage::Mouse(MouseEvent {
        kind: MouseKind::Down,
        column: 3,
        row: 0,
    }))
    .await
    .unwrap();
    tx.send(InputMessage::Resize(100, 30)).await.unwrap();
    feed(&tx, "X\r").await;
    assert_eq!(s.read_input().await.unwrap(), Some("aXb".to_string()));
    assert!(rec.calls().contains(&Call::Resize(100, 30)));
}

#[tokio::test(start_paused = true)]
async fn print_appends_a_newline() {
    let (mut s, _tx, rec) = session(SessionOptions::default());
    s.print("hello").unwrap();
    s.print("done\n").unwrap();
    assert_eq!(
        rec.calls(),
        vec![
            Call::Print("hello\n".to_string()),
            Call::Print("done\n".to_string())
        ]
    );
}

#[derive(Clone, Default)]
struct Capture {
    events: Arc<Mutex<Vec<(String, String)>>>,
}

struct MessageVisitor(Option<String>);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{value:?}"));
        }
    }
}

impl<S: Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(None);
        event.record(&mut visitor);
        if let Some(message) = visitor.0 {
            self.events
                .lock()
                .unwrap()
                .push((event.metadata().target().to_string(), message));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn session_logs_go_to_the_injected_dispatch() {
    let capture = Capture::default();
    let events = capture.events.clone();
    let dispatch = Dispatch::new(Registry::default().with(capture));
    let (mut s, tx, _rec) = session(SessionOptions::default().with_dispatch(dispatch));
    feed(&tx, "\r").await;
    s.read_input().await.unwrap();

    let events = events.lock().unwrap();
    let session_events: Vec<&str> = events
        .iter()
        .filter(|(target, _)| target == "session.loop")
        .map(|(_, message)| message.as_str())
        .collect();
    assert_eq!(session_events.first(), Some(&"read_input_start"));
    assert_eq!(session_events.last(), Some(&"read_input_end"));
}
