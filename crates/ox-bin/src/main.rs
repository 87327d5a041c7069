//! `oxline` demo binary: reads lines with the selected demo configuration and
//! echoes them back.

mod demos;

use anyhow::{Context, Result};
use clap::Parser;
use demos::Demo;
use oxline::{FileHistory, LineError, Session, SessionOptions};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;

const DEFAULT_LOG_FILE: &str = "oxline.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "oxline", version, about = "Interactive line editing demo")]
struct Args {
    /// Use the alternate screen with scrollback and mouse support.
    #[arg(long)]
    full_screen: bool,
    /// Persist history to this file (overrides `[history] path`).
    #[arg(long)]
    history: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Demo::Echo)]
    demo: Demo,
    /// Configuration file path (overrides discovery of `oxline.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// Log destination, filtered by `RUST_LOG`.
    #[arg(long = "log-file", default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (dispatch, _log_guard) = configure_logging(&args.log_file);
    install_panic_hook(dispatch.clone());

    let options =
        tracing::dispatcher::with_default(&dispatch, || session_options(&args, dispatch.clone()))?;
    let mut session = match Session::new(options) {
        Ok(session) => session,
        Err(LineError::NotATerminal) => {
            eprintln!("oxline: stdin and stdout must be a terminal");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let result = echo_loop(&mut session, args.demo).await;
    session.close()?;
    result
}

fn session_options(args: &Args, dispatch: Dispatch) -> Result<SessionOptions> {
    let config = oxline::load_from(args.config.clone())?;
    let mut options = SessionOptions::from_config(&config)?.with_dispatch(dispatch);
    if args.full_screen {
        options.full_screen = true;
    }
    if let Some(path) = &args.history {
        let history = FileHistory::open(path)
            .with_context(|| format!("opening history file {}", path.display()))?;
        options = options.with_history(history);
    }
    tracing::info!(
        target: "runtime",
        demo = ?args.demo,
        full_screen = options.full_screen,
        "startup"
    );
    Ok(args.demo.configure(options))
}

async fn echo_loop(session: &mut Session, demo: Demo) -> Result<()> {
    if let Some(banner) = demo.banner() {
        session.print(banner)?;
    }
    loop {
        match session.read_input().await {
            Ok(Some(text)) => session.print(&format!("echo: {text}"))?,
            Ok(None) => break,
            Err(e) if e.is_interrupt() => {
                tracing::debug!(target: "runtime", reason = %e, "demo_finished");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// File logging through a non-blocking writer. The returned guard flushes
/// pending lines when dropped, so it must outlive the session.
fn configure_logging(log_file: &Path) -> (Dispatch, WorkerGuard) {
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let name = log_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_LOG_FILE.into());
    let file_appender = tracing_appender::rolling::never(dir, name);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .with_ansi(false)
        .finish();
    (Dispatch::new(subscriber), guard)
}

fn install_panic_hook(dispatch: Dispatch) {
    static HOOK: Once = Once::new();
    HOOK.call_once(move || {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::dispatcher::with_default(&dispatch, || {
                tracing::error!(target: "runtime.panic", ?info, "panic");
            });
            default_panic(info);
        }));
    });
}
