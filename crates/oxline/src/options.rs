//! Per-session configuration.

use anyhow::Result;
use core_actions::{BaseHandler, EventHandler};
use core_config::{LineConfig, StyleConfig};
use core_events::{AsyncEventSource, EventSourceRegistry};
use core_render::{BasePrompt, Color, Prompt, Schema, Style};
use core_state::{Completer, FileHistory, History, MemHistory, NoCompletion};
use core_text::{PlainTokenizer, TokenType, Tokenizer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Dispatch, info, warn};

pub use core_config::Policy;

pub const DEFAULT_INPUT_TIMEOUT: Duration = Duration::from_millis(100);

pub struct SessionOptions {
    pub prompt: Box<dyn Prompt>,
    pub completer: Arc<dyn Completer>,
    pub tokenizer: Arc<dyn Tokenizer>,
    pub history: Box<dyn History>,
    pub schema: Schema,
    pub handler: Box<dyn EventHandler>,
    /// Ctrl-C.
    pub on_abort: Policy,
    /// Ctrl-D on an empty buffer.
    pub on_exit: Policy,
    pub auto_indent: bool,
    /// Poll timeout; pending escape prefixes are flushed when it fires.
    pub input_timeout: Duration,
    /// Alternate screen with scrollback, mouse selection and clipboard.
    pub full_screen: bool,
    /// Subscriber for everything the session logs. `None` uses whatever the
    /// host installed.
    pub dispatch: Option<Dispatch>,
    pub sources: EventSourceRegistry,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            prompt: Box::new(BasePrompt::default()),
            completer: Arc::new(NoCompletion),
            tokenizer: Arc::new(PlainTokenizer),
            history: Box::new(MemHistory::new()),
            schema: Schema::default(),
            handler: Box::new(BaseHandler::new()),
            on_abort: Policy::Retry,
            on_exit: Policy::ReturnError,
            auto_indent: false,
            input_timeout: DEFAULT_INPUT_TIMEOUT,
            full_screen: false,
            dispatch: None,
            sources: EventSourceRegistry::new(),
        }
    }
}

impl SessionOptions {
    /// Defaults overlaid with a loaded `oxline.toml`: policies, timeout,
    /// screen mode, the history file and style overrides.
    pub fn from_config(config: &LineConfig) -> Result<Self> {
        let session = config.session();
        let mut options = Self {
            on_abort: session.on_abort,
            on_exit: session.on_exit,
            auto_indent: session.auto_indent,
            input_timeout: session.input_timeout(),
            full_screen: session.full_screen,
            ..Self::default()
        };
        if let Some(path) = config.history().resolved_path() {
            info!(target: "config", path = %path.display(), "history_file");
            options.history = Box::new(FileHistory::open(path)?);
        }
        options.schema.apply_overrides(config.styles().filter_map(|(name, raw)| {
            match style_from_config(raw) {
                Ok(style) => Some((TokenType::new(name), style)),
                Err(e) => {
                    warn!(target: "config", kind = name, error = %e, "style_override_invalid");
                    None
                }
            }
        }));
        Ok(options)
    }

    pub fn with_prompt(mut self, prompt: impl Prompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    pub fn with_completer(mut self, completer: impl Completer + 'static) -> Self {
        self.completer = Arc::new(completer);
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Arc::new(tokenizer);
        self
    }

    pub fn with_history(mut self, history: impl History + 'static) -> Self {
        self.history = Box::new(history);
        self
    }

    pub fn with_handler(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handler = Box::new(handler);
        self
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn with_source<S: AsyncEventSource>(mut self, source: S) -> Self {
        self.sources.register(source);
        self
    }
}

fn style_from_config(raw: &StyleConfig) -> Result<Style> {
    let color = |value: &Option<String>| Color::parse(value.as_deref().unwrap_or(""));
    Ok(Style {
        fg: color(&raw.fg)?,
        bg: color(&raw.bg)?,
        bold: raw.bold,
        underline: raw.underline,
        italic: raw.italic,
        reverse: false,
    })
}
