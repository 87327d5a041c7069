//! Configuration loading and parsing.
//!
//! Parses `oxline.toml` (or an override path provided by the host) into
//! [`LineConfig`]. Every field has a default and unknown fields are ignored,
//! so a partial file or a file written for a newer version still loads. A
//! missing or unparsable file yields the defaults; parse errors are logged
//! under the `config` target instead of failing the session.
//!
//! Style overrides are kept as raw strings here. Turning them into render
//! styles is the caller's job so this crate stays free of rendering types.

use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{debug, info, warn};

pub const CONFIG_FILE_NAME: &str = "oxline.toml";

/// What a session does when the user aborts (Ctrl-C) or exits (Ctrl-D on an
/// empty buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Reset the buffer and keep reading.
    Retry,
    /// End the read with an error.
    ReturnError,
    /// End the read with no text.
    ReturnNone,
    /// Do nothing.
    Ignore,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub on_abort: Policy,
    pub on_exit: Policy,
    pub auto_indent: bool,
    pub input_timeout_ms: u64,
    pub full_screen: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            on_abort: Policy::Retry,
            on_exit: Policy::ReturnError,
            auto_indent: false,
            input_timeout_ms: 100,
            full_screen: false,
        }
    }
}

impl SessionConfig {
    /// Poll timeout of the event loop; zero is bumped to one millisecond.
    pub fn input_timeout(&self) -> Duration {
        Duration::from_millis(self.input_timeout_ms.max(1))
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HistoryConfig {
    /// History file; absent means in-memory history.
    pub path: Option<PathBuf>,
}

impl HistoryConfig {
    /// The history path with a leading `~` expanded to the home directory.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.as_ref().map(|p| expand_home(p))
    }
}

/// One `[styles.<token.type>]` table. Colors accept `#rrggbb`, a palette
/// index or `default`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StyleConfig {
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub bold: bool,
    pub underline: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigFile {
    pub session: SessionConfig,
    pub history: HistoryConfig,
    /// Keyed by dotted token type, e.g. `keyword` or `literal.string`.
    pub styles: BTreeMap<String, StyleConfig>,
}

#[derive(Debug, Clone, Default)]
pub struct LineConfig {
    pub source: Option<PathBuf>, // file the values came from, if any
    pub file: ConfigFile,
}

impl LineConfig {
    pub fn session(&self) -> &SessionConfig {
        &self.file.session
    }

    pub fn history(&self) -> &HistoryConfig {
        &self.file.history
    }

    pub fn styles(&self) -> impl Iterator<Item = (&str, &StyleConfig)> {
        self.file.styles.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Best-effort config path: `./oxline.toml` first, then the platform config
/// directory (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("oxline").join(CONFIG_FILE_NAME);
    }
    local
}

pub fn load_from(path: Option<PathBuf>) -> Result<LineConfig> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        debug!(target: "config", path = %path.display(), "config_missing");
        return Ok(LineConfig::default());
    };
    match parse(&content) {
        Ok(file) => {
            info!(
                target: "config",
                path = %path.display(),
                styles = file.styles.len(),
                "config_loaded"
            );
            Ok(LineConfig {
                source: Some(path),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(LineConfig::default())
        }
    }
}

pub fn parse(content: &str) -> Result<ConfigFile> {
    Ok(toml::from_str::<ConfigFile>(content)?)
}

fn expand_home(path: &std::path::Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
