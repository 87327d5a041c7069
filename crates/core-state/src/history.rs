//! Past inputs.
//!
//! `FileHistory` persists each entry as a block of `+`-prefixed lines
//! preceded by a timestamp comment:
//!
//! ```text
//!
//!  # 2024-05-01T10:00:00+02:00
//! +first line
//! +second line
//! ```
//!
//! Any line not starting with `+` ends the current block. A trailing block
//! without a following separator still counts as a complete entry.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

pub trait History: Send {
    fn get_all(&self) -> &[String];
    fn append(&mut self, entry: &str) -> Result<()>;

    fn last(&self) -> Option<&str> {
        self.get_all().last().map(String::as_str)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemHistory {
    entries: Vec<String>,
}

impl MemHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl History for MemHistory {
    fn get_all(&self) -> &[String] {
        &self.entries
    }

    fn append(&mut self, entry: &str) -> Result<()> {
        self.entries.push(entry.to_string());
        Ok(())
    }
}

#[derive(Debug)]
pub struct FileHistory {
    mem: MemHistory,
    path: PathBuf,
}

impl FileHistory {
    /// Open (and load) the history stored at `path`. A missing file is an
    /// empty history; it is created on the first append.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut history = Self {
            mem: MemHistory::new(),
            path,
        };
        history.load()?;
        Ok(history)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&mut self) -> Result<()> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(e).with_context(|| format!("open history {}", self.path.display()));
            }
        };
        let mut reader = BufReader::new(file);
        let mut block: Vec<String> = Vec::new();
        let mut buf = String::new();
        loop {
            buf.clear();
            let read = reader
                .read_line(&mut buf)
                .with_context(|| format!("read history {}", self.path.display()))?;
            if read == 0 {
                break;
            }
            // Only the newline is a separator; a `\r` belongs to the entry.
            let line = buf.strip_suffix('\n').unwrap_or(&buf);
            if let Some(rest) = line.strip_prefix('+') {
                block.push(rest.to_string());
            } else if !block.is_empty() {
                self.mem.entries.push(block.join("\n"));
                block.clear();
            }
        }
        if !block.is_empty() {
            self.mem.entries.push(block.join("\n"));
        }
        debug!(target: "state.history", path = %self.path.display(), entries = self.mem.entries.len(), "history_loaded");
        Ok(())
    }
}

impl History for FileHistory {
    fn get_all(&self) -> &[String] {
        self.mem.get_all()
    }

    fn append(&mut self, entry: &str) -> Result<()> {
        self.mem.append(entry)?;
        let mut block = format!("\n # {}\n", chrono::Local::now().to_rfc3339());
        for line in entry.split('\n') {
            block.push('+');
            block.push_str(line);
            block.push('\n');
        }
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .with_context(|| format!("open history {}", self.path.display()))?;
        file.write_all(block.as_bytes())
            .with_context(|| format!("write history {}", self.path.display()))?;
        trace!(target: "state.history", bytes = block.len(), "history_appended");
        Ok(())
    }
}
