//! Blocking rune reader for direct mode.
//!
//! A dedicated OS thread reads raw bytes, decodes UTF-8 incrementally (bytes
//! of one character may straddle reads) and forwards each `char` into the
//! bounded input channel with `blocking_send`. Invalid sequences become
//! U+FFFD. End of input or a read failure is forwarded once as
//! `InputMessage::ReadError` and the thread exits.

use core_events::InputMessage;
use std::io::{self, Read};
use std::thread;
use tokio::sync::mpsc::Sender;
use tracing::{debug, info, trace};

const READ_CHUNK: usize = 256;

/// Incremental UTF-8 decoder.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    partial: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes`, keeping an incomplete trailing sequence for the next call.
    pub fn push(&mut self, bytes: &[u8], out: &mut Vec<char>) {
        self.partial.extend_from_slice(bytes);
        let mut consumed = 0;
        loop {
            match std::str::from_utf8(&self.partial[consumed..]) {
                Ok(s) => {
                    out.extend(s.chars());
                    consumed = self.partial.len();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(s) = std::str::from_utf8(&self.partial[consumed..consumed + valid]) {
                        out.extend(s.chars());
                    }
                    consumed += valid;
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            consumed += len;
                        }
                        None => break,
                    }
                }
            }
        }
        self.partial.drain(..consumed);
    }

    pub fn has_partial(&self) -> bool {
        !self.partial.is_empty()
    }
}

/// Spawn the reader thread over `reader` (stdin in production).
pub fn spawn_rune_reader<R>(
    reader: R,
    tx: Sender<InputMessage>,
    dispatch: Option<tracing::Dispatch>,
) -> io::Result<thread::JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("oxline-stdin".into())
        .spawn(move || match dispatch {
            Some(d) => tracing::dispatcher::with_default(&d, || read_loop(reader, &tx)),
            None => read_loop(reader, &tx),
        })
}

fn read_loop<R: Read>(mut reader: R, tx: &Sender<InputMessage>) {
    info!(target: "input.thread", "rune_reader_started");
    let mut buf = [0u8; READ_CHUNK];
    let mut decoder = Utf8Decoder::new();
    let mut chars = Vec::with_capacity(READ_CHUNK);
    let failure = loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => break e,
        };
        chars.clear();
        decoder.push(&buf[..n], &mut chars);
        trace!(target: "input.thread", bytes = n, chars = chars.len(), "read_chunk");
        for &c in &chars {
            if tx.blocking_send(InputMessage::Rune(c)).is_err() {
                debug!(target: "input.thread", "rune_reader_channel_closed");
                return;
            }
        }
    };
    debug!(target: "input.thread", error = %failure, "rune_reader_stopped");
    let _ = tx.blocking_send(InputMessage::ReadError(failure));
}
