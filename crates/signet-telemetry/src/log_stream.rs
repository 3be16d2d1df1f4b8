//! Log stream broadcaster for SSE consumers and the recent-log endpoint.
//!
//! # Design
//! - Reuse the formatted log output to avoid duplicating formatting logic.
//! - Broadcast newline-delimited log lines via a bounded channel.
//! - Keep the last `LOG_HISTORY_CAPACITY` lines for clients that poll instead of stream.
//! - Keep the writer lightweight and non-blocking for the hot logging path.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Mutex, OnceLock, PoisonError};

use tokio::sync::broadcast;
use tracing_subscriber::fmt::MakeWriter;

const LOG_STREAM_CAPACITY: usize = 1024;
const LOG_HISTORY_CAPACITY: usize = 1000;

static LOG_STREAM: OnceLock<broadcast::Sender<String>> = OnceLock::new();
static LOG_HISTORY: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();

/// Subscribe to the log stream as newline-delimited messages.
#[must_use]
pub fn log_stream_receiver() -> broadcast::Receiver<String> {
    log_stream_sender().subscribe()
}

/// Most recent log lines, newest first, capped at `limit`.
#[must_use]
pub fn recent_log_lines(limit: usize) -> Vec<String> {
    log_history()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .rev()
        .take(limit)
        .cloned()
        .collect()
}

/// Number of log lines currently retained.
#[must_use]
pub fn retained_log_lines() -> usize {
    log_history()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}

pub(crate) fn log_stream_writer() -> LogStreamMakeWriter {
    LogStreamMakeWriter {
        sender: log_stream_sender(),
    }
}

fn log_stream_sender() -> broadcast::Sender<String> {
    LOG_STREAM
        .get_or_init(|| broadcast::channel(LOG_STREAM_CAPACITY).0)
        .clone()
}

fn log_history() -> &'static Mutex<VecDeque<String>> {
    LOG_HISTORY.get_or_init(|| Mutex::new(VecDeque::with_capacity(LOG_HISTORY_CAPACITY)))
}

fn remember_line(line: &str) {
    let mut history = log_history()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if history.len() == LOG_HISTORY_CAPACITY {
        let _ = history.pop_front();
    }
    history.push_back(line.to_string());
}

/// `tracing_subscriber` writer that mirrors output and broadcasts log lines.
#[derive(Clone)]
pub(crate) struct LogStreamMakeWriter {
    sender: broadcast::Sender<String>,
}

impl<'a> MakeWriter<'a> for LogStreamMakeWriter {
    type Writer = LogStreamWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogStreamWriter::new(self.sender.clone())
    }
}

pub(crate) struct LogStreamWriter {
    sender: broadcast::Sender<String>,
    stdout: io::Stdout,
    buffer: LineBuffer,
}

impl LogStreamWriter {
    fn new(sender: broadcast::Sender<String>) -> Self {
        Self {
            sender,
            stdout: io::stdout(),
            buffer: LineBuffer::default(),
        }
    }

    fn emit_line(&self, line: String) {
        if line.is_empty() {
            return;
        }
        remember_line(&line);
        let _ = self.sender.send(line);
    }
}

impl Write for LogStreamWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stdout.write_all(buf)?;
        for line in self.buffer.push(buf) {
            self.emit_line(line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

impl Drop for LogStreamWriter {
    fn drop(&mut self) {
        if let Some(line) = self.buffer.finish() {
            self.emit_line(line);
        }
    }
}

#[derive(Default)]
struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        self.drain_complete_lines()
    }

    fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.buffer).to_string();
        self.buffer.clear();
        Some(trim_line(&line))
    }

    fn drain_complete_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut start = 0usize;
        for (idx, byte) in self.buffer.iter().enumerate() {
            if *byte == b'\n' {
                let line = String::from_utf8_lossy(&self.buffer[start..idx]);
                lines.push(trim_line(&line));
                start = idx.saturating_add(1);
            }
        }
        if start > 0 {
            self.buffer.drain(0..start);
        }
        lines
    }
}

fn trim_line(line: &str) -> String {
    line.trim_end_matches(['\r', '\n']).to_string()
}
