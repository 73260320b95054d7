//! Progress sinks the mirror engine reports through.
//!
//! The engine is a pure producer of notifications: it never branches on
//! sink state. Sinks record an "error occurred" flag the caller can query
//! once a run completes.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Observer for mirror-run notifications.
///
/// Implementations must tolerate being called once per file; `tick` arrives
/// at the engine's configured byte granularity, not per write.
pub trait ProgressSink {
    /// A verbose step notification (one file scanned, copied, or skipped).
    fn verbose(&self, message: &str);

    /// A recoverable error notification. Implementations set their error
    /// flag here.
    fn error(&self, message: &str);

    /// Cumulative bytes copied so far this run; emitted whenever the total
    /// crosses the engine's reporting granularity.
    fn tick(&self, _bytes_copied: u64) {}

    /// True once any `error` notification has been received.
    fn error_encountered(&self) -> bool;
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullProgress {
    /// Set when an error notification arrives.
    error: AtomicBool,
}

impl NullProgress {
    /// Creates a silent sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for NullProgress {
    fn verbose(&self, _message: &str) {}

    fn error(&self, _message: &str) {
        self.error.store(true, Ordering::Relaxed);
    }

    fn error_encountered(&self) -> bool {
        self.error.load(Ordering::Relaxed)
    }
}

/// Sink that prints through the crate's output helpers, respecting the
/// global verbosity level.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    /// Set when an error notification arrives.
    error: AtomicBool,
}

impl ConsoleProgress {
    /// Creates a console-backed sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for ConsoleProgress {
    fn verbose(&self, message: &str) {
        super::verbose(message);
    }

    fn error(&self, message: &str) {
        self.error.store(true, Ordering::Relaxed);
        super::error(message);
    }

    fn error_encountered(&self) -> bool {
        self.error.load(Ordering::Relaxed)
    }
}

/// Sink that accumulates notifications into a string buffer.
///
/// Intended for tests that assert on what the engine reported.
#[derive(Debug, Default)]
pub struct StringProgress {
    /// Accumulated notification text, one line per notification.
    buffer: Mutex<String>,
    /// Set when an error notification arrives.
    error: AtomicBool,
}

impl StringProgress {
    /// Creates an empty buffer-backed sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything reported so far, newline-separated.
    ///
    /// # Panics
    ///
    /// Panics if a previous writer panicked while holding the buffer lock.
    #[must_use]
    pub fn text(&self) -> String {
        self.buffer.lock().expect("progress buffer poisoned").clone()
    }

    /// Appends one line to the buffer.
    fn push_line(&self, message: &str) {
        let mut buffer = self.buffer.lock().expect("progress buffer poisoned");
        buffer.push_str(message);
        buffer.push('\n');
    }
}

impl ProgressSink for StringProgress {
    fn verbose(&self, message: &str) {
        self.push_line(message);
    }

    fn error(&self, message: &str) {
        self.error.store(true, Ordering::Relaxed);
        self.push_line(message);
    }

    fn error_encountered(&self) -> bool {
        self.error.load(Ordering::Relaxed)
    }
}
