//! Process-wide log output target.
//!
//! Log output goes through a [`LogSink`] instead of straight to stdout, so a
//! full-screen front-end can capture it while it owns the terminal:
//!
//! ```text
//!   tracing fmt layer ──▶ LogSink ──▶ stdout            (default)
//!                                └──▶ front-end log     (while redirected)
//! ```
//!
//! [`LogSink::redirect`] swaps the target and returns a [`SinkRedirect`]
//! guard. Only one guard may exist at a time. The previous target is put back
//! exactly once, when the guard is released or dropped, unwinding included.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::SinkError;

/// Boxed writer that a [`LogSink`] forwards to.
pub type BoxedWriter = Box<dyn Write + Send>;

struct SinkState {
    target: BoxedWriter,
    /// Target to restore when the active redirect ends.
    saved: Option<BoxedWriter>,
}

/// Shared, swappable log output.
#[derive(Clone)]
pub struct LogSink {
    state: Arc<Mutex<SinkState>>,
}

impl LogSink {
    /// Creates a sink writing to stdout.
    pub fn new() -> Self {
        Self::with_target(Box::new(io::stdout()))
    }

    pub fn with_target(target: BoxedWriter) -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState {
                target,
                saved: None,
            })),
        }
    }

    /// The process-wide sink used by the runtime's logging setup.
    pub fn global() -> &'static LogSink {
        static GLOBAL: OnceLock<LogSink> = OnceLock::new();
        GLOBAL.get_or_init(LogSink::new)
    }

    /// Sends output to `target` until the returned guard is released.
    ///
    /// Fails fast if another redirect is active.
    pub fn redirect(&self, target: BoxedWriter) -> Result<SinkRedirect, SinkError> {
        {
            let mut state = self.state.lock();
            if state.saved.is_some() {
                return Err(SinkError::AlreadyRedirected);
            }
            let _ = state.target.flush();
            let previous = std::mem::replace(&mut state.target, target);
            state.saved = Some(previous);
        }
        // the lock must be released first: this event may be written to the sink itself
        debug!("Log sink redirected");

        Ok(SinkRedirect {
            sink: self.clone(),
            active: true,
        })
    }

    pub fn is_redirected(&self) -> bool {
        self.state.lock().saved.is_some()
    }

    /// A writer handle for this sink.
    pub fn writer(&self) -> SinkWriter {
        SinkWriter { sink: self.clone() }
    }

    /// Writes one line to the current target.
    pub fn print(&self, line: &str) -> io::Result<()> {
        let mut state = self.state.lock();
        writeln!(state.target, "{line}")?;
        state.target.flush()
    }

    fn restore(&self) {
        let mut state = self.state.lock();
        if let Some(previous) = state.saved.take() {
            let _ = state.target.flush();
            state.target = previous;
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("redirected", &self.is_redirected())
            .finish()
    }
}

/// Writer handle returned by [`LogSink::writer`].
pub struct SinkWriter {
    sink: LogSink,
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink.state.lock().target.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.sink.state.lock().target.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.state.lock().target.flush()
    }
}

// =============================================================================
// SinkRedirect
// =============================================================================

/// Guard for an active redirect. Restores the previous target once.
#[must_use = "dropping the guard ends the redirect"]
pub struct SinkRedirect {
    sink: LogSink,
    active: bool,
}

impl SinkRedirect {
    /// Ends the redirect now.
    pub fn release(mut self) {
        self.restore_once();
    }

    fn restore_once(&mut self) {
        if std::mem::take(&mut self.active) {
            self.sink.restore();
            debug!("Log sink restored");
        }
    }
}

impl Drop for SinkRedirect {
    fn drop(&mut self) {
        self.restore_once();
    }
}

impl fmt::Debug for SinkRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkRedirect")
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writer appending into a shared buffer.
    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_redirect_and_release() {
        let original = Buffer::default();
        let capture = Buffer::default();
        let sink = LogSink::with_target(Box::new(original.clone()));

        sink.print("before").unwrap();
        let guard = sink.redirect(Box::new(capture.clone())).unwrap();
        assert!(sink.is_redirected());
        sink.print("during").unwrap();
        guard.release();
        sink.print("after").unwrap();

        assert!(!sink.is_redirected());
        assert_eq!(original.text(), "before\nafter\n");
        assert_eq!(capture.text(), "during\n");
    }

    #[test]
    fn test_second_redirect_fails_fast() {
        let sink = LogSink::with_target(Box::new(Buffer::default()));
        let _guard = sink.redirect(Box::new(Buffer::default())).unwrap();
        assert_eq!(
            sink.redirect(Box::new(Buffer::default())).unwrap_err(),
            SinkError::AlreadyRedirected
        );
    }

    #[test]
    fn test_restored_on_panic() {
        let original = Buffer::default();
        let sink = LogSink::with_target(Box::new(original.clone()));

        let cloned = sink.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = cloned.redirect(Box::new(Buffer::default())).unwrap();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!sink.is_redirected());

        sink.print("ok").unwrap();
        assert_eq!(original.text(), "ok\n");
    }

    #[test]
    fn test_restore_happens_once() {
        let first = Buffer::default();
        let sink = LogSink::with_target(Box::new(first.clone()));

        let guard = sink.redirect(Box::new(Buffer::default())).unwrap();
        guard.release();

        // a later redirect is unaffected by the earlier guard
        let second = Buffer::default();
        let guard = sink.redirect(Box::new(second.clone())).unwrap();
        sink.print("x").unwrap();
        drop(guard);
        sink.print("y").unwrap();

        assert_eq!(second.text(), "x\n");
        assert_eq!(first.text(), "y\n");
    }

    #[test]
    fn test_writer_follows_redirect() {
        let capture = Buffer::default();
        let sink = LogSink::with_target(Box::new(Buffer::default()));
        let mut writer = sink.writer();

        let _guard = sink.redirect(Box::new(capture.clone())).unwrap();
        writer.write_all(b"line\n").unwrap();
        assert_eq!(capture.text(), "line\n");
    }
}
