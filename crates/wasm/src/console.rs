//! `tracing` output for the browser devtools console.

use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// Which `console.*` method an event goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Error,
    Warn,
    Info,
    Debug,
}

impl From<Level> for Method {
    fn from(level: Level) -> Self {
        match level {
            Level::ERROR => Method::Error,
            Level::WARN => Method::Warn,
            Level::INFO => Method::Info,
            _ => Method::Debug,
        }
    }
}

/// One formatted event with the trailing newline dropped.
fn message(buf: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(buf);
    let line = text.trim_end();
    (!line.is_empty()).then(|| line.to_string())
}

#[cfg(target_arch = "wasm32")]
fn emit(method: Method, line: &str) {
    use web_sys::console;
    let line = wasm_bindgen::JsValue::from_str(line);
    match method {
        Method::Error => console::error_1(&line),
        Method::Warn => console::warn_1(&line),
        Method::Info => console::info_1(&line),
        Method::Debug => console::debug_1(&line),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(_method: Method, line: &str) {
    eprintln!("{line}");
}

/// Buffers one event and hands it to the console when dropped.
pub struct ConsoleWriter {
    method: Method,
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if let Some(line) = message(&self.buf) {
            emit(self.method, &line);
        }
    }
}

pub struct MakeConsoleWriter;

impl<'a> MakeWriter<'a> for MakeConsoleWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            method: Method::Info,
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            method: Method::from(*meta.level()),
            buf: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_pick_matching_console_method() {
        assert_eq!(Method::from(Level::ERROR), Method::Error);
        assert_eq!(Method::from(Level::WARN), Method::Warn);
        assert_eq!(Method::from(Level::INFO), Method::Info);
        assert_eq!(Method::from(Level::DEBUG), Method::Debug);
        assert_eq!(Method::from(Level::TRACE), Method::Debug);
    }

    #[test]
    fn formatted_event_loses_trailing_newline() {
        assert_eq!(
            message(b" WARN card callback threw id=7\n").as_deref(),
            Some(" WARN card callback threw id=7")
        );
        assert_eq!(message(b"\n"), None);
        assert_eq!(message(b""), None);
    }
}
