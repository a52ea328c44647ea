//! Output capture
//!
//! A byte sink that turns each write into an output notification.

use std::io::{self, Write};
use std::sync::Arc;

use super::{OutputChannel, TestListener, TestOutput};

/// Writer tagging everything it receives with one output channel
#[derive(Clone)]
pub struct EventWriter {
    listener: Arc<dyn TestListener>,
    channel: OutputChannel,
}

impl EventWriter {
    pub fn new(listener: Arc<dyn TestListener>, channel: OutputChannel) -> Self {
        Self { listener, channel }
    }

    pub fn channel(&self) -> OutputChannel {
        self.channel
    }

    /// Emit one output notification for `text`
    pub fn write_text(&self, text: &str) {
        self.listener
            .test_output(&TestOutput::new(text, self.channel));
    }

    /// Like [`write_text`](Self::write_text) with a trailing newline
    pub fn write_line(&self, text: &str) {
        self.write_text(&format!("{}\n", text));
    }
}

impl Write for EventWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !buf.is_empty() {
            self.write_text(&String::from_utf8_lossy(buf));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for EventWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventWriter")
            .field("channel", &self.channel)
            .finish()
    }
}
