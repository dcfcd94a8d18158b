//! Host-visible diagnostic output.
//!
//! The engine reports parse warnings and selection results as plain lines
//! to a [`LogSink`], the equivalent of the host's output pane. Everything is
//! also emitted as `tracing` events; the sink is only for what the user sees.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::info;

/// Fire-and-forget line sink.
pub trait LogSink {
  fn write_line(&self, line: &str);
}

/// Forwards lines to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
  fn write_line(&self, line: &str) {
    info!(target: "envswitch::output", "{}", line);
  }
}

/// Keeps every line in memory. Cloned handles share the buffer.
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
  lines: Rc<RefCell<Vec<String>>>,
}

impl BufferSink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn lines(&self) -> Vec<String> {
    self.lines.borrow().clone()
  }

  pub fn take(&self) -> Vec<String> {
    std::mem::take(&mut *self.lines.borrow_mut())
  }
}

impl LogSink for BufferSink {
  fn write_line(&self, line: &str) {
    if !line.is_empty() {
      self.lines.borrow_mut().push(line.to_string());
    }
  }
}
