//! Output capabilities handed to work functions.
//!
//! Work functions that want to report progress take a sink as an argument
//! instead of writing to a global console. The task machinery never touches
//! it.

use std::sync::Arc;

use crate::thread::this_task;

/// Somewhere a work function can write lines.
pub trait Sink: Send + Sync {
    fn emit(&self, line: &str);
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn emit(&self, line: &str) {
        (**self).emit(line);
    }
}

impl<S: Sink + ?Sized> Sink for &S {
    fn emit(&self, line: &str) {
        (**self).emit(line);
    }
}

/// Forwards lines to `tracing` at info level, tagged with the current task.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn emit(&self, line: &str) {
        match this_task::id() {
            Some(id) => tracing::info!(task_id = id.get(), "{line}"),
            None => tracing::info!("{line}"),
        }
    }
}

/// Keeps every line in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: spin::Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Sink for MemorySink {
    fn emit(&self, line: &str) {
        self.lines.lock().push(line.to_owned());
    }
}
