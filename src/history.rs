//! In-memory history log
//!
//! Append-only sequence of public rendered lines, replayed to new joiners.

use std::sync::Arc;

/// Ordered log of every public line since server start
#[derive(Debug, Default)]
pub struct History {
    lines: Vec<Arc<str>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rendered line
    pub fn append(&mut self, line: Arc<str>) {
        self.lines.push(line);
    }

    /// Frozen copy of the log; later appends do not show up in it
    pub fn snapshot(&self) -> Vec<Arc<str>> {
        self.lines.clone()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
