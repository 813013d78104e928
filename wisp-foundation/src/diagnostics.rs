//! The diagnostics collector.
//!
//! Every stage of the front end (lexer, preprocessor, parser) shares a single
//! [`Diagnostics`] instance. Errors are fail-fast: a stage observes
//! [`Diagnostics::empty`] and stops at its next natural boundary rather than
//! trying to recover indefinitely.

use tracing::debug;

/// Accumulates human-readable error messages produced while processing a
/// single source file.
///
/// This intentionally stores rendered strings rather than structured
/// diagnostics. Each stage has its own `thiserror`-derived error enum (see
/// [`crate::errors`]) whose `Display` impl produces the stable message text;
/// by the time a message reaches the collector it has already been rendered,
/// keeping this type trivial to share across crate boundaries.
#[derive(Debug, Default)]
pub struct Diagnostics {
    messages: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message without displaying it.
    pub fn insert(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(message = %message, "diagnostic inserted");
        self.messages.push(message);
    }

    /// Whether any diagnostics are currently pending.
    pub fn empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Flushes pending diagnostics to stderr, prefixed with the error count,
    /// then clears them. Returns whether anything was printed.
    pub fn display(&mut self) -> bool {
        if self.messages.is_empty() {
            return false;
        }

        let count = self.messages.len();
        let plural = if count == 1 { "" } else { "s" };
        eprintln!("{count} error{plural}:");
        for message in &self.messages {
            eprintln!("  {message}");
        }
        self.messages.clear();
        true
    }

    /// Inserts a message and immediately displays it. Equivalent to
    /// `insert` followed by `display`.
    pub fn error(&mut self, message: impl Into<String>) -> bool {
        self.insert(message);
        self.display()
    }
}
