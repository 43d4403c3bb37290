// src/diagnostics.rs

//! Diagnostic sinks handed to clients and iterators at construction.
//!
//! Production code uses [`LogSink`], which forwards to the `log` facade.
//! [`MemorySink`] keeps every record so callers can inspect what was reported.

use std::sync::{Arc, Mutex};

use log::Level;

/// Destination for diagnostic messages.
pub trait DiagnosticSink: Send + Sync {
    /// Emit a message at the given level for a component.
    fn emit(&self, level: Level, target: &str, message: &str);

    fn debug(&self, target: &str, message: &str) {
        self.emit(Level::Debug, target, message);
    }

    fn info(&self, target: &str, message: &str) {
        self.emit(Level::Info, target, message);
    }

    fn warn(&self, target: &str, message: &str) {
        self.emit(Level::Warn, target, message);
    }
}

/// Shared handle to a sink.
pub type Sink = Arc<dyn DiagnosticSink>;

/// Forwards to the global `log` logger.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl LogSink {
    pub fn shared() -> Sink {
        Arc::new(LogSink)
    }
}

impl DiagnosticSink for LogSink {
    fn emit(&self, level: Level, target: &str, message: &str) {
        log::log!(target: target, level, "{}", message);
    }
}

/// A recorded diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub level: Level,
    pub target: String,
    pub message: String,
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of the records emitted so far.
    pub fn records(&self) -> Vec<Record> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Records at exactly the given level.
    pub fn at_level(&self, level: Level) -> Vec<Record> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, level: Level, target: &str, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push(Record {
                level,
                target: target.to_string(),
                message: message.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_levels() {
        let sink = MemorySink::new();
        sink.debug("github", "Page 1 of 3");
        sink.warn("github", "Unable to retrieve all items");

        assert_eq!(sink.records().len(), 2);
        let warnings = sink.at_level(Level::Warn);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].target, "github");
    }
}
