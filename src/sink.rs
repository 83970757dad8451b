//! Message sinks for diagnostics produced while formatting.
//!
//! The formatter never logs on its own: it is handed an error sink and a
//! debug sink at construction and reports through them. Any
//! `Fn(&str) + Send + Sync` closure is a sink, which keeps tests simple.

use log::Level;

/// Destination for diagnostic messages
pub trait MessageSink: Send + Sync {
    fn emit(&self, message: &str);
}

impl<F> MessageSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn emit(&self, message: &str) {
        self(message);
    }
}

/// Forwards messages to the `log` facade at a fixed level
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    level: Level,
}

impl LogSink {
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Sink for failures (`log::error!`)
    #[must_use]
    pub fn error() -> Self {
        Self::new(Level::Error)
    }

    /// Sink for diagnostics (`log::debug!`)
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::Debug)
    }
}

impl MessageSink for LogSink {
    fn emit(&self, message: &str) {
        log::log!(self.level, "{message}");
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MessageSink for NullSink {
    fn emit(&self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_closure_is_a_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |message: &str| seen.lock().unwrap().push(message.to_string());
        sink.emit("first");
        sink.emit("second");
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_log_sink_levels() {
        assert_eq!(LogSink::error().level, Level::Error);
        assert_eq!(LogSink::debug().level, Level::Debug);
        // Emitting without an installed logger is a no-op
        LogSink::debug().emit("ignored");
        NullSink.emit("ignored");
    }
}
