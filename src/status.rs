use std::fmt;

/// Severity of an appended status line. Warnings are auto-corrected data
/// anomalies; errors mean the operation was aborted and state reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusEntry {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for StatusEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Info => write!(f, "{}", self.message),
            Severity::Warning => write!(f, "WARNING: {}", self.message),
            Severity::Error => write!(f, "ERROR: {}", self.message),
        }
    }
}

/// Append-only status surface. Nothing in the engine is ever thrown at a
/// top-level handler; every outcome lands here and is mirrored to `tracing`.
#[derive(Debug, Default)]
pub struct StatusLog {
    entries: Vec<StatusEntry>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        let message = msg.into();
        tracing::info!("{message}");
        self.entries.push(StatusEntry {
            severity: Severity::Info,
            message,
        });
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        let message = msg.into();
        tracing::warn!("{message}");
        self.entries.push(StatusEntry {
            severity: Severity::Warning,
            message,
        });
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        let message = msg.into();
        tracing::error!("{message}");
        self.entries.push(StatusEntry {
            severity: Severity::Error,
            message,
        });
    }

    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    /// Drain accumulated entries, e.g. after flushing them to a UI.
    pub fn take(&mut self) -> Vec<StatusEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.severity == Severity::Error)
    }
}
