//! Diagnostics collected during a generation run.

use std::fmt;

use serde::Serialize;

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    /// Aborts the run before any generator executes.
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A message produced by a lint or a generator.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Lint or generator that produced the message.
    pub generator: String,
    pub message: String,
    /// Location in the manifest, e.g. `operations.query`.
    pub location: Option<String>,
}

impl Diagnostic {
    pub fn error(generator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, generator, message)
    }

    pub fn warning(generator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, generator, message)
    }

    pub fn info(generator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, generator, message)
    }

    fn new(severity: Severity, generator: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            generator: generator.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.generator, self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " (at {})", loc)?;
        }
        Ok(())
    }
}
