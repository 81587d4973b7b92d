//! Diagnostics sink for the partial linkage pass.

use smol_str::SmolStr;
use std::fmt;

/// Line or column that could not be computed.
pub const UNDEFINED_LINE: i32 = -1;
pub const UNDEFINED_COLUMN: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Where a diagnostic points, in human terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// `<module> @ <file path>`
    pub file: SmolStr,
    /// 1-based, or [`UNDEFINED_LINE`].
    pub line: i32,
    /// 1-based, or [`UNDEFINED_COLUMN`].
    pub column: i32,
}

impl Location {
    pub fn new(file: impl Into<SmolStr>, line: i32, column: i32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    pub fn is_undefined(&self) -> bool {
        self.line == UNDEFINED_LINE || self.column == UNDEFINED_COLUMN
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_undefined() {
            write!(f, "{}", self.file)
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

/// Receives one report per rewritten site.
pub trait MessageLogger {
    fn report(&mut self, severity: Severity, message: &str, location: Option<&Location>);
}

/// Forwards reports as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl MessageLogger for TracingLogger {
    fn report(&mut self, severity: Severity, message: &str, location: Option<&Location>) {
        let location = location.map(ToString::to_string).unwrap_or_default();
        match severity {
            Severity::Info => tracing::info!(%location, "{}", message),
            Severity::Warning => tracing::warn!(%location, "{}", message),
            Severity::Error => tracing::error!(%location, "{}", message),
        }
    }
}

/// A single collected report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub severity: Severity,
    pub message: String,
    pub location: Option<Location>,
}

/// Keeps every report in memory, in emission order.
#[derive(Debug, Default, Clone)]
pub struct CollectingLogger {
    pub reports: Vec<Report>,
}

impl CollectingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.reports.iter().map(|report| report.message.as_str())
    }
}

impl MessageLogger for CollectingLogger {
    fn report(&mut self, severity: Severity, message: &str, location: Option<&Location>) {
        self.reports.push(Report {
            severity,
            message: message.to_string(),
            location: location.cloned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        let location = Location::new("lib @ pkg/A.kt", 3, 7);
        assert_eq!(location.to_string(), "lib @ pkg/A.kt:3:7");

        let undefined = Location::new("lib @ pkg/A.kt", UNDEFINED_LINE, UNDEFINED_COLUMN);
        assert!(undefined.is_undefined());
        assert_eq!(undefined.to_string(), "lib @ pkg/A.kt");
    }

    #[test]
    fn test_collecting_logger() {
        let mut logger = CollectingLogger::new();
        logger.report(Severity::Warning, "first", None);
        logger.report(Severity::Error, "second", Some(&Location::new("m @ f", 1, 1)));

        assert_eq!(logger.messages().collect::<Vec<_>>(), vec!["first", "second"]);
        assert_eq!(logger.reports[1].severity, Severity::Error);
    }
}
