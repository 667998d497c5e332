//! Monitoring verdict plumbing: severity levels and the status sink.
//!
//! The monitor core reports through a [`StatusSink`]; [`CheckResponse`] is
//! the standard implementation, accumulating updates and rendering one
//! plugin-style output line whose exit code mirrors the worst severity.

use std::fmt;

/// Verdict severity, totally ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Everything within thresholds.
    Ok,
    /// Warning threshold crossed.
    Warning,
    /// Critical threshold crossed.
    Critical,
    /// The check itself failed to run.
    Unknown,
}

impl Severity {
    /// Conventional monitoring-plugin exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Critical => 2,
            Self::Unknown => 3,
        }
    }

    /// Upper-case label used in plugin output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Returns true if this severity does not require operator attention
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Receiver of monitoring verdicts.
pub trait StatusSink: Send {
    /// Records one `(severity, message)` update.
    fn update_status(&mut self, severity: Severity, message: &str);
}

/// Standard [`StatusSink`]: tracks the worst severity seen and renders a
/// single output line from the messages reported at that severity.
#[derive(Debug, Clone)]
pub struct CheckResponse {
    severity: Severity,
    updates: Vec<(Severity, String)>,
    default_ok: String,
}

impl CheckResponse {
    /// Creates a response with the message used when no update arrives.
    pub fn new<S: Into<String>>(default_ok: S) -> Self {
        Self {
            severity: Severity::Ok,
            updates: Vec::new(),
            default_ok: default_ok.into(),
        }
    }

    /// Worst severity observed so far.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Process exit code for the current severity.
    pub fn exit_code(&self) -> i32 {
        self.severity.exit_code()
    }

    /// All updates in arrival order.
    pub fn updates(&self) -> &[(Severity, String)] {
        &self.updates
    }

    /// Renders the plugin output line, e.g.
    /// `CRITICAL: job "backups": ...`.
    pub fn output_line(&self) -> String {
        let messages: Vec<&str> = self
            .updates
            .iter()
            .filter(|(severity, _)| *severity == self.severity)
            .map(|(_, message)| message.as_str())
            .collect();

        if messages.is_empty() {
            format!("{}: {}", self.severity, self.default_ok)
        } else {
            format!("{}: {}", self.severity, messages.join("; "))
        }
    }
}

impl StatusSink for CheckResponse {
    fn update_status(&mut self, severity: Severity, message: &str) {
        self.severity = self.severity.max(severity);
        self.updates.push((severity, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Ok < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
        assert!(Severity::Critical < Severity::Unknown);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Severity::Ok.exit_code(), 0);
        assert_eq!(Severity::Warning.exit_code(), 1);
        assert_eq!(Severity::Critical.exit_code(), 2);
        assert_eq!(Severity::Unknown.exit_code(), 3);
    }

    #[test]
    fn test_worst_severity_wins() {
        let mut resp = CheckResponse::new("snapshots checked");
        resp.update_status(Severity::Warning, "a bit old");
        resp.update_status(Severity::Critical, "too old");
        resp.update_status(Severity::Warning, "also a bit old");
        assert_eq!(resp.severity(), Severity::Critical);
        assert_eq!(resp.exit_code(), 2);
        assert_eq!(resp.output_line(), "CRITICAL: too old");
    }

    #[test]
    fn test_severity_never_improves() {
        let mut resp = CheckResponse::new("snapshots checked");
        resp.update_status(Severity::Critical, "too old");
        resp.update_status(Severity::Ok, "all fine");
        assert_eq!(resp.severity(), Severity::Critical);
    }

    #[test]
    fn test_default_ok_line() {
        let resp = CheckResponse::new("snapshots checked");
        assert_eq!(resp.output_line(), "OK: snapshots checked");
    }

    #[test]
    fn test_ok_summary_line() {
        let mut resp = CheckResponse::new("snapshots checked");
        resp.update_status(Severity::Ok, "all snapshots count: 3");
        assert_eq!(resp.output_line(), "OK: all snapshots count: 3");
    }
}
