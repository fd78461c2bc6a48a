use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// One message emitted while running plugins
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub plugin_id: String,
    pub message: String,
}

/// Sink for plugin diagnostics (implemented by adapters)
pub trait DiagnosticReporter: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);

    fn info(&self, plugin_id: &str, message: String) {
        self.report(Diagnostic {
            severity: Severity::Info,
            plugin_id: plugin_id.to_string(),
            message,
        });
    }

    fn warn(&self, plugin_id: &str, message: String) {
        self.report(Diagnostic {
            severity: Severity::Warning,
            plugin_id: plugin_id.to_string(),
            message,
        });
    }

    fn error(&self, plugin_id: &str, message: String) {
        self.report(Diagnostic {
            severity: Severity::Error,
            plugin_id: plugin_id.to_string(),
            message,
        });
    }
}
