use crate::plugin::diagnostics::{Diagnostic, DiagnosticReporter, Severity};
use std::sync::{Mutex, PoisonError};

/// Forwards plugin diagnostics to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticReporter for TracingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        let Diagnostic {
            severity,
            plugin_id,
            message,
        } = diagnostic;
        match severity {
            Severity::Info => tracing::info!(plugin = %plugin_id, "{message}"),
            Severity::Warning => tracing::warn!(plugin = %plugin_id, "{message}"),
            Severity::Error => tracing::error!(plugin = %plugin_id, "{message}"),
        }
    }
}

/// Keeps every diagnostic in memory, in arrival order
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    messages: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnostics {
    pub fn messages(&self) -> Vec<Diagnostic> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn clear(&self) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl DiagnosticReporter for CollectingDiagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::debug!(plugin = %diagnostic.plugin_id, severity = %diagnostic.severity, "{}", diagnostic.message);
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }
}
