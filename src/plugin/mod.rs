//! Safe execution of externally supplied classification logic.

pub mod diagnostics;
pub mod executor;

pub use diagnostics::{Diagnostic, DiagnosticReporter, Severity};
pub use executor::{
    BoundedPluginExecutor, ClassificationPlugin, PluginContext, PluginError, PluginOutcome,
    PluginVerdict,
};
