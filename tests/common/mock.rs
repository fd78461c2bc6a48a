//! Plugin doubles for executor and engine tests.
#![allow(dead_code)]

use archrole::classification::kind::{ConfidenceLevel, DomainKind};
use archrole::domain::node::TypeNode;
use archrole::plugin::executor::{ClassificationPlugin, PluginContext, PluginError, PluginVerdict};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Always returns the same verdict
pub struct FixedPlugin {
    pub id: String,
    pub kind: DomainKind,
    pub confidence: ConfidenceLevel,
    pub calls: AtomicUsize,
}

impl FixedPlugin {
    pub fn new(id: &str, kind: DomainKind, confidence: ConfidenceLevel) -> Self {
        Self {
            id: id.to_string(),
            kind,
            confidence,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ClassificationPlugin<DomainKind> for FixedPlugin {
    fn id(&self) -> &str {
        &self.id
    }

    fn classify(
        &self,
        node: &TypeNode,
        _context: &PluginContext<DomainKind>,
    ) -> Result<Option<PluginVerdict<DomainKind>>, PluginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(PluginVerdict {
            kind: self.kind,
            confidence: self.confidence,
            justification: format!("fixed verdict for {}", node.simple_name()),
        }))
    }
}

/// Sleeps in small steps until cancelled or `duration` elapsed
pub struct SlowPlugin {
    pub duration: Duration,
    pub observed_cancel: AtomicUsize,
}

impl SlowPlugin {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            observed_cancel: AtomicUsize::new(0),
        }
    }
}

impl ClassificationPlugin<DomainKind> for SlowPlugin {
    fn id(&self) -> &str {
        "slow"
    }

    fn classify(
        &self,
        _node: &TypeNode,
        context: &PluginContext<DomainKind>,
    ) -> Result<Option<PluginVerdict<DomainKind>>, PluginError> {
        let step = Duration::from_millis(10);
        let mut waited = Duration::ZERO;
        while waited < self.duration {
            if context.is_cancelled() {
                self.observed_cancel.fetch_add(1, Ordering::SeqCst);
                return Err(PluginError::Cancelled);
            }
            thread::sleep(step);
            waited += step;
        }
        Ok(None)
    }
}

pub struct FailingPlugin;

impl ClassificationPlugin<DomainKind> for FailingPlugin {
    fn id(&self) -> &str {
        "failing"
    }

    fn classify(
        &self,
        _node: &TypeNode,
        _context: &PluginContext<DomainKind>,
    ) -> Result<Option<PluginVerdict<DomainKind>>, PluginError> {
        Err(PluginError::Failed("boom".to_string()))
    }
}

pub struct PanickingPlugin;

impl ClassificationPlugin<DomainKind> for PanickingPlugin {
    fn id(&self) -> &str {
        "panicking"
    }

    fn classify(
        &self,
        _node: &TypeNode,
        _context: &PluginContext<DomainKind>,
    ) -> Result<Option<PluginVerdict<DomainKind>>, PluginError> {
        panic!("plugin bug")
    }
}

/// Blocks for `duration` without ever checking for cancellation
pub struct StubbornPlugin {
    pub duration: Duration,
}

impl ClassificationPlugin<DomainKind> for StubbornPlugin {
    fn id(&self) -> &str {
        "stubborn"
    }

    fn classify(
        &self,
        _node: &TypeNode,
        _context: &PluginContext<DomainKind>,
    ) -> Result<Option<PluginVerdict<DomainKind>>, PluginError> {
        thread::sleep(self.duration);
        Ok(None)
    }
}
