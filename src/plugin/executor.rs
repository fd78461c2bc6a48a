use crate::classification::kind::{ClassificationKind, ConfidenceLevel};
use crate::classification::policy::Decision;
use crate::domain::graph::FactGraph;
use crate::domain::node::TypeNode;
use crate::domain::query::GraphQuery;
use crate::plugin::diagnostics::DiagnosticReporter;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Notify, oneshot};
use tracing::{debug, warn};

/// Error a plugin may return. Never escapes the executor.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("{0}")]
    Failed(String),

    #[error("cancelled")]
    Cancelled,

    #[error("panicked: {0}")]
    Panicked(String),
}

/// A plugin's opinion about one type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginVerdict<K: ClassificationKind> {
    pub kind: K,
    pub confidence: ConfidenceLevel,
    pub justification: String,
}

/// What the caller gets back from one plugin invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginOutcome<K: ClassificationKind> {
    Verdict(PluginVerdict<K>),
    /// Keep the primary decision
    DeferToPrimary,
}

impl<K: ClassificationKind> PluginOutcome<K> {
    pub fn is_defer(&self) -> bool {
        matches!(self, PluginOutcome::DeferToPrimary)
    }

    pub fn verdict(&self) -> Option<&PluginVerdict<K>> {
        match self {
            PluginOutcome::Verdict(v) => Some(v),
            PluginOutcome::DeferToPrimary => None,
        }
    }
}

/// Everything a plugin may read during one invocation.
///
/// Each invocation gets its own context and cancellation flag; nothing is
/// shared between plugin executions except the immutable graph.
#[derive(Debug, Clone)]
pub struct PluginContext<K: ClassificationKind> {
    graph: Arc<FactGraph>,
    primary: Decision<K>,
    cancelled: Arc<AtomicBool>,
}

impl<K: ClassificationKind> PluginContext<K> {
    pub fn new(graph: Arc<FactGraph>, primary: Decision<K>) -> Self {
        Self {
            graph,
            primary,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn graph(&self) -> &FactGraph {
        &self.graph
    }

    pub fn query(&self) -> GraphQuery<'_> {
        GraphQuery::new(&self.graph)
    }

    /// Decision of the built-in engine; empty when it found nothing.
    pub fn primary(&self) -> &Decision<K> {
        &self.primary
    }

    /// Set on timeout or forced shutdown. Long-running plugins should poll it
    /// and return [`PluginError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Externally supplied classification logic.
///
/// Returning `Ok(None)` defers to the primary decision.
pub trait ClassificationPlugin<K: ClassificationKind>: Send + Sync {
    fn id(&self) -> &str;

    /// Per-plugin timeout; the executor default applies when `None`.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    fn classify(
        &self,
        node: &TypeNode,
        context: &PluginContext<K>,
    ) -> Result<Option<PluginVerdict<K>>, PluginError>;
}

#[derive(Default)]
struct ExecutorState {
    shut_down: AtomicBool,
    in_flight: AtomicUsize,
    next_ticket: AtomicU64,
    idle: Notify,
    cancel_flags: Mutex<HashMap<u64, Arc<AtomicBool>>>,
}

impl ExecutorState {
    fn enter(self: &Arc<Self>) -> InFlight {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let flag = Arc::new(AtomicBool::new(false));
        self.cancel_flags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ticket, flag.clone());
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        InFlight {
            state: Arc::clone(self),
            ticket,
            flag,
        }
    }

    fn cancel_all(&self) -> usize {
        let flags = self.cancel_flags.lock().unwrap_or_else(PoisonError::into_inner);
        for flag in flags.values() {
            flag.store(true, Ordering::Release);
        }
        flags.len()
    }

    async fn wait_idle(&self) {
        loop {
            let mut notified = std::pin::pin!(self.idle.notified());
            notified.as_mut().enable();
            if self.in_flight.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Registration of one running worker; released when the worker finishes,
/// even if the caller stopped waiting for it.
struct InFlight {
    state: Arc<ExecutorState>,
    ticket: u64,
    flag: Arc<AtomicBool>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.state
            .cancel_flags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.ticket);
        if self.state.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.state.idle.notify_waiters();
        }
    }
}

/// Runs plugins on isolated, detached worker threads under a timeout.
///
/// A plugin can never fail the analysis: timeouts, errors and panics all
/// degrade to [`PluginOutcome::DeferToPrimary`] plus a diagnostic.
pub struct BoundedPluginExecutor {
    diagnostics: Arc<dyn DiagnosticReporter>,
    default_timeout: Duration,
    state: Arc<ExecutorState>,
}

impl BoundedPluginExecutor {
    pub fn new(diagnostics: Arc<dyn DiagnosticReporter>, default_timeout: Duration) -> Self {
        Self {
            diagnostics,
            default_timeout,
            state: Arc::new(ExecutorState::default()),
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Runs `plugin` with its own timeout, or the executor default.
    pub async fn execute<K: ClassificationKind>(
        &self,
        plugin: Arc<dyn ClassificationPlugin<K>>,
        node: &TypeNode,
        graph: Arc<FactGraph>,
        primary: Decision<K>,
    ) -> PluginOutcome<K> {
        let timeout = plugin.timeout().unwrap_or(self.default_timeout);
        self.execute_with_timeout(plugin, node, graph, primary, timeout)
            .await
    }

    /// Runs `plugin` against `node` on a fresh worker and waits at most `timeout`.
    pub async fn execute_with_timeout<K: ClassificationKind>(
        &self,
        plugin: Arc<dyn ClassificationPlugin<K>>,
        node: &TypeNode,
        graph: Arc<FactGraph>,
        primary: Decision<K>,
        timeout: Duration,
    ) -> PluginOutcome<K> {
        let plugin_id = plugin.id().to_string();
        let type_name = node.simple_name().to_string();

        if self.is_shutdown() {
            self.diagnostics.warn(
                &plugin_id,
                format!("Plugin '{plugin_id}' rejected for {type_name}: executor is shut down"),
            );
            return PluginOutcome::DeferToPrimary;
        }

        let in_flight = self.state.enter();
        let cancelled = in_flight.flag.clone();
        let context = PluginContext {
            graph,
            primary,
            cancelled: cancelled.clone(),
        };
        let node = node.clone();
        let (tx, rx) = oneshot::channel();
        // detached so a plugin ignoring cancellation cannot hold up runtime teardown
        let spawned = thread::Builder::new()
            .name(format!("plugin-{plugin_id}"))
            .spawn(move || {
                let result = if context.is_cancelled() {
                    Err(PluginError::Cancelled)
                } else {
                    catch_unwind(AssertUnwindSafe(|| plugin.classify(&node, &context)))
                        .unwrap_or_else(|payload| Err(PluginError::Panicked(panic_message(payload))))
                };
                // released before reporting so callers see the worker as finished
                drop(in_flight);
                // the caller may have stopped waiting
                let _ = tx.send(result);
            });
        if let Err(err) = spawned {
            self.diagnostics.error(
                &plugin_id,
                format!("Plugin '{plugin_id}' could not start a worker for {type_name}: {err}"),
            );
            return PluginOutcome::DeferToPrimary;
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(Ok(Some(verdict)))) => {
                self.diagnostics.info(
                    &plugin_id,
                    format!(
                        "Plugin '{plugin_id}' succeeded for {type_name} (kind={}, confidence={})",
                        verdict.kind, verdict.confidence
                    ),
                );
                PluginOutcome::Verdict(verdict)
            }
            Ok(Ok(Ok(None))) => {
                self.diagnostics.info(
                    &plugin_id,
                    format!("Plugin '{plugin_id}' delegated to primary for {type_name}"),
                );
                PluginOutcome::DeferToPrimary
            }
            Ok(Ok(Err(PluginError::Cancelled))) => {
                self.diagnostics.warn(
                    &plugin_id,
                    format!("Plugin '{plugin_id}' was interrupted for {type_name}"),
                );
                PluginOutcome::DeferToPrimary
            }
            Ok(Ok(Err(err))) => {
                self.diagnostics.error(
                    &plugin_id,
                    format!("Plugin '{plugin_id}' failed for {type_name}: {err}"),
                );
                PluginOutcome::DeferToPrimary
            }
            Ok(Err(_)) => {
                self.diagnostics.error(
                    &plugin_id,
                    format!("Plugin '{plugin_id}' worker ended without a result for {type_name}"),
                );
                PluginOutcome::DeferToPrimary
            }
            Err(_) => {
                cancelled.store(true, Ordering::Release);
                self.diagnostics.warn(
                    &plugin_id,
                    format!(
                        "Plugin '{plugin_id}' timed out after {} ms for {type_name}",
                        timeout.as_millis()
                    ),
                );
                PluginOutcome::DeferToPrimary
            }
        }
    }

    /// Stops accepting work, waits up to `grace` for running workers, then
    /// signals cancellation to whatever is left. Repeated calls are no-ops.
    pub async fn shutdown(&self, grace: Duration) {
        if self.state.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!(in_flight = self.in_flight(), "Shutting down plugin executor");
        if tokio::time::timeout(grace, self.state.wait_idle()).await.is_err() {
            let cancelled = self.state.cancel_all();
            warn!(
                cancelled,
                grace_ms = grace.as_millis() as u64,
                "Plugin workers still running after grace period, cancelling"
            );
        }
    }

    /// Stops accepting work and cancels running workers without waiting.
    pub fn shutdown_now(&self) {
        self.state.shut_down.store(true, Ordering::Release);
        let cancelled = self.state.cancel_all();
        if cancelled > 0 {
            warn!(cancelled, "Plugin executor shut down with workers still running");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.shut_down.load(Ordering::Acquire)
    }

    /// Shut down and no worker left running.
    pub fn is_terminated(&self) -> bool {
        self.is_shutdown() && self.in_flight() == 0
    }

    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::Acquire)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::diagnostics::CollectingDiagnostics;
    use crate::classification::kind::DomainKind;
    use crate::domain::builder::GraphBuilder;
    use crate::domain::node::TypeForm;
    use crate::plugin::diagnostics::Severity;

    struct Fixed(Option<DomainKind>);

    impl ClassificationPlugin<DomainKind> for Fixed {
        fn id(&self) -> &str {
            "fixed"
        }

        fn classify(
            &self,
            _node: &TypeNode,
            _context: &PluginContext<DomainKind>,
        ) -> Result<Option<PluginVerdict<DomainKind>>, PluginError> {
            Ok(self.0.map(|kind| PluginVerdict {
                kind,
                confidence: ConfidenceLevel::High,
                justification: "fixed".to_string(),
            }))
        }
    }

    fn fixture() -> (Arc<FactGraph>, TypeNode) {
        let node = TypeNode::new("x.Order", TypeForm::Class).unwrap();
        let mut b = GraphBuilder::new();
        b.add_node(node.clone()).unwrap();
        (Arc::new(b.freeze()), node)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_verdict_and_defer() {
        let (graph, node) = fixture();
        let diagnostics = Arc::new(CollectingDiagnostics::default());
        let executor = BoundedPluginExecutor::new(diagnostics.clone(), Duration::from_secs(1));

        let outcome = executor
            .execute::<DomainKind>(Arc::new(Fixed(Some(DomainKind::Entity))), &node, graph.clone(), Decision::empty())
            .await;
        assert_eq!(outcome.verdict().map(|v| v.kind), Some(DomainKind::Entity));

        let outcome = executor
            .execute::<DomainKind>(Arc::new(Fixed(None)), &node, graph, Decision::empty())
            .await;
        assert!(outcome.is_defer());

        let messages = diagnostics.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|d| d.severity == Severity::Info));
        assert!(messages[1].message.contains("delegated to primary"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shutdown_is_idempotent_and_rejects_work() {
        let (graph, node) = fixture();
        let diagnostics = Arc::new(CollectingDiagnostics::default());
        let executor = BoundedPluginExecutor::new(diagnostics.clone(), Duration::from_secs(1));

        executor.shutdown(Duration::from_millis(100)).await;
        executor.shutdown(Duration::from_millis(100)).await;
        assert!(executor.is_shutdown());
        assert!(executor.is_terminated());

        let outcome = executor
            .execute::<DomainKind>(Arc::new(Fixed(Some(DomainKind::Entity))), &node, graph, Decision::empty())
            .await;
        assert!(outcome.is_defer());
        assert_eq!(diagnostics.count(Severity::Warning), 1);
    }
}
