use crate::adapters::criteria::{domain_engine, port_engine};
use crate::adapters::diagnostics::TracingDiagnostics;
use crate::app::dto::{
    AnalysisReport, ClassifiedType, GraphDocument, GraphSummary, PortReport, TypeExplanation,
};
use crate::classification::engine::CriteriaEngine;
use crate::classification::kind::{DomainKind, PortKind};
use crate::classification::policy::Decision;
use crate::config::AnalysisConfig;
use crate::domain::audit::{AuditContext, CycleViolation, DependencyCycleAudit};
use crate::domain::cycle::Cycle;
use crate::domain::graph::FactGraph;
use crate::domain::id::NodeId;
use crate::domain::query::GraphQuery;
use crate::plugin::diagnostics::DiagnosticReporter;
use crate::plugin::executor::{BoundedPluginExecutor, ClassificationPlugin, PluginOutcome};
use anyhow::{Context as _, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs classification, plugins and cycle detection over one frozen graph.
pub struct AnalysisEngine {
    graph: Arc<FactGraph>,
    config: AnalysisConfig,
    domain: CriteriaEngine<DomainKind>,
    ports: CriteriaEngine<PortKind>,
    plugins: Vec<Arc<dyn ClassificationPlugin<DomainKind>>>,
    executor: BoundedPluginExecutor,
}

impl AnalysisEngine {
    pub fn new(graph: FactGraph, config: AnalysisConfig) -> Result<Self> {
        config.validate().context("Invalid analysis configuration")?;
        let profile = config.profile()?;
        let domain = domain_engine(profile.clone(), config.thresholds.complexity_threshold);
        let ports = port_engine(profile);
        let executor = BoundedPluginExecutor::new(Arc::new(TracingDiagnostics), config.plugin_timeout());
        Ok(Self {
            graph: Arc::new(graph),
            config,
            domain,
            ports,
            plugins: Vec::new(),
            executor,
        })
    }

    pub fn from_document(document: GraphDocument, config: AnalysisConfig) -> Result<Self> {
        let graph = document.into_graph()?;
        Self::new(graph, config)
    }

    /// Loads a graph document and an optional configuration file.
    pub fn load(graph_path: &Path, config_path: Option<&Path>) -> Result<Self> {
        let json = std::fs::read_to_string(graph_path)
            .with_context(|| format!("Failed to read graph file: {}", graph_path.display()))?;
        let document = GraphDocument::from_json_str(&json)?;
        let config = match config_path {
            Some(path) => AnalysisConfig::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => AnalysisConfig::default(),
        };
        Self::from_document(document, config)
    }

    /// Plugins run in registration order; the first accepted verdict wins.
    pub fn with_plugin(mut self, plugin: Arc<dyn ClassificationPlugin<DomainKind>>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Replaces the diagnostic sink used for plugin runs.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticReporter>) -> Self {
        self.executor = BoundedPluginExecutor::new(diagnostics, self.config.plugin_timeout());
        self
    }

    pub fn graph(&self) -> &FactGraph {
        &self.graph
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn query(&self) -> GraphQuery<'_> {
        GraphQuery::new(&self.graph)
    }

    pub fn executor(&self) -> &BoundedPluginExecutor {
        &self.executor
    }

    // ============ Classification ============

    pub fn classify_domain(&self) -> BTreeMap<NodeId, Decision<DomainKind>> {
        self.domain.classify_all(&self.query())
    }

    pub fn classify_ports(&self) -> BTreeMap<NodeId, Decision<PortKind>> {
        self.ports.classify_all(&self.query())
    }

    /// Contributions and decisions for one type, by qualified name.
    pub fn explain(&self, qualified_name: &str) -> Option<TypeExplanation> {
        let query = self.query();
        let node = query.type_by_name(qualified_name)?;
        let domain_contributions = self.domain.contributions(node, &query);
        let port_contributions = self.ports.contributions(node, &query);
        Some(TypeExplanation {
            type_name: node.qualified_name.clone(),
            domain_decision: self.domain.classify(node, &query),
            domain_contributions,
            port_decision: self.ports.classify(node, &query),
            port_contributions,
        })
    }

    /// Domain classification refined by the registered plugins.
    ///
    /// A plugin verdict replaces the primary decision only when its confidence
    /// reaches `min_plugin_confidence_pct`; anything else keeps the primary.
    pub async fn classify_with_plugins(&self) -> Vec<ClassifiedType<DomainKind>> {
        let primary = self.classify_domain();
        let min_pct = self.config.thresholds.min_plugin_confidence_pct;
        let mut classified = Vec::new();

        for (id, decision) in primary {
            let Some(node) = self.graph.type_node(&id) else {
                continue;
            };
            let mut resolved = ClassifiedType::from_decision(&node.qualified_name, &decision);

            for plugin in &self.plugins {
                let outcome = self
                    .executor
                    .execute(plugin.clone(), node, self.graph.clone(), decision.clone())
                    .await;
                let PluginOutcome::Verdict(verdict) = outcome else {
                    continue;
                };
                if u32::from(verdict.confidence.percentage()) < min_pct {
                    debug!(
                        plugin = plugin.id(),
                        type_name = %node.qualified_name,
                        confidence = %verdict.confidence,
                        "plugin verdict below threshold, keeping primary"
                    );
                    continue;
                }
                resolved = Some(ClassifiedType {
                    type_name: node.qualified_name.clone(),
                    kind: verdict.kind,
                    confidence: verdict.confidence,
                    criteria: format!("plugin:{}", plugin.id()),
                    justification: verdict.justification,
                    ambiguous: false,
                    conflicts: Vec::new(),
                });
                break;
            }
            classified.extend(resolved);
        }
        classified
    }

    // ============ Cycles ============

    pub fn detect_type_cycles(&self) -> Vec<Cycle<String, (String, String)>> {
        let cycles = self.query().type_cycles(&self.config.cycles);
        info!(cycles = cycles.len(), "type cycle detection finished");
        cycles
    }

    /// Dependency-cycle violations for one type.
    pub fn audit(&self, qualified_name: &str) -> Vec<CycleViolation> {
        let context = AuditContext::from_query(self.query());
        DependencyCycleAudit::new(self.config.cycles).check(qualified_name, Some(&context))
    }

    // ============ Reports ============

    pub fn report(&self) -> AnalysisReport {
        let domain: Vec<ClassifiedType<DomainKind>> = self
            .classify_domain()
            .iter()
            .filter_map(|(id, d)| ClassifiedType::from_decision(id.type_name(), d))
            .collect();
        self.assemble(domain)
    }

    /// Same as [`report`](Self::report), with plugins refining the domain roles.
    pub async fn report_with_plugins(&self) -> AnalysisReport {
        let domain = self.classify_with_plugins().await;
        self.assemble(domain)
    }

    fn assemble(&self, domain: Vec<ClassifiedType<DomainKind>>) -> AnalysisReport {
        let ports: Vec<PortReport> = self
            .classify_ports()
            .iter()
            .filter_map(|(id, d)| ClassifiedType::from_decision(id.type_name(), d))
            .map(|port| PortReport {
                direction: port.kind.direction(),
                port,
            })
            .collect();

        let mut unclassified: Vec<String> = self
            .query()
            .types()
            .map(|t| t.qualified_name.clone())
            .filter(|name| {
                !domain.iter().any(|d| &d.type_name == name)
                    && !ports.iter().any(|p| &p.port.type_name == name)
            })
            .collect();
        unclassified.sort();

        AnalysisReport {
            graph: GraphSummary::of(&self.graph),
            domain,
            ports,
            unclassified,
            cycles: self.detect_type_cycles(),
        }
    }

    /// Stops the plugin executor, waiting up to the configured grace period.
    pub async fn shutdown(&self) {
        self.executor.shutdown(self.config.shutdown_grace()).await;
    }
}
