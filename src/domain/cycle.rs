//! Generic strongly-connected-component cycle detection.
//!
//! The detector knows nothing about the fact graph: it works over any node
//! type and any edge type, given two projections from an edge to its source
//! and target node. Traversal state lives on the stack of one
//! [`TarjanCycleDetector::detect_cycles`] call, so a detector can be shared
//! freely between threads.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::hash::Hash;
use std::marker::PhantomData;
use tracing::{debug, warn};

/// Limits applied to one detection run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleDetectionConfig {
    /// Stop emitting cycles once this many were found
    pub max_cycles: usize,
    /// Cap on the edge list of a single cycle
    pub max_edges_per_cycle: usize,
    /// Budget of edge visits across the whole run
    pub max_edge_scans: usize,
}

impl Default for CycleDetectionConfig {
    fn default() -> Self {
        Self {
            max_cycles: 100,
            max_edges_per_cycle: 50,
            max_edge_scans: 100_000,
        }
    }
}

/// One strongly connected component that contains a closed walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle<N, E> {
    /// Every participant, in first-discovery order
    pub nodes: Vec<N>,
    /// Closed walk starting and ending at `nodes[0]`
    pub edges: Vec<E>,
    /// Set when `edges` was cut at `max_edges_per_cycle`
    pub truncated: bool,
}

impl<N: PartialEq, E> Cycle<N, E> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_self_loop(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn contains(&self, node: &N) -> bool {
        self.nodes.contains(node)
    }
}

/// Per-call traversal state
struct Tarjan {
    index: Vec<Option<usize>>,
    low_link: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<usize>,
    next_index: usize,
    scans: usize,
    budget: usize,
}

impl Tarjan {
    fn new(node_count: usize, budget: usize) -> Self {
        Self {
            index: vec![None; node_count],
            low_link: vec![0; node_count],
            on_stack: vec![false; node_count],
            stack: Vec::new(),
            next_index: 0,
            scans: 0,
            budget,
        }
    }

    fn scan(&mut self) -> bool {
        if self.scans >= self.budget {
            return false;
        }
        self.scans += 1;
        true
    }

    /// Iterative DFS rooted at `root`; calls `emit` with each completed component.
    /// Returns `false` when the scan budget ran out.
    fn visit(
        &mut self,
        root: usize,
        adjacency: &[Vec<(usize, usize)>],
        emit: &mut dyn FnMut(&mut Self, Vec<usize>) -> bool,
    ) -> bool {
        // (node, position in its adjacency list)
        let mut frames: Vec<(usize, usize)> = vec![(root, 0)];
        self.open(root);

        while let Some(&(v, pos)) = frames.last() {
            if pos < adjacency[v].len() {
                let (w, _) = adjacency[v][pos];
                let top = frames.len() - 1;
                frames[top].1 += 1;
                if !self.scan() {
                    return false;
                }
                match self.index[w] {
                    None => {
                        self.open(w);
                        frames.push((w, 0));
                    }
                    Some(w_index) if self.on_stack[w] => {
                        self.low_link[v] = self.low_link[v].min(w_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                self.low_link[parent] = self.low_link[parent].min(self.low_link[v]);
            }

            if Some(self.low_link[v]) == self.index[v] {
                let mut component = Vec::new();
                while let Some(w) = self.stack.pop() {
                    self.on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                if !emit(self, component) {
                    return false;
                }
            }
        }
        true
    }

    fn open(&mut self, v: usize) {
        self.index[v] = Some(self.next_index);
        self.low_link[v] = self.next_index;
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack[v] = true;
    }
}

/// Tarjan SCC detector parameterized by edge projections.
///
/// Deterministic: for a fixed node slice and edge slice, the returned cycles
/// and their contents are always identical.
pub struct TarjanCycleDetector<N, E, S, T> {
    source: S,
    target: T,
    _marker: PhantomData<fn(&E) -> N>,
}

impl<N, E, S, T> TarjanCycleDetector<N, E, S, T>
where
    N: Clone + Eq + Hash,
    E: Clone,
    S: Fn(&E) -> N,
    T: Fn(&E) -> N,
{
    pub fn new(source: S, target: T) -> Self {
        Self {
            source,
            target,
            _marker: PhantomData,
        }
    }

    /// Reports every SCC with more than one node, and every single node with a
    /// self-loop. Edges touching nodes outside `nodes` are ignored.
    pub fn detect_cycles(
        &self,
        nodes: &[N],
        edges: &[E],
        config: &CycleDetectionConfig,
    ) -> Vec<Cycle<N, E>> {
        if config.max_cycles == 0 || nodes.is_empty() {
            return Vec::new();
        }

        let mut position: HashMap<&N, usize> = HashMap::with_capacity(nodes.len());
        let mut order: Vec<&N> = Vec::with_capacity(nodes.len());
        for node in nodes {
            if !position.contains_key(node) {
                position.insert(node, order.len());
                order.push(node);
            }
        }

        // (target, edge index) per source, in edge order
        let mut adjacency: Vec<Vec<(usize, usize)>> = vec![Vec::new(); order.len()];
        for (edge_idx, edge) in edges.iter().enumerate() {
            let from = (self.source)(edge);
            let to = (self.target)(edge);
            if let (Some(&f), Some(&t)) = (position.get(&from), position.get(&to)) {
                adjacency[f].push((t, edge_idx));
            }
        }

        let mut state = Tarjan::new(order.len(), config.max_edge_scans);
        let mut found: Vec<(usize, Cycle<N, E>)> = Vec::new();
        let mut exhausted = false;

        for root in 0..order.len() {
            if state.index[root].is_some() {
                continue;
            }
            let mut emit = |state: &mut Tarjan, mut component: Vec<usize>| -> bool {
                let self_loop = component.len() == 1
                    && adjacency[component[0]].iter().any(|&(t, _)| t == component[0]);
                if component.len() < 2 && !self_loop {
                    return true;
                }
                component.sort_by_key(|&v| state.index[v]);
                let Some(walk) = closed_walk(&component, &adjacency, state) else {
                    return false;
                };
                let truncated = walk.len() > config.max_edges_per_cycle;
                let first_seen = state.index[component[0]].unwrap_or(usize::MAX);
                found.push((
                    first_seen,
                    Cycle {
                        nodes: component.iter().map(|&v| order[v].clone()).collect(),
                        edges: walk
                            .into_iter()
                            .take(config.max_edges_per_cycle)
                            .map(|e| edges[e].clone())
                            .collect(),
                        truncated,
                    },
                ));
                found.len() < config.max_cycles
            };
            if !state.visit(root, &adjacency, &mut emit) {
                exhausted = state.scans >= state.budget;
                break;
            }
        }

        if exhausted {
            warn!(
                scans = state.scans,
                cycles = found.len(),
                "Cycle detection stopped after exhausting the edge scan budget"
            );
        } else if found.len() >= config.max_cycles {
            warn!(max_cycles = config.max_cycles, "Cycle limit reached");
        }

        found.sort_by_key(|(first_seen, _)| *first_seen);
        debug!(cycles = found.len(), nodes = order.len(), "Cycle detection finished");
        found.into_iter().map(|(_, cycle)| cycle).collect()
    }
}

/// Shortest closed walk through `component[0]`, as edge indices.
/// `None` when the scan budget runs out.
fn closed_walk(
    component: &[usize],
    adjacency: &[Vec<(usize, usize)>],
    state: &mut Tarjan,
) -> Option<Vec<usize>> {
    let root = component[0];
    if component.len() == 1 {
        let &(_, edge) = adjacency[root].iter().find(|&&(t, _)| t == root)?;
        return Some(vec![edge]);
    }

    let members: BTreeSet<usize> = component.iter().copied().collect();
    // node -> (predecessor, edge taken)
    let mut parent: HashMap<usize, (usize, usize)> = HashMap::new();
    let mut queue = VecDeque::from([root]);
    let mut closing: Option<(usize, usize)> = None;

    'search: while let Some(u) = queue.pop_front() {
        for &(w, edge) in &adjacency[u] {
            if !state.scan() {
                return None;
            }
            if w == u || !members.contains(&w) {
                continue;
            }
            if w == root {
                closing = Some((u, edge));
                break 'search;
            }
            if !parent.contains_key(&w) {
                parent.insert(w, (u, edge));
                queue.push_back(w);
            }
        }
    }

    // Strong connectivity guarantees a way back to the root.
    let (mut current, last_edge) = closing?;
    let mut walk = vec![last_edge];
    while current != root {
        let &(prev, edge) = parent.get(&current)?;
        walk.push(edge);
        current = prev;
    }
    walk.reverse();
    Some(walk)
}

/// Cycles of a plain name → dependencies map, e.g. a type-level dependency
/// map. Edges are `(from, to)` pairs.
pub fn find_dependency_cycles(
    dependencies: &BTreeMap<String, BTreeSet<String>>,
    config: &CycleDetectionConfig,
) -> Vec<Cycle<String, (String, String)>> {
    let mut nodes: BTreeSet<&String> = dependencies.keys().collect();
    nodes.extend(dependencies.values().flatten());
    let nodes: Vec<String> = nodes.into_iter().cloned().collect();

    let edges: Vec<(String, String)> = dependencies
        .iter()
        .flat_map(|(from, targets)| targets.iter().map(move |to| (from.clone(), to.clone())))
        .collect();

    let detector = TarjanCycleDetector::new(
        |e: &(String, String)| e.0.clone(),
        |e: &(String, String)| e.1.clone(),
    );
    detector.detect_cycles(&nodes, &edges, config)
}
