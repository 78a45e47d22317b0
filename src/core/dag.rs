//! Precedence graph for line balancing.
//!
//! Tasks are stored arena-style in a petgraph `DiGraph`; an edge `a -> b`
//! means task `a` must be done at a station no later than task `b`.

use crate::core::task::TaskId;
use crate::error::{Error, Result};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// The task precedence graph.
///
/// Node indices are stable (tasks are never removed), so insertion order
/// doubles as the deterministic tie-break order used by the balancer.
pub struct PrecedenceGraph {
    /// The underlying directed graph.
    graph: DiGraph<TaskId, ()>,
    /// Index mapping from TaskId to NodeIndex for fast lookups.
    task_index: HashMap<TaskId, NodeIndex>,
}

impl PrecedenceGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            task_index: HashMap::new(),
        }
    }

    /// Add a task to the graph.
    ///
    /// Returns the NodeIndex for the task. Adding a known id returns the
    /// existing index.
    pub fn add_task(&mut self, id: TaskId) -> NodeIndex {
        if let Some(&index) = self.task_index.get(&id) {
            return index;
        }

        let index = self.graph.add_node(id.clone());
        self.task_index.insert(id, index);
        index
    }

    /// Record that `from` precedes `to`, adding unknown tasks on the way.
    ///
    /// No cycle check happens here: loaders record the diagram as written and
    /// cycles are reported when the graph is balanced. Repeated edges are
    /// stored once.
    pub fn add_precedence(&mut self, from: TaskId, to: TaskId) {
        let from_index = self.add_task(from);
        let to_index = self.add_task(to);
        self.graph.update_edge(from_index, to_index, ());
    }

    /// Get the number of tasks in the graph.
    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of precedence edges.
    pub fn precedence_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains_task(&self, id: &TaskId) -> bool {
        self.task_index.contains_key(id)
    }

    /// Check if `from -> to` is a recorded edge.
    pub fn has_precedence(&self, from: &TaskId, to: &TaskId) -> bool {
        match (self.task_index.get(from), self.task_index.get(to)) {
            (Some(&a), Some(&b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// All task ids in insertion order.
    pub fn task_ids(&self) -> Vec<&TaskId> {
        self.graph.node_weights().collect()
    }

    /// All edges as `(predecessor, successor)` pairs.
    pub fn precedences(&self) -> Vec<(&TaskId, &TaskId)> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (&self.graph[a], &self.graph[b]))
            .collect()
    }

    /// Get the underlying graph for advanced operations.
    pub fn graph(&self) -> &DiGraph<TaskId, ()> {
        &self.graph
    }

    /// Verify the graph is acyclic.
    ///
    /// # Errors
    /// Returns `Error::Cycle` naming a task on a cycle.
    pub fn check_acyclic(&self) -> Result<()> {
        self.sorted_indices().map(|_| ())
    }

    /// Number of tasks on the longest precedence chain (0 for an empty graph).
    pub fn longest_chain(&self) -> Result<usize> {
        let order = self.sorted_indices()?;
        let mut depth = vec![0usize; self.graph.node_count()];
        let mut longest = 0;
        for index in order {
            let d = self
                .graph
                .neighbors_directed(index, Direction::Incoming)
                .map(|p| depth[p.index()])
                .max()
                .map_or(1, |d| d + 1);
            depth[index.index()] = d;
            longest = longest.max(d);
        }
        Ok(longest)
    }

    fn sorted_indices(&self) -> Result<Vec<NodeIndex>> {
        toposort(&self.graph, None).map_err(|cycle| Error::Cycle {
            task: self.graph[cycle.node_id()].clone(),
        })
    }
}

impl Default for PrecedenceGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PrecedenceGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrecedenceGraph")
            .field("tasks", &self.task_count())
            .field("precedences", &self.precedence_count())
            .finish()
    }
}
