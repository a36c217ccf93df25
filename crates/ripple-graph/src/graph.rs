//! Core graph data structure.
//!
//! The EntityGraph wraps petgraph and adds a string-id index for fast
//! lookups. It is a pure adjacency store: no traversal logic lives here,
//! and no operation can fail; unknown ids degrade to empty results.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use ripple_core::CodeEntity;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// The directed graph of code entities.
///
/// Node identity is the entity's string id; edges are untyped and
/// deduplicated. Entities live for the lifetime of the graph instance
/// unless the whole graph is cleared for a full rebuild.
#[derive(Debug, Default)]
pub struct EntityGraph {
    graph: DiGraph<CodeEntity, ()>,
    /// Maps entity ids to graph node indexes.
    id_index: HashMap<String, NodeIndex>,
}

impl EntityGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entity, replacing any prior content under the same id.
    ///
    /// Replacing an existing entity drops its outgoing edges so an
    /// incremental merge can re-derive them; incoming edges from
    /// entities in unchanged files stay in place.
    pub fn upsert(&mut self, entity: CodeEntity) -> NodeIndex {
        if let Some(&index) = self.id_index.get(&entity.id) {
            while let Some(edge) = self.graph.first_edge(index, Direction::Outgoing) {
                self.graph.remove_edge(edge);
            }
            if let Some(weight) = self.graph.node_weight_mut(index) {
                *weight = entity;
            }
            debug!(id = %self.graph[index].id, "replaced node");
            index
        } else {
            let id = entity.id.clone();
            let index = self.graph.add_node(entity);
            self.id_index.insert(id, index);
            index
        }
    }

    /// Adds a directed edge between two ids.
    ///
    /// Returns whether the edge exists after the call. A missing
    /// endpoint makes this a logged no-op: construction may run on
    /// partial input and favors resilience over strictness.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        let (Some(&from_idx), Some(&to_idx)) = (self.id_index.get(from), self.id_index.get(to))
        else {
            warn!(from, to, "dropping edge with missing endpoint");
            return false;
        };
        self.graph.update_edge(from_idx, to_idx, ());
        true
    }

    /// Outgoing neighbor ids, sorted; empty when the id is unknown.
    pub fn neighbors(&self, id: &str) -> Vec<String> {
        let Some(&index) = self.id_index.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<String> = self
            .graph
            .neighbors_directed(index, Direction::Outgoing)
            .filter_map(|idx| self.graph.node_weight(idx))
            .map(|entity| entity.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Looks up an entity by id.
    pub fn node(&self, id: &str) -> Option<&CodeEntity> {
        let index = self.id_index.get(id)?;
        self.graph.node_weight(*index)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    /// Resolves a reference to a node id.
    ///
    /// Exact id match first; otherwise a suffix match against the
    /// unqualified name, which deliberately tolerates partial import
    /// resolution. When several ids share the suffix the
    /// lexicographically smallest wins, keeping resolution stable.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        if self.id_index.contains_key(reference) {
            return Some(reference.to_string());
        }
        let simple = reference.rsplit('.').next().unwrap_or(reference);
        if simple.is_empty() {
            return None;
        }
        let suffix = format!(".{simple}");
        self.id_index
            .keys()
            .filter(|id| id.ends_with(&suffix) || id.as_str() == simple)
            .min()
            .cloned()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Discards every node and edge. Used for full rebuilds.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.id_index.clear();
        debug!("graph cleared");
    }

    /// Iterates over all entities.
    pub fn entities(&self) -> impl Iterator<Item = &CodeEntity> {
        self.graph.node_weights()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
        }
    }

    /// Snapshot of nodes and edges for JSON export/visualization.
    pub fn export(&self) -> GraphExport {
        let nodes = self.graph.node_weights().cloned().collect();
        let edges = self
            .graph
            .edge_references()
            .filter_map(|edge| {
                let source = self.graph.node_weight(edge.source())?.id.clone();
                let target = self.graph.node_weight(edge.target())?.id.clone();
                Some(ExportEdge { source, target })
            })
            .collect();
        GraphExport { nodes, edges }
    }
}

/// Graph statistics for the status endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
}

/// A serializable snapshot of the whole graph.
#[derive(Debug, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<CodeEntity>,
    pub edges: Vec<ExportEdge>,
}

#[derive(Debug, Serialize)]
pub struct ExportEdge {
    pub source: String,
    pub target: String,
}
