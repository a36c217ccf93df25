//! Transitive impact propagation.
//!
//! Multi-source breadth-first traversal from the changed entities,
//! draining one full frontier at a time so the level count measures
//! propagation depth. While visiting, each node's complexity and
//! markers are snapshotted into the report, reflecting graph state at analysis
//! time, not at node-creation time.

use crate::graph::EntityGraph;
use ripple_core::Marker;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

/// The outcome of propagating a change set through the graph.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImpactReport {
    /// The set of directly changed entity ids.
    pub changed: BTreeSet<String>,
    /// Transitive closure reachable from the changed set. Every changed
    /// id present in the graph appears here at depth 0.
    pub impacted: BTreeSet<String>,
    /// Maximum number of levels reached beyond any single source; 0
    /// when no changed entity has neighbors.
    pub depth: usize,
    /// Per-source reach sets.
    pub reach: BTreeMap<String, BTreeSet<String>>,
    /// Outbound-call count per visited node.
    pub complexity: BTreeMap<String, usize>,
    /// Marker snapshot per visited node.
    pub markers: BTreeMap<String, BTreeSet<Marker>>,
    /// Every changed file's diff was judged comment-only.
    pub comment_only_override: bool,
    /// Some changed entity carries a critical marker.
    pub critical_method_override: bool,
}

impl ImpactReport {
    /// Impacted nodes beyond the changed set itself.
    pub fn affected_count(&self) -> usize {
        self.impacted
            .iter()
            .filter(|id| !self.changed.contains(*id))
            .count()
    }

    /// Average outbound-call count across the changed nodes; missing
    /// data counts as zero.
    pub fn avg_changed_complexity(&self) -> f64 {
        if self.changed.is_empty() {
            return 0.0;
        }
        let total: usize = self
            .changed
            .iter()
            .map(|id| self.complexity.get(id).copied().unwrap_or(0))
            .sum();
        total as f64 / self.changed.len() as f64
    }

    /// Whether any changed entity carries a critical marker.
    pub fn has_critical_changed_entity(&self) -> bool {
        self.changed
            .iter()
            .any(|id| self.markers.get(id).is_some_and(|m| !m.is_empty()))
    }

    /// One-line summary for logs and CLI output.
    pub fn summary(&self) -> String {
        format!(
            "blast radius: {} impacted ({} beyond the change), depth {}",
            self.impacted.len(),
            self.affected_count(),
            self.depth
        )
    }
}

/// Computes the impacted set and propagation depth for a change set.
///
/// Each changed id is traversed independently; unknown ids yield an
/// empty reach set with no error.
pub fn propagate(graph: &EntityGraph, changed: &BTreeSet<String>) -> ImpactReport {
    let mut report = ImpactReport {
        changed: changed.clone(),
        ..Default::default()
    };

    for source in changed {
        if graph.node(source).is_none() {
            debug!(id = %source, "changed entity not in graph, empty reach");
            report.reach.insert(source.clone(), BTreeSet::new());
            continue;
        }

        let mut reach = BTreeSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier = vec![source.clone()];
        visited.insert(source.clone());
        let mut level = 0usize;

        loop {
            let mut next = Vec::new();
            for id in frontier.drain(..) {
                if let Some(entity) = graph.node(&id) {
                    report.complexity.insert(id.clone(), entity.complexity());
                    report.markers.insert(id.clone(), entity.markers.clone());
                }
                for neighbor in graph.neighbors(&id) {
                    if visited.insert(neighbor.clone()) {
                        next.push(neighbor);
                    }
                }
                reach.insert(id);
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
            level += 1;
        }

        report.depth = report.depth.max(level);
        report.impacted.extend(reach.iter().cloned());
        report.reach.insert(source.clone(), reach);
    }

    info!(
        changed = report.changed.len(),
        impacted = report.impacted.len(),
        depth = report.depth,
        "impact propagation complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_core::{CodeEntity, EntityKind};

    fn graph_from_edges(nodes: &[&str], edges: &[(&str, &str)]) -> EntityGraph {
        let mut graph = EntityGraph::new();
        for id in nodes {
            graph.upsert(CodeEntity::new(*id, EntityKind::Method, *id));
        }
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    fn changed(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn source_is_in_its_own_closure_at_depth_zero() {
        let graph = graph_from_edges(&["a"], &[]);
        let report = propagate(&graph, &changed(&["a"]));

        assert!(report.impacted.contains("a"));
        assert_eq!(report.depth, 0);
        assert_eq!(report.reach["a"], changed(&["a"]));
    }

    #[test]
    fn unknown_source_yields_empty_reach() {
        let graph = graph_from_edges(&["a"], &[]);
        let report = propagate(&graph, &changed(&["ghost"]));

        assert!(report.reach["ghost"].is_empty());
        assert!(report.impacted.is_empty());
        assert_eq!(report.depth, 0);
    }

    #[test]
    fn linear_chain_counts_levels() {
        let graph = graph_from_edges(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let report = propagate(&graph, &changed(&["a"]));

        assert_eq!(report.impacted, changed(&["a", "b", "c"]));
        assert_eq!(report.depth, 2);
    }

    #[test]
    fn cycle_terminates() {
        let graph =
            graph_from_edges(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let report = propagate(&graph, &changed(&["a"]));

        assert_eq!(report.impacted, changed(&["a", "b", "c"]));
        assert_eq!(report.depth, 2);
    }

    #[test]
    fn depth_is_max_over_sources() {
        // a → b → c and lone d.
        let graph = graph_from_edges(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c")]);
        let report = propagate(&graph, &changed(&["a", "d"]));

        assert_eq!(report.depth, 2);
        assert_eq!(report.reach["d"], changed(&["d"]));
    }

    #[test]
    fn snapshots_capture_analysis_time_state() {
        let mut graph = EntityGraph::new();
        graph.upsert(
            CodeEntity::new("a", EntityKind::Method, "a")
                .with_calls(vec!["x".into(), "y".into(), "z".into()]),
        );
        let report = propagate(&graph, &changed(&["a"]));

        assert_eq!(report.complexity["a"], 3);
        assert!(report.markers["a"].is_empty());
    }

    #[test]
    fn affected_count_excludes_changed() {
        let graph = graph_from_edges(&["a", "b", "c"], &[("a", "b"), ("a", "c")]);
        let report = propagate(&graph, &changed(&["a"]));
        assert_eq!(report.affected_count(), 2);
    }
}
