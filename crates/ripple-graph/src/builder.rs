//! Graph construction from parser descriptors.
//!
//! The builder runs three passes: create nodes, link structural edges
//! (supertypes, injected dependencies, containment), link call edges.
//! Unresolvable references at any step are dropped, not reported:
//! incremental runs only parse a subset of files, so best effort given
//! partial information is the contract.

use crate::graph::EntityGraph;
use ripple_core::{CodeEntity, EntityDescriptor, EntityKind};
use tracing::{debug, info};

/// Rebuilds the graph from scratch out of a full-repository parse.
pub fn rebuild(graph: &mut EntityGraph, descriptors: &[EntityDescriptor]) {
    graph.clear();
    merge(graph, descriptors);
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph rebuilt"
    );
}

/// Merges descriptors into an existing graph.
///
/// Entities from changed files replace their prior content; nodes from
/// files absent here are left untouched, including nodes from deleted
/// files (a documented staleness window).
pub fn merge(graph: &mut EntityGraph, descriptors: &[EntityDescriptor]) {
    add_nodes(graph, descriptors);
    link_structure(graph, descriptors);
    link_calls(graph, descriptors);
}

/// Pass 1: a Class node per descriptor, a Method node per nested method.
fn add_nodes(graph: &mut EntityGraph, descriptors: &[EntityDescriptor]) {
    for desc in descriptors {
        let class = CodeEntity::new(&desc.name, EntityKind::Class, desc.simple_name())
            .with_markers(desc.markers.iter().copied());
        graph.upsert(class);

        for method in &desc.methods {
            let node = CodeEntity::new(method.id(), EntityKind::Method, &method.name)
                .with_markers(method.markers.iter().copied())
                .with_calls(method.called_names.iter().cloned());
            graph.upsert(node);
        }
    }
}

/// Pass 2: supertype, injected-dependency, and containment edges.
fn link_structure(graph: &mut EntityGraph, descriptors: &[EntityDescriptor]) {
    for desc in descriptors {
        for supertype in &desc.supertypes {
            if let Some(target) = graph.resolve(supertype) {
                graph.add_edge(&desc.name, &target);
            } else {
                debug!(class = %desc.name, reference = %supertype, "unresolved supertype");
            }
        }

        for injected in &desc.injected_types {
            if let Some(target) = graph.resolve(injected) {
                graph.add_edge(&desc.name, &target);
            } else {
                debug!(class = %desc.name, reference = %injected, "unresolved injection");
            }
        }

        for method in &desc.methods {
            graph.add_edge(&method.id(), &desc.name);
        }
    }
}

/// Pass 3: an edge per resolvable call target.
fn link_calls(graph: &mut EntityGraph, descriptors: &[EntityDescriptor]) {
    for desc in descriptors {
        for method in &desc.methods {
            let from = method.id();
            for called in &method.called_names {
                if graph.contains(called) {
                    graph.add_edge(&from, called);
                } else {
                    debug!(method = %from, target = %called, "unresolved call target");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_core::{DescriptorKind, Marker, MethodDescriptor};

    fn class(name: &str) -> EntityDescriptor {
        EntityDescriptor::new(name, DescriptorKind::Class)
    }

    fn method(class_name: &str, name: &str, calls: &[&str]) -> MethodDescriptor {
        let mut m = MethodDescriptor::new(class_name, name);
        m.called_names = calls.iter().map(|c| c.to_string()).collect();
        m
    }

    #[test]
    fn node_pass_creates_class_and_method_nodes() {
        let mut desc = class("shop.OrderService");
        desc.markers.insert(Marker::Transactional);
        desc.methods.push(method("shop.OrderService", "checkout", &[]));

        let mut graph = EntityGraph::new();
        rebuild(&mut graph, &[desc]);

        assert_eq!(graph.node_count(), 2);
        let class_node = graph.node("shop.OrderService").unwrap();
        assert_eq!(class_node.kind, EntityKind::Class);
        assert_eq!(class_node.display_name, "OrderService");
        assert!(class_node.markers.contains(&Marker::Transactional));

        let method_node = graph.node("shop.OrderService.checkout").unwrap();
        assert_eq!(method_node.kind, EntityKind::Method);
    }

    #[test]
    fn methods_link_to_their_owning_class() {
        let mut desc = class("pkg.A");
        desc.methods.push(method("pkg.A", "f", &[]));

        let mut graph = EntityGraph::new();
        rebuild(&mut graph, &[desc]);

        assert_eq!(graph.neighbors("pkg.A.f"), vec!["pkg.A".to_string()]);
    }

    #[test]
    fn injected_dependency_resolves_by_suffix() {
        let mut service = class("shop.OrderService");
        // Unqualified type name, as left by partial import resolution.
        service.injected_types.push("PaymentGateway".to_string());
        let gateway = class("billing.PaymentGateway");

        let mut graph = EntityGraph::new();
        rebuild(&mut graph, &[service, gateway]);

        assert!(graph
            .neighbors("shop.OrderService")
            .contains(&"billing.PaymentGateway".to_string()));
    }

    #[test]
    fn supertype_edges_are_created() {
        let mut child = class("pkg.Child");
        child.supertypes.push("pkg.Base".to_string());
        let base = class("pkg.Base");

        let mut graph = EntityGraph::new();
        rebuild(&mut graph, &[child, base]);

        assert_eq!(graph.neighbors("pkg.Child"), vec!["pkg.Base".to_string()]);
    }

    #[test]
    fn call_edges_require_exact_ids() {
        let mut a = class("pkg.A");
        a.methods
            .push(method("pkg.A", "f", &["pkg.B.g", "unqualifiedCall"]));
        let mut b = class("pkg.B");
        b.methods.push(method("pkg.B", "g", &[]));

        let mut graph = EntityGraph::new();
        rebuild(&mut graph, &[a, b]);

        let neighbors = graph.neighbors("pkg.A.f");
        assert!(neighbors.contains(&"pkg.B.g".to_string()));
        // The dangling reference is dropped silently.
        assert!(!neighbors.iter().any(|n| n == "unqualifiedCall"));
    }

    #[test]
    fn incremental_merge_replaces_only_changed_entities() {
        let mut a = class("pkg.A");
        a.methods.push(method("pkg.A", "f", &["pkg.B.g"]));
        let mut b = class("pkg.B");
        b.methods.push(method("pkg.B", "g", &[]));

        let mut graph = EntityGraph::new();
        rebuild(&mut graph, &[a, b.clone()]);
        assert!(graph.neighbors("pkg.A.f").contains(&"pkg.B.g".to_string()));

        // Re-parse only pkg.B: pkg.B.g now calls pkg.A.f.
        b.methods[0].called_names.push("pkg.A.f".to_string());
        merge(&mut graph, &[b]);

        assert_eq!(graph.node_count(), 4);
        // Untouched entity keeps its edges, merged one gets new ones.
        assert!(graph.neighbors("pkg.A.f").contains(&"pkg.B.g".to_string()));
        assert!(graph.neighbors("pkg.B.g").contains(&"pkg.A.f".to_string()));
    }
}
