//! Ripple Graph - The change-impact engine
//!
//! This crate turns parser descriptors and pull-request diffs into a
//! categorical risk verdict. It owns the entity graph and every stage of
//! the analysis pipeline that operates on it:
//!
//! - [`EntityGraph`] - adjacency store over code entities
//! - [`builder`] - (re)construction and incremental merging
//! - [`diff`] - unified-diff line-range extraction
//! - [`localize`] - diff ranges → changed entity ids
//! - [`impact`] - transitive impact propagation with depth tracking
//! - [`risk`] - weighted scoring with override rules
//!
//! The engine is deliberately infallible: partial input (missing
//! positions, missing diffs, dangling references) degrades to smaller
//! results rather than errors.
//!
//! # Example
//!
//! ```
//! use ripple_core::{CodeEntity, EntityKind};
//! use ripple_graph::{impact, risk, EntityGraph};
//! use std::collections::BTreeSet;
//!
//! let mut graph = EntityGraph::new();
//! graph.upsert(CodeEntity::new("a.A.f", EntityKind::Method, "f"));
//! graph.upsert(CodeEntity::new("a.A.g", EntityKind::Method, "g"));
//! graph.add_edge("a.A.f", "a.A.g");
//!
//! let changed = BTreeSet::from(["a.A.f".to_string()]);
//! let report = impact::propagate(&graph, &changed);
//! assert_eq!(report.depth, 1);
//! let verdict = risk::score(&report);
//! ```

pub mod builder;
pub mod diff;
pub mod impact;
pub mod localize;
pub mod risk;

mod graph;

pub use graph::{EntityGraph, GraphExport, GraphStats};
pub use impact::ImpactReport;
pub use risk::RiskLevel;
