//! Structural descriptors supplied by the parser collaborator.
//!
//! The parser is an external concern behind the [`SourceParser`] seam:
//! Ripple only assumes it can turn a source file into zero or more
//! descriptors, tolerating unresolvable positions and references.

use crate::change::{LineRange, MethodSpan};
use crate::entity::Marker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// The declared kind of a parsed top-level type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorKind {
    Class,
    Interface,
}

/// One parsed top-level type with its nested methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Qualified type name, e.g. `"shop.OrderService"`.
    pub name: String,
    pub kind: DescriptorKind,
    #[serde(default)]
    pub markers: BTreeSet<Marker>,
    /// Supertype and interface names, qualified where the parser could
    /// resolve them.
    #[serde(default)]
    pub supertypes: Vec<String>,
    /// Types injected as dependencies (constructor/field injection).
    #[serde(default)]
    pub injected_types: Vec<String>,
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

impl EntityDescriptor {
    pub fn new(name: impl Into<String>, kind: DescriptorKind) -> Self {
        Self {
            name: name.into(),
            kind,
            markers: BTreeSet::new(),
            supertypes: Vec::new(),
            injected_types: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// The unqualified display name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Source spans of every method, for diff localization.
    pub fn method_spans(&self) -> Vec<MethodSpan> {
        self.methods
            .iter()
            .map(|m| MethodSpan::new(m.id(), m.span()))
            .collect()
    }
}

/// One parsed method inside a type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    /// Qualified name of the owning type.
    pub class_name: String,
    /// Raw call targets found in the body, in source order.
    #[serde(default)]
    pub called_names: Vec<String>,
    #[serde(default)]
    pub markers: BTreeSet<Marker>,
    /// First line of the declaration; `-1` when unresolved.
    pub start_line: i32,
    /// Last line of the body; `-1` when unresolved.
    pub end_line: i32,
}

impl MethodDescriptor {
    pub fn new(class_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            called_names: Vec::new(),
            markers: BTreeSet::new(),
            start_line: LineRange::UNKNOWN,
            end_line: LineRange::UNKNOWN,
        }
    }

    /// Graph id of this method: `<className>.<methodName>`.
    pub fn id(&self) -> String {
        format!("{}.{}", self.class_name, self.name)
    }

    pub fn span(&self) -> LineRange {
        LineRange::new(self.start_line, self.end_line)
    }
}

/// The narrow seam to the per-language structural parser.
///
/// Implementations never fail outward: a file that cannot be parsed
/// degrades to an empty descriptor list, logged at the implementation.
pub trait SourceParser {
    /// Whether this parser understands the given path.
    fn handles(&self, path: &Path) -> bool;

    /// Parses one source file into descriptors.
    fn parse_file(&self, path: &Path) -> Vec<EntityDescriptor>;
}
