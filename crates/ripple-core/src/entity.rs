//! Code entities and critical-capability markers.
//!
//! An entity is a class or method represented as a graph node. Markers
//! are a closed set of framework-level capabilities used for risk
//! scoring; they are assigned by the parser through an explicit mapping
//! table, never by substring matching at scoring time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The kind of code entity a graph node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Class,
    Method,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Class => write!(f, "class"),
            Self::Method => write!(f, "method"),
        }
    }
}

/// A declared critical capability on an entity.
///
/// Every variant marks a side-effecting or security-sensitive
/// capability; absence of capability is expressed by an empty marker
/// set, so there is no `None` variant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    Transactional,
    Caching,
    Scheduled,
    AsyncDispatch,
    SecurityEnforced,
    HttpWriteEndpoint,
}

impl Marker {
    /// Maps a declared annotation name onto a marker.
    ///
    /// Accepts qualified names (`org.springframework.scheduling.annotation.Async`),
    /// simple names (`Async`), and a leading `@`. Unknown annotations map
    /// to nothing rather than an error.
    pub fn from_annotation(name: &str) -> Option<Self> {
        let simple = name
            .rsplit('.')
            .next()
            .unwrap_or(name)
            .trim_start_matches('@');

        match simple {
            "Transactional" => Some(Self::Transactional),
            "Cacheable" | "CacheEvict" | "CachePut" => Some(Self::Caching),
            "Scheduled" => Some(Self::Scheduled),
            "Async" | "EventListener" => Some(Self::AsyncDispatch),
            "PreAuthorize" | "Secured" | "RolesAllowed" => Some(Self::SecurityEnforced),
            "PostMapping" | "PutMapping" | "DeleteMapping" | "PatchMapping" => {
                Some(Self::HttpWriteEndpoint)
            }
            _ => None,
        }
    }

    /// Maps a batch of annotation names, dropping the unrecognized ones.
    pub fn from_annotations<I, S>(names: I) -> BTreeSet<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|n| Self::from_annotation(n.as_ref()))
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transactional => "transactional",
            Self::Caching => "caching",
            Self::Scheduled => "scheduled",
            Self::AsyncDispatch => "async_dispatch",
            Self::SecurityEnforced => "security_enforced",
            Self::HttpWriteEndpoint => "http_write_endpoint",
        }
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A node in the entity graph.
///
/// Identity is the `id` string alone; re-inserting an id into a graph
/// replaces the prior content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntity {
    /// Unique, stable key, e.g. `"pkg.Class"` or `"pkg.Class.method"`.
    pub id: String,
    pub kind: EntityKind,
    pub display_name: String,
    /// Declared critical-capability markers.
    #[serde(default)]
    pub markers: BTreeSet<Marker>,
    /// Raw outbound call targets, in source order. Not necessarily
    /// resolvable to graph ids; the count doubles as a complexity metric.
    #[serde(default)]
    pub outbound_calls: Vec<String>,
}

impl CodeEntity {
    pub fn new(
        id: impl Into<String>,
        kind: EntityKind,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            display_name: display_name.into(),
            markers: BTreeSet::new(),
            outbound_calls: Vec::new(),
        }
    }

    pub fn with_markers(mut self, markers: impl IntoIterator<Item = Marker>) -> Self {
        self.markers = markers.into_iter().collect();
        self
    }

    pub fn with_calls(mut self, calls: impl IntoIterator<Item = String>) -> Self {
        self.outbound_calls = calls.into_iter().collect();
        self
    }

    /// Complexity metric: how many outbound calls the entity makes.
    pub fn complexity(&self) -> usize {
        self.outbound_calls.len()
    }

    pub fn has_critical_marker(&self) -> bool {
        !self.markers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_qualified_annotation_names() {
        assert_eq!(
            Marker::from_annotation("org.springframework.transaction.annotation.Transactional"),
            Some(Marker::Transactional)
        );
        assert_eq!(
            Marker::from_annotation("@Scheduled"),
            Some(Marker::Scheduled)
        );
        assert_eq!(Marker::from_annotation("CacheEvict"), Some(Marker::Caching));
        assert_eq!(Marker::from_annotation("GetMapping"), None);
        assert_eq!(Marker::from_annotation("Override"), None);
    }

    #[test]
    fn batch_mapping_drops_unknown() {
        let markers = Marker::from_annotations(["Transactional", "Override", "PostMapping"]);
        assert_eq!(markers.len(), 2);
        assert!(markers.contains(&Marker::Transactional));
        assert!(markers.contains(&Marker::HttpWriteEndpoint));
    }

    #[test]
    fn empty_marker_set_is_not_critical() {
        let plain = CodeEntity::new("pkg.A.helper", EntityKind::Method, "helper");
        assert!(!plain.has_critical_marker());

        let critical = plain.clone().with_markers([Marker::SecurityEnforced]);
        assert!(critical.has_critical_marker());
    }
}
