//! Diff-to-entity localization.
//!
//! Intersects a file's changed line ranges with its method spans to
//! find the entities that were directly edited. When no line data is
//! available the localizer degrades to file granularity: a deleted file
//! contributes its class id, everything else contributes every method
//! in the file (a conservative over-approximation).

use ripple_core::{ChangeKind, ChangeRecord, EntityDescriptor, LineRange, MethodSpan};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Returns the ids of the entities a change set directly touches.
pub fn changed_entity_ids(
    records: &[ChangeRecord],
    descriptors: &[EntityDescriptor],
) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    if records.is_empty() || descriptors.is_empty() {
        return ids;
    }

    let by_path = index_by_path(descriptors);

    for record in records {
        let Some(desc) = by_path.get(record.path.as_str()) else {
            warn!(path = %record.path, "no parsed entity for changed file");
            continue;
        };
        if desc.methods.is_empty() {
            debug!(path = %record.path, "changed file has no methods");
            continue;
        }

        if !record.changed_lines.is_empty() {
            let spans = desc.method_spans();
            for span in overlapping(&spans, &record.changed_lines) {
                ids.insert(span.id.clone());
            }
        } else {
            match record.kind {
                ChangeKind::Deleted => {
                    ids.insert(desc.name.clone());
                }
                _ => {
                    // No diff data: every method counts as changed.
                    for method in &desc.methods {
                        ids.insert(method.id());
                    }
                }
            }
        }
    }

    ids
}

/// Spans whose extent overlaps any of the given ranges.
pub fn overlapping<'a>(spans: &'a [MethodSpan], ranges: &[LineRange]) -> Vec<&'a MethodSpan> {
    spans
        .iter()
        .filter(|span| ranges.iter().any(|range| range.overlaps(&span.range)))
        .collect()
}

/// Indexes descriptors under every path their class could live at:
/// `pkg/Name.java` plus the conventional source roots.
fn index_by_path(descriptors: &[EntityDescriptor]) -> HashMap<String, &EntityDescriptor> {
    let mut map = HashMap::new();
    for desc in descriptors {
        let relative = format!("{}.java", desc.name.replace('.', "/"));
        map.insert(format!("src/main/java/{relative}"), desc);
        map.insert(format!("src/test/java/{relative}"), desc);
        map.insert(relative, desc);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_core::{DescriptorKind, MethodDescriptor};

    fn descriptor_with_methods(name: &str, methods: &[(&str, i32, i32)]) -> EntityDescriptor {
        let mut desc = EntityDescriptor::new(name, DescriptorKind::Class);
        for (method, start, end) in methods {
            let mut m = MethodDescriptor::new(name, *method);
            m.start_line = *start;
            m.end_line = *end;
            desc.methods.push(m);
        }
        desc
    }

    #[test]
    fn overlapping_span_is_reported_changed() {
        // Patch covers lines 10-12; the 5-20 method overlaps, 30-40 does not.
        let desc = descriptor_with_methods("pkg.Svc", &[("inside", 5, 20), ("outside", 30, 40)]);
        let mut record = ChangeRecord::new("src/main/java/pkg/Svc.java", ChangeKind::Modified, None);
        record.changed_lines = vec![LineRange::new(10, 12)];

        let ids = changed_entity_ids(&[record], &[desc]);
        assert_eq!(ids, BTreeSet::from(["pkg.Svc.inside".to_string()]));
    }

    #[test]
    fn unresolved_span_never_matches() {
        let desc = descriptor_with_methods("pkg.Svc", &[("ghost", -1, -1)]);
        let mut record = ChangeRecord::new("pkg/Svc.java", ChangeKind::Modified, None);
        record.changed_lines = vec![LineRange::new(1, 100)];

        assert!(changed_entity_ids(&[record], &[desc]).is_empty());
    }

    #[test]
    fn deleted_file_without_ranges_contributes_class_id() {
        let desc = descriptor_with_methods("pkg.Gone", &[("f", 1, 5)]);
        let record = ChangeRecord::new("pkg/Gone.java", ChangeKind::Deleted, None);

        let ids = changed_entity_ids(&[record], &[desc]);
        assert_eq!(ids, BTreeSet::from(["pkg.Gone".to_string()]));
    }

    #[test]
    fn missing_ranges_fall_back_to_every_method() {
        let desc = descriptor_with_methods("pkg.Svc", &[("f", 1, 5), ("g", 7, 9)]);
        let record = ChangeRecord::new("pkg/Svc.java", ChangeKind::Modified, None);

        let ids = changed_entity_ids(&[record], &[desc]);
        assert_eq!(
            ids,
            BTreeSet::from(["pkg.Svc.f".to_string(), "pkg.Svc.g".to_string()])
        );
    }

    #[test]
    fn unmatched_file_is_skipped() {
        let desc = descriptor_with_methods("pkg.Svc", &[("f", 1, 5)]);
        let record = ChangeRecord::new("docs/README.md", ChangeKind::Modified, None);
        assert!(changed_entity_ids(&[record], &[desc]).is_empty());
    }

    #[test]
    fn source_root_prefixes_all_match() {
        let desc = descriptor_with_methods("pkg.Svc", &[("f", 1, 5)]);
        for path in [
            "pkg/Svc.java",
            "src/main/java/pkg/Svc.java",
            "src/test/java/pkg/Svc.java",
        ] {
            let record = ChangeRecord::new(path, ChangeKind::Modified, None);
            let ids = changed_entity_ids(&[record], std::slice::from_ref(&desc));
            assert!(ids.contains("pkg.Svc.f"), "path {path} should match");
        }
    }
}
