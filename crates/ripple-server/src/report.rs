//! Markdown rendering of an impact report for the PR comment.

use ripple_graph::{ImpactReport, RiskLevel};
use std::fmt::Write;

/// Renders the comment body posted on the pull request.
pub fn format_comment(report: &ImpactReport, risk: RiskLevel) -> String {
    let mut out = String::new();
    out.push_str("## PR Impact Analysis\n\n");

    out.push_str("### Changed Entities\n");
    for id in &report.changed {
        let _ = writeln!(out, "- `{id}`");
    }

    out.push_str("\n### Impacted Entities (direct + downstream)\n");
    let mut any = false;
    for id in &report.impacted {
        if !report.changed.contains(id) {
            let _ = writeln!(out, "- `{id}`");
            any = true;
        }
    }
    if !any {
        out.push_str("_(none)_\n");
    }

    let _ = writeln!(out, "\n### Impact Depth: {}", report.depth);
    let _ = writeln!(out, "### Risk: **{}**", risk.as_str());

    out.push_str("\n---\n*This comment was generated automatically by Ripple.*\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn report(changed: &[&str], impacted: &[&str], depth: usize) -> ImpactReport {
        ImpactReport {
            changed: changed.iter().map(|s| s.to_string()).collect(),
            impacted: impacted.iter().map(|s| s.to_string()).collect(),
            depth,
            ..Default::default()
        }
    }

    #[test]
    fn changed_entities_are_excluded_from_the_impacted_list() {
        let r = report(
            &["shop.OrderService.place"],
            &["shop.OrderService.place", "shop.OrderController.create"],
            1,
        );
        let body = format_comment(&r, RiskLevel::Medium);

        let impacted_section = body
            .split("### Impacted Entities")
            .nth(1)
            .unwrap();
        assert!(impacted_section.contains("`shop.OrderController.create`"));
        assert!(!impacted_section
            .split("### Impact Depth")
            .next()
            .unwrap()
            .contains("`shop.OrderService.place`"));
        assert!(body.contains("### Risk: **MEDIUM**"));
    }

    #[test]
    fn empty_downstream_renders_a_placeholder() {
        let changed: BTreeSet<String> = ["pkg.A".to_string()].into_iter().collect();
        let r = ImpactReport {
            impacted: changed.clone(),
            changed,
            depth: 0,
            ..Default::default()
        };
        let body = format_comment(&r, RiskLevel::Low);
        assert!(body.contains("_(none)_"));
        assert!(body.contains("### Impact Depth: 0"));
    }
}
