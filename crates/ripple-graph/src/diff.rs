//! Unified-diff line arithmetic.
//!
//! Extracts, from one file's patch text, the line ranges in the new
//! file's coordinate space that were added or modified, plus the
//! comment-only judgement used by the risk override. Malformed or
//! missing diff text yields empty results, never an error.

use regex::Regex;
use ripple_core::{ChangeRecord, LineRange};
use std::sync::LazyLock;

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("hunk header pattern")
});

/// Parses a unified-diff patch into maximal runs of consecutive
/// added/modified lines, numbered in the new file.
pub fn extract_changed_ranges(patch: &str) -> Vec<LineRange> {
    let mut ranges = Vec::new();
    let mut new_line: i32 = 0;
    let mut open: Option<(i32, i32)> = None;
    let mut in_hunk = false;

    for line in patch.lines() {
        if let Some(caps) = HUNK_HEADER.captures(line) {
            // A new hunk force-closes any open range.
            if let Some((start, end)) = open.take() {
                ranges.push(LineRange::new(start, end));
            }
            new_line = caps
                .get(3)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            in_hunk = true;
            continue;
        }
        if !in_hunk {
            continue;
        }

        if line.starts_with('+') {
            match &mut open {
                Some((_, end)) => *end = new_line,
                None => open = Some((new_line, new_line)),
            }
            new_line += 1;
        } else if line.starts_with('-') {
            // Existed only in the old file: the new-file counter holds.
        } else {
            // Context closes an open run.
            if let Some((start, end)) = open.take() {
                ranges.push(LineRange::new(start, end));
            }
            new_line += 1;
        }
    }

    if let Some((start, end)) = open {
        ranges.push(LineRange::new(start, end));
    }
    ranges
}

/// Whether every added line in the patch is blank or a comment.
///
/// A patch with zero added lines is not comment-only.
pub fn is_comment_only(patch: &str) -> bool {
    let mut added = 0usize;
    let mut comments = 0usize;

    for line in patch.lines() {
        if line.starts_with('+') && !line.starts_with("+++") {
            added += 1;
            let trimmed = line[1..].trim();
            if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with('*') {
                comments += 1;
            }
        }
    }
    added > 0 && added == comments
}

/// Whether every changed file's diff is judged comment-only.
///
/// Files without diff text do not veto the judgement; scoring input
/// gaps bias toward lower risk.
pub fn all_comment_only(records: &[ChangeRecord]) -> bool {
    !records.is_empty()
        && records
            .iter()
            .all(|rec| rec.patch.as_deref().map_or(true, is_comment_only))
}
