//! Change records derived from a pull request's files.

use serde::{Deserialize, Serialize};

/// An inclusive line range, 1-based, in the new-file coordinate space.
///
/// A bound of `-1` means "unknown" and disables overlap checks involving
/// the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: i32,
    pub end: i32,
}

impl LineRange {
    /// Sentinel for a position the parser could not resolve.
    pub const UNKNOWN: i32 = -1;

    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    pub fn unresolved() -> Self {
        Self::new(Self::UNKNOWN, Self::UNKNOWN)
    }

    /// Both bounds are real line numbers.
    pub fn is_resolved(&self) -> bool {
        self.start >= 0 && self.end >= 0
    }

    /// Inclusive overlap test. Symmetric; any sentinel bound on either
    /// side makes the ranges disjoint.
    pub fn overlaps(&self, other: &LineRange) -> bool {
        if !self.is_resolved() || !other.is_resolved() {
            return false;
        }
        self.start <= other.end && self.end >= other.start
    }
}

impl std::fmt::Display for LineRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// An entity id plus its source extent, as reported by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSpan {
    pub id: String,
    pub range: LineRange,
}

impl MethodSpan {
    pub fn new(id: impl Into<String>, range: LineRange) -> Self {
        Self {
            id: id.into(),
            range,
        }
    }
}

/// How a file changed within a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl ChangeKind {
    /// Maps a GitHub file status string. Anything unrecognized is
    /// treated as a modification.
    pub fn from_status(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "added" => Self::Added,
            "deleted" | "removed" => Self::Deleted,
            "renamed" => Self::Renamed,
            _ => Self::Modified,
        }
    }
}

/// One changed file in a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub path: String,
    pub kind: ChangeKind,
    /// Unified-diff text from the hosting platform, when available.
    pub patch: Option<String>,
    /// Ranges derived from the patch; empty means no line data and the
    /// localizer falls back to file granularity.
    #[serde(default)]
    pub changed_lines: Vec<LineRange>,
}

impl ChangeRecord {
    pub fn new(path: impl Into<String>, kind: ChangeKind, patch: Option<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            patch,
            changed_lines: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_symmetric() {
        let cases = [
            (LineRange::new(1, 5), LineRange::new(5, 9), true),
            (LineRange::new(1, 5), LineRange::new(6, 9), false),
            (LineRange::new(10, 12), LineRange::new(5, 20), true),
            (LineRange::new(10, 12), LineRange::new(30, 40), false),
        ];
        for (a, b, expected) in cases {
            assert_eq!(a.overlaps(&b), expected, "{a} vs {b}");
            assert_eq!(b.overlaps(&a), expected, "{b} vs {a}");
        }
    }

    #[test]
    fn sentinel_never_overlaps() {
        let known = LineRange::new(1, 100);
        let unknown = LineRange::unresolved();
        assert!(!known.overlaps(&unknown));
        assert!(!unknown.overlaps(&known));
        assert!(!unknown.overlaps(&unknown));

        let half = LineRange::new(5, LineRange::UNKNOWN);
        assert!(!half.overlaps(&known));
    }

    #[test]
    fn change_kind_from_github_status() {
        assert_eq!(ChangeKind::from_status("added"), ChangeKind::Added);
        assert_eq!(ChangeKind::from_status("removed"), ChangeKind::Deleted);
        assert_eq!(ChangeKind::from_status("deleted"), ChangeKind::Deleted);
        assert_eq!(ChangeKind::from_status("Renamed"), ChangeKind::Renamed);
        assert_eq!(ChangeKind::from_status("copied"), ChangeKind::Modified);
    }
}
