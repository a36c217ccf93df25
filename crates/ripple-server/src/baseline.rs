//! Per-repository baseline bookkeeping.
//!
//! A repository only gets incremental PR analysis once a full baseline
//! graph has been built for it. The tracker records that fact together
//! with the commit the baseline was built from; ping-triggered baselines
//! use a synthetic `ping-<epoch-millis>` marker since no PR head exists.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Baseline state for one repository, keyed by `owner/name`.
#[derive(Debug, Clone)]
pub struct RepoBaseline {
    pub repo: String,
    pub fully_parsed: bool,
    pub last_commit_sha: String,
    pub last_parsed_at: DateTime<Utc>,
}

/// In-memory registry of which repositories have a baseline graph.
#[derive(Debug, Default)]
pub struct BaselineTracker {
    repos: Mutex<HashMap<String, RepoBaseline>>,
}

impl BaselineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fully_parsed(&self, repo: &str) -> bool {
        self.lock().get(repo).is_some_and(|b| b.fully_parsed)
    }

    /// Records a completed baseline build from `commit_sha`.
    pub fn mark_fully_parsed(&self, repo: &str, commit_sha: &str) {
        self.lock().insert(
            repo.to_string(),
            RepoBaseline {
                repo: repo.to_string(),
                fully_parsed: true,
                last_commit_sha: commit_sha.to_string(),
                last_parsed_at: Utc::now(),
            },
        );
    }

    pub fn metadata(&self, repo: &str) -> Option<RepoBaseline> {
        self.lock().get(repo).cloned()
    }

    pub fn tracked_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, RepoBaseline>> {
        self.repos.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untracked_repo_has_no_baseline() {
        let tracker = BaselineTracker::new();
        assert!(!tracker.is_fully_parsed("acme/shop"));
        assert!(tracker.metadata("acme/shop").is_none());
    }

    #[test]
    fn marking_records_sha_and_timestamp() {
        let tracker = BaselineTracker::new();
        tracker.mark_fully_parsed("acme/shop", "abc123");

        assert!(tracker.is_fully_parsed("acme/shop"));
        let meta = tracker.metadata("acme/shop").unwrap();
        assert_eq!(meta.last_commit_sha, "abc123");
        assert!(meta.fully_parsed);
        assert_eq!(tracker.tracked_count(), 1);
    }

    #[test]
    fn remarking_updates_the_sha() {
        let tracker = BaselineTracker::new();
        tracker.mark_fully_parsed("acme/shop", "abc123");
        tracker.mark_fully_parsed("acme/shop", "def456");

        let meta = tracker.metadata("acme/shop").unwrap();
        assert_eq!(meta.last_commit_sha, "def456");
        assert_eq!(tracker.tracked_count(), 1);
    }
}
