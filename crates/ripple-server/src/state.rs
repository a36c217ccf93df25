//! Shared server state: per-repository graphs and background dispatch.

use crate::baseline::BaselineTracker;
use crate::git::GitClient;
use crate::github::GitHubClient;
use ripple_graph::EntityGraph;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Mutable analysis state for one repository.
#[derive(Debug, Default)]
pub struct RepoState {
    pub graph: EntityGraph,
}

/// Hands out one lock-guarded [`RepoState`] per repository, so analyses
/// for different repositories never contend with each other.
#[derive(Debug, Default)]
pub struct RepoRegistry {
    repos: Mutex<HashMap<String, Arc<tokio::sync::Mutex<RepoState>>>>,
}

impl RepoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, repo: &str) -> Arc<tokio::sync::Mutex<RepoState>> {
        let mut repos = self.repos.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            repos
                .entry(repo.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(RepoState::default()))),
        )
    }

    pub fn repo_count(&self) -> usize {
        self.repos
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// The result of handing work to the [`Dispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Work is running on a background task.
    Spawned,
    /// All workers were busy; the work ran on the calling task before
    /// this returned, applying backpressure at the ingress.
    RanInline,
    /// The same key was already in flight; the work was dropped.
    Duplicate,
}

/// Bounded background executor with per-key deduplication.
///
/// GitHub redelivers webhooks, and a force-push can produce several
/// `synchronize` events for the same head in quick succession. Keying by
/// `owner/repo#pr@sha` collapses those into a single analysis.
#[derive(Debug)]
pub struct Dispatcher {
    permits: Arc<Semaphore>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

struct InFlightGuard {
    key: String,
    set: Arc<Mutex<HashSet<String>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

impl Dispatcher {
    pub fn new(worker_limit: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(worker_limit)),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Runs `work` under the worker limit, unless `key` is already in
    /// flight. Completes immediately when a worker slot was free.
    pub async fn dispatch<F>(&self, key: String, work: F) -> DispatchOutcome
    where
        F: Future<Output = ()> + Send + 'static,
    {
        {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !in_flight.insert(key.clone()) {
                debug!(%key, "dropping duplicate delivery");
                return DispatchOutcome::Duplicate;
            }
        }
        let guard = InFlightGuard {
            key,
            set: Arc::clone(&self.in_flight),
        };
        let work = async move {
            let _guard = guard;
            work.await;
        };

        match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => {
                tokio::spawn(async move {
                    let _permit = permit;
                    work.await;
                });
                DispatchOutcome::Spawned
            }
            Err(_) => {
                warn!("worker pool saturated, running delivery inline");
                work.await;
                DispatchOutcome::RanInline
            }
        }
    }
}

/// Everything the webhook handlers need, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RepoRegistry>,
    pub baselines: Arc<BaselineTracker>,
    pub dispatcher: Arc<Dispatcher>,
    pub github: Arc<GitHubClient>,
    pub git: Arc<GitClient>,
}

impl AppState {
    pub fn new(github: GitHubClient, git: GitClient, worker_limit: usize) -> Self {
        Self {
            registry: Arc::new(RepoRegistry::new()),
            baselines: Arc::new(BaselineTracker::new()),
            dispatcher: Arc::new(Dispatcher::new(worker_limit)),
            github: Arc::new(github),
            git: Arc::new(git),
        }
    }
}
