//! Webhook ingress and the pull request analysis pipeline.
//!
//! The server accepts GitHub webhook deliveries, answers immediately, and
//! runs parsing and impact analysis on background tasks. Per-repository
//! graph state lives in memory behind the registry in [`state`]; the
//! [`baseline`] tracker records which repositories have a full baseline
//! graph and which still need one.

pub mod baseline;
pub mod git;
pub mod github;
pub mod pipeline;
pub mod report;
pub mod state;
pub mod webhook;

pub use baseline::BaselineTracker;
pub use git::GitClient;
pub use github::GitHubClient;
pub use state::{AppState, DispatchOutcome, Dispatcher, RepoRegistry};
pub use webhook::{router, serve};
