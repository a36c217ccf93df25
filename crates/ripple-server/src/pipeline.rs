//! The analysis pipeline behind the webhook: baseline builds from ping
//! events, then incremental per-PR analysis once a baseline exists.

use crate::report;
use crate::state::AppState;
use ripple_core::{ChangeKind, EntityDescriptor, SourceParser};
use ripple_graph::{builder, diff, impact, localize, risk};
use ripple_parser::{parse_repo, JavaParser};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// PR actions that get an analysis comment; other actions (labels,
/// assignments) still refresh the commit status silently.
const COMMENT_ACTIONS: &[&str] = &["opened", "reopened", "synchronize"];

/// Everything the pipeline needs from a pull request delivery.
#[derive(Debug, Clone)]
pub struct PullRequestEvent {
    pub owner: String,
    pub name: String,
    pub number: u64,
    pub head_sha: String,
    pub action: Option<String>,
    /// Local working copy, already cloned and checked out.
    pub local_path: PathBuf,
}

impl PullRequestEvent {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Deduplication key: one analysis per head SHA per PR.
    pub fn dispatch_key(&self) -> String {
        format!("{}#{}@{}", self.full_name(), self.number, self.head_sha)
    }
}

/// Builds the baseline graph for a freshly configured repository.
///
/// Idempotent: a repository that already has a baseline is left alone, so
/// webhook redeliveries of the ping are harmless.
pub async fn process_ping(state: AppState, owner: String, name: String, local_path: PathBuf) {
    let full = format!("{owner}/{name}");
    if state.baselines.is_fully_parsed(&full) {
        info!(repo = %full, "baseline already present, skipping ping");
        return;
    }

    let descriptors = parse_tree(local_path).await;
    let repo_state = state.registry.get_or_create(&full);
    {
        let mut repo = repo_state.lock().await;
        builder::rebuild(&mut repo.graph, &descriptors);
    }

    // No PR head exists for a ping; a synthetic marker records when the
    // baseline was taken.
    let marker = format!("ping-{}", chrono::Utc::now().timestamp_millis());
    state.baselines.mark_fully_parsed(&full, &marker);
    info!(repo = %full, entities = descriptors.len(), "baseline built from ping");
}

/// Runs the full per-PR analysis: fetch the diff, localize the change,
/// propagate impact, score risk, and report back to GitHub.
///
/// The first PR on a repository without a baseline only builds the
/// baseline; analysis starts with the next delivery.
pub async fn process_pull_request(state: AppState, event: PullRequestEvent) {
    let full = event.full_name();

    if !state.baselines.is_fully_parsed(&full) {
        info!(repo = %full, pr = event.number, "no baseline found, performing full scan");
        let descriptors = parse_tree(event.local_path.clone()).await;
        let repo_state = state.registry.get_or_create(&full);
        {
            let mut repo = repo_state.lock().await;
            builder::rebuild(&mut repo.graph, &descriptors);
        }
        state.baselines.mark_fully_parsed(&full, &event.head_sha);
        info!(repo = %full, entities = descriptors.len(), "baseline initialized, analysis starts next delivery");
        return;
    }

    let mut records = match state
        .github
        .fetch_changed_files(&event.owner, &event.name, event.number)
        .await
    {
        Ok(records) => records,
        Err(err) => {
            error!(pr = event.number, error = %err, "failed to fetch changed files");
            return;
        }
    };
    if records.is_empty() {
        warn!(pr = event.number, "no changed files in delivery");
        return;
    }

    for record in &mut records {
        match &record.patch {
            Some(patch) => {
                record.changed_lines = diff::extract_changed_ranges(patch);
                debug!(path = %record.path, ranges = record.changed_lines.len(), "extracted changed ranges");
            }
            None => {
                warn!(path = %record.path, kind = ?record.kind, "no patch data, falling back to file granularity");
            }
        }
    }

    // Re-parse only the touched sources; deleted files have nothing left
    // on disk to parse and are localized from the baseline graph instead.
    let touched: Vec<PathBuf> = records
        .iter()
        .filter(|r| r.kind != ChangeKind::Deleted)
        .map(|r| event.local_path.join(&r.path))
        .collect();
    let descriptors = parse_files(touched).await;

    let repo_state = state.registry.get_or_create(&full);
    let mut report = {
        let mut repo = repo_state.lock().await;
        builder::merge(&mut repo.graph, &descriptors);

        let changed = localize::changed_entity_ids(&records, &descriptors);
        if changed.is_empty() {
            warn!(pr = event.number, "no changed entities localized");
            return;
        }
        impact::propagate(&repo.graph, &changed)
    };

    report.comment_only_override = diff::all_comment_only(&records);
    report.critical_method_override = report.has_critical_changed_entity();
    let level = risk::score(&report);
    info!(
        repo = %full,
        pr = event.number,
        risk = level.as_str(),
        comment_only = report.comment_only_override,
        critical = report.critical_method_override,
        "{}",
        report.summary()
    );

    if event
        .action
        .as_deref()
        .is_some_and(|a| COMMENT_ACTIONS.contains(&a))
    {
        let body = report::format_comment(&report, level);
        match state
            .github
            .post_comment(&event.owner, &event.name, event.number, &body)
            .await
        {
            Ok(()) => info!(pr = event.number, "posted impact analysis comment"),
            Err(err) => error!(pr = event.number, error = %err, "failed to post comment"),
        }
    } else {
        debug!(action = ?event.action, "action does not get a comment");
    }

    if let Err(err) = state
        .github
        .set_commit_status(&event.owner, &event.name, &event.head_sha, level)
        .await
    {
        error!(sha = %event.head_sha, error = %err, "failed to set commit status");
    }
}

/// Parses a whole working copy off the async runtime.
async fn parse_tree(path: PathBuf) -> Vec<EntityDescriptor> {
    match tokio::task::spawn_blocking(move || parse_repo(&JavaParser::new(), &path)).await {
        Ok(descriptors) => descriptors,
        Err(err) => {
            error!(error = %err, "full-repo parse task failed");
            Vec::new()
        }
    }
}

/// Parses an explicit list of files off the async runtime. Files the
/// parser does not handle or cannot read contribute nothing.
async fn parse_files(paths: Vec<PathBuf>) -> Vec<EntityDescriptor> {
    match tokio::task::spawn_blocking(move || {
        let parser = JavaParser::new();
        paths
            .iter()
            .filter(|p| parser.handles(p))
            .flat_map(|p| parser.parse_file(p))
            .collect()
    })
    .await
    {
        Ok(descriptors) => descriptors,
        Err(err) => {
            error!(error = %err, "incremental parse task failed");
            Vec::new()
        }
    }
}
