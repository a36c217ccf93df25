//! Webhook ingress.
//!
//! `POST /api/webhook/pr` accepts GitHub deliveries and answers before any
//! analysis runs; the pipeline continues on background tasks through the
//! dispatcher. `GET /api/status` is a liveness probe with a few counters.

use crate::pipeline::{self, PullRequestEvent};
use crate::state::{AppState, DispatchOutcome};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/webhook/pr", post(handle_webhook))
        .route("/api/status", get(status))
        .with_state(state)
}

/// Serves the webhook API on an already-bound listener until shutdown.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

/// The fields Ripple reads out of a webhook delivery; everything else in
/// the payload is ignored.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    /// Present on the ping GitHub sends when the webhook is configured.
    pub zen: Option<String>,
    pub hook: Option<Value>,
    pub action: Option<String>,
    pub pull_request: Option<PullRequestInfo>,
    pub repository: Option<RepositoryInfo>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub default_branch: String,
    pub owner: OwnerInfo,
}

#[derive(Debug, Deserialize)]
pub struct OwnerInfo {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestInfo {
    pub number: u64,
    pub head: HeadInfo,
}

#[derive(Debug, Deserialize)]
pub struct HeadInfo {
    pub sha: String,
}

async fn handle_webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Response {
    if payload.zen.is_some() && payload.hook.is_some() {
        return handle_ping(state, payload).await;
    }
    if payload.pull_request.is_some() {
        return handle_pull_request(state, payload).await;
    }
    (
        StatusCode::OK,
        Json(json!({ "status": "ignored", "message": "Unrecognized event" })),
    )
        .into_response()
}

async fn handle_ping(state: AppState, payload: WebhookPayload) -> Response {
    let Some(repo) = payload.repository else {
        return bad_request("No repository info");
    };
    let owner = repo.owner.login;
    let name = repo.name;
    let full = format!("{owner}/{name}");
    info!(repo = %full, "webhook ping received");

    // Clone and checkout up front while the delivery is still in hand;
    // the slow parse runs in the background.
    let local_path = match state.git.clone_or_fetch(&owner, &name).await {
        Ok(path) => path,
        Err(err) => {
            warn!(repo = %full, error = %err, "working copy unavailable on ping");
            return accepted(json!({
                "status": "accepted",
                "message": "Webhook configured, baseline will be built on first PR",
            }));
        }
    };
    if let Err(err) = state.git.checkout(&local_path, &repo.default_branch).await {
        warn!(repo = %full, error = %err, "checkout failed on ping");
    }

    let key = format!("{full}@ping");
    let task_state = state.clone();
    state
        .dispatcher
        .dispatch(key, async move {
            pipeline::process_ping(task_state, owner, name, local_path).await;
        })
        .await;

    accepted(json!({
        "status": "accepted",
        "message": "Webhook configured, baseline processing started",
        "repo": full,
    }))
}

async fn handle_pull_request(state: AppState, payload: WebhookPayload) -> Response {
    let (Some(pr), Some(repo)) = (payload.pull_request, payload.repository) else {
        return bad_request("Invalid payload");
    };
    let owner = repo.owner.login;
    let name = repo.name;
    let full = format!("{owner}/{name}");
    info!(repo = %full, pr = pr.number, action = ?payload.action, "pull request delivery");

    let local_path = match state.git.clone_or_fetch(&owner, &name).await {
        Ok(path) => path,
        Err(err) => {
            warn!(repo = %full, error = %err, "working copy unavailable");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };
    if let Err(err) = state.git.checkout(&local_path, &repo.default_branch).await {
        warn!(repo = %full, error = %err, "checkout failed");
    }

    let event = PullRequestEvent {
        owner,
        name,
        number: pr.number,
        head_sha: pr.head.sha,
        action: payload.action,
        local_path,
    };
    let key = event.dispatch_key();
    let number = event.number;
    let task_state = state.clone();
    let outcome = state
        .dispatcher
        .dispatch(key, async move {
            pipeline::process_pull_request(task_state, event).await;
        })
        .await;

    let message = match outcome {
        DispatchOutcome::Duplicate => "Analysis already in progress for this head",
        _ => "PR received, impact analysis in progress",
    };
    accepted(json!({
        "status": "accepted",
        "message": message,
        "pr_number": number,
        "repo": full,
    }))
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "ripple",
        "repos": state.registry.repo_count(),
        "baselines": state.baselines.tracked_count(),
    }))
}

fn accepted(body: Value) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_payload_shape_is_recognized() {
        let payload: WebhookPayload = serde_json::from_str(
            r#"{
                "zen": "Keep it logically awesome.",
                "hook": {"id": 1},
                "repository": {
                    "name": "shop",
                    "default_branch": "main",
                    "owner": {"login": "acme"}
                }
            }"#,
        )
        .unwrap();
        assert!(payload.zen.is_some() && payload.hook.is_some());
        assert!(payload.pull_request.is_none());
        assert_eq!(payload.repository.unwrap().owner.login, "acme");
    }

    #[test]
    fn pull_request_payload_shape_is_recognized() {
        let payload: WebhookPayload = serde_json::from_str(
            r#"{
                "action": "synchronize",
                "pull_request": {
                    "number": 42,
                    "head": {"sha": "abc123"},
                    "title": "ignored extra field"
                },
                "repository": {
                    "name": "shop",
                    "default_branch": "main",
                    "owner": {"login": "acme"}
                }
            }"#,
        )
        .unwrap();
        let pr = payload.pull_request.unwrap();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.head.sha, "abc123");
        assert_eq!(payload.action.as_deref(), Some("synchronize"));
    }

    #[test]
    fn unrecognized_events_deserialize_to_nothing_actionable() {
        let payload: WebhookPayload =
            serde_json::from_str(r#"{"action": "created", "comment": {"id": 1}}"#).unwrap();
        assert!(payload.pull_request.is_none());
        assert!(payload.zen.is_none());
    }
}
