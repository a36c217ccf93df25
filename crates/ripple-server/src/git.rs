//! Local working copies via the `git` binary.
//!
//! Each repository gets a directory under the configured workdir named
//! `<owner>_<name>`. Clones go over HTTPS; when a token is configured it
//! is embedded in the remote URL the way GitHub's token auth expects.

use std::path::{Path, PathBuf};
use std::process::Output;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("git {command} failed: {stderr}")]
    Command { command: String, stderr: String },
}

#[derive(Debug)]
pub struct GitClient {
    workdir: PathBuf,
    token: Option<String>,
}

impl GitClient {
    pub fn new(workdir: impl Into<PathBuf>, token: Option<String>) -> Self {
        Self {
            workdir: workdir.into(),
            token,
        }
    }

    /// Where a repository's working copy lives, whether or not it exists.
    pub fn local_path(&self, owner: &str, name: &str) -> PathBuf {
        self.workdir.join(format!("{owner}_{name}"))
    }

    fn remote_url(&self, owner: &str, name: &str) -> String {
        match &self.token {
            Some(token) => format!("https://{token}@github.com/{owner}/{name}.git"),
            None => format!("https://github.com/{owner}/{name}.git"),
        }
    }

    /// Clones the repository, or fast-forwards an existing working copy.
    pub async fn clone_or_fetch(&self, owner: &str, name: &str) -> Result<PathBuf, GitError> {
        let path = self.local_path(owner, name);
        if path.is_dir() {
            debug!(path = %path.display(), "pulling existing working copy");
            self.run(&["-C", &path.to_string_lossy(), "pull", "--ff-only"])
                .await?;
        } else {
            info!(repo = %format!("{owner}/{name}"), "cloning working copy");
            let url = self.remote_url(owner, name);
            self.run(&["clone", "--quiet", &url, &path.to_string_lossy()])
                .await?;
        }
        Ok(path)
    }

    pub async fn checkout(&self, path: &Path, branch: &str) -> Result<(), GitError> {
        self.run(&["-C", &path.to_string_lossy(), "checkout", "--quiet", branch])
            .await?;
        debug!(branch, "checked out");
        Ok(())
    }

    async fn run(&self, args: &[&str]) -> Result<Output, GitError> {
        let output = Command::new("git").args(args).output().await?;
        if !output.status.success() {
            return Err(GitError::Command {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}
