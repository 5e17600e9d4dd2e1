//! Source-control access for validation
//!
//! Implemented on top of the `git` CLI. Every command runs against the
//! asset repository with `git -C <repo>`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// Result of comparing a path against a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOutcome {
    Unchanged,
    Changed,
}

/// Trait for the source-control operations the validator needs
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Fail unless the checkout is on `branch`, clean and (unless offline) current
    async fn check_clean_state(&self, branch: &str, offline: bool) -> Result<()>;

    /// Every tag in the repository
    async fn tags(&self) -> Result<Vec<String>>;

    /// Compare `path` (relative to the repository root) between `tag` and the working tree
    async fn diff_path(&self, tag: &str, path: &Path) -> Result<DiffOutcome>;
}

/// `git` command-line implementation
pub struct GitCli {
    repo: PathBuf,
    remote: String,
}

impl GitCli {
    pub fn new(repo: PathBuf) -> Self {
        Self {
            repo,
            remote: "origin".to_string(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        debug!("git {}", args.join(" "));
        Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to run git {}", args.join(" ")))
    }

    /// Run and return trimmed stdout, failing on non-zero exit
    async fn run_ok(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args).await?;
        if !output.status.success() {
            anyhow::bail!(
                "git {} exited with {}: {}",
                args.join(" "),
                exit_code(&output),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl SourceControl for GitCli {
    async fn check_clean_state(&self, branch: &str, offline: bool) -> Result<()> {
        let inside = self
            .run_ok(&["rev-parse", "--is-inside-work-tree"])
            .await
            .with_context(|| format!("{} is not a git repository", self.repo.display()))?;
        if inside != "true" {
            anyhow::bail!("{} is not a git work tree", self.repo.display());
        }

        let current = self.run_ok(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        if current != branch {
            anyhow::bail!("on branch '{current}', expected '{branch}'");
        }

        let status = self.run_ok(&["status", "--porcelain"]).await?;
        if !status.is_empty() {
            anyhow::bail!(
                "working tree has uncommitted changes:\n{status}\n\nCommit or stash them before validating."
            );
        }

        if offline {
            debug!("Skipping upstream freshness check (offline)");
            return Ok(());
        }

        self.run_ok(&["fetch", "--quiet", "--tags", &self.remote])
            .await
            .with_context(|| format!("Failed to fetch from '{}'", self.remote))?;

        let behind = self
            .run_ok(&["rev-list", "--count", "HEAD..@{u}"])
            .await
            .context("Cannot compare with upstream (does the branch track a remote?)")?;
        if behind != "0" {
            anyhow::bail!("branch '{branch}' is {behind} commit(s) behind its upstream, pull first");
        }

        Ok(())
    }

    async fn tags(&self) -> Result<Vec<String>> {
        let out = self.run_ok(&["tag", "--list"]).await?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    async fn diff_path(&self, tag: &str, path: &Path) -> Result<DiffOutcome> {
        let path_arg = path.to_string_lossy();
        let output = self
            .run(&["diff", "--quiet", tag, "--", path_arg.as_ref()])
            .await?;

        match output.status.code() {
            Some(0) => Ok(DiffOutcome::Unchanged),
            Some(1) => Ok(DiffOutcome::Changed),
            _ => anyhow::bail!(
                "git diff exited with {}: {}",
                exit_code(&output),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        }
    }
}

fn exit_code(output: &Output) -> String {
    output
        .status
        .code()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string())
}
