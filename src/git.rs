use std::fmt;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, anyhow};

use crate::APP_NAME;

pub trait VersionControl {
    /// Stage and commit exactly `file` inside `dir`.
    fn commit_file(&self, dir: &Path, file: &str) -> Result<()>;
}

pub fn commit_message(file: &str) -> String {
    format!("Auto-save: {} (via {})", file, APP_NAME)
}

/// Result of the optional auto-commit, shown in the success message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStatus {
    Committed,
    Failed(String),
}

impl fmt::Display for CommitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitStatus::Committed => write!(f, "(Git Commit Successful)"),
            CommitStatus::Failed(reason) => write!(f, "(Git Commit Failed: {})", reason),
        }
    }
}

/// Runs the `git` executable found on PATH.
#[derive(Debug, Default)]
pub struct GitCli;

impl GitCli {
    fn ensure_installed() -> Result<()> {
        let check = if cfg!(windows) {
            Command::new("where").arg("git").output()
        } else {
            Command::new("which").arg("git").output()
        };
        match check {
            Ok(output) if output.status.success() => Ok(()),
            _ => Err(anyhow!("git not found")),
        }
    }

    fn run(dir: &Path, step: &str, args: &[&str]) -> Result<()> {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .with_context(|| format!("{}: failed to execute 'git'", step))?;
        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(anyhow!("{}: {}", step, combined.trim()));
        }
        Ok(())
    }
}

impl VersionControl for GitCli {
    fn commit_file(&self, dir: &Path, file: &str) -> Result<()> {
        Self::ensure_installed()?;
        tracing::debug!("git add {} in {}", file, dir.display());
        Self::run(dir, "add", &["add", file])?;
        let message = commit_message(file);
        tracing::debug!("git commit -m {:?}", message);
        Self::run(dir, "commit", &["commit", "-m", &message])
    }
}
