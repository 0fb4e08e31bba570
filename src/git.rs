use serde::Serialize;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// The last commit that touched a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub hash: String,
    pub short_hash: String,
    pub date: String,
    pub email: String,
    pub name: String,
}

impl CommitInfo {
    /// Parse one line of `git log --format="%H %cs %ce %cn"`.
    fn parse(line: &str) -> Option<Self> {
        let mut parts = line.trim_end().splitn(4, ' ');
        let hash = parts.next().filter(|h| h.len() >= 7)?;
        let date = parts.next()?;
        let email = parts.next()?;
        let name = parts.next()?;
        Some(CommitInfo {
            hash: hash.to_string(),
            short_hash: hash[..7].to_string(),
            date: date.to_string(),
            email: email.to_string(),
            name: name.to_string(),
        })
    }
}

/// Look up the last commit for `file` in the repository at `repo`. Any
/// problem (no git, not a repository, untracked file) just yields `None`.
pub fn last_commit(repo: &Path, file: &Path) -> Option<CommitInfo> {
    let output = Command::new("git")
        .current_dir(repo)
        .args(["log", "-1", "--format=%H %cs %ce %cn", "--"])
        .arg(file)
        .output();
    let output = match output {
        Ok(o) if o.status.success() => o,
        Ok(o) => {
            debug!("git log failed for {}: {}", file.display(), o.status);
            return None;
        }
        Err(e) => {
            debug!("could not run git: {e}");
            return None;
        }
    };
    CommitInfo::parse(std::str::from_utf8(&output.stdout).ok()?)
}
