use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::error::{Error, Result};

/// Where git should look, instead of whatever the process environment says.
#[derive(Debug, Clone, Default)]
pub struct GitConfig {
    pub git_dir: Option<PathBuf>,
    pub work_tree: Option<PathBuf>,
}

/// Thin wrapper over the `git` command line.
#[derive(Debug, Clone, Default)]
pub struct Git {
    config: GitConfig,
}

impl Git {
    pub fn new(config: GitConfig) -> Self {
        Self { config }
    }

    async fn git(&self, args: &[&str]) -> Result<std::process::Output> {
        let mut cmd = tokio::process::Command::new("git");
        cmd.args(args);
        if let Some(git_dir) = &self.config.git_dir {
            cmd.env("GIT_DIR", git_dir);
        }
        if let Some(work_tree) = &self.config.work_tree {
            cmd.env("GIT_WORK_TREE", work_tree);
        }

        trace!("git {}", args.join(" "));
        Ok(cmd.output().await?)
    }

    async fn git_ok(&self, args: &[&str]) -> Result<String> {
        let output = self.git(args).await?;
        if !output.status.success() {
            return Err(Error::Git {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// `git config --get <key>`, `None` when the key is unset or empty.
    pub async fn get_config(&self, key: &str) -> Result<Option<String>> {
        let output = self.git(&["config", "--get", key]).await?;
        // exit code 1 means the key is not set
        if !output.status.success() {
            debug!("git config {} is not set", key);
            return Ok(None);
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!value.is_empty()).then_some(value))
    }

    /// The configured work tree, or the closest folder at or above `start`
    /// that holds a `.git` entry.
    pub async fn find_root(&self, start: &Path) -> Result<Option<PathBuf>> {
        if let Some(work_tree) = &self.config.work_tree {
            return Ok(Some(work_tree.clone()));
        }

        for folder in start.ancestors() {
            if tokio::fs::try_exists(folder.join(".git")).await? {
                return Ok(Some(folder.to_path_buf()));
            }
        }
        Ok(None)
    }

    /// Tracked files with unstaged changes, relative to the repository root.
    pub async fn list_modified(&self) -> Result<Vec<PathBuf>> {
        let output = self.git_ok(&["ls-files", "-m", "--full-name"]).await?;
        Ok(output
            .lines()
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    pub async fn add(&self, path: &Path) -> Result<()> {
        let path = path.to_string_lossy();
        self.git_ok(&["add", "--", &path]).await?;
        Ok(())
    }
}
