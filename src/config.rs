use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use dotenv::dotenv;
use env_logger::TimestampPrecision;
use log::debug;
use std::{
    fmt::{self, Display},
    path::PathBuf,
};

use crate::{
    changes::ScanLimit,
    error::{Error, Result},
    git::{Git, GitConfig},
};

/// Easy maintenance of a WordPress blog through git.
///
/// Set wp.url, wp.user and wp.password with `git config`, or pass them as
/// flags.
#[derive(Debug, Clone, Parser)]
#[command(version)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
    /// XML-RPC endpoint, when `wp.url` is not in git config
    #[arg(long, env = "WP_URL", global = true)]
    url: Option<String>,
    /// Blog user, when `wp.user` is not in git config
    #[arg(long, env = "WP_USER", global = true)]
    user: Option<String>,
    /// Blog password, when `wp.password` is not in git config
    #[arg(long, env = "WP_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,
    /// Blog id sent with every call
    #[arg(long, default_value = "1", global = true)]
    blog_id: String,
    /// Repository folder, instead of searching up from here
    #[arg(long, env = "GIT_DIR", global = true)]
    git_dir: Option<PathBuf>,
    /// Work tree holding the post files
    #[arg(long, env = "GIT_WORK_TREE", global = true)]
    work_tree: Option<PathBuf>,
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Download everything at once
    Download,
    /// Compare the local files with the blog
    Status {
        #[arg(value_enum, default_value_t = Scope::Recent)]
        scope: Scope,
    },
    /// Bring down changes to the local files
    Update,
    /// Post files to the blog
    Post {
        /// Stage the file written for a new post
        #[arg(long)]
        add: bool,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, Hash, ValueEnum, PartialEq, Eq, Default)]
pub enum Scope {
    /// Stop after a few unchanged posts
    #[default]
    Recent,
    /// Check every post
    All,
}

impl Scope {
    pub fn scan_limit(&self) -> ScanLimit {
        match self {
            Self::Recent => ScanLimit::default(),
            Self::All => ScanLimit::Full,
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Recent => write!(f, "recent"),
            Self::All => write!(f, "all"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub url: String,
    pub user: String,
    pub password: String,
}

impl Config {
    /// Parse the configuration from the environment and command line arguments
    pub fn parse() -> Self {
        dotenv().ok();
        <Self as Parser>::parse()
    }
    /// Create a logger with the configured verbosity level
    pub fn init_logger(&self) {
        let verbose = self
            .verbose
            .log_level()
            .is_some_and(|level| level > log::Level::Info);

        env_logger::Builder::new()
            .format_timestamp(verbose.then_some(TimestampPrecision::Millis))
            .format_target(false)
            .filter_level(self.verbose.log_level_filter())
            .init();
    }
    pub fn git_config(&self) -> GitConfig {
        GitConfig {
            git_dir: self.git_dir.clone(),
            work_tree: self.work_tree.clone(),
        }
    }
    pub fn blog_id(&self) -> &str {
        &self.blog_id
    }
    /// Git config first, flags and environment second.
    pub async fn credentials(&self, git: &Git) -> Result<Credentials> {
        let url = lookup(git, "wp.url", &self.url).await;
        let user = lookup(git, "wp.user", &self.user).await;
        let password = lookup(git, "wp.password", &self.password).await;

        match (url, user, password) {
            (Some(url), Some(user), Some(password)) => Ok(Credentials {
                url,
                user,
                password,
            }),
            _ => Err(Error::MissingCredentials),
        }
    }
}

async fn lookup(git: &Git, key: &str, fallback: &Option<String>) -> Option<String> {
    let value = match git.get_config(key).await {
        Ok(Some(value)) => Some(value),
        Ok(None) => fallback.clone(),
        Err(e) => {
            debug!("git config {}: {}", key, e);
            fallback.clone()
        }
    };
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{git_repo, run_git};

    #[test]
    fn status_scope_defaults_to_recent() {
        let config = Config::try_parse_from(["wp", "status"]).unwrap();
        assert!(matches!(config.command, Command::Status { scope: Scope::Recent }));
        assert_eq!(Scope::Recent.scan_limit(), ScanLimit::default());

        let config = Config::try_parse_from(["wp", "status", "all"]).unwrap();
        assert!(matches!(config.command, Command::Status { scope: Scope::All }));
        assert_eq!(Scope::All.scan_limit(), ScanLimit::Full);
    }

    #[test]
    fn post_needs_files() {
        assert!(Config::try_parse_from(["wp", "post"]).is_err());

        let config =
            Config::try_parse_from(["wp", "post", "--add", "draft/a", "draft/b"]).unwrap();
        match config.command {
            Command::Post { add, files } => {
                assert!(add);
                assert_eq!(files, [PathBuf::from("draft/a"), PathBuf::from("draft/b")]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn flags_after_the_subcommand() {
        let config = Config::try_parse_from([
            "wp",
            "update",
            "--url",
            "https://blog.example/xmlrpc.php",
            "--blog-id",
            "3",
        ])
        .unwrap();
        assert_eq!(config.url.as_deref(), Some("https://blog.example/xmlrpc.php"));
        assert_eq!(config.blog_id(), "3");
    }

    #[tokio::test]
    async fn git_config_beats_flags() {
        let (dir, git) = git_repo().await;
        run_git(dir.path(), &["config", "wp.url", "https://git.example/xmlrpc.php"]).await;
        run_git(dir.path(), &["config", "wp.password", "from-git"]).await;

        let config = Config::try_parse_from([
            "wp",
            "update",
            "--url",
            "https://flag.example/xmlrpc.php",
            "--user",
            "flag-user",
            "--password",
            "from-flag",
        ])
        .unwrap();
        let credentials = config.credentials(&git).await.unwrap();

        assert_eq!(credentials.url, "https://git.example/xmlrpc.php");
        assert_eq!(credentials.user, "flag-user");
        assert_eq!(credentials.password, "from-git");
    }

    #[tokio::test]
    async fn missing_credential_is_an_error() {
        let (dir, git) = git_repo().await;
        run_git(dir.path(), &["config", "wp.url", "https://git.example/xmlrpc.php"]).await;

        let config = Config::try_parse_from(["wp", "update", "--user", "someone"]).unwrap();
        let result = config.credentials(&git).await;
        assert!(matches!(result, Err(Error::MissingCredentials)));
    }
}
