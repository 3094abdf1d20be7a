mod api;
mod changes;
mod config;
mod error;
mod git;
mod post;
mod remote;
mod sync;


use std::process::ExitCode;

use api::weblog::MetaWeblogClient;
use config::{Command, Config};
use error::{Error, Result};
use git::Git;
use log::{debug, error, info, warn};
use remote::remote_posts;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    config.init_logger();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("wp: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<()> {
    let git = Git::new(config.git_config());
    let cwd = std::env::current_dir()?;
    let root = git.find_root(&cwd).await?;

    let credentials = config.credentials(&git).await?;
    debug!("Using {} as {}", credentials.url, credentials.user);
    let blog = MetaWeblogClient::new(credentials, config.blog_id());

    match &config.command {
        Command::Download => {
            let root = root.unwrap_or(cwd);
            let summary = sync::download_all(&root, remote_posts(&blog)).await?;
            info!(
                "{} downloaded, {} skipped, {} failed",
                summary.written.len(),
                summary.skipped.len(),
                summary.failed.len()
            );
        }
        Command::Status { scope } => {
            let root = root.ok_or(Error::RepositoryNotFound)?;
            let changes = sync::status(&root, remote_posts(&blog), scope.scan_limit()).await?;
            if changes.is_empty() {
                debug!("Blog and files agree ({} scan)", scope);
            }

            match git.list_modified().await {
                Ok(files) => {
                    for file in files.iter().filter(|file| post::is_post_path(file)) {
                        info!("uncommitted: {}", file.display());
                    }
                }
                Err(e) => warn!("Couldn't list uncommitted files: {}", e),
            }
        }
        Command::Update => {
            let root = root.ok_or(Error::RepositoryNotFound)?;
            sync::update(&root, remote_posts(&blog)).await?;
        }
        Command::Post { add, files } => {
            let root = root.ok_or(Error::RepositoryNotFound)?;
            let stage = add.then_some(&git);
            sync::post_files(&root, files, &blog, stage).await?;
        }
    }

    Ok(())
}
