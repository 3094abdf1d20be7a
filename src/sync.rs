use std::path::{Path, PathBuf};

use futures::{Stream, TryStreamExt};
use log::{error, info, warn};

use crate::{
    api::Blog,
    changes::{detect_changes, Changes, ScanLimit},
    error::Result,
    git::Git,
    post::Post,
};

#[derive(Debug, Default)]
pub struct Downloaded {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Write every remote post under `root`, leaving existing files alone.
pub async fn download_all<S>(root: &Path, mut posts: S) -> Result<Downloaded>
where
    S: Stream<Item = Result<Post>> + Unpin,
{
    let mut summary = Downloaded::default();

    while let Some(post) = posts.try_next().await? {
        let name = post.filename()?;
        let path = root.join(&name);

        if tokio::fs::try_exists(&path).await? {
            warn!("skipping {}, file in way", name.display());
            summary.skipped.push(name);
            continue;
        }

        match post.write(&path).await {
            Ok(()) => {
                info!("downloaded: {}", name.display());
                summary.written.push(name);
            }
            Err(e) => {
                error!("{}: {}", name.display(), e);
                summary.failed.push(name);
            }
        }
    }

    Ok(summary)
}

/// Report what differs between the blog and `root` without touching anything.
pub async fn status<S>(root: &Path, posts: S, limit: ScanLimit) -> Result<Changes>
where
    S: Stream<Item = Result<Post>> + Unpin,
{
    let changes = detect_changes(root, posts, limit).await?;

    for post in &changes.new {
        info!("new: {}", post.filename()?.display());
    }
    for post in &changes.changed {
        info!("changed: {}", post.filename()?.display());
    }

    Ok(changes)
}

#[derive(Debug, Default)]
pub struct Updated {
    pub written: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Bring new and changed posts down, overwriting local files.
pub async fn update<S>(root: &Path, posts: S) -> Result<Updated>
where
    S: Stream<Item = Result<Post>> + Unpin,
{
    let Changes { new, changed } = detect_changes(root, posts, ScanLimit::default()).await?;
    let mut summary = Updated::default();

    for post in new.into_iter().chain(changed) {
        let name = post.filename()?;
        match post.write(&root.join(&name)).await {
            Ok(()) => {
                info!("updated: {}", name.display());
                summary.written.push(name);
            }
            Err(e) => {
                error!("{}: {}", name.display(), e);
                summary.failed.push(name);
            }
        }
    }

    Ok(summary)
}

#[derive(Debug, Default)]
pub struct Published {
    pub edited: Vec<PathBuf>,
    /// Input file and the canonical file written for the new post.
    pub posted: Vec<(PathBuf, PathBuf)>,
    pub skipped: Vec<PathBuf>,
}

/// Push local files to the blog.
///
/// Files with a `postid` edit that post. Others create a new post, which is
/// then fetched back and written to its canonical path under `root` (and
/// staged when `stage` is given). Unreadable files are skipped; any other
/// error stops the batch.
pub async fn post_files<B: Blog>(
    root: &Path,
    files: &[PathBuf],
    blog: &B,
    stage: Option<&Git>,
) -> Result<Published> {
    let mut summary = Published::default();

    for file in files {
        let post = match Post::read(file).await {
            Ok(post) => post,
            Err(e) => {
                warn!("Couldn't open {} ({}), continuing.", file.display(), e);
                summary.skipped.push(file.clone());
                continue;
            }
        };

        if let Some(id) = post.id()? {
            if !blog.edit_post(id, post.outbound()).await? {
                warn!("blog did not accept the edit of {}", file.display());
            }
            info!("edited: {}", file.display());
            summary.edited.push(file.clone());
            continue;
        }

        let id = blog.new_post(post.outbound()).await?;
        let created = Post::from_remote(blog.get_post(id).await?);
        let path = root.join(created.filename()?);

        match created.write(&path).await {
            Ok(()) => {
                if let Some(git) = stage {
                    git.add(&path).await?;
                }
            }
            Err(e) => error!("{}: {}", path.display(), e),
        }

        info!("posted: {} -> {}", file.display(), path.display());
        summary.posted.push((file.clone(), path));
    }

    Ok(summary)
}
