use std::path::Path;

use futures::{Stream, TryStreamExt};
use log::{debug, error, trace};

use crate::{error::Result, post::Post};

pub const DEFAULT_UNCHANGED: usize = 5;

/// How far to walk the remote listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanLimit {
    /// Stop once more than this many unchanged posts have been seen.
    ///
    /// The count is cumulative over the whole scan: new or changed posts in
    /// between do not reset it.
    Unchanged(usize),
    /// Look at every post.
    Full,
}

impl Default for ScanLimit {
    fn default() -> Self {
        Self::Unchanged(DEFAULT_UNCHANGED)
    }
}

impl ScanLimit {
    fn reached(&self, unchanged: usize) -> bool {
        match self {
            Self::Unchanged(limit) => unchanged > *limit,
            Self::Full => false,
        }
    }
}

/// Remote posts that differ from the local tree.
#[derive(Debug, Default)]
pub struct Changes {
    /// No local file at the derived path.
    pub new: Vec<Post>,
    /// Local file exists but its content differs.
    pub changed: Vec<Post>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.changed.is_empty()
    }
}

/// Compare remote posts, most recent first, against the files under `root`.
///
/// Posts past the point where `limit` stops the scan are never looked at, even
/// if they changed.
pub async fn detect_changes<S>(root: &Path, mut posts: S, limit: ScanLimit) -> Result<Changes>
where
    S: Stream<Item = Result<Post>> + Unpin,
{
    let mut changes = Changes::default();
    let mut unchanged = 0;

    while let Some(remote) = posts.try_next().await? {
        let path = root.join(remote.filename()?);

        if !tokio::fs::try_exists(&path).await? {
            trace!("new {}", path.display());
            changes.new.push(remote);
            continue;
        }

        let signature = match remote.signature() {
            Ok(signature) => signature,
            Err(e) => {
                error!("{}: {}", path.display(), e);
                continue;
            }
        };

        let local = Post::read(&path).await?;
        if local.signature().ok() != Some(signature) {
            trace!("changed {}", path.display());
            changes.changed.push(remote);
        } else {
            unchanged += 1;
            if limit.reached(unchanged) {
                debug!("{} unchanged posts seen, stopping", unchanged);
                break;
            }
        }
    }

    Ok(changes)
}
