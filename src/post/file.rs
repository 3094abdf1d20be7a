use std::path::Path;

use log::debug;

use super::Post;
use crate::error::Result;

impl Post {
    /// Read a post file. Bytes that are not UTF-8 are replaced, so such a
    /// file never matches what the blog has.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let contents = tokio::fs::read(path).await?;
        Ok(Self::parse(&String::from_utf8_lossy(&contents)))
    }

    /// Write the post to `path`, creating missing folders.
    ///
    /// The file is replaced as a whole; an existing file at `path` is
    /// overwritten.
    pub async fn write(&self, path: &Path) -> Result<()> {
        let contents = self.serialize()?;

        if let Some(folder) = path.parent().filter(|folder| !folder.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(folder).await?;
        }

        debug!("Writing {}", path.display());
        tokio::fs::write(path, contents).await?;
        Ok(())
    }
}
