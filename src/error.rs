use std::io;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("need --url, --user, and --password")]
    MissingCredentials,
    #[error("couldn't find .git directory anywhere")]
    RepositoryNotFound,

    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error(transparent)]
    Http(#[from] reqwest_middleware::Error),
    #[error(transparent)]
    Status(#[from] reqwest::Error),
    #[error("fault {code}: {message}")]
    Fault { code: i64, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("post has no description field")]
    MissingDescription,
    #[error("field `{0}` spans several lines and can't be a header")]
    MultilineHeader(String),
    #[error("invalid post id `{0}`")]
    InvalidPostId(String),
    #[error("post has no slug, title or id to name its file after")]
    Unnamed,
    #[error("published post `{0}` has no dateCreated")]
    MissingDate(String),
}
