//! Error types for the session layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Proto(#[from] sqmix_proto::Error),

    #[error("no current scene is known yet; cannot step")]
    SceneUnknown,
}

pub type Result<T> = std::result::Result<T, Error>;
