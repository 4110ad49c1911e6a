//! Centralized error type for the sqmix umbrella crate.
//!
//! Wraps the layer errors so `?` propagates naturally across crate
//! boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Proto(#[from] sqmix_proto::Error),

    #[error(transparent)]
    Session(#[from] sqmix_session::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
