//! Error types for the protocol calculus.
//!
//! Every variant here aborts exactly one requested operation; none of them
//! ever tears down a connection.

use thiserror::Error;

use crate::model::{Category, Model};
use crate::nrpn::ParamTag;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{category} index {index} out of range on {model} ({count} available)")]
    IndexOutOfRange {
        category: Category,
        index: u16,
        model: Model,
        count: u16,
    },

    // The field cannot be called `source`: thiserror would treat it as the
    // error's cause and demand `Category: std::error::Error`.
    #[error("the console has no {kind} parameter for {from} into {sink}")]
    UnsupportedSend {
        kind: ParamTag,
        from: Category,
        sink: Category,
    },

    #[error("the console has no {kind} master for {category}")]
    UnsupportedOutput { kind: ParamTag, category: Category },

    #[error("{category} strips have no {kind} control")]
    UnsupportedStrip { kind: ParamTag, category: Category },

    #[error("scene {scene} out of range ({count} scenes)")]
    SceneOutOfRange { scene: u16, count: u16 },

    #[error("level {0} dB outside (-90, +10]")]
    LevelOutOfRange(f32),

    #[error("pan amount {0} must be a multiple of 5 in 5..=100")]
    InvalidPanAmount(u8),

    #[error("unrecognized pan label {0:?}")]
    InvalidPanLabel(String),
}

pub type Result<T> = std::result::Result<T, Error>;
