//! # sqmix - Allen & Heath SQ mixer control
//!
//! Remote control of SQ-series consoles (SQ-5/6/7) over the MIDI-over-TCP
//! service on port 51325.
//!
//! ## Architecture
//!
//! sqmix is an umbrella crate that coordinates:
//! - **sqmix-midi** - MIDI wire layer (stream tokenizer, NRPN/scene parser)
//! - **sqmix-proto** - Protocol calculus (models, NRPN address calculator,
//!   level and pan codecs)
//! - **sqmix-session** - Session layer (TCP connection, command builders,
//!   state store, fade engine, the mixer session)
//!
//! ## Quick Start
//!
//! ```ignore
//! use sqmix::prelude::*;
//!
//! let mixer = SqMixer::builder("192.168.1.60", Model::Sq6)
//!     .fader_law(FaderLaw::AudioTaper)
//!     .connect()?;
//!
//! let session = mixer.session();
//! session.set_mute(Category::InputChannel, 0, true)?;
//! session.set_mix_level(
//!     Category::InputChannel,
//!     0,
//!     MixOrLr::Lr,
//!     Level::db(-6.0)?,
//! )?;
//! session.fade_output_level(
//!     Category::Lr,
//!     0,
//!     Level::Off,
//!     std::time::Duration::from_secs(3),
//! )?;
//!
//! mixer.disconnect();
//! ```

/// Re-export of the protocol layer for direct access.
pub use sqmix_proto as proto;

// Protocol types
pub use sqmix_proto::{
    AddressCalculator, Category, FaderLaw, Level, MixOrLr, Model, Nrpn, Pan, PanDirection,
    ParamTag,
};

/// Re-export of the wire layer for direct access.
pub use sqmix_midi as midi;

pub use sqmix_midi::{ChannelParser, MidiMessage, MixerEvent, Tokenizer};

/// Re-export of the session layer for direct access.
pub use sqmix_session as session;

pub use sqmix_session::{
    ChangeListener, Connection, ConnectionStatus, MidiSink, MixerSession, NopListener, Pacing,
    SessionConfig, StateStore, DEFAULT_PORT,
};

mod builder;
mod error;
mod mixer;

pub use builder::{MixerConfig, SqMixerBuilder};
pub use error::{Error, Result};
pub use mixer::SqMixer;

/// Convenience prelude for common imports.
pub mod prelude {
    pub use crate::{MixerConfig, SqMixer, SqMixerBuilder};

    pub use crate::proto::{Category, FaderLaw, Level, MixOrLr, Model, Pan, PanDirection};

    pub use crate::session::{ChangeListener, ConnectionStatus, Pacing};
}
