//! Session layer for SQ consoles: one TCP connection, the outbound command
//! builders, the last-known-value store, the fade engine, and the
//! [`MixerSession`] orchestrator that feeds socket bytes through the wire
//! layer and applies the resulting events.

pub mod error;
pub use error::{Error, Result};

pub mod commands;

mod connection;
pub use connection::{Connection, ConnectionStatus, MidiSink, Pacing, DEFAULT_PORT};

mod store;
pub use store::{level_key, mute_key, pan_key, ChangeListener, NopListener, StateStore};

mod fade;
pub use fade::FadeEngine;

mod session;
pub use session::{MixerSession, SessionConfig};
