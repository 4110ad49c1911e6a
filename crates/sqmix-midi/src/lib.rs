//! MIDI wire layer for the SQ control protocol.
//!
//! Two stages, both pull-based:
//!
//! - [`Tokenizer`] reassembles complete MIDI 1.0 messages from an arbitrarily
//!   fragmented byte stream (running status, interleaved real-time bytes,
//!   non-canonical SysEx termination included).
//! - [`ChannelParser`] recognizes the multi-message NRPN and scene-change
//!   sequences the console speaks and emits semantic [`MixerEvent`]s.
//!
//! Neither stage ever fails hard on malformed input: garbage is logged and
//! discarded, and parsing resynchronizes on the next status byte.

mod message;
pub use message::MidiMessage;

mod tokenizer;
pub use tokenizer::Tokenizer;

mod parser;
pub use parser::{ChannelParser, MixerEvent};
