//! Typed MIDI 1.0 messages as reassembled from the wire.

use smallvec::SmallVec;

/// One complete MIDI message. Immutable once emitted by the tokenizer.
///
/// `Channel` and `SystemCommon` always start with their status byte and carry
/// exactly the data-byte count the MIDI 1.0 spec mandates for that status.
/// `SystemExclusive` always starts `0xF0` and ends `0xF7`; a non-canonical
/// terminator on the wire is normalized before emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    Channel(SmallVec<[u8; 3]>),
    SystemCommon(SmallVec<[u8; 3]>),
    SystemExclusive(Vec<u8>),
    SystemRealTime(u8),
}

impl MidiMessage {
    /// The status byte of this message.
    pub fn status(&self) -> u8 {
        match self {
            MidiMessage::Channel(bytes) | MidiMessage::SystemCommon(bytes) => bytes[0],
            MidiMessage::SystemExclusive(bytes) => bytes[0],
            MidiMessage::SystemRealTime(byte) => *byte,
        }
    }

    /// The MIDI channel (0-15) for channel messages, `None` otherwise.
    pub fn channel(&self) -> Option<u8> {
        match self {
            MidiMessage::Channel(bytes) => Some(bytes[0] & 0x0F),
            _ => None,
        }
    }

    /// Data bytes (everything after the status byte).
    pub fn data(&self) -> &[u8] {
        match self {
            MidiMessage::Channel(bytes) | MidiMessage::SystemCommon(bytes) => &bytes[1..],
            MidiMessage::SystemExclusive(bytes) => &bytes[1..],
            MidiMessage::SystemRealTime(_) => &[],
        }
    }
}

/// Data-byte count for a channel status byte (high nibble `0x8..=0xE`).
pub(crate) fn channel_data_len(status: u8) -> usize {
    match status >> 4 {
        0x8..=0xB | 0xE => 2,
        0xC | 0xD => 1,
        _ => unreachable!("not a channel status: {status:#04x}"),
    }
}
